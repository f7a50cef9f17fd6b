pub mod mock;
pub mod piston;
pub mod router;

pub use mock::*;
pub use piston::*;
pub use router::*;
