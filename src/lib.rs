pub mod assistant;
pub mod clients;
pub mod config;
pub mod core;
pub mod error;
pub mod fixtures;
pub mod interceptors;
pub mod json_utils;
pub mod prompt;
pub mod quiz;
pub mod roadmap;
pub mod schema;
pub mod server;

// Convenient re-exports
pub use assistant::{recover, Assistant};
pub use json_utils::{extract, ExtractedJson};
pub use schema::{validate, QuizQuestion, ReplyKind, RoadmapModule, Validated};
