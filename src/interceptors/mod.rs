//! Optional capture of prompt/reply pairs, for diagnosing replies that fail extraction.

use async_trait::async_trait;
use std::fmt::Debug;

/// Receives every prompt/reply pair the assistant exchanges with the model.
/// `task` is a short label such as `quiz` or `notes`.
#[async_trait]
pub trait Interceptor: Send + Sync + Debug {
    async fn save(&self, task: &str, prompt: &str, reply: &str) -> std::io::Result<()>;
}

pub mod file;
pub use file::FileInterceptor;
