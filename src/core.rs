//! Upstream client abstractions.
//!
//! Implementors perform exactly one outbound call per invocation and translate
//! failures into [`GatewayError`]. Nothing here retries; higher layers decide
//! what a failure means for the caller.

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

use crate::clients::piston::{ExecuteRequest, ExecutionResult};
use crate::error::GatewayError;
use crate::prompt::ChatMessage;

/// Chat-completion model client.
#[async_trait]
pub trait ChatCompletionClient: Send + Sync + Debug {
    /// Send `messages` to `model` and return the raw text of the first choice.
    async fn complete(&self, model: &str, messages: Vec<ChatMessage>, max_tokens: u32) -> Result<String, GatewayError>;

    /// Clone this client into a boxed trait object
    fn clone_box(&self) -> Box<dyn ChatCompletionClient>;
}

impl Clone for Box<dyn ChatCompletionClient> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[async_trait]
impl ChatCompletionClient for Box<dyn ChatCompletionClient> {
    async fn complete(&self, model: &str, messages: Vec<ChatMessage>, max_tokens: u32) -> Result<String, GatewayError> {
        self.as_ref().complete(model, messages, max_tokens).await
    }

    fn clone_box(&self) -> Box<dyn ChatCompletionClient> {
        self.as_ref().clone_box()
    }
}

/// Remote sandboxed code runner.
#[async_trait]
pub trait CodeExecutor: Send + Sync + Debug {
    async fn execute(&self, request: ExecuteRequest) -> Result<ExecutionResult, GatewayError>;
}

#[async_trait]
impl<T: CodeExecutor + ?Sized> CodeExecutor for Arc<T> {
    async fn execute(&self, request: ExecuteRequest) -> Result<ExecutionResult, GatewayError> {
        self.as_ref().execute(request).await
    }
}
