use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::clients::piston::{ExecuteRequest, ExecutionResult};
use crate::core::{ChatCompletionClient, CodeExecutor};
use crate::error::GatewayError;
use crate::prompt::ChatMessage;

/// Scripted outcome for one upstream call.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Reply(String),
    Status(u16, String),
    Unavailable(String),
}

impl MockResponse {
    fn into_result(self) -> Result<String, GatewayError> {
        match self {
            Self::Reply(text) => Ok(text),
            Self::Status(status, body) => Err(GatewayError::Status { status, body }),
            Self::Unavailable(reason) => Err(GatewayError::Unavailable(reason)),
        }
    }
}

/// One call observed by a mock client.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

/// Shared control surface for a [`MockClient`]: queue replies, inspect calls.
#[derive(Debug, Default)]
pub struct MockHandle {
    responses: Mutex<VecDeque<MockResponse>>,
    calls: Mutex<Vec<RecordedCall>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockHandle {
    pub fn push(&self, response: MockResponse) {
        lock(&self.responses).push_back(response);
    }

    pub fn push_reply(&self, text: impl Into<String>) {
        self.push(MockResponse::Reply(text.into()));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn remaining(&self) -> usize {
        lock(&self.responses).len()
    }
}

/// Chat-completion client that answers from a queue. An empty queue is a 503.
#[derive(Debug, Clone)]
pub struct MockClient {
    handle: Arc<MockHandle>,
}

impl MockClient {
    pub fn new() -> (Self, Arc<MockHandle>) {
        let handle = Arc::new(MockHandle::default());
        (Self { handle: handle.clone() }, handle)
    }

    pub fn with_responses(responses: Vec<MockResponse>) -> (Self, Arc<MockHandle>) {
        let (client, handle) = Self::new();
        for response in responses {
            handle.push(response);
        }
        (client, handle)
    }
}

#[async_trait]
impl ChatCompletionClient for MockClient {
    async fn complete(&self, model: &str, messages: Vec<ChatMessage>, max_tokens: u32) -> Result<String, GatewayError> {
        lock(&self.handle.calls).push(RecordedCall { model: model.to_string(), messages, max_tokens });
        let next = lock(&self.handle.responses).pop_front();
        next.unwrap_or_else(|| MockResponse::Status(503, "mock has no scripted reply".to_string()))
            .into_result()
    }

    fn clone_box(&self) -> Box<dyn ChatCompletionClient> {
        Box::new(self.clone())
    }
}

/// Code executor returning a fixed result and recording requests.
#[derive(Debug, Default)]
pub struct MockExecutor {
    result: Mutex<Option<ExecutionResult>>,
    requests: Mutex<Vec<ExecuteRequest>>,
}

impl MockExecutor {
    pub fn returning(result: ExecutionResult) -> Self {
        Self { result: Mutex::new(Some(result)), requests: Mutex::default() }
    }

    /// An executor whose upstream is unreachable.
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<ExecuteRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl CodeExecutor for MockExecutor {
    async fn execute(&self, request: ExecuteRequest) -> Result<ExecutionResult, GatewayError> {
        lock(&self.requests).push(request);
        lock(&self.result)
            .clone()
            .ok_or_else(|| GatewayError::Unavailable("mock executor is offline".to_string()))
    }
}
