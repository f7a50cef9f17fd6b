use crate::config::DEFAULT_CODE_EXEC_URL;
use crate::core::CodeExecutor;
use crate::error::GatewayError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Program to run remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub language: String,
    pub version: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
struct PistonFile<'a> {
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct PistonRequest<'a> {
    language: &'a str,
    version: &'a str,
    files: Vec<PistonFile<'a>>,
}

/// Output of one stage (compile or run) as reported by the runner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStage {
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    /// Interleaved stdout and stderr
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub code: Option<i32>,
    #[serde(default)]
    pub signal: Option<String>,
    /// Fields this crate does not interpret (`message`, `status`, `cpu_time`,
    /// `wall_time`, `memory`, ...), kept so responses forward unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Runner response, passed through to callers in the same shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile: Option<ExecutionStage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<ExecutionStage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExecutionResult {
    /// The stage that decided the outcome: a failed compile, else the run.
    pub fn decisive_stage(&self) -> Option<&ExecutionStage> {
        match &self.compile {
            Some(compile) if compile.code.unwrap_or(0) != 0 => Some(compile),
            _ => self.run.as_ref(),
        }
    }

    pub fn stdout(&self) -> &str {
        self.decisive_stage().map_or("", |s| s.stdout.as_str())
    }

    pub fn stderr(&self) -> &str {
        self.decisive_stage().map_or("", |s| s.stderr.as_str())
    }

    /// `None` when the runner reported neither stage or killed the process by signal.
    pub fn exit_status(&self) -> Option<i32> {
        self.decisive_stage().and_then(|s| s.code)
    }
}

#[derive(Debug, Clone)]
pub struct PistonConfig {
    pub base_url: String,
    pub timeout: Option<Duration>,
}

impl Default for PistonConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_CODE_EXEC_URL.to_string(), timeout: None }
    }
}

/// Client for the Piston remote execution API. Needs no credential.
#[derive(Clone, Debug)]
pub struct PistonClient {
    config: PistonConfig,
    client: Client,
}

impl PistonClient {
    pub fn new(config: PistonConfig) -> Self {
        info!(base_url = %config.base_url, "Creating new Piston client");
        Self { config, client: Client::new() }
    }
}

#[async_trait]
impl CodeExecutor for PistonClient {
    #[instrument(skip(self, request), fields(language = %request.language, version = %request.version, code_len = request.code.len()))]
    async fn execute(&self, request: ExecuteRequest) -> Result<ExecutionResult, GatewayError> {
        let body = PistonRequest {
            language: &request.language,
            version: &request.version,
            files: vec![PistonFile { content: &request.code }],
        };
        let url = format!("{}/execute", self.config.base_url.trim_end_matches('/'));

        let mut builder = self.client.post(url).json(&body);
        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            error!(error = %e, "Execution request failed");
            GatewayError::from_transport(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %body, "Execution API error");
            return Err(GatewayError::Status { status: status.as_u16(), body });
        }

        let result: ExecutionResult = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse execution response JSON");
            GatewayError::Protocol(e.to_string())
        })?;

        debug!(exit_status = ?result.exit_status(), "Execution finished");
        Ok(result)
    }
}
