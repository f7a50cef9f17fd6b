use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),
}

/// Failures turning a raw model reply into typed records.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Model reply contains no JSON array")]
    MalformedReply,
    #[error("Array text is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("Reply does not match the expected shape: {0}")]
    Schema(String),
}

/// Failures talking to an upstream service (LLM router or code runner).
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),
    #[error("Upstream returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Upstream response could not be decoded: {0}")]
    Protocol(String),
}

impl GatewayError {
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Unavailable(format!("request timed out: {}", e))
        } else {
            Self::Unavailable(e.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable {name} is invalid: {reason}")]
    InvalidVar { name: &'static str, reason: String },
    #[error("Could not read fixtures from {path}: {reason}")]
    Fixtures { path: String, reason: String },
}
