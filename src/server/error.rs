use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::error::{AssistantError, GatewayError};

/// Request-boundary error. Upstream and parse failures become a generic
/// message and a 500; the detail goes to the log only.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{message}: {source}")]
    Assistant {
        message: &'static str,
        #[source]
        source: AssistantError,
    },
    #[error("{message}: {source}")]
    Execution {
        message: &'static str,
        #[source]
        source: GatewayError,
    },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Assistant { .. } | Self::Execution { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::BadRequest(m) | Self::Unauthorized(m) => *m,
            Self::Assistant { message, .. } | Self::Execution { message, .. } => *message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Assistant { message, source } => {
                error!(target: "techmate::server", error = %source, "{}", message);
                json!({ "message": message })
            }
            Self::Execution { message, source } => {
                error!(target: "techmate::server", error = %source, "{}", message);
                json!({ "message": message })
            }
            Self::Unauthorized(message) => json!({ "success": false, "message": message }),
            Self::BadRequest(message) => json!({ "message": message }),
        };
        (status, Json(body)).into_response()
    }
}
