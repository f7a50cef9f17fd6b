//! HTTP surface consumed by the browser front end.

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::assistant::Assistant;
use crate::clients::{PistonClient, PistonConfig, RouterClient, RouterConfig};
use crate::config::{KeyFromEnv, ServerConfig};
use crate::core::{ChatCompletionClient, CodeExecutor};
use crate::error::ConfigError;
use crate::fixtures::Fixtures;
use crate::interceptors::FileInterceptor;

pub mod error;
pub mod handlers;

pub use error::ApiError;

/// Shared, read-only per-process state. Requests never mutate it.
#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<Assistant<Box<dyn ChatCompletionClient>>>,
    pub executor: Arc<dyn CodeExecutor>,
    pub fixtures: Arc<Fixtures>,
}

impl AppState {
    pub fn new(
        assistant: Assistant<Box<dyn ChatCompletionClient>>,
        executor: Arc<dyn CodeExecutor>,
        fixtures: Fixtures,
    ) -> Self {
        Self { assistant: Arc::new(assistant), executor, fixtures: Arc::new(fixtures) }
    }

    /// Wire the real upstream clients described by `config`.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ConfigError> {
        let router = RouterClient::new(RouterConfig {
            base_url: config.llm_base_url.clone(),
            api_key: RouterClient::find_key().unwrap_or_default(),
            timeout: config.llm_timeout,
        });
        let mut assistant = Assistant::new(Box::new(router) as Box<dyn ChatCompletionClient>, config.profiles.clone());
        if let Some(dir) = &config.reply_capture_dir {
            info!(target: "techmate::server", dir = %dir.display(), "Capturing model replies");
            assistant = assistant.with_interceptor(Arc::new(FileInterceptor::new(dir.clone())));
        }

        let executor = PistonClient::new(PistonConfig {
            base_url: config.code_exec_url.clone(),
            timeout: config.code_exec_timeout,
        });

        let fixtures = match &config.fixtures_path {
            Some(path) => Fixtures::load(path)?,
            None => Fixtures::demo(),
        };

        Ok(Self::new(assistant, Arc::new(executor), fixtures))
    }
}

/// Routes without any middleware.
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route("/api/dashboard/stats", get(handlers::dashboard))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/ai/roadmap", post(handlers::roadmap))
        .route("/api/ai/quiz", post(handlers::quiz))
        .route("/api/ai/chat", post(handlers::chat))
        .route("/api/ai/notes", post(handlers::notes))
        .route("/api/code/execute", post(handlers::execute))
        .with_state(state)
}

/// Full application: routes plus CORS for `origins` and request tracing.
pub fn app(state: AppState, origins: &[String]) -> Router {
    routes(state).layer(cors(origins)).layer(TraceLayer::new_for_http())
}

fn cors(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(target: "techmate::server", origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
