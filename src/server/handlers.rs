use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::ApiError;
use super::AppState;
use crate::clients::piston::{ExecuteRequest, ExecutionResult};
use crate::core::CodeExecutor;
use crate::fixtures::{DashboardStats, UserProfile};
use crate::prompt::ChatMessage;
use crate::schema::{QuizQuestion, RoadmapModule};

/// Piston resolves `*` to the newest installed version.
const ANY_VERSION: &str = "*";

#[derive(Debug, Default, Deserialize)]
pub struct TopicRequest {
    #[serde(default)]
    pub topic: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Option<Vec<ChatMessage>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NotesRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExecuteBody {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoadmapResponse {
    pub roadmap: Vec<RoadmapModule>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuizResponse {
    pub quiz: Vec<QuizQuestion>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotesResponse {
    pub notes: String,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub user: UserProfile,
    #[serde(flatten)]
    pub stats: DashboardStats,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: UserProfile,
}

/// Unwrap a JSON body; malformed JSON counts as missing input.
fn body<T>(payload: Result<Json<T>, JsonRejection>, message: &'static str) -> Result<T, ApiError> {
    payload.map(|Json(v)| v).map_err(|_| ApiError::BadRequest(message))
}

fn required(value: Option<String>, message: &'static str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::BadRequest(message))
}

pub async fn health() -> &'static str {
    "TechMate API is running..."
}

pub async fn roadmap(
    State(state): State<AppState>,
    payload: Result<Json<TopicRequest>, JsonRejection>,
) -> Result<Json<RoadmapResponse>, ApiError> {
    let topic = required(body(payload, "Topic required")?.topic, "Topic required")?;
    let roadmap = state
        .assistant
        .generate_roadmap(&topic)
        .await
        .map_err(|source| ApiError::Assistant { message: "Roadmap generation failed", source })?;
    Ok(Json(RoadmapResponse { roadmap }))
}

pub async fn quiz(
    State(state): State<AppState>,
    payload: Result<Json<TopicRequest>, JsonRejection>,
) -> Result<Json<QuizResponse>, ApiError> {
    let topic = required(body(payload, "Topic required")?.topic, "Topic required")?;
    let quiz = state
        .assistant
        .generate_quiz(&topic)
        .await
        .map_err(|source| ApiError::Assistant { message: "Quiz generation failed", source })?;
    Ok(Json(QuizResponse { quiz }))
}

pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let messages = body(payload, "Messages array required")?
        .messages
        .ok_or(ApiError::BadRequest("Messages array required"))?;
    let reply = state
        .assistant
        .chat(messages)
        .await
        .map_err(|source| ApiError::Assistant { message: "Chat API failed", source })?;
    Ok(Json(ChatResponse { reply }))
}

pub async fn notes(
    State(state): State<AppState>,
    payload: Result<Json<NotesRequest>, JsonRejection>,
) -> Result<Json<NotesResponse>, ApiError> {
    let text = required(body(payload, "Text required")?.text, "Text required")?;
    let notes = state
        .assistant
        .notes(&text)
        .await
        .map_err(|source| ApiError::Assistant { message: "Notes generation failed", source })?;
    Ok(Json(NotesResponse { notes }))
}

pub async fn execute(
    State(state): State<AppState>,
    payload: Result<Json<ExecuteBody>, JsonRejection>,
) -> Result<Json<ExecutionResult>, ApiError> {
    let request = body(payload, "Language and code required")?;
    let language = required(request.language, "Language and code required")?;
    let code = request
        .code
        .filter(|c| !c.trim().is_empty())
        .ok_or(ApiError::BadRequest("Language and code required"))?;
    let version = request
        .version
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| ANY_VERSION.to_string());

    let result = state
        .executor
        .execute(ExecuteRequest { language, version, code })
        .await
        .map_err(|source| ApiError::Execution { message: "Code execution engine failed.", source })?;
    Ok(Json(result))
}

pub async fn dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    Json(DashboardResponse {
        user: state.fixtures.user.clone(),
        stats: state.fixtures.dashboard.clone(),
    })
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let request = body(payload, "Email and password required")?;
    let email = required(request.email, "Email and password required")?;
    let password = request.password.ok_or(ApiError::BadRequest("Email and password required"))?;

    if !state.fixtures.check_login(&email, &password) {
        info!(target: "techmate::server", "Rejected login attempt");
        return Err(ApiError::Unauthorized("Invalid email or password"));
    }

    Ok(Json(LoginResponse {
        success: true,
        token: state.fixtures.credentials.token.clone(),
        user: state.fixtures.user.clone(),
    }))
}
