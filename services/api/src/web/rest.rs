//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the study endpoints (extract, summary, quiz,
//! chat) and the master definition for the OpenAPI specification.

use crate::error::port_error_response;
use crate::web::state::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_assistant_core::domain::{ChatMessage, QuizQuestion};
use tracing::info;
use utoipa::{OpenApi, ToSchema};

/// The model's opening line when a chat starts with no history.
pub const CHAT_GREETING: &str =
    "Hi there! I'm your study buddy. Ask me anything about the content you provided.";

const MISSING_CONTENT: &str = "Please provide some content first.";

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        extract_text_handler,
        summary_handler,
        quiz_handler,
        chat_handler,
        start_chat_handler,
        crate::web::sessions::list_sessions_handler,
        crate::web::sessions::create_session_handler,
        crate::web::sessions::get_session_handler,
        crate::web::sessions::delete_session_handler,
        crate::web::preferences::get_preferences_handler,
        crate::web::preferences::update_preferences_handler,
        crate::web::admin::list_logs_handler,
        crate::web::admin::stats_handler,
        crate::web::admin::clear_logs_handler,
    ),
    components(
        schemas(
            ExtractTextResponse,
            TextRequest,
            SummaryResponse,
            QuizResponse,
            ChatRequest,
            ChatResponse,
            StartChatRequest,
            StartChatResponse,
            crate::web::sessions::CreateSessionResponse,
            crate::web::admin::LogsResponse,
            crate::web::admin::StatsResponse,
        )
    ),
    tags(
        (name = "Study Assistant API", description = "Summaries, quizzes, chat and saved study sessions.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct ExtractTextResponse {
    pub text: String,
}

/// The study material an action works on.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuizResponse {
    #[schema(value_type = Vec<Object>)]
    pub quiz: Vec<QuizQuestion>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    /// The conversation so far, without the new message.
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub history: Vec<ChatMessage>,
    pub message: String,
    /// The study material the chat is about.
    pub context: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    pub reply: String,
    /// The request history plus the new message and the reply.
    #[schema(value_type = Vec<Object>)]
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StartChatRequest {
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub history: Vec<ChatMessage>,
    pub context: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StartChatResponse {
    #[schema(value_type = Vec<Object>)]
    pub history: Vec<ChatMessage>,
}

fn require_content(text: &str) -> Result<(), (StatusCode, String)> {
    if text.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, MISSING_CONTENT.to_string()));
    }
    Ok(())
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Extract the text of an uploaded file.
///
/// Accepts a multipart/form-data request with a single file part.
#[utoipa::path(
    post,
    path = "/extract",
    request_body(content_type = "multipart/form-data", description = "The file to read."),
    responses(
        (status = 200, description = "Text extracted", body = ExtractTextResponse),
        (status = 400, description = "Missing or unsupported file"),
        (status = 500, description = "The AI service failed")
    )
)]
pub async fn extract_text_handler(
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ExtractTextResponse>, (StatusCode, String)> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Failed to read multipart data: {}", e),
            )
        })?
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                "Multipart form must include a file".to_string(),
            )
        })?;

    let mime_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let data = field.bytes().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read file bytes: {}", e),
        )
    })?;

    info!("Extracting text from '{}' ({}, {} bytes)", file_name, mime_type, data.len());
    let text = app_state
        .study_ai
        .extract_text(&data, &mime_type)
        .await
        .map_err(|e| port_error_response(e, "Failed to process the file. Please try again."))?;

    Ok(Json(ExtractTextResponse { text }))
}

/// Summarize the study material.
#[utoipa::path(
    post,
    path = "/summary",
    request_body = TextRequest,
    responses(
        (status = 200, description = "Summary generated", body = SummaryResponse),
        (status = 400, description = "No content supplied"),
        (status = 500, description = "The AI service failed")
    )
)]
pub async fn summary_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<TextRequest>,
) -> Result<Json<SummaryResponse>, (StatusCode, String)> {
    require_content(&req.text)?;
    let summary = app_state
        .study_ai
        .generate_summary(&req.text)
        .await
        .map_err(|e| port_error_response(e, "Failed to generate a summary. Please try again."))?;
    Ok(Json(SummaryResponse { summary }))
}

/// Generate a multiple-choice quiz over the study material.
#[utoipa::path(
    post,
    path = "/quiz",
    request_body = TextRequest,
    responses(
        (status = 200, description = "Quiz generated", body = QuizResponse),
        (status = 400, description = "No content supplied"),
        (status = 500, description = "The AI service failed")
    )
)]
pub async fn quiz_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<TextRequest>,
) -> Result<Json<QuizResponse>, (StatusCode, String)> {
    require_content(&req.text)?;
    let quiz = app_state
        .study_ai
        .generate_quiz(&req.text)
        .await
        .map_err(|e| port_error_response(e, "Failed to generate a quiz. Please try again."))?;
    Ok(Json(QuizResponse { quiz }))
}

/// Ask the study buddy a question about the material.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Reply generated", body = ChatResponse),
        (status = 400, description = "No content or empty message"),
        (status = 500, description = "The AI service failed")
    )
)]
pub async fn chat_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, String)> {
    require_content(&req.context)?;
    let message = req.message.trim();
    if message.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Please enter a message.".to_string()));
    }

    let reply = app_state
        .study_ai
        .chat(&req.history, message, &req.context)
        .await
        .map_err(|e| port_error_response(e, "Failed to get a response. Please try again."))?;

    let mut history = req.history;
    history.push(ChatMessage::user(message));
    history.push(ChatMessage::model(reply.clone()));
    Ok(Json(ChatResponse { reply, history }))
}

/// Open the chat, seeding an empty conversation with the greeting.
#[utoipa::path(
    post,
    path = "/chat/start",
    request_body = StartChatRequest,
    responses(
        (status = 200, description = "Chat ready", body = StartChatResponse),
        (status = 400, description = "No content supplied")
    )
)]
pub async fn start_chat_handler(
    Json(req): Json<StartChatRequest>,
) -> Result<Json<StartChatResponse>, (StatusCode, String)> {
    if req.context.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Please provide some content to chat about.".to_string(),
        ));
    }
    let history = if req.history.is_empty() {
        vec![ChatMessage::model(CHAT_GREETING)]
    } else {
        req.history
    };
    Ok(Json(StartChatResponse { history }))
}
