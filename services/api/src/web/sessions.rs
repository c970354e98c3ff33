//! services/api/src/web/sessions.rs
//!
//! Handlers for saving, listing, loading and deleting a user's study sessions.
//! Every route is scoped by `user_id`; one user's collection is invisible to
//! every other user.

use crate::error::port_error_response;
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use std::sync::Arc;
use study_assistant_core::domain::{NewStudySession, StudySession};
use tracing::info;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateSessionResponse {
    pub id: String,
}

/// List the user's saved sessions, newest first.
#[utoipa::path(
    get,
    path = "/users/{user_id}/sessions",
    params(("user_id" = String, Path, description = "The user's id.")),
    responses(
        (status = 200, description = "Saved sessions, newest first"),
        (status = 500, description = "The session store could not be read")
    )
)]
pub async fn list_sessions_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<StudySession>>, (StatusCode, String)> {
    let sessions = app_state
        .sessions
        .for_user(&user_id)
        .list()
        .await
        .map_err(|e| port_error_response(e, "Could not load sessions."))?;
    Ok(Json(sessions))
}

/// Save the current study material as a named session.
#[utoipa::path(
    post,
    path = "/users/{user_id}/sessions",
    params(("user_id" = String, Path, description = "The user's id.")),
    request_body(content_type = "application/json", description = "name, sourceText, summary, quiz and chatHistory"),
    responses(
        (status = 201, description = "Session saved", body = CreateSessionResponse),
        (status = 400, description = "Empty session name"),
        (status = 500, description = "The stored sessions are unreadable"),
        (status = 507, description = "Storage is full")
    )
)]
pub async fn create_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(draft): Json<NewStudySession>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), (StatusCode, String)> {
    if draft.name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Please enter a name for the session.".to_string(),
        ));
    }

    let id = app_state
        .sessions
        .for_user(&user_id)
        .save(draft)
        .await
        .map_err(|e| port_error_response(e, "Could not save the session."))?;

    info!(user_id = %user_id, session_id = %id, "Study session saved");
    Ok((StatusCode::CREATED, Json(CreateSessionResponse { id })))
}

/// Load one of the user's saved sessions.
#[utoipa::path(
    get,
    path = "/users/{user_id}/sessions/{id}",
    params(
        ("user_id" = String, Path, description = "The user's id."),
        ("id" = String, Path, description = "The session id.")
    ),
    responses(
        (status = 200, description = "The session"),
        (status = 404, description = "No session with that id")
    )
)]
pub async fn get_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path((user_id, id)): Path<(String, String)>,
) -> Result<Json<StudySession>, (StatusCode, String)> {
    app_state
        .sessions
        .for_user(&user_id)
        .load(&id)
        .await
        .map_err(|e| port_error_response(e, "Could not load the session."))?
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Session {} not found", id)))
}

/// Delete one of the user's saved sessions. Deleting an unknown id succeeds.
#[utoipa::path(
    delete,
    path = "/users/{user_id}/sessions/{id}",
    params(
        ("user_id" = String, Path, description = "The user's id."),
        ("id" = String, Path, description = "The session id.")
    ),
    responses(
        (status = 204, description = "Session deleted (or never existed)"),
        (status = 500, description = "The session store could not be written")
    )
)]
pub async fn delete_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path((user_id, id)): Path<(String, String)>,
) -> Result<StatusCode, (StatusCode, String)> {
    app_state
        .sessions
        .for_user(&user_id)
        .delete(&id)
        .await
        .map_err(|e| port_error_response(e, "Could not delete the session."))?;
    Ok(StatusCode::NO_CONTENT)
}
