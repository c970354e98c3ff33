//! services/api/src/web/preferences.rs
//!
//! Handlers for per-user preferences (currently whether to show the user guide).

use crate::error::port_error_response;
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;
use study_assistant_core::domain::UserPreferences;

/// Get a user's preferences. Unknown users get the defaults.
#[utoipa::path(
    get,
    path = "/preferences/{user_id}",
    params(("user_id" = String, Path, description = "The user's id.")),
    responses((status = 200, description = "The user's preferences"))
)]
pub async fn get_preferences_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Json<UserPreferences> {
    Json(app_state.preferences.get(&user_id).await)
}

/// Replace a user's preferences.
#[utoipa::path(
    put,
    path = "/preferences/{user_id}",
    params(("user_id" = String, Path, description = "The user's id.")),
    request_body(content_type = "application/json", description = "{ \"showUserGuide\": bool }"),
    responses(
        (status = 204, description = "Preferences saved"),
        (status = 500, description = "Preferences could not be saved")
    )
)]
pub async fn update_preferences_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(prefs): Json<UserPreferences>,
) -> Result<StatusCode, (StatusCode, String)> {
    app_state
        .preferences
        .update(&user_id, prefs)
        .await
        .map_err(|e| {
            port_error_response(
                e,
                "Could not save your preference. The guide might appear again.",
            )
        })?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::test_support::test_state;

    #[tokio::test]
    async fn dismissing_the_guide_sticks() {
        let state = test_state(false);
        let Json(before) =
            get_preferences_handler(State(state.clone()), Path("u1".to_string())).await;
        assert!(before.show_user_guide);

        let status = update_preferences_handler(
            State(state.clone()),
            Path("u1".to_string()),
            Json(UserPreferences { show_user_guide: false }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let Json(after) = get_preferences_handler(State(state), Path("u1".to_string())).await;
        assert!(!after.show_user_guide);
    }
}
