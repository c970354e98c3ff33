//! services/api/src/web/admin.rs
//!
//! The admin dashboard API: the raw call log, aggregated usage statistics and a
//! reset. All routes here sit behind `require_admin`.

use crate::web::state::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use study_assistant_core::{
    domain::LogEntry,
    monitor::{format_duration, LogSummary},
};
use tracing::info;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogsResponse {
    /// Newest first.
    #[schema(value_type = Vec<Object>)]
    pub entries: Vec<LogEntry>,
    pub refreshed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    #[schema(value_type = Object)]
    pub summary: LogSummary,
    /// `average_duration_ms` rendered for display, e.g. `1.25s`.
    pub average_duration: String,
    pub refreshed_at: DateTime<Utc>,
}

/// The call log, newest first.
#[utoipa::path(
    get,
    path = "/admin/logs",
    responses(
        (status = 200, description = "Every recorded AI call", body = LogsResponse),
        (status = 401, description = "Missing or wrong admin token")
    )
)]
pub async fn list_logs_handler(State(app_state): State<Arc<AppState>>) -> Json<LogsResponse> {
    Json(LogsResponse {
        entries: app_state.monitor.get_log(),
        refreshed_at: Utc::now(),
    })
}

/// Call counts and durations grouped by operation.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses(
        (status = 200, description = "Aggregated usage", body = StatsResponse),
        (status = 401, description = "Missing or wrong admin token")
    )
)]
pub async fn stats_handler(State(app_state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let summary = app_state.monitor.summary();
    Json(StatsResponse {
        average_duration: format_duration(summary.average_duration_ms),
        summary,
        refreshed_at: Utc::now(),
    })
}

/// Drop the whole call log.
#[utoipa::path(
    delete,
    path = "/admin/logs",
    responses(
        (status = 204, description = "Log cleared"),
        (status = 401, description = "Missing or wrong admin token")
    )
)]
pub async fn clear_logs_handler(State(app_state): State<Arc<AppState>>) -> StatusCode {
    let dropped = app_state.monitor.len();
    app_state.monitor.clear();
    info!(dropped, "Cleared the call log");
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::rest::{summary_handler, TextRequest};
    use crate::web::test_support::test_state;
    use study_assistant_core::domain::OperationName;

    async fn summarize(state: &Arc<AppState>) {
        let _ = summary_handler(
            State(state.clone()),
            Json(TextRequest { text: "Cells".to_string() }),
        )
        .await;
    }

    #[tokio::test]
    async fn logs_and_stats_reflect_calls_until_cleared() {
        let state = test_state(false);
        summarize(&state).await;
        summarize(&state).await;

        let Json(logs) = list_logs_handler(State(state.clone())).await;
        assert_eq!(logs.entries.len(), 2);

        let Json(stats) = stats_handler(State(state.clone())).await;
        assert_eq!(stats.summary.total_calls, 2);
        assert_eq!(stats.summary.operations[0].operation, OperationName::Summarize);
        assert!(stats.average_duration.ends_with("ms") || stats.average_duration.ends_with('s'));

        assert_eq!(clear_logs_handler(State(state.clone())).await, StatusCode::NO_CONTENT);
        let Json(logs) = list_logs_handler(State(state)).await;
        assert!(logs.entries.is_empty());
    }
}
