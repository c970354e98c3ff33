//! services/api/src/web/routes.rs
//!
//! Assembles the axum router: public study and session routes, the admin
//! routes behind `require_admin`, CORS and the Swagger UI.

use crate::web::{
    admin::{clear_logs_handler, list_logs_handler, stats_handler},
    middleware::require_admin,
    preferences::{get_preferences_handler, update_preferences_handler},
    rest::{
        chat_handler, extract_text_handler, quiz_handler, start_chat_handler, summary_handler,
        ApiDoc,
    },
    sessions::{
        create_session_handler, delete_session_handler, get_session_handler,
        list_sessions_handler,
    },
    state::AppState,
};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Uploads larger than this are rejected before they reach a handler.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(app_state: Arc<AppState>) -> Router {
    // Public routes
    let study_routes = Router::new()
        .route("/extract", post(extract_text_handler))
        .route("/summary", post(summary_handler))
        .route("/quiz", post(quiz_handler))
        .route("/chat", post(chat_handler))
        .route("/chat/start", post(start_chat_handler))
        .route(
            "/users/{user_id}/sessions",
            get(list_sessions_handler).post(create_session_handler),
        )
        .route(
            "/users/{user_id}/sessions/{id}",
            get(get_session_handler).delete(delete_session_handler),
        )
        .route(
            "/preferences/{user_id}",
            get(get_preferences_handler).put(update_preferences_handler),
        );

    // Admin routes (token required)
    let admin_routes = Router::new()
        .route(
            "/admin/logs",
            get(list_logs_handler).delete(clear_logs_handler),
        )
        .route("/admin/stats", get(stats_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_admin,
        ));

    let api_router = Router::new()
        .merge(study_routes)
        .merge(admin_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors_layer(&app_state.config.cors_origin))
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    match origin.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            warn!("Ignoring invalid CORS_ORIGIN '{}': {}", origin, e);
            layer
        }
    }
}
