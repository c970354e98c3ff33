//! services/api/src/web/middleware.rs
//!
//! Authorization middleware for the admin dashboard routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use crate::web::state::AppState;

/// Middleware that only lets requests carrying the configured admin bearer token through.
///
/// When no admin token is configured every request is refused.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = state.config.admin_token.as_deref() else {
        warn!("Admin route requested but ADMIN_TOKEN is not configured");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    if !bearer_matches(authorization, expected) {
        warn!("Rejected admin request with a missing or wrong token");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(req).await)
}

/// True when `authorization` is `Bearer <expected>`.
fn bearer_matches(authorization: Option<&str>, expected: &str) -> bool {
    authorization
        .and_then(|value| value.trim().strip_prefix("Bearer "))
        .is_some_and(|token| token.trim() == expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_the_exact_bearer_token() {
        assert!(bearer_matches(Some("Bearer s3cret"), "s3cret"));
        assert!(bearer_matches(Some("  Bearer s3cret "), "s3cret"));
        assert!(!bearer_matches(Some("Bearer wrong"), "s3cret"));
        assert!(!bearer_matches(Some("s3cret"), "s3cret"));
        assert!(!bearer_matches(Some("Basic s3cret"), "s3cret"));
        assert!(!bearer_matches(None, "s3cret"));
    }
}
