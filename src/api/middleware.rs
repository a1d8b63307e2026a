//! API Middleware
//!
//! Session resolution and request logging.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::auth::Session;
use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the session token returned by login
pub const SESSION_HEADER: &str = "X-Session-Id";

/// The logged-in session, inserted into request extensions
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Arc<Session>);

impl CurrentSession {
    pub fn account_id(&self) -> &str {
        self.0.account_id()
    }
}

// =========================================================================
// Session Middleware
// =========================================================================

/// Resolve the `X-Session-Id` header to an open session. The session is
/// also attached to the response so the request log can name the account.
pub async fn session_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let raw = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::InvalidSession.into_response())?;

    let session_id = Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::InvalidSession.into_response())?;

    let session = state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| AppError::InvalidSession.into_response())?;

    request
        .extensions_mut()
        .insert(CurrentSession(session.clone()));

    let mut response = next.run(request).await;
    response.extensions_mut().insert(CurrentSession(session));
    Ok(response)
}

// =========================================================================
// mask_headers_for_logging
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["x-session-id", "authorization", "cookie", "set-cookie"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

// =========================================================================
// Request Logging Middleware
// =========================================================================

/// Request logging middleware. Session tokens never reach the log; the
/// account behind the session does.
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let version = request.version();

    let headers = mask_headers_for_logging(request.headers());

    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        version = ?version,
        request_id = ?request_id,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();
    let account_id = response
        .extensions()
        .get::<CurrentSession>()
        .map(|session| session.account_id().to_string());

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        request_id = ?request_id,
        account_id = ?account_id,
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn protected_app(state: AppState) -> Router {
        Router::new()
            .route("/whoami", get(|| async { "ok" }))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                session_middleware,
            ))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_session_is_attached_to_response() {
        let state = AppState::in_memory();
        let session = state.sessions.open("a1b2c3").await;

        let response = protected_app(state)
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header(SESSION_HEADER, session.id().to_string())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let current = response.extensions().get::<CurrentSession>().unwrap();
        assert_eq!(current.account_id(), "a1b2c3");
    }

    #[tokio::test]
    async fn test_unknown_session_rejected() {
        let state = AppState::in_memory();

        let response = protected_app(state)
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header(SESSION_HEADER, Uuid::new_v4().to_string())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.extensions().get::<CurrentSession>().is_none());
    }

    #[test]
    fn test_mask_headers_for_logging() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());
        headers.insert("x-session-id", Uuid::new_v4().to_string().parse().unwrap());
        headers.insert("x-request-id", "req-123".parse().unwrap());

        let masked = mask_headers_for_logging(&headers);

        let session = masked.iter().find(|(k, _)| k == "x-session-id");
        let content_type = masked.iter().find(|(k, _)| k == "content-type");
        let request_id = masked.iter().find(|(k, _)| k == "x-request-id");

        assert_eq!(session.unwrap().1, "[REDACTED]");
        assert_eq!(content_type.unwrap().1, "application/json");
        assert_eq!(request_id.unwrap().1, "req-123");
    }

    #[test]
    fn test_sensitive_headers_list() {
        assert!(SENSITIVE_HEADERS.contains(&"x-session-id"));
        assert!(SENSITIVE_HEADERS.contains(&"authorization"));
        assert!(!SENSITIVE_HEADERS.contains(&"content-type"));
    }
}
