use axum::{
    Json,
    extract::{Request, State, rejection::JsonRejection},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::{Expiry, Session};

use super::validation::{parse_body, require};
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::constants::session::STATE_KEY;

// ============================================================================
// Session state
// ============================================================================

/// What the cookie session carries once the household password was accepted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionState {
    pub authenticated: bool,
    /// Milliseconds since the Unix epoch.
    pub login_time: i64,
}

impl SessionState {
    #[must_use]
    pub const fn logged_in_at(login_time: i64) -> Self {
        Self {
            authenticated: true,
            login_time,
        }
    }
}

/// A session is good for `max_age_hours` after login, never longer.
#[must_use]
pub const fn is_session_valid(state: &SessionState, now_ms: i64, max_age_hours: i64) -> bool {
    let max_age_ms = max_age_hours.saturating_mul(60 * 60 * 1000);
    state.authenticated && now_ms.saturating_sub(state.login_time) <= max_age_ms
}

async fn current_session(session: &Session, max_age_hours: i64) -> Option<SessionState> {
    let state = session.get::<SessionState>(STATE_KEY).await.ok().flatten()?;
    is_session_valid(&state, Utc::now().timestamp_millis(), max_age_hours).then_some(state)
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

// ============================================================================
// Middleware
// ============================================================================

/// Lets requests through only with a live session. Browsers are sent to the
/// login page, API clients get a 401.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    let max_age = state.config().auth.session_max_age_hours;
    if current_session(&session, max_age).await.is_some() {
        return next.run(request).await;
    }

    if wants_html(&headers) {
        Redirect::to(&state.config().server.login_path).into_response()
    } else {
        ApiError::Unauthorized("Not authenticated".to_string()).into_response()
    }
}

fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
/// Checks the shared password and starts a fresh session.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AuthStatusResponse>>, ApiError> {
    let payload = parse_body(payload)?;
    let password = require("password", payload.password.filter(|p| !p.is_empty()))?;

    if let Err(e) = state.auth_service().verify_password(&password).await {
        tracing::warn!("Rejected login attempt");
        metrics::counter!("auth_logins_total", "outcome" => "rejected").increment(1);
        return Err(e.into());
    }

    let max_age = state.config().auth.session_max_age_hours;
    let now = Utc::now();
    let session_state = SessionState::logged_in_at(now.timestamp_millis());

    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;
    session
        .insert(STATE_KEY, session_state)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;
    session.set_expiry(Some(Expiry::AtDateTime(
        time::OffsetDateTime::now_utc() + time::Duration::hours(max_age),
    )));

    tracing::info!("Household member logged in");
    metrics::counter!("auth_logins_total", "outcome" => "accepted").increment(1);

    Ok(Json(ApiResponse::success(AuthStatusResponse {
        authenticated: true,
        expires_at: Some(expires_at(&session_state, max_age)),
    })))
}

/// POST /auth/logout
pub async fn logout(session: Session) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    session
        .flush()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to end session: {e}")))?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Logged out",
    ))))
}

/// GET /auth/status
pub async fn status(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Json<ApiResponse<AuthStatusResponse>> {
    let max_age = state.config().auth.session_max_age_hours;
    let current = current_session(&session, max_age).await;

    Json(ApiResponse::success(AuthStatusResponse {
        authenticated: current.is_some(),
        expires_at: current.map(|s| expires_at(&s, max_age)),
    }))
}

const fn expires_at(state: &SessionState, max_age_hours: i64) -> i64 {
    state
        .login_time
        .saturating_add(max_age_hours.saturating_mul(60 * 60 * 1000))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR_MS: i64 = 60 * 60 * 1000;

    #[test]
    fn test_fresh_session_is_valid() {
        let state = SessionState::logged_in_at(1_000);
        assert!(is_session_valid(&state, 1_000 + HOUR_MS, 4));
        assert!(is_session_valid(&state, 1_000 + 4 * HOUR_MS, 4));
    }

    #[test]
    fn test_session_older_than_max_age_is_rejected() {
        let state = SessionState::logged_in_at(1_000);
        assert!(!is_session_valid(&state, 1_000 + 4 * HOUR_MS + 1, 4));
    }

    #[test]
    fn test_unauthenticated_state_is_rejected() {
        let state = SessionState {
            authenticated: false,
            login_time: 1_000,
        };
        assert!(!is_session_valid(&state, 1_000, 4));
    }

    #[test]
    fn test_wants_html() {
        let mut headers = HeaderMap::new();
        assert!(!wants_html(&headers));

        headers.insert(
            header::ACCEPT,
            "text/html,application/xhtml+xml".parse().unwrap(),
        );
        assert!(wants_html(&headers));

        headers.insert(header::ACCEPT, "application/json".parse().unwrap());
        assert!(!wants_html(&headers));
    }
}
