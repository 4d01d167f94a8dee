/// Session status gate
///
/// Cross-cutting checkpoint applied to every authenticated route: the acting
/// user's current status is re-read from the store before any authorization
/// policy runs. A deactivated (or deleted) account is cut off on its next
/// request, no matter which component flipped the status:
///
/// - page navigations (requests accepting `text/html`) are redirected to the
///   login surface
/// - API and background requests get a structured 401 `{logout: true, ...}`
///   signal so clients drop their tokens
///
/// The companion poll endpoint (`GET /v1/auth/status`) reuses
/// [`StatusSignal`] but answers 200 in both outcomes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use userdesk_shared::auth::policy::Actor;
use userdesk_shared::models::user::User;

use crate::{app::AppState, error::ApiError};

/// Message shown to a deactivated user on logout
pub const DEACTIVATED_MESSAGE: &str = "Your account has been deactivated.";

/// Login surface page navigations are redirected to
pub const LOGIN_PATH: &str = "/login";

/// Structured status signal for clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSignal {
    /// Whether the client must terminate its session
    pub logout: bool,

    /// Human-readable explanation
    pub message: String,
}

/// Rejects requests from deactivated accounts
///
/// Must be layered after [`crate::middleware::auth::require_auth`] (it reads
/// the [`Actor`] extension) and before any handler, so a deactivated user
/// never reaches policy evaluation with a live session.
pub async fn enforce_active_status(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let actor = req
        .extensions()
        .get::<Actor>()
        .ok_or_else(|| ApiError::Unauthorized("Missing authentication context".to_string()))?;

    // A vanished account is treated the same as a deactivated one.
    let active = User::find_by_id(&state.db, actor.id)
        .await?
        .map(|user| user.status)
        .unwrap_or(false);

    if active {
        return Ok(next.run(req).await);
    }

    Ok(logout_response(req.headers()))
}

/// Builds the termination response for a deactivated session
fn logout_response(headers: &HeaderMap) -> Response {
    if wants_html(headers) {
        Redirect::to(LOGIN_PATH).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(StatusSignal {
                logout: true,
                message: DEACTIVATED_MESSAGE.to_string(),
            }),
        )
            .into_response()
    }
}

/// Whether the request is a page navigation rather than an API call
fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("text/html"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_wants_html_detects_navigation() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml"),
        );
        assert!(wants_html(&headers));
    }

    #[test]
    fn test_api_requests_are_not_navigations() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        assert!(!wants_html(&headers));

        assert!(!wants_html(&HeaderMap::new()));
    }

    #[test]
    fn test_logout_response_shape() {
        let signal = StatusSignal {
            logout: true,
            message: DEACTIVATED_MESSAGE.to_string(),
        };

        let json = serde_json::to_value(&signal).unwrap();
        assert_eq!(json["logout"], true);
        assert_eq!(json["message"], DEACTIVATED_MESSAGE);
    }
}
