/// Bearer-token authentication middleware
///
/// Validates the `Authorization: Bearer <token>` header and loads the
/// requester's capability snapshot (roles + permissions) fresh from the
/// store, so downstream policy checks never see stale state. The snapshot is
/// injected into request extensions as an [`Actor`] for handlers to extract
/// with `Extension<Actor>`.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use userdesk_shared::auth::policy::Actor;
use userdesk_shared::auth::token::validate_access_token;

use crate::{app::AppState, error::ApiError};

/// Authenticates the request and attaches the actor snapshot
///
/// # Errors
///
/// - 401 if the Authorization header is missing, or the token is invalid,
///   expired, or not an access token
/// - 400 if the header is not a Bearer scheme
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::BadRequest("Expected Bearer token".to_string()))?;

    let claims = validate_access_token(token, state.token_secret())?;

    // Roles and permissions are re-read on every request; a concurrent role
    // change takes effect on the target's next request.
    let actor = Actor::load(&state.db, claims.sub).await?;
    req.extensions_mut().insert(actor);

    Ok(next.run(req).await)
}
