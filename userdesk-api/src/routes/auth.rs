/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/login` - Exchange credentials for session tokens
/// - `POST /v1/auth/refresh` - Exchange a refresh token for a new access token
/// - `GET  /v1/auth/status` - Session status poll (200 in both outcomes)
///
/// There is no registration endpoint: accounts are created through the
/// user-management resource by actors holding `create-user`.

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use userdesk_shared::auth::policy::Actor;
use userdesk_shared::auth::{password, token};
use userdesk_shared::models::user::User;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::status_gate::{StatusSignal, DEACTIVATED_MESSAGE},
};

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// User ID
    pub user_id: String,

    /// Access token (24h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,
}

/// Login endpoint
///
/// Verifies credentials and issues session tokens. Deactivated accounts are
/// rejected with the logout message the status gate uses, so a user
/// deactivated while logged out cannot open a new session.
///
/// # Errors
///
/// - `401 Unauthorized`: wrong credentials or deactivated account
/// - `422 Unprocessable Entity`: validation failed
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    if !user.status {
        return Err(ApiError::Unauthorized(DEACTIVATED_MESSAGE.to_string()));
    }

    let access_claims = token::Claims::new(user.id, token::TokenType::Access);
    let refresh_claims = token::Claims::new(user.id, token::TokenType::Refresh);

    let access_token = token::create_token(&access_claims, state.token_secret())?;
    let refresh_token = token::create_token(&refresh_claims, state.token_secret())?;

    Ok(Json(LoginResponse {
        user_id: user.id.to_string(),
        access_token,
        refresh_token,
    }))
}

/// Token refresh endpoint
///
/// # Errors
///
/// - `401 Unauthorized`: invalid or expired refresh token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = token::refresh_access_token(&req.refresh_token, state.token_secret())?;

    Ok(Json(RefreshResponse { access_token }))
}

/// Session status poll
///
/// Answers `200 OK` in both outcomes so background polling clients can
/// branch on the body alone:
///
/// ```json
/// { "logout": true, "message": "User is inactive" }
/// ```
///
/// The route authenticates but deliberately skips the status gate: a
/// deactivated user must still receive the `logout: true` signal here.
pub async fn check_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<StatusSignal>> {
    let active = User::find_by_id(&state.db, actor.id)
        .await?
        .map(|user| user.status)
        .unwrap_or(false);

    let signal = if active {
        StatusSignal {
            logout: false,
            message: "User is active".to_string(),
        }
    } else {
        StatusSignal {
            logout: true,
            message: "User is inactive".to_string(),
        }
    };

    Ok(Json(signal))
}
