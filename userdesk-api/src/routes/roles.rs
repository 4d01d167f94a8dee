/// Role listing endpoint
///
/// Supplies the role names the create/edit user forms offer. Role and
/// permission administration itself happens elsewhere; this surface is
/// read-only.
///
/// # Endpoints
///
/// - `GET /v1/roles` - List role names

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use userdesk_shared::auth::policy::{require_action, Actor, UserAction};
use userdesk_shared::models::role::Role;

use crate::{app::AppState, error::ApiResult};

/// Role list response
#[derive(Debug, Serialize, Deserialize)]
pub struct RolesResponse {
    /// All role names, ordered by name
    pub roles: Vec<String>,
}

/// Lists role names for the user forms
///
/// Gated like the user listing: any user-management permission grants access.
pub async fn list_roles(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<RolesResponse>> {
    require_action(&actor, UserAction::List)?;

    let roles = Role::names(&state.db).await?;

    Ok(Json(RolesResponse { roles }))
}
