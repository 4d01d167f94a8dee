/// User management endpoints
///
/// The resource surface of the admin panel:
///
/// - `GET    /v1/users` - Index page data (3 rows per page, newest first)
/// - `POST   /v1/users/table` - Server-driven table query
/// - `POST   /v1/users` - Create a user with an initial role set
/// - `GET    /v1/users/:id` - Show a user
/// - `GET    /v1/users/:id/edit` - Edit-form payload (user + role names)
/// - `PUT    /v1/users/:id` - Update a user, fully re-syncing roles
/// - `DELETE /v1/users/:id` - Delete a user and their role links
/// - `PATCH  /v1/users/:id/toggle-status` - Flip the active status
///
/// Every handler applies the authorization policy before touching the store:
/// the route-level permission gate first, then the Super Admin protections
/// for the specific target. Hard denials are 403 with a fixed message; the
/// Super Admin deactivation guard is a soft notice in a 200 body.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use userdesk_shared::auth::policy::{
    check_toggle, require_action, require_delete, require_edit, Actor, TargetUser, UserAction,
    SUPER_ADMIN_TOGGLE_NOTICE,
};
use userdesk_shared::auth::password;
use userdesk_shared::listing::{
    project_rows, StatusBadge, TablePage, TableQuery, SortColumn, SortDir, UserRow,
    INDEX_PAGE_SIZE,
};
use userdesk_shared::models::role::Role;
use userdesk_shared::models::user::{CreateUser, UpdateUser, User, UserWithRoles};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};

/// Create user request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    /// Display name
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    /// Email address (must be unique)
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (also checked for strength)
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Initial role set; may be empty
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Update user request
///
/// `password` is optional: a missing or empty value leaves the stored hash
/// untouched. `roles` is the complete new role set (full sync).
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    /// Display name
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// New password, if changing it
    #[serde(default)]
    pub password: Option<String>,

    /// The complete new role set
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Index page query
#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    /// 1-based page number
    #[serde(default)]
    pub page: Option<i64>,
}

/// Index page response
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    /// Projected rows for this page
    pub data: Vec<UserRow>,

    /// 1-based page number
    pub page: i64,

    /// Rows per page
    pub per_page: i64,

    /// Total user count
    pub total: i64,
}

/// Response carrying a user plus a flash-style message
#[derive(Debug, Serialize)]
pub struct UserMessageResponse {
    /// The affected user with their roles
    pub user: UserWithRoles,

    /// Flash message
    pub message: String,
}

/// Show response
#[derive(Debug, Serialize)]
pub struct ShowUserResponse {
    /// The requested user with their roles
    pub user: UserWithRoles,
}

/// Edit-form payload
#[derive(Debug, Serialize)]
pub struct EditUserResponse {
    /// The user being edited
    pub user: UserWithRoles,

    /// All assignable role names
    pub roles: Vec<String>,

    /// The user's current role names
    pub user_roles: Vec<String>,
}

/// Delete response
#[derive(Debug, Serialize)]
pub struct DeleteUserResponse {
    /// Flash message
    pub message: String,
}

/// Toggle-status response
///
/// `toggled: false` with a 200 status is the soft policy notice: the action
/// was blocked with guidance, distinct from a 404 (unknown target) and from
/// a hard 403.
#[derive(Debug, Serialize)]
pub struct ToggleStatusResponse {
    /// Whether the status actually flipped
    pub toggled: bool,

    /// The user's status after the call
    pub status: StatusBadge,

    /// Flash message or policy notice
    pub message: String,
}

/// Index page data, 3 rows per page, newest first
///
/// Visible to any actor holding at least one user-management permission.
pub async fn index(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<IndexQuery>,
) -> ApiResult<Json<IndexResponse>> {
    require_action(&actor, UserAction::List)?;

    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * INDEX_PAGE_SIZE;

    let total = User::count(&state.db).await?;
    let users = User::list_page(
        &state.db,
        None,
        SortColumn::Id,
        SortDir::Desc,
        INDEX_PAGE_SIZE,
        offset,
    )
    .await?;

    Ok(Json(IndexResponse {
        data: project_rows(&actor, &users, offset),
        page,
        per_page: INDEX_PAGE_SIZE,
        total,
    }))
}

/// Server-driven table endpoint
///
/// Accepts the table protocol's draw/search/order/pagination parameters and
/// answers with `draw`, `recordsTotal`, `recordsFiltered`, and the projected
/// rows. Page size is clamped server-side.
pub async fn table(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(query): Json<TableQuery>,
) -> ApiResult<Json<TablePage>> {
    require_action(&actor, UserAction::List)?;

    let term = query.search_term();
    let (sort, dir) = query.sort();

    let records_total = User::count(&state.db).await?;
    let records_filtered = if term.is_some() {
        User::search_count(&state.db, term).await?
    } else {
        records_total
    };

    let users = User::list_page(
        &state.db,
        term,
        sort,
        dir,
        query.page_size(),
        query.offset(),
    )
    .await?;

    Ok(Json(TablePage {
        draw: query.draw,
        records_total,
        records_filtered,
        data: project_rows(&actor, &users, query.offset()),
    }))
}

/// Creates a user and assigns the requested roles atomically
///
/// # Errors
///
/// - `403 Forbidden`: actor lacks `create-user`
/// - `409 Conflict`: email already exists
/// - `422 Unprocessable Entity`: validation failed or unknown role name
pub async fn store(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<Json<UserMessageResponse>> {
    require_action(&actor, UserAction::Create)?;
    req.validate()?;
    validate_password(&req.password)?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create_with_roles(
        &state.db,
        CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
        },
        &req.roles,
    )
    .await?;

    Ok(Json(UserMessageResponse {
        user,
        message: "New user is added successfully.".to_string(),
    }))
}

/// Shows a single user with their roles
pub async fn show(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ShowUserResponse>> {
    require_action(&actor, UserAction::List)?;

    let user = find_user(&state, id).await?;

    Ok(Json(ShowUserResponse { user }))
}

/// Edit-form payload: the user, all role names, and their current roles
///
/// Applies the Super Admin edit protection before returning anything, so a
/// non-Super-Admin cannot even open the form for a Super Admin.
pub async fn edit(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<EditUserResponse>> {
    require_action(&actor, UserAction::Edit)?;

    let user = find_user(&state, id).await?;
    require_edit(&actor, &TargetUser::of(&user))?;

    let roles = Role::names(&state.db).await?;

    Ok(Json(EditUserResponse {
        user_roles: user.roles.clone(),
        user,
        roles,
    }))
}

/// Updates a user and fully re-syncs their role set
///
/// An omitted or empty password leaves the stored hash untouched; a supplied
/// one is strength-checked and re-hashed. Field update and role sync commit
/// in one transaction.
pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserMessageResponse>> {
    require_action(&actor, UserAction::Edit)?;
    req.validate()?;

    let target = find_user(&state, id).await?;
    require_edit(&actor, &TargetUser::of(&target))?;

    let password_hash = match req.password.as_deref().filter(|p| !p.is_empty()) {
        Some(plaintext) => {
            validate_password(plaintext)?;
            Some(password::hash_password(plaintext)?)
        }
        None => None,
    };

    let user = User::update_with_roles(
        &state.db,
        id,
        UpdateUser {
            name: Some(req.name),
            email: Some(req.email),
            password_hash,
        },
        &req.roles,
    )
    .await?
    .ok_or_else(user_not_found)?;

    Ok(Json(UserMessageResponse {
        user,
        message: "User is updated successfully.".to_string(),
    }))
}

/// Deletes a user, clearing their role links first
///
/// Denied for Super Admin targets and for the actor's own account.
pub async fn destroy(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteUserResponse>> {
    require_action(&actor, UserAction::Delete)?;

    let target = find_user(&state, id).await?;
    require_delete(&actor, &TargetUser::of(&target))?;

    let deleted = User::delete_with_roles(&state.db, id).await?;
    if !deleted {
        return Err(user_not_found());
    }

    Ok(Json(DeleteUserResponse {
        message: "User is deleted successfully.".to_string(),
    }))
}

/// Flips a user's active status
///
/// No permission gate beyond authentication; the Super Admin deactivation
/// guard answers with a soft notice (200, `toggled: false`) instead of an
/// error, and reactivating an inactive Super Admin stays possible.
pub async fn toggle_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ToggleStatusResponse>> {
    let target = find_user(&state, id).await?;

    if check_toggle(&TargetUser::of(&target)).is_err() {
        return Ok(Json(ToggleStatusResponse {
            toggled: false,
            status: StatusBadge::from_active(target.status),
            message: SUPER_ADMIN_TOGGLE_NOTICE.to_string(),
        }));
    }

    let user = User::set_status(&state.db, id, !target.status)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(Json(ToggleStatusResponse {
        toggled: true,
        status: StatusBadge::from_active(user.status),
        message: "User status updated successfully.".to_string(),
    }))
}

/// Loads a target user or reports 404
async fn find_user(state: &AppState, id: Uuid) -> Result<UserWithRoles, ApiError> {
    User::find_with_roles(&state.db, id)
        .await?
        .ok_or_else(user_not_found)
}

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".to_string())
}

/// Maps a password strength failure to a field-level validation error
fn validate_password(plaintext: &str) -> Result<(), ApiError> {
    password::validate_password_strength(plaintext).map_err(|message| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message,
        }])
    })
}
