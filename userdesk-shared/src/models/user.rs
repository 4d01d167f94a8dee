/// User model, lifecycle operations, and listing queries
///
/// This module provides the `User` model plus the transactional lifecycle
/// operations of the admin panel: create-with-roles, update-with-role-sync,
/// delete-with-role-cleanup, and the status toggle. The multi-step operations
/// run inside a single transaction so a user is never persisted with a role
/// set different from the one requested, and no role links survive a deleted
/// user.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email CITEXT NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     status BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use userdesk_shared::models::user::{CreateUser, User};
///
/// # async fn example(pool: sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let user = User::create_with_roles(
///     &pool,
///     CreateUser {
///         name: "Jo Admin".to_string(),
///         email: "jo@example.com".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///     },
///     &["Editor".to_string()],
/// )
/// .await?;
/// println!("created {} with roles {:?}", user.email, user.roles);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::listing::{SortColumn, SortDir};
use crate::models::role::Role;

/// User model representing an admin-panel account
///
/// Passwords are stored as Argon2id hashes, never in plaintext. `status`
/// is the active flag: inactive users are logged out by the status gate on
/// their next request.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address (case-insensitive via CITEXT, unique)
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// Active (true) or inactive (false)
    pub status: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// A user joined with the names of their assigned roles
///
/// This is the shape the listing and the show/edit payloads work with. It
/// deliberately omits the password hash. An empty `roles` list is the
/// explicit "no role" state.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserWithRoles {
    /// Unique user ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address
    pub email: String,

    /// Active (true) or inactive (false)
    pub status: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,

    /// Names of assigned roles, ordered by name
    pub roles: Vec<String>,
}

impl UserWithRoles {
    /// Assembles the joined shape from a freshly written row and its roles
    pub fn from_parts(user: User, roles: Vec<String>) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
            roles,
        }
    }

    /// Whether the user holds the named role
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r == name)
    }
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Display name
    pub name: String,

    /// Email address
    pub email: String,

    /// Argon2id password hash (NOT a plaintext password)
    pub password_hash: String,
}

/// Input for updating an existing user
///
/// Only non-None fields are written. `password_hash: None` leaves the stored
/// hash untouched: an update without a new password never overwrites the
/// old one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    /// New display name
    pub name: Option<String>,

    /// New email address
    pub email: Option<String>,

    /// New password hash
    pub password_hash: Option<String>,
}

/// Error type for the transactional lifecycle operations
#[derive(Debug, thiserror::Error)]
pub enum UserStoreError {
    /// A requested role name does not exist in the role store
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// Storage-layer failure; the enclosing transaction was rolled back
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

const USER_COLUMNS: &str =
    "id, name, email, password_hash, status, created_at, updated_at";

/// SELECT list for the joined user+roles shape; requires GROUP BY u.id.
const USER_WITH_ROLES_SELECT: &str = r#"
    SELECT u.id, u.name, u.email, u.status, u.created_at, u.updated_at,
           COALESCE(
               ARRAY_AGG(r.name::text ORDER BY r.name)
                   FILTER (WHERE r.name IS NOT NULL),
               '{}'
           ) AS roles
    FROM users u
    LEFT JOIN user_roles ur ON ur.user_id = u.id
    LEFT JOIN roles r ON r.id = ur.role_id
"#;

/// Builds an ILIKE pattern matching rows that contain `term`
///
/// LIKE metacharacters in the term are escaped so a search for "100%" only
/// matches the literal text.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

impl User {
    /// Finds a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by email address (case-insensitive via CITEXT)
    pub async fn find_by_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user together with their role names
    pub async fn find_with_roles(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<UserWithRoles>, sqlx::Error> {
        sqlx::query_as::<_, UserWithRoles>(&format!(
            "{USER_WITH_ROLES_SELECT} WHERE u.id = $1 GROUP BY u.id"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Creates a user and assigns the requested roles, atomically
    ///
    /// The insert and the role assignment run in one transaction: if any
    /// requested role name is unknown, nothing is persisted and the caller
    /// gets [`UserStoreError::UnknownRole`] to surface as a validation
    /// failure.
    ///
    /// # Errors
    ///
    /// - [`UserStoreError::UnknownRole`] if a role name does not resolve
    /// - [`UserStoreError::Database`] on storage failure (including email
    ///   unique-constraint violations)
    pub async fn create_with_roles(
        pool: &PgPool,
        data: CreateUser,
        role_names: &[String],
    ) -> Result<UserWithRoles, UserStoreError> {
        let mut tx = pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .fetch_one(&mut *tx)
        .await?;

        let roles = resolve_roles(&mut tx, role_names).await?;
        Role::assign_to_user(&mut tx, user.id, &roles).await?;

        tx.commit().await?;

        let names = roles.into_iter().map(|r| r.name).collect();
        Ok(UserWithRoles::from_parts(user, names))
    }

    /// Updates a user's fields and replaces their role set, atomically
    ///
    /// Only non-None fields of `data` are written; the role set is fully
    /// synced to `role_names` (absent roles removed, new ones added). Returns
    /// `Ok(None)` if no user with `id` exists.
    pub async fn update_with_roles(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
        role_names: &[String],
    ) -> Result<Option<UserWithRoles>, UserStoreError> {
        let mut tx = pool.begin().await?;

        let Some(user) = update_fields(&mut tx, id, data).await? else {
            return Ok(None);
        };

        let roles = resolve_roles(&mut tx, role_names).await?;
        Role::replace_for_user(&mut tx, id, &roles).await?;

        tx.commit().await?;

        let names = roles.into_iter().map(|r| r.name).collect();
        Ok(Some(UserWithRoles::from_parts(user, names)))
    }

    /// Deletes a user, clearing their role links first, atomically
    ///
    /// Both steps commit together: no role links survive the removed user,
    /// and no user is removed while links still reference it.
    ///
    /// # Returns
    ///
    /// True if the user existed and was deleted
    pub async fn delete_with_roles(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        Role::clear_for_user(&mut tx, id).await?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    /// Sets a user's active status
    ///
    /// Returns the updated user, or `Ok(None)` if the id does not resolve.
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        status: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await
    }

    /// Counts all users
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
    }

    /// Counts users whose name or email contains `term` (case-insensitive)
    ///
    /// `None` counts everything, matching [`User::count`].
    pub async fn search_count(
        pool: &PgPool,
        term: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let pattern = like_pattern(term.unwrap_or(""));

        sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE name ILIKE $1 OR email ILIKE $1",
        )
        .bind(pattern)
        .fetch_one(pool)
        .await
    }

    /// Fetches one page of the user list, joined with role names
    ///
    /// The search term is matched case-insensitively against name and email.
    /// `sort`/`dir` come from a whitelisted enum, so the ORDER BY clause is
    /// never built from raw client input; `u.id DESC` is always appended as a
    /// tiebreaker so re-ordering never alters row identity.
    pub async fn list_page(
        pool: &PgPool,
        term: Option<&str>,
        sort: SortColumn,
        dir: SortDir,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserWithRoles>, sqlx::Error> {
        let pattern = like_pattern(term.unwrap_or(""));

        let query = format!(
            r#"
            {USER_WITH_ROLES_SELECT}
            WHERE u.name ILIKE $1 OR u.email ILIKE $1
            GROUP BY u.id
            ORDER BY {sort} {dir}, u.id DESC
            LIMIT $2 OFFSET $3
            "#,
            sort = sort.order_expr(),
            dir = dir.as_sql(),
        );

        sqlx::query_as::<_, UserWithRoles>(&query)
            .bind(pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}

/// Resolves role names against the role store, rejecting unknown names
async fn resolve_roles(
    tx: &mut PgConnection,
    role_names: &[String],
) -> Result<Vec<Role>, UserStoreError> {
    let roles = Role::find_by_names(tx, role_names).await?;

    if let Some(missing) = role_names
        .iter()
        .find(|name| !roles.iter().any(|r| &r.name == *name))
    {
        return Err(UserStoreError::UnknownRole(missing.clone()));
    }

    Ok(roles)
}

/// Writes the non-None fields of `data` as a single dynamic UPDATE
async fn update_fields(
    tx: &mut PgConnection,
    id: Uuid,
    data: UpdateUser,
) -> Result<Option<User>, sqlx::Error> {
    // Build the update statement from whichever fields are present.
    let mut query = String::from("UPDATE users SET updated_at = NOW()");
    let mut bind_count = 1;

    if data.name.is_some() {
        bind_count += 1;
        query.push_str(&format!(", name = ${}", bind_count));
    }
    if data.email.is_some() {
        bind_count += 1;
        query.push_str(&format!(", email = ${}", bind_count));
    }
    if data.password_hash.is_some() {
        bind_count += 1;
        query.push_str(&format!(", password_hash = ${}", bind_count));
    }

    query.push_str(&format!(
        " WHERE id = $1 RETURNING {USER_COLUMNS}"
    ));

    let mut q = sqlx::query_as::<_, User>(&query).bind(id);

    if let Some(name) = data.name {
        q = q.bind(name);
    }
    if let Some(email) = data.email {
        q = q.bind(email);
    }
    if let Some(password_hash) = data.password_hash {
        q = q.bind(password_hash);
    }

    q.fetch_optional(&mut *tx).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_wraps_term() {
        assert_eq!(like_pattern("jo"), "%jo%");
        assert_eq!(like_pattern(""), "%%");
    }

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("c:\\temp"), "%c:\\\\temp%");
    }

    #[test]
    fn test_update_user_default_is_noop() {
        let update = UpdateUser::default();
        assert!(update.name.is_none());
        assert!(update.email.is_none());
        assert!(update.password_hash.is_none());
    }

    #[test]
    fn test_user_with_roles_from_parts() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Jo".to_string(),
            email: "jo@example.com".to_string(),
            password_hash: "hash".to_string(),
            status: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let joined =
            UserWithRoles::from_parts(user.clone(), vec!["Editor".to_string()]);

        assert_eq!(joined.id, user.id);
        assert!(joined.has_role("Editor"));
        assert!(!joined.has_role("Super Admin"));
    }

    #[test]
    fn test_user_with_roles_omits_password_hash() {
        let joined = UserWithRoles {
            id: Uuid::new_v4(),
            name: "Jo".to_string(),
            email: "jo@example.com".to_string(),
            status: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            roles: vec![],
        };

        let json = serde_json::to_value(&joined).unwrap();
        assert!(json.get("password_hash").is_none());
    }

    // Lifecycle and listing behavior against a live database is covered by
    // the API crate's integration tests.
}
