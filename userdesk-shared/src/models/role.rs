/// Role and permission models
///
/// Roles are named permission bundles ("Super Admin", "Editor", ...).
/// Permissions are atomic capability strings ("create-user", "edit-user",
/// "delete-user") granted to roles via `role_permissions` and never directly
/// to users; users acquire them through `user_roles`.
///
/// Role and permission administration happens in a separate admin surface;
/// this service only reads roles and (re)assigns them to users. The
/// assignment helpers therefore run on a caller-supplied connection so the
/// user lifecycle operations can keep them inside one transaction.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE roles (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE permissions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE role_permissions (
///     role_id UUID NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
///     permission_id UUID NOT NULL REFERENCES permissions(id) ON DELETE CASCADE,
///     PRIMARY KEY (role_id, permission_id)
/// );
///
/// CREATE TABLE user_roles (
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role_id UUID NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (user_id, role_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// A named bundle of permissions assignable to users
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    /// Unique role ID
    pub id: Uuid,

    /// Human-readable role name (unique, e.g. "Super Admin")
    pub name: String,

    /// When the role was created
    pub created_at: DateTime<Utc>,
}

/// An atomic capability string gating an action family
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Permission {
    /// Unique permission ID
    pub id: Uuid,

    /// Capability name (unique, e.g. "edit-user")
    pub name: String,

    /// When the permission was created
    pub created_at: DateTime<Utc>,
}

impl Role {
    /// Lists all roles, ordered by name
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            "SELECT id, name, created_at FROM roles ORDER BY name",
        )
        .fetch_all(pool)
        .await
    }

    /// Lists all role names, ordered by name
    ///
    /// Used to populate the create/edit form payloads.
    pub async fn names(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT name::text FROM roles ORDER BY name")
            .fetch_all(pool)
            .await
    }

    /// Resolves roles by name
    ///
    /// Returns the roles whose names appear in `names`; callers compare the
    /// result against the requested set to detect unknown role names. Runs on
    /// a plain connection so it can participate in a transaction.
    pub async fn find_by_names(
        conn: &mut PgConnection,
        names: &[String],
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            r#"
            SELECT id, name, created_at
            FROM roles
            WHERE name = ANY($1::text[])
            ORDER BY name
            "#,
        )
        .bind(names)
        .fetch_all(conn)
        .await
    }

    /// Assigns roles to a user (additive)
    ///
    /// Already-present assignments are left untouched.
    pub async fn assign_to_user(
        conn: &mut PgConnection,
        user_id: Uuid,
        roles: &[Role],
    ) -> Result<(), sqlx::Error> {
        if roles.is_empty() {
            return Ok(());
        }

        let role_ids: Vec<Uuid> = roles.iter().map(|r| r.id).collect();

        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            SELECT $1, role_id FROM UNNEST($2::uuid[]) AS t(role_id)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(&role_ids)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Replaces a user's role set (full sync)
    ///
    /// Roles absent from `roles` are removed, new ones added; the result is
    /// exactly `roles`. Callers must wrap this in a transaction together with
    /// whatever user mutation it accompanies.
    pub async fn replace_for_user(
        conn: &mut PgConnection,
        user_id: Uuid,
        roles: &[Role],
    ) -> Result<(), sqlx::Error> {
        Self::clear_for_user(conn, user_id).await?;
        Self::assign_to_user(conn, user_id, roles).await
    }

    /// Removes every role assignment for a user
    pub async fn clear_for_user(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .execute(conn)
            .await?;

        Ok(())
    }

    /// Role names held by a user, ordered by name
    pub async fn names_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT r.name::text
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}

impl Permission {
    /// Permission names a user holds through their roles, deduplicated
    pub async fn names_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT DISTINCT p.name::text
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            JOIN user_roles ur ON ur.role_id = rp.role_id
            WHERE ur.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
