/// Database models for Userdesk
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts, lifecycle operations, and listing queries
/// - `role`: Roles, permissions, and the user/role join table
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
///     &["Super Admin".to_string()],
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```

pub mod role;
pub mod user;
