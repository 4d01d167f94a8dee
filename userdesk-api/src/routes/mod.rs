/// API route handlers
///
/// Organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Login, token refresh, and the session status poll
/// - `users`: User management (listing, CRUD, status toggle)
/// - `roles`: Role names for the user forms

pub mod auth;
pub mod health;
pub mod roles;
pub mod users;
