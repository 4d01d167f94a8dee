/// Authentication and authorization for the admin panel
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength validation
/// - [`token`]: HS256 session token generation and validation
/// - [`policy`]: the authorization policy for user-management actions
///
/// Password verification and token validation both use constant-time
/// comparisons. Policy decisions are pure set lookups over a per-request
/// capability snapshot.

pub mod password;
pub mod policy;
pub mod token;
