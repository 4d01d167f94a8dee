/// Middleware modules for the API server
///
/// - `auth`: bearer-token authentication and per-request actor loading
/// - `status_gate`: terminates sessions of deactivated accounts
/// - `security`: OWASP security headers

pub mod auth;
pub mod security;
pub mod status_gate;
