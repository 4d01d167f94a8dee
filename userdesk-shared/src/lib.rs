//! # Userdesk Shared Library
//!
//! This crate contains the models, authorization logic, and utilities shared
//! between the Userdesk API server and its tooling.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `auth`: Password hashing, session tokens, and the authorization policy
//! - `db`: Connection pooling and migrations
//! - `listing`: Server-driven table projection for the user list

pub mod auth;
pub mod db;
pub mod listing;
pub mod models;

/// Current version of the Userdesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
