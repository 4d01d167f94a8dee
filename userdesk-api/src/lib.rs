//! # Userdesk API Server
//!
//! HTTP API for the admin panel's user management: listing, creating,
//! editing, deleting, and toggling the active status of user accounts under
//! role-based permissions.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Authentication, session status gate, security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
