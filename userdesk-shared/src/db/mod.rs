/// Database layer for Userdesk
///
/// This module provides database connection pooling and the migration runner.
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool management with a startup health check
/// - `migrations`: Database migration runner
///
/// Models live in the `models` module at the crate root.

pub mod migrations;
pub mod pool;
