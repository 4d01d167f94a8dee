/// Database migration runner
///
/// Thin wrapper around sqlx's migration system. Migrations live in the
/// `migrations/` directory at the workspace root; each file is a plain SQL
/// "up" migration named `{timestamp}_{name}.sql`.
///
/// # Example
///
/// ```no_run
/// use userdesk_shared::db::migrations::run_migrations;
/// # async fn example(pool: sqlx::PgPool) -> anyhow::Result<()> {
/// run_migrations(&pool).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::postgres::PgPool;
use tracing::info;

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Number of migrations that have been applied
    pub applied_migrations: usize,

    /// Latest applied migration version (timestamp), if any
    pub latest_version: Option<i64>,
}

/// Runs all pending database migrations
///
/// Each migration runs inside a transaction where possible; a failing
/// migration is rolled back and reported as an error.
///
/// # Errors
///
/// Returns an error if a migration is malformed, fails to execute, or the
/// database connection is lost mid-run.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../migrations").run(pool).await?;
    info!("database migrations up to date");
    Ok(())
}

/// Reports how many migrations have been applied
///
/// Reads the `_sqlx_migrations` bookkeeping table; a database that has never
/// been migrated reports zero applied migrations.
pub async fn get_migration_status(pool: &PgPool) -> Result<MigrationStatus, sqlx::Error> {
    let rows: Vec<(i64,)> = sqlx::query_as(
        "SELECT version FROM _sqlx_migrations WHERE success ORDER BY version",
    )
    .fetch_all(pool)
    .await?;

    Ok(MigrationStatus {
        applied_migrations: rows.len(),
        latest_version: rows.last().map(|(v,)| *v),
    })
}
