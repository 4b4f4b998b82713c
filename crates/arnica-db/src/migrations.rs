//! # Database Migrations
//!
//! Schema migrations, embedded at compile time and applied on startup.
//!
//! The SQL lives in `migrations/sqlite/` at the workspace root; the
//! `sqlx::migrate!` macro bakes every file into the binary, so a deployed
//! API needs no migration files on disk. sqlx tracks what has been applied
//! in its `_sqlx_migrations` table and runs each pending file inside a
//! transaction, in filename order.
//!
//! ## Adding a Migration
//!
//! Create `migrations/sqlite/NNN_description.sql` with the next sequence
//! number. Applied migrations are checksummed; editing one after it has
//! shipped will fail the startup check, so fixes always go in a new file.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies all pending migrations. Idempotent; called on every startup.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Migration counts as (embedded, applied), for diagnostics.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}
