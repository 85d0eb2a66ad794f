//! # Database Migrations
//!
//! The schema ships inside the binary: `sqlx::migrate!` embeds every file
//! under `migrations/sqlite/` at compile time and `Database::new` applies
//! whatever is pending before the pool is handed out.
//!
//! ```text
//! migrations/sqlite/
//! └── 001_initial_schema.sql   users, venues, events, discounts,
//!                              bookings, payments, tickets
//! ```
//!
//! New migrations get the next sequence number (`002_add_waitlist.sql`).
//! Applied files are checksummed in `_sqlx_migrations`; editing one after
//! release makes startup fail, so changes always go in a new file.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies pending migrations in filename order, each in its own
/// transaction. Safe to call on every startup.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Checking for pending migrations");
    MIGRATOR.run(pool).await?;
    info!("Schema is up to date");
    Ok(())
}

/// Returns `(embedded, applied)` migration counts for the health check.
///
/// A database that was never migrated reports zero applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let embedded = MIGRATOR.migrations.len();

    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    Ok((embedded, applied.max(0) as usize))
}
