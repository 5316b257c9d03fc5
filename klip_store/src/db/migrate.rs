//! Embedded schema migrations.

use anyhow::anyhow;
use diesel::{Connection, SqliteConnection, connection::SimpleConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use super::connection::sqlite_path;

/// Embedded Diesel migrations bundled with this crate.
///
/// These are applied by [`run_sqlite`] to bring the topo and report tables up to date.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Runs pending Diesel migrations on a SQLite database at the given path.
///
/// This sets the SQLite journal mode to WAL and applies all embedded migrations,
/// returning the number of migrations that ran.
pub fn run_sqlite(path: &str) -> anyhow::Result<usize> {
    let mut conn = SqliteConnection::establish(path)?;
    conn.batch_execute("PRAGMA journal_mode=WAL;")?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow!(e))?;

    Ok(applied.len())
}

/// Runs pending migrations for a `DATABASE_URL`.
///
/// Accepts bare paths as well as `sqlite:` / `sqlite://` URLs. Other schemes are rejected:
/// the store only speaks SQLite.
pub fn run_all(database_url: &str) -> anyhow::Result<usize> {
    if database_url.contains("://") && !database_url.starts_with("sqlite://") {
        anyhow::bail!("Unsupported DATABASE_URL: {database_url}");
    }
    run_sqlite(sqlite_path(database_url))
}
