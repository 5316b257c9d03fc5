//! SQLite connection helpers.
//!
//! Provides [`connect_sqlite`] that opens a connection and applies recommended PRAGMAs:
//! WAL journaling, foreign_keys=ON (the topo hierarchy relies on cascading FKs), and a
//! 5000ms busy_timeout. It also registers a `unicode_lower` SQL function, since SQLite's own
//! `lower()` and `LIKE` only fold ASCII.
//!
//! Example:
//! ```no_run
//! use klip_store::db::connection::connect_sqlite;
//!
//! let path = std::env::temp_dir().join("klip_example.db");
//! let _conn = connect_sqlite(path.to_str().unwrap()).expect("open sqlite");
//! ```

use anyhow::Context;
use diesel::sql_types::{Nullable, Text};
use diesel::{Connection, RunQueryDsl, SqliteConnection, define_sql_function, sql_query};

define_sql_function! {
    /// Full Unicode lowercase, registered on every connection by [`connect_sqlite`].
    fn unicode_lower(x: Nullable<Text>) -> Nullable<Text>;
}

/// Strip an optional `sqlite://` / `sqlite:` scheme so both URLs and bare paths work.
pub fn sqlite_path(database_url: &str) -> &str {
    database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url)
}

/// Open a SQLite connection and apply connection-wide PRAGMAs.
pub fn connect_sqlite(database_url: &str) -> anyhow::Result<SqliteConnection> {
    let path = sqlite_path(database_url);
    let mut conn = SqliteConnection::establish(path)
        .with_context(|| format!("open sqlite database {path}"))?;

    sql_query("PRAGMA journal_mode=WAL;").execute(&mut conn)?;
    sql_query("PRAGMA foreign_keys=ON;").execute(&mut conn)?;
    sql_query("PRAGMA busy_timeout=5000;").execute(&mut conn)?;
    unicode_lower_utils::register_impl(&mut conn, |s: Option<String>| {
        s.map(|s| s.to_lowercase())
    })?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::sqlite_path;

    #[test]
    fn scheme_is_optional() {
        assert_eq!(sqlite_path("sqlite://data/klip.db"), "data/klip.db");
        assert_eq!(sqlite_path("sqlite:klip.db"), "klip.db");
        assert_eq!(sqlite_path("/var/lib/klip.db"), "/var/lib/klip.db");
        assert_eq!(sqlite_path(":memory:"), ":memory:");
    }
}
