//! SQLite connection pool and `memes` table bootstrap.

use anyhow::{Context, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::time::Duration;

/// The name of the table used for memes.
pub const MEMES_TABLE: &str = "memes";

pub type DbPool = Pool<SqliteConnectionManager>;

const CREATE_MEMES_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS memes (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        title       TEXT NOT NULL,
        image_url   TEXT NOT NULL,
        description TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS ix_memes_title ON memes (title);
";

/// Opens a pool for `database_url` (a file path, or `:memory:`) and makes sure
/// the `memes` table exists.
pub fn init_pool(database_url: &str) -> Result<DbPool> {
    if database_url == ":memory:" {
        return init_memory_pool();
    }

    let manager = SqliteConnectionManager::file(database_url)
        .with_init(|conn| conn.busy_timeout(Duration::from_secs(5)));

    let pool = Pool::builder()
        .max_size(8)
        .build(manager)
        .with_context(|| format!("Failed to create connection pool for '{}'", database_url))?;

    bootstrap(&pool)?;
    tracing::info!(database_url, "SQLite pool ready");
    Ok(pool)
}

/// In-memory pool for tests and throwaway runs.
///
/// Every SQLite in-memory connection is its own database, so the pool holds a
/// single connection that is never reaped.
pub fn init_memory_pool() -> Result<DbPool> {
    let manager = SqliteConnectionManager::memory();

    let pool = Pool::builder()
        .max_size(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .build(manager)
        .context("Failed to create in-memory pool")?;

    bootstrap(&pool)?;
    Ok(pool)
}

fn bootstrap(pool: &DbPool) -> Result<()> {
    let conn = pool
        .get()
        .context("Failed to get connection for table creation")?;
    create_memes_table(&conn)
}

/// Creates the memes table, if it does not already exist.
pub fn create_memes_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_MEMES_TABLE)
        .with_context(|| format!("Failed to create table '{}'", MEMES_TABLE))?;
    tracing::debug!("Table '{}' created or already existed.", MEMES_TABLE);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_pool_has_memes_table() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
                [MEMES_TABLE],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn table_creation_is_idempotent() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        create_memes_table(&conn).unwrap();
        create_memes_table(&conn).unwrap();
    }

    #[test]
    fn memory_url_selects_memory_pool() {
        let pool = init_pool(":memory:").unwrap();
        assert_eq!(pool.max_size(), 1);
    }
}
