//! Versioned schema migrations for the syncmarks database.
//!
//! Applied versions are recorded in a `schema_version` table, so a
//! database opened by any release is upgraded exactly as far as it needs
//! to be and no further.

use rusqlite::Connection;

/// Latest schema version this build knows. Bump when adding a migration.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Highest version recorded in the database, 0 for a fresh file.
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .unwrap_or(0)
}

/// Brings the database up to [`CURRENT_SCHEMA_VERSION`].
///
/// Runs on every open; versions already recorded are skipped, so the call
/// is idempotent.
///
/// # Errors
/// Returns `rusqlite::Error` if any SQL statement fails.
pub fn run_all(conn: &Connection) -> Result<(), rusqlite::Error> {
    // WAL and foreign keys are connection settings, not versioned schema
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY,
             applied_at INTEGER NOT NULL,
             description TEXT NOT NULL
         );",
    )?;

    let current = get_schema_version(conn);

    if current < 1 {
        migration_v1(conn)?;
        record_version(conn, 1, "Initial schema: bookmarks and auth session")?;
    }

    Ok(())
}

fn record_version(conn: &Connection, version: i32, description: &str) -> Result<(), rusqlite::Error> {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
        rusqlite::params![version, now, description],
    )?;
    Ok(())
}

/// V1: bookmark rows plus the single-row session table.
///
/// `created_at` is milliseconds since the UNIX epoch; listing queries order by
/// it descending with `rowid` as the tie-breaker, so the owner/created index
/// covers the hot path.
fn migration_v1(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS bookmarks (
            id TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL,
            url TEXT NOT NULL,
            title TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_bookmarks_owner ON bookmarks(owner_id);
        CREATE INDEX IF NOT EXISTS idx_bookmarks_owner_created ON bookmarks(owner_id, created_at);

        CREATE TABLE IF NOT EXISTS auth_session (
            id TEXT PRIMARY KEY DEFAULT 'default',
            user_id TEXT NOT NULL,
            email TEXT,
            token_ciphertext BLOB NOT NULL,
            token_nonce BLOB NOT NULL,
            updated_at INTEGER NOT NULL
        );
        ",
    )
}
