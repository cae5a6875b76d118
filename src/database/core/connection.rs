//! Database connection management
//!
//! This module provides the connection wrapper used by the initializer,
//! the validator and the status report.

use anyhow::{anyhow, Result};
use rusqlite::{Connection, OpenFlags};
use std::collections::BTreeSet;

/// Core database connection wrapper
///
/// `DatabaseConn` wraps a SQLite connection and applies the per-connection
/// settings every devdb connection needs. Foreign key enforcement is scoped
/// to a connection in SQLite, so it is switched on for every handle opened
/// here, including read-only ones.
pub struct DatabaseConn {
    pub conn: Connection,
}

impl DatabaseConn {
    /// Open a database at the specified path
    ///
    /// If the path is `None`, an in-memory database is created.
    /// The file is created if it does not exist yet.
    pub fn open(path: Option<&str>) -> Result<Self> {
        let conn = match path {
            Some(p) => Connection::open(p)
                .map_err(|e| anyhow!("Failed to open database at '{}': {}", p, e))?,
            None => Connection::open_in_memory()
                .map_err(|e| anyhow!("Failed to create in-memory database: {}", e))?,
        };

        let db = DatabaseConn { conn };
        db.configure()?;
        Ok(db)
    }

    /// Open a database at the specified path (convenience method)
    pub fn open_path(path: &str) -> Result<Self> {
        Self::open(Some(path))
    }

    /// Create an in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::open(None)
    }

    /// Open an existing database file without write access
    ///
    /// Never creates the file. Journal settings are left untouched since
    /// they need write access; only foreign key enforcement is enabled.
    pub fn open_read_only(path: &str) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| anyhow!("Failed to open database at '{}' read-only: {}", path, e))?;

        conn.execute("PRAGMA foreign_keys=ON", [])
            .map_err(|e| anyhow!("Failed to enable foreign keys: {}", e))?;

        Ok(DatabaseConn { conn })
    }

    /// Apply integrity and durability settings
    ///
    /// Must run before any DDL: `foreign_keys` is a no-op inside a transaction
    /// and `journal_mode` cannot change while one is open.
    fn configure(&self) -> Result<()> {
        self.conn
            .execute("PRAGMA foreign_keys=ON", [])
            .map_err(|e| anyhow!("Failed to enable foreign keys: {}", e))?;

        // in-memory databases report "memory" here, which is fine
        let _: String = self
            .conn
            .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
            .map_err(|e| anyhow!("Failed to set journal mode: {}", e))?;

        self.conn
            .execute("PRAGMA synchronous=NORMAL", [])
            .map_err(|e| anyhow!("Failed to set synchronous mode: {}", e))?;

        Ok(())
    }

    /// Execute a SQL statement
    pub fn execute(&self, sql: &str) -> Result<usize> {
        self.conn
            .execute(sql, [])
            .map_err(|e| anyhow!("Failed to execute SQL: {}", e))
    }

    /// Begin an unchecked transaction
    ///
    /// Dropping the transaction without committing rolls it back.
    pub fn transaction(&self) -> Result<rusqlite::Transaction<'_>> {
        self.conn
            .unchecked_transaction()
            .map_err(|e| anyhow!("Failed to begin transaction: {}", e))
    }

    /// Check if a table exists in the database
    pub fn table_exists(&self, table_name: &str) -> Result<bool> {
        let count: i32 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [table_name],
                |row| row.get(0),
            )
            .map_err(|e| anyhow!("Failed to check table existence: {}", e))?;
        Ok(count > 0)
    }

    /// Get the row count for a table
    pub fn table_count(&self, table_name: &str) -> Result<u64> {
        let query = format!("SELECT COUNT(*) FROM \"{}\"", table_name);
        let count: u64 = self
            .conn
            .query_row(&query, [], |row| row.get(0))
            .map_err(|e| anyhow!("Failed to get row count for '{}': {}", table_name, e))?;
        Ok(count)
    }

    /// Names of all user tables, excluding SQLite's internal `sqlite_*` tables
    pub fn list_tables(&self) -> Result<BTreeSet<String>> {
        self.names_of("table")
    }

    /// Names of all explicitly created indexes
    pub fn list_indexes(&self) -> Result<BTreeSet<String>> {
        self.names_of("index")
    }

    fn names_of(&self, kind: &str) -> Result<BTreeSet<String>> {
        schema_object_names(&self.conn, kind)
    }

    /// Close the connection, surfacing any error SQLite reports on close
    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| anyhow!("Failed to close database: {}", e))
    }
}

/// Names of `sqlite_master` entries of one `kind` (`table`, `index`, ...),
/// excluding SQLite's internal `sqlite_*` objects
pub(crate) fn schema_object_names(conn: &Connection, kind: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type=?1 AND name NOT LIKE 'sqlite_%'")
        .map_err(|e| anyhow!("Failed to prepare {} listing: {}", kind, e))?;

    let names = stmt
        .query_map([kind], |row| row.get::<_, String>(0))
        .map_err(|e| anyhow!("Failed to list {} names: {}", kind, e))?
        .collect::<rusqlite::Result<BTreeSet<String>>>()
        .map_err(|e| anyhow!("Failed to read {} name: {}", kind, e))?;

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = DatabaseConn::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = DatabaseConn::open_in_memory().unwrap();
        let enabled: i64 = db
            .conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_file_pragmas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pragmas.db");
        let db = DatabaseConn::open_path(path.to_str().unwrap()).unwrap();

        let mode: String = db
            .conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");

        // NORMAL == 1
        let sync: i64 = db
            .conn
            .query_row("PRAGMA synchronous", [], |row| row.get(0))
            .unwrap();
        assert_eq!(sync, 1);
    }

    #[test]
    fn test_table_exists() {
        let db = DatabaseConn::open_in_memory().unwrap();
        db.execute("CREATE TABLE test_table (id INTEGER PRIMARY KEY)")
            .unwrap();

        assert!(db.table_exists("test_table").unwrap());
        assert!(!db.table_exists("nonexistent_table").unwrap());
    }

    #[test]
    fn test_table_count() {
        let db = DatabaseConn::open_in_memory().unwrap();
        db.execute("CREATE TABLE test_table (id INTEGER PRIMARY KEY)")
            .unwrap();
        db.execute("INSERT INTO test_table (id) VALUES (1), (2), (3)")
            .unwrap();

        assert_eq!(db.table_count("test_table").unwrap(), 3);
    }

    #[test]
    fn test_list_tables_skips_internal() {
        let db = DatabaseConn::open_in_memory().unwrap();
        // AUTOINCREMENT creates sqlite_sequence behind the scenes
        db.execute("CREATE TABLE a (id INTEGER PRIMARY KEY AUTOINCREMENT)")
            .unwrap();
        db.execute("CREATE INDEX idx_a_id ON a(id)").unwrap();

        let tables = db.list_tables().unwrap();
        assert_eq!(tables.into_iter().collect::<Vec<_>>(), vec!["a"]);

        let indexes = db.list_indexes().unwrap();
        assert!(indexes.contains("idx_a_id"));
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ro.db");
        let path = path.to_str().unwrap();
        DatabaseConn::open_path(path)
            .unwrap()
            .execute("CREATE TABLE t (id INTEGER)")
            .unwrap();

        let ro = DatabaseConn::open_read_only(path).unwrap();
        assert!(ro.table_exists("t").unwrap());
        assert!(ro.execute("INSERT INTO t (id) VALUES (1)").is_err());
    }

    #[test]
    fn test_read_only_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");
        assert!(DatabaseConn::open_read_only(path.to_str().unwrap()).is_err());
        assert!(!path.exists());
    }
}
