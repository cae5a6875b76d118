//! Database schema management
//!
//! This module holds the table and index definitions of the development
//! database and the manager that applies them. The schema mirrors the
//! production relational schema so application code can run against a local
//! SQLite file.

use anyhow::{anyhow, Result};
use rusqlite::Connection;
use std::collections::BTreeSet;
use tracing::debug;

use super::connection::schema_object_names;

/// Schema definitions for all tables in the development database
pub struct SchemaDefinitions;

impl SchemaDefinitions {
    /// SQL for creating the app info table (project metadata key/value pairs)
    pub const APP_INFO_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS app_info (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            key TEXT UNIQUE NOT NULL,
            value TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        );
    "#;

    pub const USERS_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            username TEXT UNIQUE,
            password_hash TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            is_admin INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        );
    "#;

    /// Credentials owned by users; `data_encrypted` is an opaque ciphertext blob
    pub const CREDENTIALS_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS credentials (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            data_encrypted BLOB NOT NULL,
            iv BLOB,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        );
    "#;

    /// One share record per grantee per credential
    pub const SHARES_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS shares (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            credential_id INTEGER NOT NULL,
            shared_with_user_id INTEGER NOT NULL,
            permission TEXT NOT NULL DEFAULT 'read',
            expires_at TIMESTAMP,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (credential_id) REFERENCES credentials(id) ON DELETE CASCADE,
            FOREIGN KEY (shared_with_user_id) REFERENCES users(id) ON DELETE CASCADE,
            UNIQUE (credential_id, shared_with_user_id)
        );
    "#;

    pub const EKYC_SESSIONS_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS ekyc_sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            provider TEXT,
            reference_id TEXT,
            result_json TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        );
    "#;

    /// Audit rows outlive the user they reference (`ON DELETE SET NULL`)
    pub const AUDIT_LOGS_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS audit_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER,
            action TEXT NOT NULL,
            resource_type TEXT,
            resource_id INTEGER,
            ip_address TEXT,
            user_agent TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE SET NULL
        );
    "#;

    /// Table statements in creation order (referenced tables come first)
    pub const TABLES: &'static [&'static str] = &[
        Self::APP_INFO_TABLE,
        Self::USERS_TABLE,
        Self::CREDENTIALS_TABLE,
        Self::SHARES_TABLE,
        Self::EKYC_SESSIONS_TABLE,
        Self::AUDIT_LOGS_TABLE,
    ];

    pub const INDEXES: &'static [&'static str] = &[
        "CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)",
        "CREATE INDEX IF NOT EXISTS idx_users_username ON users(username)",
        "CREATE INDEX IF NOT EXISTS idx_credentials_user_id ON credentials(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_shares_credential_id ON shares(credential_id)",
        "CREATE INDEX IF NOT EXISTS idx_shares_shared_with_user_id ON shares(shared_with_user_id)",
        "CREATE INDEX IF NOT EXISTS idx_ekyc_user_id ON ekyc_sessions(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_audit_user_id ON audit_logs(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_audit_created_at ON audit_logs(created_at)",
    ];

    /// Every table the initializer creates, in creation order
    pub const TABLE_NAMES: &'static [&'static str] = &[
        "app_info",
        "users",
        "credentials",
        "shares",
        "ekyc_sessions",
        "audit_logs",
    ];

    pub const INDEX_NAMES: &'static [&'static str] = &[
        "idx_users_email",
        "idx_users_username",
        "idx_credentials_user_id",
        "idx_shares_credential_id",
        "idx_shares_shared_with_user_id",
        "idx_ekyc_user_id",
        "idx_audit_user_id",
        "idx_audit_created_at",
    ];

    /// Tables downstream consumers rely on; checked by the validator
    pub const REQUIRED_TABLES: &'static [&'static str] = &[
        "users",
        "credentials",
        "shares",
        "ekyc_sessions",
        "audit_logs",
    ];

    pub fn required_tables() -> BTreeSet<String> {
        Self::REQUIRED_TABLES
            .iter()
            .map(|t| t.to_string())
            .collect()
    }
}

/// Values written into `app_info` on every initialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub project_name: String,
    pub version: String,
}

impl SeedInfo {
    pub fn new(project_name: &str, version: &str) -> Self {
        Self {
            project_name: project_name.to_string(),
            version: version.to_string(),
        }
    }
}

/// A single row of the `app_info` table
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AppInfoEntry {
    pub key: String,
    pub value: Option<String>,
    pub created_at: Option<String>,
}

/// Schema manager for the development database
///
/// Works on any connection, including an open transaction (which derefs to
/// `Connection`), so callers decide the transaction scope.
pub struct SchemaManager<'a> {
    conn: &'a Connection,
}

impl<'a> SchemaManager<'a> {
    /// Create a new schema manager for the given connection
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Initialize the database schema
    ///
    /// Creates all tables and then all indexes if they don't exist.
    /// Safe to run any number of times.
    pub fn initialize(&self) -> Result<()> {
        self.execute_statements(SchemaDefinitions::TABLES)
            .map_err(|e| anyhow!("Failed to create tables: {}", e))?;

        self.execute_statements(SchemaDefinitions::INDEXES)
            .map_err(|e| anyhow!("Failed to create indexes: {}", e))?;

        Ok(())
    }

    /// Run statements in order, skipping blank ones
    pub fn execute_statements(&self, statements: &[&str]) -> Result<()> {
        for stmt in statements {
            let sql = stmt.trim();
            if sql.is_empty() {
                continue;
            }
            debug!("executing: {}", first_line(sql));
            self.conn
                .execute(sql, [])
                .map_err(|e| anyhow!("'{}': {}", first_line(sql), e))?;
        }
        Ok(())
    }

    /// Upsert the project name and version rows
    pub fn seed(&self, seed: &SeedInfo) -> Result<()> {
        self.set_app_info("project_name", &seed.project_name)?;
        self.set_app_info("version", &seed.version)?;
        Ok(())
    }

    /// Check the current schema status
    pub fn check_status(&self) -> Result<SchemaStatus> {
        let existing = schema_object_names(self.conn, "table")?;

        let missing: Vec<String> = SchemaDefinitions::TABLE_NAMES
            .iter()
            .filter(|t| !existing.contains(**t))
            .map(|t| t.to_string())
            .collect();

        if missing.len() == SchemaDefinitions::TABLE_NAMES.len() {
            Ok(SchemaStatus::NotInitialized)
        } else if missing.is_empty() {
            Ok(SchemaStatus::Current)
        } else {
            Ok(SchemaStatus::Incomplete { missing })
        }
    }

    /// Set an app info value, replacing any existing row with the same key
    pub fn set_app_info(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO app_info (key, value) VALUES (?1, ?2)",
                [key, value],
            )
            .map_err(|e| anyhow!("Failed to set app_info '{}': {}", key, e))?;
        Ok(())
    }

    /// Get an app info value
    pub fn get_app_info(&self, key: &str) -> Result<Option<String>> {
        let result: Result<Option<String>, _> = self.conn.query_row(
            "SELECT value FROM app_info WHERE key = ?1",
            [key],
            |row| row.get(0),
        );

        match result {
            Ok(value) => Ok(value),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(anyhow!("Failed to get app_info '{}': {}", key, e)),
        }
    }

    /// All app info rows ordered by key
    pub fn app_info_entries(&self) -> Result<Vec<AppInfoEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value, created_at FROM app_info ORDER BY key")
            .map_err(|e| anyhow!("Failed to query app_info: {}", e))?;

        let entries = stmt
            .query_map([], |row| {
                Ok(AppInfoEntry {
                    key: row.get(0)?,
                    value: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })
            .map_err(|e| anyhow!("Failed to query app_info: {}", e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| anyhow!("Failed to read app_info row: {}", e))?;

        Ok(entries)
    }

    /// Reset the database by dropping all tables
    ///
    /// Referencing tables are dropped before the tables they reference.
    /// Indexes go with their tables.
    pub fn reset(&self) -> Result<()> {
        for table in SchemaDefinitions::TABLE_NAMES.iter().rev() {
            self.conn
                .execute(&format!("DROP TABLE IF EXISTS {}", table), [])
                .map_err(|e| anyhow!("Failed to drop table '{}': {}", table, e))?;
        }
        Ok(())
    }
}

fn first_line(sql: &str) -> &str {
    sql.lines().next().unwrap_or(sql).trim()
}

/// Status of the database schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaStatus {
    /// None of the schema tables exist (fresh database)
    NotInitialized,

    /// All schema tables exist
    Current,

    /// Some schema tables are missing
    Incomplete { missing: Vec<String> },
}

impl std::fmt::Display for SchemaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaStatus::NotInitialized => write!(f, "not initialized"),
            SchemaStatus::Current => write!(f, "current"),
            SchemaStatus::Incomplete { missing } => {
                write!(f, "incomplete (missing: {})", missing.join(", "))
            }
        }
    }
}
