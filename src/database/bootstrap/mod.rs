//! Development database bootstrap
//!
//! This module provisions the development database and its companion files:
//! - `initialize_database`: create or verify the schema and seed `app_info`
//! - `connection_files`: write the connection descriptors for other tooling
//! - `validator`: post-hoc check that the required tables exist

mod connection_files;
mod validator;

pub use connection_files::{
    read_env_file, ConnectionFiles, EmitReport, CONNECTION_INFO_FILE, ENV_FILE, VISUALIZER_DIR,
    VISUALIZER_ENV_FILE,
};
pub use validator::{validate_schema, ValidationReport};

use crate::database::core::{DatabaseConn, SchemaManager, SchemaStatus, SeedInfo};
use anyhow::{anyhow, Result};
use std::path::{Component, Path, PathBuf};
use tracing::info;

/// Default database file name, resolved against the working directory
pub const DEFAULT_DB_PATH: &str = "myapp.db";

/// Default `project_name` seed value
pub const DEFAULT_PROJECT_NAME: &str = "database_postgres";

/// Default `version` seed value
pub const DEFAULT_PROJECT_VERSION: &str = "0.2.0";

/// Result of a successful initialization
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct InitOutcome {
    /// Path as given by the caller
    pub db_path: String,
    /// Absolute location of the database file
    pub absolute_path: PathBuf,
    /// Whether the file did not exist before this run
    pub first_time: bool,
}

/// Create the database at `path` if needed and make sure the full schema exists
///
/// The path is made absolute and `.`/`..` components are resolved lexically
/// before anything is created. Missing parent directories are created. Tables, indexes and the two seed
/// rows are written in one transaction that is committed before the
/// connection is closed; on any error the transaction is rolled back and the
/// error is returned. With `reset`, all schema tables are dropped first
/// inside the same transaction.
pub fn initialize_database(path: &str, seed: &SeedInfo, reset: bool) -> Result<InitOutcome> {
    let absolute_path = std::path::absolute(path)
        .map(|p| normalize_path(&p))
        .map_err(|e| anyhow!("Failed to resolve database path '{}': {}", path, e))?;
    let open_path = absolute_path
        .to_str()
        .ok_or_else(|| anyhow!("Database path '{}' is not valid UTF-8", path))?;

    // decided before the connection creates the file
    let first_time = !absolute_path.exists();

    if let Some(parent) = absolute_path.parent() {
        ensure_data_dir(parent)?;
    }

    let db = DatabaseConn::open_path(open_path)?;
    {
        let tx = db.transaction()?;
        let schema = SchemaManager::new(&tx);

        if reset {
            info!("dropping existing schema tables");
            schema.reset()?;
        }

        match schema.check_status()? {
            SchemaStatus::Current => info!("schema present, verifying"),
            SchemaStatus::NotInitialized => info!("creating schema"),
            SchemaStatus::Incomplete { missing } => {
                info!("schema incomplete, creating: {}", missing.join(", "))
            }
        }

        schema.initialize()?;
        schema.seed(seed)?;

        tx.commit()
            .map_err(|e| anyhow!("Failed to commit schema initialization: {}", e))?;
    }
    db.close()?;

    info!(
        "database ready at {} ({})",
        absolute_path.display(),
        if first_time { "new" } else { "existing" }
    );

    Ok(InitOutcome {
        db_path: path.to_string(),
        absolute_path,
        first_time,
    })
}

/// Ensure a directory and its ancestors exist
pub fn ensure_data_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .map_err(|e| anyhow!("Failed to create directory '{}': {}", dir.display(), e))
}

/// Resolve `.` and `..` components of an absolute path without touching the filesystem
fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
