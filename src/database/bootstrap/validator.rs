//! Post-hoc schema validation
//!
//! Confirms that a database file carries the tables downstream consumers rely
//! on. The file is opened read-only and never created.

use anyhow::Result;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

use crate::database::core::{DatabaseConn, SchemaDefinitions};

/// Outcome of a schema validation
///
/// Storage errors are returned as `Err` from [`validate_schema`] instead.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ValidationReport {
    /// Every required table exists
    Valid { existing: BTreeSet<String> },

    /// At least one required table is absent
    MissingTables {
        missing: BTreeSet<String>,
        existing: BTreeSet<String>,
    },

    /// There is no database file at the path
    FileNotFound { path: String },
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationReport::Valid { .. })
    }

    /// Process exit status for this outcome
    pub fn exit_code(&self) -> i32 {
        if self.is_valid() {
            0
        } else {
            1
        }
    }

    pub fn message(&self) -> String {
        match self {
            ValidationReport::Valid { .. } => "All required tables are present.".to_string(),
            ValidationReport::MissingTables { missing, existing } => format!(
                "Missing tables: {}\nExisting tables: {}",
                join(missing),
                join(existing)
            ),
            ValidationReport::FileNotFound { path } => {
                format!("Database file '{}' not found", path)
            }
        }
    }
}

fn join(names: &BTreeSet<String>) -> String {
    names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Check that the database at `path` has every required table
///
/// Returns `Err` only when the storage engine fails while opening or
/// querying the file.
pub fn validate_schema(path: &str) -> Result<ValidationReport> {
    if !Path::new(path).exists() {
        return Ok(ValidationReport::FileNotFound {
            path: path.to_string(),
        });
    }

    let db = DatabaseConn::open_read_only(path)?;
    let existing = db.list_tables()?;
    db.close()?;

    debug!("tables in {}: {:?}", path, existing);

    let missing: BTreeSet<String> = SchemaDefinitions::required_tables()
        .difference(&existing)
        .cloned()
        .collect();

    if missing.is_empty() {
        Ok(ValidationReport::Valid { existing })
    } else {
        Ok(ValidationReport::MissingTables { missing, existing })
    }
}
