//! Connection descriptor files
//!
//! After the schema is in place, devdb leaves three small text files behind
//! so other tools can find the database without being told where it is:
//!
//! - `db_connection.txt`: human-readable connection notes
//! - `.env`: `DB_URL` and `SQLITE_DB` variables
//! - `db_visualizer/sqlite.env`: shell snippet sourced by the visualizer
//!
//! Every file is written on its own. A failure is logged and recorded in the
//! returned [`EmitReport`] but never stops the remaining writes.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::InitOutcome;

pub const CONNECTION_INFO_FILE: &str = "db_connection.txt";
pub const ENV_FILE: &str = ".env";
pub const VISUALIZER_DIR: &str = "db_visualizer";
pub const VISUALIZER_ENV_FILE: &str = "sqlite.env";

const ENV_HEADER: &str = "# Auto-generated by devdb";
const GENERATED_ENV_KEYS: [&str; 2] = ["DB_URL", "SQLITE_DB"];

/// Writer for the connection descriptor files of one database
pub struct ConnectionFiles<'a> {
    outcome: &'a InitOutcome,
    output_dir: PathBuf,
}

/// What happened to each descriptor file
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct EmitReport {
    pub written: Vec<PathBuf>,
    /// Files that could not be written, with the reason
    pub failed: Vec<(PathBuf, String)>,
}

impl EmitReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl<'a> ConnectionFiles<'a> {
    pub fn new(outcome: &'a InitOutcome, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            outcome,
            output_dir: output_dir.into(),
        }
    }

    /// `sqlite:///` followed by the absolute path
    pub fn connection_string(&self) -> String {
        format!("sqlite:///{}", self.outcome.absolute_path.display())
    }

    pub fn connection_info_contents(&self) -> String {
        format!(
            "# SQLite connection methods:\n\
             # sqlite3 CLI: sqlite3 {}\n\
             # Connection string: {}\n\
             # File path: {}\n",
            self.outcome.db_path,
            self.connection_string(),
            self.outcome.absolute_path.display()
        )
    }

    /// Generated `.env` contents for a directory without an existing `.env`
    pub fn env_contents(&self) -> String {
        self.merged_env_contents("")
    }

    /// `.env` contents that keep every line of `existing` except the
    /// generated header and the `DB_URL`/`SQLITE_DB` assignments
    pub fn merged_env_contents(&self, existing: &str) -> String {
        let mut out = String::new();
        for line in existing.lines() {
            if line.trim() == ENV_HEADER || is_generated_assignment(line) {
                continue;
            }
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&format!(
            "{}\nDB_URL={}\nSQLITE_DB={}\n",
            ENV_HEADER,
            self.connection_string(),
            self.outcome.absolute_path.display()
        ));
        out
    }

    pub fn visualizer_env_contents(&self) -> String {
        format!(
            "export SQLITE_DB=\"{}\"\n",
            self.outcome.absolute_path.display()
        )
    }

    /// Write all three files, continuing past individual failures
    pub fn write_all(&self) -> EmitReport {
        let mut report = EmitReport::default();

        let env_path = self.output_dir.join(ENV_FILE);
        let env_contents = match std::fs::read_to_string(&env_path) {
            Ok(existing) => self.merged_env_contents(&existing),
            Err(_) => self.env_contents(),
        };

        let targets = [
            (
                self.output_dir.join(CONNECTION_INFO_FILE),
                self.connection_info_contents(),
            ),
            (env_path, env_contents),
            (
                self.output_dir.join(VISUALIZER_DIR).join(VISUALIZER_ENV_FILE),
                self.visualizer_env_contents(),
            ),
        ];

        for (path, contents) in targets {
            match write_file(&path, &contents) {
                Ok(()) => {
                    info!("wrote {}", path.display());
                    report.written.push(path);
                }
                Err(e) => {
                    warn!("could not write {}: {}", path.display(), e);
                    report.failed.push((path, e.to_string()));
                }
            }
        }

        report
    }

    /// Completion summary shown after initialization
    pub fn summary(&self) -> String {
        let name = self
            .outcome
            .absolute_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.outcome.db_path.clone());

        let status = if self.outcome.first_time {
            "Initialized a new database file."
        } else {
            "Verified existing database and ensured schema is present."
        };

        [
            "SQLite setup complete!".to_string(),
            format!("Database: {}", name),
            format!("Location: {}", self.outcome.absolute_path.display()),
            status.to_string(),
        ]
        .join("\n")
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| anyhow!("Failed to create directory '{}': {}", parent.display(), e))?;
    }
    std::fs::write(path, contents)
        .map_err(|e| anyhow!("Failed to write '{}': {}", path.display(), e))
}

fn env_key(line: &str) -> Option<&str> {
    let line = line.trim_start();
    if line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    line.split_once('=').map(|(key, _)| key.trim())
}

fn is_generated_assignment(line: &str) -> bool {
    env_key(line).is_some_and(|key| GENERATED_ENV_KEYS.contains(&key))
}

/// Read `KEY=value` pairs from an env file such as the generated `.env`
///
/// The file is parsed with dotenvy first. The generated values are written
/// unquoted, so a database path containing whitespace is rejected by dotenvy;
/// in that case the failure is logged and the file is read again with a plain
/// `KEY=value` split that keeps values literally.
pub fn read_env_file(path: &Path) -> Result<Vec<(String, String)>> {
    let parsed: Result<Vec<(String, String)>> = dotenvy::from_path_iter(path)
        .map_err(|e| anyhow!("Failed to open env file '{}': {}", path.display(), e))?
        .map(|item| item.map_err(|e| anyhow!("Failed to parse '{}': {}", path.display(), e)))
        .collect();

    match parsed {
        Ok(pairs) => Ok(pairs),
        Err(e) => {
            warn!("{}, reading it as plain KEY=value lines", e);
            read_env_file_literal(path)
        }
    }
}

fn read_env_file_literal(path: &Path) -> Result<Vec<(String, String)>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read env file '{}': {}", path.display(), e))?;

    Ok(contents
        .lines()
        .filter_map(|line| {
            let key = env_key(line)?;
            let (_, value) = line.split_once('=')?;
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            Some((key.to_string(), value.to_string()))
        })
        .filter(|(key, _)| !key.is_empty())
        .collect())
}
