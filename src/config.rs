use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use config::Config;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::database::{
    read_env_file, DatabaseConn, SchemaManager, SeedInfo, DEFAULT_DB_PATH, DEFAULT_PROJECT_NAME,
    DEFAULT_PROJECT_VERSION, ENV_FILE,
};

/// File name looked up in the working directory and the user config directory
pub const CONFIG_FILE_NAME: &str = "devdb.toml";

pub struct DevdbConfig {
    /// Path of the SQLite database file
    pub db_path: String,

    /// Directory receiving db_connection.txt, .env and db_visualizer/
    pub output_dir: String,

    /// Value seeded as `app_info.project_name`
    pub project_name: String,

    /// Value seeded as `app_info.version`
    pub project_version: String,
}

const EMPTY_CONFIG: &str = r#"### devdb configuration file

### database file, relative to the working directory unless absolute
# db_path = "myapp.db"

### where db_connection.txt, .env and db_visualizer/ are written
# output_dir = "."

### values seeded into the app_info table
# project_name = "database_postgres"
# project_version = "0.2.0"
"#;

impl Default for DevdbConfig {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            output_dir: ".".to_string(),
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            project_version: DEFAULT_PROJECT_VERSION.to_string(),
        }
    }
}

impl DevdbConfig {
    /// Function to create and initialize a new configuration
    ///
    /// An explicit path that does not exist yet gets a commented template.
    /// Without a path, `./devdb.toml` and then `<config dir>/devdb/devdb.toml`
    /// are used when present. `DEVDB_*` environment variables override both.
    pub fn new(path: &Option<String>) -> Result<DevdbConfig> {
        Self::load(path, None)
    }

    /// Like [`DevdbConfig::new`], also taking `DEVDB_*` overrides from
    /// `env_file` when it exists
    ///
    /// Variables already set in the process environment win over the file.
    /// The file is only read, so overrides kept in the generated `.env`
    /// survive every rewrite of it.
    pub fn load(path: &Option<String>, env_file: Option<&Path>) -> Result<DevdbConfig> {
        let mut builder = Config::builder();

        match path {
            Some(p) => {
                let path = Path::new(p.as_str());
                if path.exists() {
                    let path_str = path
                        .to_str()
                        .ok_or_else(|| anyhow!("Could not convert path to string"))?;
                    builder = builder.add_source(config::File::with_name(path_str));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG)
                        .map_err(|e| anyhow!("Unable to create config file: {}", e))?;
                }
            }
            None => {
                if let Some(found) = Self::config_file_candidates()
                    .into_iter()
                    .find(|c| c.exists())
                {
                    let path_str = found
                        .to_str()
                        .ok_or_else(|| anyhow!("Could not convert path to string"))?;
                    builder = builder.add_source(config::File::with_name(path_str));
                }
            }
        }

        // Add in settings from the environment (with a prefix of DEVDB)
        // E.g., `DEVDB_DB_PATH=/tmp/dev.db devdb` would set the database path
        let mut env_vars: config::Map<String, String> = config::Map::new();
        if let Some(env_file) = env_file.filter(|f| f.exists()) {
            match read_env_file(env_file) {
                Ok(vars) => env_vars.extend(vars),
                Err(e) => warn!("ignoring overrides in {}: {}", env_file.display(), e),
            }
        }
        env_vars.extend(std::env::vars());
        builder = builder
            .add_source(config::Environment::with_prefix("DEVDB").source(Some(env_vars)));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let config = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        let defaults = DevdbConfig::default();
        let pick = |key: &str, default: String| -> String {
            config
                .get(key)
                .filter(|v| !v.trim().is_empty())
                .cloned()
                .unwrap_or(default)
        };

        Ok(DevdbConfig {
            db_path: pick("db_path", defaults.db_path),
            output_dir: pick("output_dir", defaults.output_dir),
            project_name: pick("project_name", defaults.project_name),
            project_version: pick("project_version", defaults.project_version),
        })
    }

    /// Config files consulted when no path is given, in order
    pub fn config_file_candidates() -> Vec<PathBuf> {
        let mut candidates = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join("devdb").join(CONFIG_FILE_NAME));
        }
        candidates
    }

    /// Seed values for the `app_info` table
    pub fn seed_info(&self) -> SeedInfo {
        SeedInfo::new(&self.project_name, &self.project_version)
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        let lines = [
            format!("Database Path:      {}", self.db_path),
            format!("Output Directory:   {}", self.output_dir),
            format!("Project Name:       {}", self.project_name),
            format!("Project Version:    {}", self.project_version),
        ];
        lines.join("\n")
    }
}

// =============================================================================
// Database info types (used by the status command)
// =============================================================================

/// A row of `app_info` with its timestamp parsed
#[derive(Debug, Serialize, Clone)]
pub struct AppInfoRecord {
    pub key: String,
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Row count of a schema table
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "display", derive(tabled::Tabled))]
pub struct TableInfo {
    pub table: String,
    pub rows: u64,
}

/// Information about the development database file
#[derive(Debug, Serialize, Clone)]
pub struct DatabaseFileInfo {
    pub path: String,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_status: Option<String>,
    pub app_info: Vec<AppInfoRecord>,
    pub tables: Vec<TableInfo>,
    pub indexes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_db_url: Option<String>,
}

/// Gather information about the database at `db_path` without modifying it
///
/// `output_dir` is where the generated `.env` is looked up.
pub fn get_database_info(db_path: &str, output_dir: &str) -> Result<DatabaseFileInfo> {
    let exists = Path::new(db_path).exists();
    let size_bytes = if exists {
        std::fs::metadata(db_path).ok().map(|m| m.len())
    } else {
        None
    };

    let env_path = Path::new(output_dir).join(ENV_FILE);
    let env_db_url = if env_path.exists() {
        match read_env_file(&env_path) {
            Ok(vars) => vars
                .into_iter()
                .find(|(k, _)| k == "DB_URL")
                .map(|(_, v)| v),
            Err(e) => {
                warn!("could not read DB_URL from {}: {}", env_path.display(), e);
                None
            }
        }
    } else {
        None
    };

    let mut info = DatabaseFileInfo {
        path: db_path.to_string(),
        exists,
        size_bytes,
        schema_status: None,
        app_info: Vec::new(),
        tables: Vec::new(),
        indexes: Vec::new(),
        env_db_url,
    };

    if !exists {
        return Ok(info);
    }

    let db = DatabaseConn::open_read_only(db_path)?;
    let schema = SchemaManager::new(&db.conn);
    info.schema_status = Some(schema.check_status()?.to_string());

    let existing = db.list_tables()?;
    for table in crate::database::SchemaDefinitions::TABLE_NAMES {
        if existing.contains(*table) {
            info.tables.push(TableInfo {
                table: table.to_string(),
                rows: db.table_count(table)?,
            });
        }
    }

    if existing.contains("app_info") {
        info.app_info = schema
            .app_info_entries()?
            .into_iter()
            .map(|e| AppInfoRecord {
                created_at: e.created_at.as_deref().and_then(parse_sqlite_timestamp),
                key: e.key,
                value: e.value,
            })
            .collect();
    }

    info.indexes = db.list_indexes()?.into_iter().collect();

    Ok(info)
}

/// Parse SQLite's `CURRENT_TIMESTAMP` format (UTC, `YYYY-MM-DD HH:MM:SS`)
pub fn parse_sqlite_timestamp(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{initialize_database, ConnectionFiles};

    #[test]
    fn test_default_config() {
        let config = DevdbConfig::default();
        assert_eq!(config.db_path, "myapp.db");
        assert_eq!(config.output_dir, ".");
        assert_eq!(
            config.seed_info(),
            SeedInfo::new("database_postgres", "0.2.0")
        );
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devdb.toml");
        std::fs::write(
            &path,
            "db_path = \"data/dev.db\"\nproject_name = \"vault\"\n",
        )
        .unwrap();

        let config = DevdbConfig::new(&Some(path.to_str().unwrap().to_string())).unwrap();
        assert_eq!(config.db_path, "data/dev.db");
        assert_eq!(config.project_name, "vault");
        // untouched keys keep their defaults
        assert_eq!(config.output_dir, ".");
        assert_eq!(config.project_version, "0.2.0");
    }

    #[test]
    fn test_missing_config_file_gets_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.toml");

        let config = DevdbConfig::new(&Some(path.to_str().unwrap().to_string())).unwrap();
        assert_eq!(config.db_path, "myapp.db");

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, EMPTY_CONFIG);
    }

    #[test]
    fn test_summary() {
        let summary = DevdbConfig::default().summary();
        assert!(summary.contains("Database Path:      myapp.db"));
        assert!(summary.contains("Project Version:    0.2.0"));
    }

    #[test]
    fn test_parse_sqlite_timestamp() {
        let ts = parse_sqlite_timestamp("2024-03-01 12:30:45").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-01T12:30:45+00:00");
        assert!(parse_sqlite_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_database_info_missing() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("none.db");
        let info =
            get_database_info(db_path.to_str().unwrap(), dir.path().to_str().unwrap()).unwrap();

        assert!(!info.exists);
        assert!(info.schema_status.is_none());
        assert!(info.tables.is_empty());
        assert!(info.env_db_url.is_none());
        assert!(!db_path.exists());
    }

    #[test]
    fn test_database_info_initialized() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("dev.db");
        let db_path = db_path.to_str().unwrap();

        let outcome =
            initialize_database(db_path, &DevdbConfig::default().seed_info(), false).unwrap();
        ConnectionFiles::new(&outcome, dir.path()).write_all();

        let info = get_database_info(db_path, dir.path().to_str().unwrap()).unwrap();
        assert!(info.exists);
        assert!(info.size_bytes.unwrap() > 0);
        assert_eq!(info.schema_status.as_deref(), Some("current"));
        assert_eq!(info.tables.len(), 6);
        assert!(info.tables.contains(&TableInfo {
            table: "app_info".to_string(),
            rows: 2
        }));
        assert_eq!(info.indexes.len(), 8);
        assert_eq!(info.app_info.len(), 2);
        assert!(info.app_info.iter().all(|r| r.created_at.is_some()));
        assert_eq!(
            info.env_db_url,
            Some(format!("sqlite:///{}", outcome.absolute_path.display()))
        );
    }

    #[test]
    fn test_env_file_overrides_survive_init() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = Some(dir.path().join("devdb.toml").to_str().unwrap().to_string());
        let env_path = dir.path().join(ENV_FILE);
        std::fs::write(&env_path, "DEVDB_PROJECT_NAME=vault\n").unwrap();

        for _ in 0..2 {
            let config = DevdbConfig::load(&config_path, Some(&env_path)).unwrap();
            assert_eq!(config.project_name, "vault");

            let db_path = dir.path().join(&config.db_path);
            let outcome =
                initialize_database(db_path.to_str().unwrap(), &config.seed_info(), false)
                    .unwrap();
            assert!(ConnectionFiles::new(&outcome, dir.path())
                .write_all()
                .is_complete());
        }

        let info = get_database_info(
            dir.path().join("myapp.db").to_str().unwrap(),
            dir.path().to_str().unwrap(),
        )
        .unwrap();
        let project = info.app_info.iter().find(|r| r.key == "project_name").unwrap();
        assert_eq!(project.value.as_deref(), Some("vault"));
        assert!(info.env_db_url.is_some());
    }

    #[test]
    fn test_missing_env_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = Some(dir.path().join("devdb.toml").to_str().unwrap().to_string());
        let config =
            DevdbConfig::load(&config_path, Some(&dir.path().join(ENV_FILE))).unwrap();
        assert_eq!(config.project_name, "database_postgres");
    }

    #[test]
    fn test_database_info_path_with_space() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("a dir").join("dev.db");
        let db_path = db_path.to_str().unwrap();

        let outcome =
            initialize_database(db_path, &DevdbConfig::default().seed_info(), false).unwrap();
        assert!(ConnectionFiles::new(&outcome, dir.path())
            .write_all()
            .is_complete());

        let info = get_database_info(db_path, dir.path().to_str().unwrap()).unwrap();
        assert_eq!(
            info.env_db_url,
            Some(format!("sqlite:///{}", outcome.absolute_path.display()))
        );
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
        assert_eq!(format_size(1073741824), "1.00 GB");
    }
}
