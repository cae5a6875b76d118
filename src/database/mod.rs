//! Database module
//!
//! This module provides all database functionality for devdb, organized into:
//!
//! - **core**: SQLite connection wrapper and schema definitions
//! - **bootstrap**: initializer, connection descriptor files and validator
//!
//! # Architecture
//!
//! ```text
//! database/
//! ├── core/                  # Foundation
//! │   ├── connection         # SQLite DatabaseConn wrapper
//! │   └── schema             # Table/index definitions and SchemaManager
//! │
//! └── bootstrap/             # Development database lifecycle
//!     ├── (mod)              # initialize_database
//!     ├── connection_files   # db_connection.txt, .env, visualizer env
//!     └── validator          # required-table check
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use devdb::database::{initialize_database, validate_schema, ConnectionFiles, SeedInfo};
//!
//! let outcome = initialize_database("myapp.db", &SeedInfo::new("demo", "0.1.0"), false)?;
//! let report = ConnectionFiles::new(&outcome, ".").write_all();
//!
//! assert!(validate_schema("myapp.db")?.is_valid());
//! ```

pub mod bootstrap;
pub mod core;

// SQLite connection and schema management
pub use core::{AppInfoEntry, DatabaseConn, SchemaDefinitions, SchemaManager, SchemaStatus, SeedInfo};

// Initializer, connection files and validator
pub use bootstrap::{
    ensure_data_dir, initialize_database, read_env_file, validate_schema, ConnectionFiles,
    EmitReport, InitOutcome, ValidationReport, CONNECTION_INFO_FILE, DEFAULT_DB_PATH,
    DEFAULT_PROJECT_NAME, DEFAULT_PROJECT_VERSION, ENV_FILE, VISUALIZER_DIR, VISUALIZER_ENV_FILE,
};
