#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! devdb - development database bootstrap
//!
//! devdb provisions a local SQLite database whose schema mirrors the
//! production relational schema (users, credentials, shares, eKYC sessions,
//! audit logs), seeds a small `app_info` table, and leaves connection
//! descriptor files behind for other tooling. A validator checks after the
//! fact that the required tables exist.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | `database` | Schema initialization, validation, connection files | `rusqlite` |
//! | `display` | Table formatting with `tabled` | `tabled` |
//! | `cli` | `devdb` binary | All above + `clap`, `tracing-subscriber` |
//!
//! # Architecture
//!
//! - **[`database`]**: all database functionality
//!   - `core`: SQLite connection management and schema definitions
//!   - `bootstrap`: initializer, connection descriptor files, validator
//! - **[`config`]**: configuration management and database info
//! - **[`output`]**: output format selection
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use devdb::{ConnectionFiles, DevdbConfig};
//!
//! let config = DevdbConfig::new(&None)?;
//! let outcome = devdb::initialize_database(&config.db_path, &config.seed_info(), false)?;
//!
//! let files = ConnectionFiles::new(&outcome, &config.output_dir);
//! let report = files.write_all();
//! println!("{}", files.summary());
//!
//! let validation = devdb::validate_schema(&config.db_path)?;
//! std::process::exit(validation.exit_code());
//! ```

pub mod config;
pub mod database;
pub mod output;

// =============================================================================
// Configuration
// =============================================================================

pub use config::DevdbConfig;

pub use config::{
    format_size, get_database_info, parse_sqlite_timestamp, AppInfoRecord, DatabaseFileInfo,
    TableInfo,
};

// =============================================================================
// Database Module - Re-export commonly used types
// =============================================================================

// Core database types
pub use database::{
    AppInfoEntry, DatabaseConn, SchemaDefinitions, SchemaManager, SchemaStatus, SeedInfo,
};

// Initializer, connection files and validator
pub use database::{
    initialize_database, read_env_file, validate_schema, ConnectionFiles, EmitReport,
    InitOutcome, ValidationReport, DEFAULT_DB_PATH,
};

pub use output::OutputFormat;
