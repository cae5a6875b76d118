//! Core database infrastructure
//!
//! This module provides the foundational database components:
//! - `DatabaseConn`: SQLite connection wrapper with per-connection configuration
//! - `SchemaManager`: Schema initialization, seeding and status checks
//! - `SchemaStatus`: Schema state enumeration

mod connection;
mod schema;

pub use connection::DatabaseConn;
pub use schema::{AppInfoEntry, SchemaDefinitions, SchemaManager, SchemaStatus, SeedInfo};
