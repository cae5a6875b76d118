use clap::Args;
use devdb::database::{initialize_database, ConnectionFiles, EmitReport, InitOutcome};
use devdb::{DevdbConfig, OutputFormat};
use serde::Serialize;

use super::print_json;

/// Arguments for the Init command
#[derive(Args, Default)]
pub struct InitArgs {
    /// Database file path, overrides the configured one
    #[clap(value_name = "PATH")]
    pub path: Option<String>,

    /// Drop all schema tables before recreating them
    #[clap(long)]
    pub reset: bool,
}

#[derive(Serialize)]
struct InitResult<'a> {
    database: &'a InitOutcome,
    files: &'a EmitReport,
}

pub fn run(config: &DevdbConfig, args: InitArgs, output_format: OutputFormat) {
    let InitArgs { path, reset } = args;
    let db_path = path.unwrap_or_else(|| config.db_path.clone());

    let outcome = match initialize_database(&db_path, &config.seed_info(), reset) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("ERROR: Failed to initialize database '{}': {}", db_path, e);
            std::process::exit(1);
        }
    };

    let files = ConnectionFiles::new(&outcome, &config.output_dir);
    // failed writes are logged as warnings by write_all
    let report = files.write_all();

    let result = InitResult {
        database: &outcome,
        files: &report,
    };
    if print_json(&result, output_format) {
        return;
    }

    for path in &report.written {
        println!("Saved {}", path.display());
    }
    println!();
    println!("{}", files.summary());
    println!();
}
