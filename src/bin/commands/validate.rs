use clap::Args;
use devdb::database::{validate_schema, ValidationReport};
use devdb::{DevdbConfig, OutputFormat};

use super::print_json;

/// Arguments for the Validate command
#[derive(Args)]
pub struct ValidateArgs {
    /// Database file path, overrides the configured one
    #[clap(value_name = "PATH")]
    pub path: Option<String>,
}

/// Exit with 0 when every required table exists and 1 otherwise
pub fn run(config: &DevdbConfig, args: ValidateArgs, output_format: OutputFormat) {
    let db_path = args.path.unwrap_or_else(|| config.db_path.clone());

    let report = match validate_schema(&db_path) {
        Ok(report) => report,
        Err(e) => {
            let json = serde_json::json!({
                "result": "error",
                "message": e.to_string(),
            });
            if !print_json(&json, output_format) {
                eprintln!("Schema validation failed: {}", e);
            }
            std::process::exit(1);
        }
    };

    if !print_json(&report, output_format) {
        match report {
            ValidationReport::Valid { .. } => println!("{}", report.message()),
            _ => eprintln!("{}", report.message()),
        }
    }

    std::process::exit(report.exit_code());
}
