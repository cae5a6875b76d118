use clap::Args;
use devdb::config::{format_size, get_database_info, DatabaseFileInfo};
use devdb::{DevdbConfig, OutputFormat};
use tabled::settings::Style;
use tabled::Table;

use super::print_json;

/// Arguments for the Status command
#[derive(Args)]
pub struct StatusArgs {
    /// Database file path, overrides the configured one
    #[clap(value_name = "PATH")]
    pub path: Option<String>,
}

pub fn run(config: &DevdbConfig, args: StatusArgs, output_format: OutputFormat) {
    let db_path = args.path.unwrap_or_else(|| config.db_path.clone());

    let info = match get_database_info(&db_path, &config.output_dir) {
        Ok(info) => info,
        Err(e) => {
            eprintln!("ERROR: Failed to read database '{}': {}", db_path, e);
            std::process::exit(1);
        }
    };

    if !print_json(&info, output_format) {
        print_status(&info);
    }
}

fn print_status(info: &DatabaseFileInfo) {
    println!("Development Database Status");
    println!("===========================\n");

    println!("  Path:           {}", info.path);
    println!(
        "  Status:         {}",
        if info.exists { "exists" } else { "not created" }
    );
    if let Some(size) = info.size_bytes {
        println!("  Size:           {}", format_size(size));
    }
    if let Some(status) = &info.schema_status {
        println!("  Schema:         {}", status);
    }
    if let Some(url) = &info.env_db_url {
        println!("  DB_URL (.env):  {}", url);
    }

    if !info.app_info.is_empty() {
        println!();
        println!("App Info:");
        for entry in &info.app_info {
            let created = entry
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_default();
            println!(
                "  {:15} {:20} {}",
                format!("{}:", entry.key),
                entry.value.as_deref().unwrap_or(""),
                created
            );
        }
    }

    if !info.tables.is_empty() {
        println!();
        println!("Tables:");
        println!("{}", Table::new(&info.tables).with(Style::rounded()));
    }

    if !info.indexes.is_empty() {
        println!();
        println!("Indexes:");
        for index in &info.indexes {
            println!("  {}", index);
        }
    }

    if !info.exists {
        eprintln!();
        eprintln!("Run `devdb init` to create the database.");
    }
}
