use clap::{Parser, Subcommand};
use devdb::*;
use tracing::Level;

mod commands;

use commands::config::ConfigArgs;
use commands::init::InitArgs;
use commands::status::StatusArgs;
use commands::validate::ValidateArgs;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default ./devdb.toml is used when present
    #[clap(short, long)]
    config: Option<String>,

    /// Print debug information
    #[clap(long)]
    debug: bool,

    /// Output format: table, json, json-pretty
    #[clap(short, long, default_value = "table")]
    format: OutputFormat,

    #[clap(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or verify the development database (default when no subcommand)
    Init(InitArgs),

    /// Check that all required tables exist
    Validate(ValidateArgs),

    /// Show database file, schema and table status
    Status(StatusArgs),

    /// Show the effective configuration
    Config(ConfigArgs),
}

fn main() {
    let cli = Cli::parse();

    // warnings such as an unreadable .env are shown even without --debug
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    // DEVDB_* overrides may live in a local .env
    let env_file = std::path::Path::new(database::ENV_FILE);
    let config = match DevdbConfig::load(&cli.config, Some(env_file)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        None => commands::init::run(&config, InitArgs::default(), cli.format),
        Some(Commands::Init(args)) => commands::init::run(&config, args, cli.format),
        Some(Commands::Validate(args)) => commands::validate::run(&config, args, cli.format),
        Some(Commands::Status(args)) => commands::status::run(&config, args, cli.format),
        Some(Commands::Config(args)) => commands::config::run(&config, args, cli.format),
    }
}
