use clap::Args;
use devdb::{DevdbConfig, OutputFormat};
use serde::Serialize;

use super::print_json;

/// Arguments for the Config command
#[derive(Args)]
pub struct ConfigArgs {
    /// Also list the config file locations that are searched
    #[clap(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Serialize)]
struct ConfigInfo {
    db_path: String,
    output_dir: String,
    project_name: String,
    project_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    config_files: Option<Vec<ConfigFileInfo>>,
}

#[derive(Debug, Serialize)]
struct ConfigFileInfo {
    path: String,
    exists: bool,
}

pub fn run(config: &DevdbConfig, args: ConfigArgs, output_format: OutputFormat) {
    let ConfigArgs { verbose } = args;

    let config_files = verbose.then(|| {
        DevdbConfig::config_file_candidates()
            .into_iter()
            .map(|p| ConfigFileInfo {
                exists: p.exists(),
                path: p.display().to_string(),
            })
            .collect::<Vec<_>>()
    });

    let info = ConfigInfo {
        db_path: config.db_path.clone(),
        output_dir: config.output_dir.clone(),
        project_name: config.project_name.clone(),
        project_version: config.project_version.clone(),
        config_files,
    };

    if print_json(&info, output_format) {
        return;
    }

    println!("{}", config.summary());

    if let Some(files) = &info.config_files {
        println!();
        println!("Config Files:");
        for file in files {
            println!(
                "  {} ({})",
                file.path,
                if file.exists { "found" } else { "not found" }
            );
        }
    }
}
