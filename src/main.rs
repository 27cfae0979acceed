use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

use rxf_import::{import_files, load_config, OutputFormat};

/// Import plain-text recipe exports and re-export them
#[derive(Parser, Debug)]
#[command(name = "rxf-import")]
#[command(version)]
struct Args {
    /// Export encoding (overrides the configuration file)
    #[arg(short, long, value_parser = parse_format)]
    format: Option<OutputFormat>,

    /// Directory receiving the export file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of decode workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Recipe files to import
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn parse_format(value: &str) -> Result<OutputFormat, String> {
    match value.to_ascii_lowercase().as_str() {
        "rxf" => Ok(OutputFormat::Rxf),
        "json" => Ok(OutputFormat::Json),
        "sql" => Ok(OutputFormat::Sql),
        other => Err(format!("unknown format '{}', expected rxf, json or sql", other)),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let mut config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Some(directory) = args.output {
        config.output.directory = directory;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }

    match import_files(&args.files, &config).await {
        Ok(recipes) => {
            info!(
                "Imported {} recipe(s) from {} file(s) as {}",
                recipes.len(),
                args.files.len(),
                config.output.format
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Import failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
