//! Reconstruct an image from a JSON request on stdin.
//!
//! Usage: `recon [--config recon.toml] [--matrix-dir DIR] [--output PATH] < request.json`
//!
//! Prints one JSON object on stdout (`success`, `warning` or `error`) and
//! exits with status 1 on `error`.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use recon_wasm::config::ReconConfig;
use recon_wasm::logging::{init_logging, LogFormat, LogLevel};
use recon_wasm::pipeline::{self, ReconstructionResponse};

#[derive(Parser)]
#[command(name = "recon", version, about = "CGNR/CGNE image reconstruction")]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding H-<id>.csv matrices
    #[arg(long)]
    matrix_dir: Option<PathBuf>,

    /// Output PNG path
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,

    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

fn load_config(cli: &Cli) -> Result<ReconConfig> {
    let mut config = match &cli.config {
        Some(path) => ReconConfig::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ReconConfig::default(),
    };
    if let Some(dir) = &cli.matrix_dir {
        config.matrix_dir = dir.clone();
    }
    if let Some(output) = &cli.output {
        config.output_path = output.clone();
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    Ok(config)
}

fn emit(response: &ReconstructionResponse) -> ExitCode {
    println!("{}", response.to_json());
    if response.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            return emit(&ReconstructionResponse::Error {
                message: format!("{:#}", e),
            })
        }
    };
    init_logging(&config.logging);

    let mut input = String::new();
    if let Err(e) = std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read request from stdin")
    {
        return emit(&ReconstructionResponse::Error {
            message: format!("{:#}", e),
        });
    }

    emit(&pipeline::handle_json(&input, &config))
}
