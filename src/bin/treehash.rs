//! treehash CLI Binary
//!
//! Command-line interface for creating, inspecting and verifying resources.

use anyhow::Context;
use clap::Parser;
use std::process;
use treehash::cli::{map_error, Cli, RunContext};
use treehash::config::ConfigLoader;
use treehash::logging::{init_logging, LoggingConfig};
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let logging_config = build_logging_config(&cli);
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("treehash CLI starting");

    let context = match RunContext::new(cli.config.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error loading configuration: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    };

    match context.execute(&cli.command) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    }
}

/// Build logging configuration from CLI args and the config files
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    if !cli.verbose {
        return LoggingConfig {
            level: "off".to_string(),
            ..LoggingConfig::default()
        };
    }

    let loaded = match cli.config {
        Some(ref path) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("loading {}", path.display())),
        None => ConfigLoader::load().context("loading global configuration"),
    };
    let mut config = match loaded {
        Ok(config) => config.logging,
        Err(e) => {
            eprintln!("Ignoring logging configuration: {:#}", e);
            LoggingConfig::default()
        }
    };

    // CLI arguments take precedence
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    // Keep stdout for command output
    if config.output == "stdout" {
        config.output = "stderr".to_string();
    }

    config
}
