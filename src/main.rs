use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{debug, info};

use leadclean::cli::Cli;
use leadclean::config::{AppConfig, ConfigError};
use leadclean::dns::DohMxLookup;
use leadclean::export::export_rows;
use leadclean::input::load_rows;
use leadclean::logger::{self, ConsoleProgress, VerbosityLevel};
use leadclean::pipeline::Pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config_path();

    // Handle --init first (before any other processing)
    if cli.init {
        match AppConfig::create_default_config_at(&config_path) {
            Ok(path) => {
                println!("✅ Created default configuration file at: {}", path.display());
                println!("   Edit this file to customize settings, then run leadclean again.");
                std::process::exit(0);
            }
            Err(e) => {
                eprintln!("❌ Failed to create configuration file: {}", e);
                std::process::exit(1);
            }
        }
    }

    let verbosity = VerbosityLevel::from_verbose_count(cli.verbose);
    logger::init_tracing(verbosity, logger::use_color(cli.no_color));

    if let Err(e) = cli.validate() {
        eprintln!("❌ Invalid arguments: {}", e);
        std::process::exit(1);
    }

    let app_config = match AppConfig::load_from_path(&config_path) {
        Ok(cfg) => cfg,
        Err(ConfigError::FileNotFound(path)) => match AppConfig::prompt_create_config(&path) {
            Ok(Some(created_path)) => {
                println!("✅ Created default configuration file at: {}", created_path.display());
                println!("   Edit this file to customize settings, then run leadclean again.");
                std::process::exit(0);
            }
            Ok(None) => {
                eprintln!("❌ Configuration file not found at: {}", path.display());
                eprintln!("   Run with --init to create a default configuration file.");
                std::process::exit(1);
            }
            Err(e) => {
                eprintln!("❌ Failed to create configuration file: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("❌ Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    debug!(
        "Loaded configuration from {} ({} provider rules)",
        config_path.display(),
        app_config.providers.len()
    );

    // validate() guarantees both are present past this point
    let (Some(input_path), Some(output_path)) = (cli.input.clone(), cli.output_path()) else {
        eprintln!("❌ Invalid arguments: Input file is required (use --input)");
        std::process::exit(1);
    };

    let rows = load_rows(&input_path)?;
    info!("Processing {} rows from {}", rows.len(), input_path.display());

    let lookup = DohMxLookup::from_config(&app_config).context("Failed to initialize DNS lookup")?;
    let mut pipeline = Pipeline::from_config(&app_config, Arc::new(lookup));
    if let Some(batch_size) = cli.batch_size {
        pipeline = pipeline.with_batch_size(batch_size);
    }

    let progress = ConsoleProgress::new();
    let result = pipeline.run_with_summary(rows, &progress).await;
    progress.finish();

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    export_rows(&output.records, &output.summary, &output_path)?;
    logger::print_final_summary(&output.summary, &output_path.to_string_lossy());

    Ok(())
}
