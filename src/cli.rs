use clap::Parser;
use std::path::{Path, PathBuf};

use crate::config::CONFIG_PATH;
use crate::input::InputFormat;

#[derive(Parser, Debug)]
#[command(name = "leadclean")]
#[command(about = "Clean, deduplicate and enrich contact lists with mail-provider classification")]
#[command(version)]
pub struct Cli {
    /// Create default configuration file at ./config/leadclean.toml
    #[arg(long)]
    pub init: bool,

    /// Contact list to process (.csv or .json)
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Output file; format follows the extension (.csv or .json).
    /// Defaults to <input stem>_cleaned.csv next to the input
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Configuration file (defaults to ./config/leadclean.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Rows per classification batch (overrides config)
    #[arg(short = 'b', long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Verbose logging (use -v for INFO, -vv for DEBUG)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output (also respects NO_COLOR environment variable)
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    pub fn validate(&self) -> Result<(), String> {
        if self.init {
            return Ok(());
        }

        let input = match &self.input {
            None => return Err("Input file is required (use --input)".to_string()),
            Some(p) if p.as_os_str().is_empty() => return Err("Input file cannot be empty".to_string()),
            Some(p) => p,
        };
        if InputFormat::from_path(input).is_none() {
            return Err(format!(
                "Unsupported input format for '{}': expected a .csv or .json file",
                input.display()
            ));
        }

        if let Some(output) = &self.output {
            if InputFormat::from_path(output).is_none() {
                return Err(format!(
                    "Unsupported output format for '{}': expected a .csv or .json file",
                    output.display()
                ));
            }
        }

        if self.batch_size == Some(0) {
            return Err("Batch size must be greater than 0".to_string());
        }

        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(|| PathBuf::from(CONFIG_PATH))
    }

    /// Explicit `--output`, else `<stem>_cleaned.csv` beside the input
    pub fn output_path(&self) -> Option<PathBuf> {
        if let Some(output) = &self.output {
            return Some(output.clone());
        }
        self.input.as_deref().map(default_output_path)
    }
}

pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "contacts".to_string());
    input.with_file_name(format!("{}_cleaned.csv", stem))
}
