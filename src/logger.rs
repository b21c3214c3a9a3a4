use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal, Write};
use tracing_subscriber::EnvFilter;

use crate::pipeline::RunSummary;
use crate::progress::{ProgressEvent, ProgressReporter};

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub enum VerbosityLevel {
    Summary = 0,   // Progress bar, warnings and final summary (default)
    Detailed = 1,  // Stage results and per-run counters
    Debug = 2,     // Per-batch and per-lookup detail
}

impl VerbosityLevel {
    pub fn from_verbose_count(count: u8) -> Self {
        match count {
            0 => VerbosityLevel::Summary,
            1 => VerbosityLevel::Detailed,
            2.. => VerbosityLevel::Debug,
        }
    }

    /// Default filter directive when `RUST_LOG` is unset
    pub fn filter_directive(&self) -> &'static str {
        match self {
            VerbosityLevel::Summary => "warn",
            VerbosityLevel::Detailed => "warn,leadclean=info",
            VerbosityLevel::Debug => "info,leadclean=debug",
        }
    }
}

/// Colors are off with `--no-color`, with `NO_COLOR` set, or when stderr is not a terminal
pub fn use_color(no_color_flag: bool) -> bool {
    !no_color_flag && std::env::var_os("NO_COLOR").is_none() && io::stderr().is_terminal()
}

/// Install the global tracing subscriber, writing to stderr.
/// `RUST_LOG` takes precedence over the verbosity flag.
pub fn init_tracing(verbosity: VerbosityLevel, color: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(color)
        .with_target(false)
        .try_init();
}

/// Terminal progress bar driven by pipeline progress events
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        let bar = if io::stderr().is_terminal() {
            ProgressBar::new(100)
        } else {
            ProgressBar::hidden()
        };

        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
                .unwrap_or_else(|_| {
                    ProgressStyle::default_bar()
                        .template("{bar:40} {pos}% {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                })
                .progress_chars("##-"),
        );
        bar.set_message("Initializing...");

        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for ConsoleProgress {
    fn report(&self, event: ProgressEvent) {
        self.bar.set_position(u64::from(event.progress));
        self.bar.set_message(event.stage);
    }
}

pub fn print_final_summary(summary: &RunSummary, output_path: &str) {
    // Clear any remaining progress bar artifacts
    print!("\x1b[2K\r");
    let _ = io::stdout().flush();

    println!("\n=== PROCESSING SUMMARY ===");
    println!("Duration: {:.2}s", summary.duration_secs);
    println!("Input Rows: {}", summary.input_rows);
    if summary.expanded_rows != summary.input_rows {
        println!("Rows After Email Expansion: {}", summary.expanded_rows);
    }
    println!("Duplicates Removed: {}", summary.duplicates_removed);
    println!("Rows Without Email or Website: {}", summary.rows_without_key);
    println!("Output Rows: {}", summary.output_rows);

    if summary.domains_classified > 0 {
        println!(
            "Mail Domains Classified: {} ({} lookups)",
            summary.domains_classified, summary.lookups_performed
        );
        for (provider, count) in &summary.provider_counts {
            println!("  {}: {}", provider, count);
        }
        println!("Alternate Contacts Assigned: {}", summary.alternates_assigned);
    }

    println!("Results Exported: {}", output_path);
    println!("==========================\n");
}
