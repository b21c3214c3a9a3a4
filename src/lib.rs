pub mod batch;
pub mod cleaner;
pub mod cli;
pub mod config;
pub mod contacts;
pub mod dedup;
pub mod dns;
pub mod expand;
pub mod export;
pub mod input;
pub mod logger;
pub mod pipeline;
pub mod progress;
pub mod provider;
pub mod record;
pub mod website;

pub use cleaner::{clean_record, clean_records};
pub use pipeline::{Pipeline, PipelineError, PipelineOutput, RunSummary};
pub use progress::{NoopProgress, ProgressEvent, ProgressReporter};
pub use provider::{ClassificationResult, ProviderClassifier, ProviderRule};
pub use record::{KnownField, Record};
pub use website::normalize_website;
