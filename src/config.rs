//! Configuration management for leadclean
//!
//! All configuration is loaded from `./config/leadclean.toml`.
//! No hardcoded defaults exist in source code - all defaults are in the config template.

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::provider::ProviderRule;

/// Configuration file path relative to working directory
pub const CONFIG_PATH: &str = "./config/leadclean.toml";

/// Default configuration file content - this is the ONLY place defaults exist
pub const DEFAULT_CONFIG: &str = include_str!("../config/leadclean.toml");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found at {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid URL in '{field}': {url}")]
    InvalidUrl { field: String, url: String },

    #[error("Configuration field '{field}' cannot be empty")]
    EmptyRequired { field: String },

    #[error("Invalid provider rule '{name}': {reason}")]
    InvalidProvider { name: String, reason: String },

    #[error("Provider '{0}' is configured more than once")]
    DuplicateProvider(String),
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub dns: DnsConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    pub providers: Vec<ProviderConfig>,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

/// DNS resolution configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DnsConfig {
    pub doh_servers: Vec<DohServerConfig>,
    #[serde(default)]
    pub system_fallback: bool,
    #[serde(default = "default_lookup_attempts")]
    pub lookup_attempts: usize,
}

fn default_lookup_attempts() -> usize {
    2
}

/// DNS-over-HTTPS server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DohServerConfig {
    pub name: String,
    pub url: String,
    pub timeout_secs: u64,
}

/// Batch processing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    10
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

/// One `[[providers]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub patterns: Vec<String>,
    pub priority: u32,
}

impl AppConfig {
    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// The configuration template compiled into the binary
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_toml(DEFAULT_CONFIG)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.user_agent.is_empty() {
            return Err(ConfigError::EmptyRequired {
                field: "http.user_agent".to_string(),
            });
        }
        if self.http.request_timeout_secs == 0 {
            return Err(ConfigError::EmptyRequired {
                field: "http.request_timeout_secs".to_string(),
            });
        }

        if self.dns.doh_servers.is_empty() && !self.dns.system_fallback {
            return Err(ConfigError::EmptyRequired {
                field: "dns.doh_servers (required when dns.system_fallback = false)".to_string(),
            });
        }
        if self.dns.lookup_attempts == 0 {
            return Err(ConfigError::EmptyRequired {
                field: "dns.lookup_attempts".to_string(),
            });
        }
        for (i, server) in self.dns.doh_servers.iter().enumerate() {
            if !server.url.starts_with("https://") {
                return Err(ConfigError::InvalidUrl {
                    field: format!("dns.doh_servers[{}].url", i),
                    url: server.url.clone(),
                });
            }
        }

        if self.pipeline.batch_size == 0 {
            return Err(ConfigError::EmptyRequired {
                field: "pipeline.batch_size".to_string(),
            });
        }

        if self.providers.is_empty() {
            return Err(ConfigError::EmptyRequired {
                field: "providers".to_string(),
            });
        }
        let mut seen = HashSet::new();
        for provider in &self.providers {
            if provider.name.trim().is_empty() {
                return Err(ConfigError::EmptyRequired {
                    field: "providers.name".to_string(),
                });
            }
            if provider.patterns.iter().all(|p| p.trim().is_empty()) {
                return Err(ConfigError::InvalidProvider {
                    name: provider.name.clone(),
                    reason: "at least one non-empty pattern is required".to_string(),
                });
            }
            if provider.priority == 0 {
                return Err(ConfigError::InvalidProvider {
                    name: provider.name.clone(),
                    reason: "priority must be greater than 0".to_string(),
                });
            }
            if !seen.insert(provider.name.as_str()) {
                return Err(ConfigError::DuplicateProvider(provider.name.clone()));
            }
        }

        Ok(())
    }

    /// Provider rules in configured order
    pub fn provider_rules(&self) -> Vec<ProviderRule> {
        self.providers
            .iter()
            .map(|p| ProviderRule::new(&p.name, p.patterns.iter().map(String::as_str), p.priority))
            .collect()
    }

    /// Create default configuration file at `path`
    pub fn create_default_config_at(path: &Path) -> Result<PathBuf, ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::File::create(path)?;
        file.write_all(DEFAULT_CONFIG.as_bytes())?;

        Ok(path.to_path_buf())
    }

    /// Check if stdin is a TTY (interactive terminal)
    pub fn is_interactive() -> bool {
        io::stdin().is_terminal()
    }

    /// Prompt user to create default config (only in interactive mode)
    pub fn prompt_create_config(path: &Path) -> Result<Option<PathBuf>, ConfigError> {
        if !Self::is_interactive() {
            return Ok(None);
        }

        print!("Configuration file not found. Create default config? [Y/n] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim().to_lowercase();

        if input.is_empty() || input == "y" || input == "yes" {
            let path = Self::create_default_config_at(path)?;
            Ok(Some(path))
        } else {
            Ok(None)
        }
    }
}
