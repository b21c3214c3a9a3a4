use anyhow::{Context, Result};
use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, DohServerConfig};

/// DNS answer type code for MX records
const MX_RECORD_TYPE: u64 = 15;

/// Source of mail-exchange host names for a domain.
///
/// Implementations never fail: any resolution problem yields an empty list.
#[async_trait]
pub trait MxLookup: Send + Sync {
    /// Lowercase mail-exchange host names for `domain`, without trailing dots
    async fn mx_hosts(&self, domain: &str) -> Vec<String>;
}

/// MX resolver that rotates through DNS-over-HTTPS servers, with an optional
/// fallback to the system resolver
pub struct DohMxLookup {
    doh_servers: Vec<DohServerConfig>,
    current_doh_index: AtomicUsize,
    attempts: usize,
    system_fallback: bool,
    client: reqwest::Client,
}

impl DohMxLookup {
    /// Create a resolver from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http.request_timeout_secs))
            .user_agent(&config.http.user_agent)
            .build()
            .context("Failed to create HTTP client for DoH")?;

        Ok(Self {
            doh_servers: config.dns.doh_servers.clone(),
            current_doh_index: AtomicUsize::new(0),
            attempts: config.dns.lookup_attempts.max(1),
            system_fallback: config.dns.system_fallback,
            client,
        })
    }

    /// Create a resolver that only talks to the given DoH endpoints.
    ///
    /// No system fallback is used, which makes this suitable for pointing at
    /// a mock server.
    pub fn with_urls(urls: Vec<String>, timeout_secs: u64) -> Result<Self> {
        let doh_servers = urls
            .into_iter()
            .enumerate()
            .map(|(i, url)| DohServerConfig {
                url,
                name: format!("DoH Server {}", i + 1),
                timeout_secs,
            })
            .collect();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("leadclean/0.1")
            .build()
            .context("Failed to create HTTP client for DoH")?;

        Ok(Self {
            doh_servers,
            current_doh_index: AtomicUsize::new(0),
            attempts: 2,
            system_fallback: false,
            client,
        })
    }

    /// Get the next DoH server in rotation
    fn next_doh_server(&self) -> Option<&DohServerConfig> {
        if self.doh_servers.is_empty() {
            return None;
        }
        let index = self.current_doh_index.fetch_add(1, Ordering::Relaxed) % self.doh_servers.len();
        self.doh_servers.get(index)
    }

    /// Perform DNS over HTTPS lookup for MX records
    async fn doh_mx_lookup(&self, domain: &str, server: &DohServerConfig) -> Result<Vec<String>> {
        debug!("DoH MX lookup for {} using {}", domain, server.name);

        let query_params = [("name", domain), ("type", "MX")];

        let response = self
            .client
            .get(&server.url)
            .query(&query_params)
            .header("Accept", "application/dns-json")
            .timeout(Duration::from_secs(server.timeout_secs))
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        let mut records = Vec::new();

        if let Some(answers) = response["Answer"].as_array() {
            for answer in answers {
                if answer["type"].as_u64() == Some(MX_RECORD_TYPE) {
                    if let Some(host) = answer["data"].as_str().and_then(parse_mx_data) {
                        records.push(host);
                    }
                }
            }
        }

        debug!("DoH found {} MX records for {} via {}", records.len(), domain, server.name);
        Ok(records)
    }
}

#[async_trait]
impl MxLookup for DohMxLookup {
    async fn mx_hosts(&self, domain: &str) -> Vec<String> {
        debug!("Querying MX records for domain: {}", domain);

        // A successful answer, even an empty one, is final; only transport
        // or HTTP errors move on to the next server.
        for attempt in 0..self.attempts {
            let Some(doh_server) = self.next_doh_server() else {
                break;
            };
            debug!("DoH attempt {} for {}: using {}", attempt + 1, domain, doh_server.name);

            match self.doh_mx_lookup(domain, doh_server).await {
                Ok(records) => return records,
                Err(e) => {
                    debug!("DoH lookup failed for {} via {}: {}", domain, doh_server.name, e);
                }
            }
        }

        if !self.system_fallback {
            warn!("MX lookup failed for {} (all DoH attempts errored) - treating as no records", domain);
            return Vec::new();
        }

        info!("DoH failed, falling back to system resolver for {}", domain);
        match try_system_dns_resolver(domain).await {
            Ok(records) => {
                debug!("Found {} MX records for {} via system resolver", records.len(), domain);
                records
            }
            Err(e) => {
                warn!("All MX resolution failed for {} (DoH and system resolver) - treating as no records. Last error: {}", domain, e);
                Vec::new()
            }
        }
    }
}

async fn try_system_dns_resolver(domain: &str) -> Result<Vec<String>> {
    let resolver = TokioAsyncResolver::tokio_from_system_conf()?;

    let mx_lookup = resolver.mx_lookup(domain).await?;
    let records = mx_lookup
        .iter()
        .filter_map(|mx| parse_mx_data(&mx.exchange().to_utf8()))
        .collect();

    Ok(records)
}

/// Extract the host from MX answer data.
///
/// DoH answers carry the preference ("10 aspmx.l.google.com."); the system
/// resolver hands over the bare exchange name. Both end up as
/// "aspmx.l.google.com".
pub fn parse_mx_data(data: &str) -> Option<String> {
    let host = data
        .split_whitespace()
        .last()?
        .trim_end_matches('.')
        .to_lowercase();

    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}
