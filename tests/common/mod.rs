#![allow(dead_code)]

pub mod fixtures;
pub mod wiremock_helpers;

use async_trait::async_trait;
use leadclean::dns::MxLookup;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory MX table that records every lookup it serves
#[derive(Default)]
pub struct CountingLookup {
    hosts: HashMap<String, Vec<String>>,
    calls: AtomicUsize,
    queried: Mutex<Vec<String>>,
}

impl CountingLookup {
    pub fn new(entries: &[(&str, &[&str])]) -> Self {
        let hosts = entries
            .iter()
            .map(|(domain, mx)| (domain.to_string(), mx.iter().map(|h| h.to_string()).collect()))
            .collect();
        Self {
            hosts,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }
}

#[async_trait]
impl MxLookup for CountingLookup {
    async fn mx_hosts(&self, domain: &str) -> Vec<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queried.lock().unwrap().push(domain.to_string());
        self.hosts.get(domain).cloned().unwrap_or_default()
    }
}
