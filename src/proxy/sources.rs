//! Candidate harvesting from public proxy lists
//!
//! Each source is a plain-text (or text-ish) document somewhere on the
//! internet; anything matching `ip:port` in the body is taken as a
//! candidate. Sources fail constantly — a failed source is logged, reported,
//! and skipped, never fatal.

use crate::config::Config;
use crate::error::Result;
use crate::proxy::models::Candidate;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Regex to match IP:PORT tokens in text. Octet ranges are not validated;
/// a token like `999.1.1.1:80` is harvested and left to fail probing.
static IP_PORT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}):(\d{1,5})\b")
        .expect("Invalid IP:PORT regex")
});

/// Result of fetching a single source
#[derive(Debug, Clone)]
pub struct FetchReport {
    /// URL that was fetched
    pub source: String,
    /// Number of tokens extracted (before cross-source deduplication)
    pub found: usize,
    /// Error message if the fetch failed
    pub error: Option<String>,
}

impl FetchReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Harvester that pulls candidate proxies from a set of list URLs
pub struct Harvester {
    sources: Vec<String>,
    client: Client,
}

impl Harvester {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.fetch_timeout())
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            sources: config.sources.clone(),
            client,
        })
    }

    /// Fetch every configured source and return the deduplicated candidate
    /// set together with a per-source report.
    pub async fn fetch_all(&self) -> (HashSet<Candidate>, Vec<FetchReport>) {
        let mut candidates = HashSet::new();
        let mut reports = Vec::with_capacity(self.sources.len());

        for url in &self.sources {
            match self.fetch_source(url).await {
                Ok(found) => {
                    debug!(source = %url, found = found.len(), "fetched source");
                    reports.push(FetchReport {
                        source: url.clone(),
                        found: found.len(),
                        error: None,
                    });
                    candidates.extend(found);
                }
                Err(e) => {
                    warn!(source = %url, error = %e, "failed to fetch source");
                    reports.push(FetchReport {
                        source: url.clone(),
                        found: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        (candidates, reports)
    }

    async fn fetch_source(&self, url: &str) -> Result<Vec<Candidate>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let content = response.text().await?;
        Ok(extract_candidates(&content))
    }
}

/// Extract `ip:port` tokens from raw text content.
pub fn extract_candidates(content: &str) -> Vec<Candidate> {
    IP_PORT_REGEX
        .captures_iter(content)
        .filter_map(|cap| {
            let host = cap.get(1)?.as_str().to_string();
            let port: u16 = cap.get(2)?.as_str().parse().ok()?;
            Some(Candidate::new(host, port))
        })
        .collect()
}
