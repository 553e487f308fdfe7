//! Two-stage candidate probing
//!
//! Stage 1 pulls a diagnostic trace through the candidate's SOCKS5 tunnel
//! and applies the egress policy (location known, country not blocked, not a
//! Tor exit). Stage 2 confirms the target service answers through the same
//! tunnel. The stages short-circuit: most candidates never reach stage 2.

use crate::config::Config;
use crate::proxy::models::{Candidate, ProbeOutcome, RejectReason};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// A probe decides whether one candidate is usable.
///
/// Implementations must never error: every failure mode collapses into
/// `ProbeOutcome::Rejected`, so one bad candidate can never affect another.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, candidate: Candidate) -> ProbeOutcome;
}

/// The production probe: diagnostic trace + target availability, both
/// routed entirely through the candidate.
pub struct TwoStageProbe {
    trace_url: String,
    target_url: String,
    blocked_countries: HashSet<String>,
    tor_flag_key: String,
    timeout: Duration,
    user_agent: String,
}

impl TwoStageProbe {
    pub fn new(config: &Config) -> Self {
        Self {
            trace_url: config.trace_url.clone(),
            target_url: config.target_url.clone(),
            blocked_countries: config.blocked_countries.iter().cloned().collect(),
            tor_flag_key: config.tor_flag_key.clone(),
            timeout: config.probe_timeout(),
            user_agent: config.user_agent.clone(),
        }
    }

    /// Build a client whose every request tunnels through the candidate.
    /// The timeout applies per request, so each of the two stages carries
    /// its own bound.
    fn client_for(&self, candidate: &Candidate) -> reqwest::Result<Client> {
        let proxy = reqwest::Proxy::all(candidate.socks_url())?;
        Client::builder()
            .proxy(proxy)
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()
    }

    async fn fetch_trace(&self, client: &Client) -> reqwest::Result<HashMap<String, String>> {
        let response = client
            .get(&self.trace_url)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        Ok(parse_trace(&body))
    }

    /// Apply the egress policy to a parsed trace.
    fn check_policy(&self, trace: &HashMap<String, String>) -> Result<(), RejectReason> {
        let loc = trace.get("loc").ok_or(RejectReason::MissingLocation)?;
        if self.blocked_countries.contains(loc) {
            return Err(RejectReason::BlockedCountry(loc.clone()));
        }
        if trace.get(&self.tor_flag_key).map(String::as_str) == Some("1") {
            return Err(RejectReason::TorExit);
        }
        Ok(())
    }
}

#[async_trait]
impl Probe for TwoStageProbe {
    async fn probe(&self, candidate: Candidate) -> ProbeOutcome {
        let client = match self.client_for(&candidate) {
            Ok(client) => client,
            Err(e) => {
                return ProbeOutcome::Rejected(candidate, RejectReason::Client(e.to_string()))
            }
        };

        // Stage 1: reachability + egress policy
        let trace = match self.fetch_trace(&client).await {
            Ok(trace) => trace,
            Err(e) => {
                return ProbeOutcome::Rejected(candidate, RejectReason::Unreachable(e.to_string()))
            }
        };
        if let Err(reason) = self.check_policy(&trace) {
            return ProbeOutcome::Rejected(candidate, reason);
        }

        // Stage 2: target availability; a success status is enough
        match client
            .get(&self.target_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
        {
            Ok(_) => ProbeOutcome::Accepted(candidate),
            Err(e) => ProbeOutcome::Rejected(candidate, RejectReason::TargetUnavailable(e.to_string())),
        }
    }
}

/// Parse a diagnostic response of newline-separated `key=value` pairs.
/// Lines without `=` are skipped; values may themselves contain `=`.
pub fn parse_trace(body: &str) -> HashMap<String, String> {
    body.lines()
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}
