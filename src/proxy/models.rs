//! Proxy data models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A candidate SOCKS5 proxy endpoint pulled from a public list.
///
/// A candidate is a plain value: two candidates with the same host and port
/// are the same candidate, so harvested duplicates collapse under set
/// semantics. No validation is done beyond the `host:port` shape — a
/// candidate with a nonsense address simply fails probing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    pub host: String,
    pub port: u16,
}

impl Candidate {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// SOCKS5 proxy URL for this candidate.
    ///
    /// Uses the `socks5h` scheme so DNS resolution happens through the
    /// tunnel as well; resolving locally would leak the real resolver and
    /// bias the geo check.
    pub fn socks_url(&self) -> String {
        format!("socks5h://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for Candidate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("missing port in {s:?}"))?;
        if host.is_empty() {
            return Err(format!("missing host in {s:?}"));
        }
        let port: u16 = port.parse().map_err(|_| format!("bad port in {s:?}"))?;
        Ok(Self::new(host, port))
    }
}

/// Why a candidate failed the probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Could not build an HTTP client around the candidate.
    Client(String),
    /// The diagnostic request errored or timed out.
    Unreachable(String),
    /// The diagnostic response carried no location key.
    MissingLocation,
    /// Egress country is on the blocklist.
    BlockedCountry(String),
    /// Egress is flagged as a Tor exit.
    TorExit,
    /// The target service request errored or returned a non-success status.
    TargetUnavailable(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Client(e) => write!(f, "client setup failed: {e}"),
            RejectReason::Unreachable(e) => write!(f, "diagnostic request failed: {e}"),
            RejectReason::MissingLocation => write!(f, "diagnostic response missing location"),
            RejectReason::BlockedCountry(cc) => write!(f, "blocked country: {cc}"),
            RejectReason::TorExit => write!(f, "tor exit node"),
            RejectReason::TargetUnavailable(e) => write!(f, "target unavailable: {e}"),
        }
    }
}

/// Outcome of probing a single candidate.
///
/// Rejection is the common case (well over 90% of public-list candidates
/// fail) and is carried as data, never as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Accepted(Candidate),
    Rejected(Candidate, RejectReason),
}

impl ProbeOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ProbeOutcome::Accepted(_))
    }

    pub fn candidate(&self) -> &Candidate {
        match self {
            ProbeOutcome::Accepted(c) => c,
            ProbeOutcome::Rejected(c, _) => c,
        }
    }
}
