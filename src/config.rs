//! Service configuration
//!
//! Every knob has a fixed default and can be overridden from a TOML file;
//! the CLI layers its own overrides on top of whatever was loaded.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Default User-Agent for outbound requests
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

fn default_sources() -> Vec<String> {
    [
        "https://raw.githubusercontent.com/hookzof/socks5_list/master/proxy.txt",
        "https://raw.githubusercontent.com/r00tee/Proxy-List/main/Socks5.txt",
        "https://raw.githubusercontent.com/TheSpeedX/PROXY-List/master/socks5.txt",
        "https://raw.githubusercontent.com/jetkai/proxy-list/main/online-proxies/txt/proxies-socks5.txt",
        "https://raw.githubusercontent.com/mmpx12/proxy-list/master/socks5.txt",
        "https://raw.githubusercontent.com/monosans/proxy-list/main/proxies/socks5.txt",
        "https://raw.githubusercontent.com/zevtyardt/proxy-list/main/socks5.txt",
        "https://raw.githubusercontent.com/prxchk/proxy-list/main/socks5.txt",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_trace_url() -> String {
    "https://cloudflare.com/cdn-cgi/trace".to_string()
}

fn default_target_url() -> String {
    "https://www.youtube.com".to_string()
}

/// Countries where the target service is blocked or heavily restricted.
/// Possibly stale; configuration data, not logic.
fn default_blocked_countries() -> Vec<String> {
    ["CN", "IR", "KP", "ER", "SS", "SY", "TJ", "TM"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_tor_flag_key() -> String {
    "t1".to_string()
}

fn default_quota() -> usize {
    220
}

fn default_sample_size() -> usize {
    2000
}

fn default_batch_size() -> usize {
    50
}

fn default_probe_timeout_secs() -> u64 {
    15
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_interval_secs() -> u64 {
    600
}

fn default_listen_port() -> u16 {
    8080
}

fn default_forwarder_bin() -> String {
    "gost".to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// URLs of public SOCKS5 proxy lists to harvest candidates from
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,
    /// Diagnostic endpoint returning `key=value` lines (egress location etc.)
    #[serde(default = "default_trace_url")]
    pub trace_url: String,
    /// Target service a proxy must be able to reach to be accepted
    #[serde(default = "default_target_url")]
    pub target_url: String,
    /// ISO country codes that disqualify a proxy's egress location
    #[serde(default = "default_blocked_countries")]
    pub blocked_countries: Vec<String>,
    /// Diagnostic key that flags Tor egress when set to "1"
    #[serde(default = "default_tor_flag_key")]
    pub tor_flag_key: String,
    /// Target number of valid proxies per cycle
    #[serde(default = "default_quota")]
    pub quota: usize,
    /// Cap on how many harvested candidates one cycle will consider
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
    /// Number of candidates probed concurrently per round
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Per-request timeout for probe requests (seconds)
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    /// Timeout for fetching each source list (seconds)
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Interval between validation cycle starts (seconds)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Local SOCKS5 listen port for the forwarding process
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    /// Path to the forwarding process binary
    #[serde(default = "default_forwarder_bin")]
    pub forwarder_bin: String,
    /// User-Agent sent on outbound requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        // serde's field defaults and Default must agree; build through an
        // empty TOML document so there is a single source of truth.
        toml::from_str("").expect("empty config must deserialize")
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        info!(
            sources = config.sources.len(),
            quota = config.quota,
            "loaded configuration"
        );
        Ok(config)
    }

    /// Check values that would make the service inert or unbounded.
    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(Error::Config("no proxy list sources configured".into()));
        }
        if self.quota == 0 {
            return Err(Error::Config("quota must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".into()));
        }
        if self.probe_timeout_secs == 0 {
            return Err(Error::Config("probe_timeout_secs must be at least 1".into()));
        }
        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}
