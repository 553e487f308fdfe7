//! Proxy Rotator - rotating SOCKS5 proxy pool
//!
//! Harvests candidate proxies from public lists, validates them in batched
//! concurrent rounds against a two-stage acceptance policy, and keeps an
//! external forwarding process round-robining traffic across the current
//! valid set on a single local SOCKS5 endpoint.

pub mod config;
pub mod error;
pub mod proxy;

pub use config::Config;
pub use error::{Error, Result};
pub use proxy::*;

/// Initialize the logger with default settings
pub fn init_logger() {
    use tracing_subscriber::{fmt, EnvFilter};

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();
}
