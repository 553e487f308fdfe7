//! Proxy pool modules
//!
//! This module provides functionality for:
//! - Harvesting candidate proxies from public SOCKS5 lists
//! - Probing candidates through their own tunnel (two-stage accept/reject)
//! - Batched concurrent validation up to a quota
//! - Driving the external forwarding process over the valid set

pub mod forwarder;
pub mod models;
pub mod pool;
pub mod probe;
pub mod sources;
pub mod validator;

pub use forwarder::{Forwarder, ForwardingSpec, GostForwarder};
pub use models::{Candidate, ProbeOutcome, RejectReason};
pub use pool::{PoolController, PoolState};
pub use probe::{Probe, TwoStageProbe};
pub use sources::{FetchReport, Harvester};
pub use validator::Validator;
