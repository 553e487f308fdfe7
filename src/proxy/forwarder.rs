//! Forwarding process control
//!
//! The actual load balancing is done by an external `gost` process: it
//! listens on a local SOCKS5 port and forwards to the current valid
//! proxies, round-robin when there is more than one. This module derives
//! the command line from a spec and owns the process handle. Restart is
//! terminate-then-spawn; a brief traffic gap on rotation is accepted.

use crate::error::{Error, Result};
use crate::proxy::models::Candidate;
use async_trait::async_trait;
use tokio::process::{Child, Command};
use tracing::{info, warn};

/// Immutable per-cycle description of the forwarding process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardingSpec {
    pub listen_port: u16,
    pub upstreams: Vec<Candidate>,
}

impl ForwardingSpec {
    pub fn new(listen_port: u16, upstreams: Vec<Candidate>) -> Self {
        Self {
            listen_port,
            upstreams,
        }
    }

    /// Round-robin only makes sense with more than one upstream.
    pub fn is_round_robin(&self) -> bool {
        self.upstreams.len() > 1
    }

    /// Argument list for the forwarding binary: one listen directive, one
    /// forward directive per upstream, and the balancing strategy when
    /// round-robin applies.
    pub fn command_args(&self) -> Vec<String> {
        let mut args = vec!["-L".to_string(), format!("socks5://:{}", self.listen_port)];
        for upstream in &self.upstreams {
            args.push("-F".to_string());
            args.push(format!("socks5://{upstream}"));
        }
        if self.is_round_robin() {
            args.push("-F".to_string());
            args.push("round".to_string());
        }
        args
    }
}

/// Handle on the forwarding process. A trait seam so the pool controller
/// can be exercised without spawning anything.
#[async_trait]
pub trait Forwarder: Send {
    /// Replace any running process with one configured per `spec`.
    async fn restart(&mut self, spec: &ForwardingSpec) -> Result<()>;

    /// Terminate the running process, if any.
    async fn stop(&mut self);
}

/// The real forwarder: spawns and kills a `gost` child process. At most one
/// child is alive at a time.
pub struct GostForwarder {
    binary: String,
    child: Option<Child>,
}

impl GostForwarder {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            child: None,
        }
    }
}

#[async_trait]
impl Forwarder for GostForwarder {
    async fn restart(&mut self, spec: &ForwardingSpec) -> Result<()> {
        self.stop().await;

        let args = spec.command_args();
        info!(binary = %self.binary, args = ?args, "starting forwarding process");
        let child = Command::new(&self.binary)
            .args(&args)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Spawn {
                command: self.binary.clone(),
                source: e,
            })?;
        self.child = Some(child);
        Ok(())
    }

    async fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            info!("stopping forwarding process");
            if let Err(e) = child.kill().await {
                warn!(error = %e, "failed to kill forwarding process");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_args_single_upstream() {
        let spec = ForwardingSpec::new(8080, vec![Candidate::new("1.2.3.4", 1080)]);
        assert!(!spec.is_round_robin());
        assert_eq!(
            spec.command_args(),
            vec!["-L", "socks5://:8080", "-F", "socks5://1.2.3.4:1080"]
        );
    }

    #[test]
    fn test_command_args_round_robin() {
        let spec = ForwardingSpec::new(
            1080,
            vec![Candidate::new("1.2.3.4", 1080), Candidate::new("5.6.7.8", 4145)],
        );
        assert!(spec.is_round_robin());
        assert_eq!(
            spec.command_args(),
            vec![
                "-L",
                "socks5://:1080",
                "-F",
                "socks5://1.2.3.4:1080",
                "-F",
                "socks5://5.6.7.8:4145",
                "-F",
                "round",
            ]
        );
    }

    #[test]
    fn test_command_args_no_upstreams() {
        // Never spawned in practice (the controller stops the process
        // instead), but the derivation itself stays well-defined.
        let spec = ForwardingSpec::new(8080, Vec::new());
        assert_eq!(spec.command_args(), vec!["-L", "socks5://:8080"]);
    }

    #[tokio::test]
    async fn test_restart_missing_binary_is_spawn_error() {
        let mut forwarder = GostForwarder::new("/nonexistent/forwarder-binary");
        let spec = ForwardingSpec::new(8080, vec![Candidate::new("1.2.3.4", 1080)]);
        let err = forwarder.restart(&spec).await.unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
        assert!(forwarder.child.is_none());
    }

    #[tokio::test]
    async fn test_stop_without_child_is_noop() {
        let mut forwarder = GostForwarder::new("gost");
        forwarder.stop().await;
        assert!(forwarder.child.is_none());
    }
}
