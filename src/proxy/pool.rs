//! Pool controller
//!
//! Owns the current valid-proxy set and the forwarding process, and drives
//! the harvest → validate → reconfigure cycle on a fixed interval. The set
//! is replaced wholesale after each successful cycle; a cycle that finds
//! nothing falls back to the last known good set rather than tearing down a
//! working service.

use crate::config::Config;
use crate::error::Result;
use crate::proxy::forwarder::{Forwarder, ForwardingSpec, GostForwarder};
use crate::proxy::models::Candidate;
use crate::proxy::probe::{Probe, TwoStageProbe};
use crate::proxy::sources::Harvester;
use crate::proxy::validator::Validator;
use rand::seq::SliceRandom;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Controller lifecycle. There is no terminal state; the controller cycles
/// until the process is stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Created, no cycle run yet
    Idle,
    /// A validation cycle is in progress
    Validating,
    /// The forwarding process is serving a non-empty valid set
    Serving,
    /// Nothing can be served: no valid set and no running process
    Degraded,
}

pub struct PoolController<P: Probe, F: Forwarder> {
    config: Config,
    harvester: Harvester,
    probe: P,
    validator: Validator,
    forwarder: F,
    state: PoolState,
    valid: Vec<Candidate>,
    serving: bool,
}

impl PoolController<TwoStageProbe, GostForwarder> {
    pub fn new(config: Config) -> Result<Self> {
        let probe = TwoStageProbe::new(&config);
        let forwarder = GostForwarder::new(config.forwarder_bin.clone());
        Self::with_parts(config, probe, forwarder)
    }
}

impl<P: Probe, F: Forwarder> PoolController<P, F> {
    pub fn with_parts(config: Config, probe: P, forwarder: F) -> Result<Self> {
        let harvester = Harvester::new(&config)?;
        let validator = Validator::from_config(&config);
        Ok(Self {
            config,
            harvester,
            probe,
            validator,
            forwarder,
            state: PoolState::Idle,
            valid: Vec::new(),
            serving: false,
        })
    }

    pub fn state(&self) -> PoolState {
        self.state
    }

    pub fn valid_proxies(&self) -> &[Candidate] {
        &self.valid
    }

    /// Run cycles forever on the configured interval.
    ///
    /// Cycles are serialized: the next tick is not awaited until the
    /// current cycle (including the forwarder restart) has finished, and a
    /// tick that lands while a cycle is still running is skipped rather
    /// than queued, so two cycles can never race a restart.
    pub async fn run(&mut self) {
        let mut ticker = tokio::time::interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            // First tick completes immediately: the initial cycle runs at
            // startup, not one interval later.
            ticker.tick().await;
            self.run_cycle().await;
        }
    }

    /// One full cycle: harvest, shuffle, sample, validate, reconfigure.
    pub async fn run_cycle(&mut self) {
        self.state = PoolState::Validating;

        let (candidates, reports) = self.harvester.fetch_all().await;
        let sources_ok = reports.iter().filter(|r| r.is_success()).count();
        info!(
            sources_ok,
            sources = reports.len(),
            candidates = candidates.len(),
            "harvest finished"
        );

        let mut sample: Vec<Candidate> = candidates.into_iter().collect();
        sample.shuffle(&mut rand::thread_rng());
        sample.truncate(self.config.sample_size);

        let accepted = self.validator.validate(&self.probe, sample).await;
        info!(accepted = accepted.len(), quota = self.config.quota, "cycle finished");

        self.apply_cycle_result(accepted).await;
    }

    /// State machine step for one cycle's validation result.
    pub async fn apply_cycle_result(&mut self, accepted: Vec<Candidate>) {
        if accepted.is_empty() {
            if self.valid.is_empty() {
                warn!("no valid proxies found and no previous set; stopping service");
                self.forwarder.stop().await;
                self.serving = false;
                self.state = PoolState::Degraded;
            } else {
                // Last-known-good fallback: previous set and process are
                // left untouched.
                warn!(
                    kept = self.valid.len(),
                    "no valid proxies found this cycle; keeping previous set"
                );
                self.state = if self.serving {
                    PoolState::Serving
                } else {
                    PoolState::Degraded
                };
            }
            return;
        }

        self.valid = accepted;
        let spec = ForwardingSpec::new(self.config.listen_port, self.valid.clone());
        match self.forwarder.restart(&spec).await {
            Ok(()) => {
                info!(
                    proxies = self.valid.len(),
                    port = self.config.listen_port,
                    round_robin = spec.is_round_robin(),
                    "forwarding process serving new proxy set"
                );
                self.serving = true;
                self.state = PoolState::Serving;
            }
            Err(e) => {
                error!(error = %e, "failed to start forwarding process");
                self.serving = false;
                self.state = PoolState::Degraded;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::models::ProbeOutcome;
    use async_trait::async_trait;

    struct NeverProbe;

    #[async_trait]
    impl Probe for NeverProbe {
        async fn probe(&self, candidate: Candidate) -> ProbeOutcome {
            ProbeOutcome::Rejected(
                candidate,
                crate::proxy::models::RejectReason::Unreachable("test".into()),
            )
        }
    }

    #[derive(Default)]
    struct RecordingForwarder {
        restarts: Vec<ForwardingSpec>,
        stops: usize,
        fail_next_restart: bool,
    }

    #[async_trait]
    impl Forwarder for RecordingForwarder {
        async fn restart(&mut self, spec: &ForwardingSpec) -> Result<()> {
            if self.fail_next_restart {
                self.fail_next_restart = false;
                return Err(crate::error::Error::Spawn {
                    command: "gost".into(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "test"),
                });
            }
            self.restarts.push(spec.clone());
            Ok(())
        }

        async fn stop(&mut self) {
            self.stops += 1;
        }
    }

    fn controller() -> PoolController<NeverProbe, RecordingForwarder> {
        PoolController::with_parts(Config::default(), NeverProbe, RecordingForwarder::default())
            .unwrap()
    }

    fn proxies(n: usize) -> Vec<Candidate> {
        (0..n)
            .map(|i| Candidate::new(format!("10.1.1.{i}"), 1080))
            .collect()
    }

    #[tokio::test]
    async fn test_accepting_result_starts_serving() {
        let mut controller = controller();
        assert_eq!(controller.state(), PoolState::Idle);

        controller.apply_cycle_result(proxies(3)).await;
        assert_eq!(controller.state(), PoolState::Serving);
        assert_eq!(controller.valid_proxies().len(), 3);

        let spec = &controller.forwarder.restarts[0];
        assert_eq!(spec.listen_port, 8080);
        assert_eq!(spec.upstreams.len(), 3);
        assert!(spec.is_round_robin());
    }

    #[tokio::test]
    async fn test_empty_result_without_prior_set_degrades() {
        let mut controller = controller();
        controller.apply_cycle_result(Vec::new()).await;
        assert_eq!(controller.state(), PoolState::Degraded);
        assert_eq!(controller.forwarder.stops, 1);
        assert!(controller.valid_proxies().is_empty());
    }

    #[tokio::test]
    async fn test_empty_result_with_prior_set_keeps_serving() {
        let mut controller = controller();
        controller.apply_cycle_result(proxies(2)).await;
        assert_eq!(controller.forwarder.restarts.len(), 1);

        controller.apply_cycle_result(Vec::new()).await;
        assert_eq!(controller.state(), PoolState::Serving);
        assert_eq!(controller.valid_proxies().len(), 2);
        // Prior process untouched: no extra restart, no stop
        assert_eq!(controller.forwarder.restarts.len(), 1);
        assert_eq!(controller.forwarder.stops, 0);
    }

    #[tokio::test]
    async fn test_new_result_replaces_set_wholesale() {
        let mut controller = controller();
        controller.apply_cycle_result(proxies(2)).await;
        let replacement = vec![Candidate::new("10.2.2.2", 4145)];
        controller.apply_cycle_result(replacement.clone()).await;
        assert_eq!(controller.valid_proxies(), replacement.as_slice());
        assert_eq!(controller.forwarder.restarts.len(), 2);
        assert!(!controller.forwarder.restarts[1].is_round_robin());
    }

    #[tokio::test]
    async fn test_spawn_failure_degrades_cycle() {
        let mut controller = controller();
        controller.forwarder.fail_next_restart = true;
        controller.apply_cycle_result(proxies(2)).await;
        assert_eq!(controller.state(), PoolState::Degraded);

        // A later empty cycle must not pretend the dead process is serving.
        controller.apply_cycle_result(Vec::new()).await;
        assert_eq!(controller.state(), PoolState::Degraded);

        // And a later good cycle recovers.
        controller.apply_cycle_result(proxies(1)).await;
        assert_eq!(controller.state(), PoolState::Serving);
    }
}
