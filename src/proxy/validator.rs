//! Batched concurrent validation engine
//!
//! Turns an unbounded, noisy candidate stream into a bounded, quality-
//! filtered set. Candidates are probed in fixed-size rounds: every probe in
//! a round runs concurrently, the round ends only when the slowest probe
//! resolves, and the quota check happens between rounds. Bounding the round
//! size bounds open connections; checking the quota between rounds means at
//! most one round of extra probing after the quota is met.

use crate::config::Config;
use crate::proxy::models::{Candidate, ProbeOutcome};
use crate::proxy::probe::Probe;
use futures::stream::{self, StreamExt};
use tracing::{debug, info};

pub struct Validator {
    quota: usize,
    batch_size: usize,
}

impl Validator {
    pub fn new(quota: usize, batch_size: usize) -> Self {
        Self { quota, batch_size }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.quota, config.batch_size)
    }

    /// Probe candidates until the quota is met or the input runs out.
    ///
    /// Returns at most `quota` accepted candidates. Order across rounds is
    /// deterministic; order within a round follows probe completion.
    /// Returning fewer than `quota` is a normal outcome, not an error. A
    /// rejected candidate is gone for this cycle — no retries.
    pub async fn validate<P: Probe + ?Sized>(
        &self,
        probe: &P,
        candidates: Vec<Candidate>,
    ) -> Vec<Candidate> {
        let mut accepted: Vec<Candidate> = Vec::new();
        let mut input = candidates.into_iter();
        let mut probed = 0usize;

        while accepted.len() < self.quota {
            let batch: Vec<Candidate> = input.by_ref().take(self.batch_size).collect();
            if batch.is_empty() {
                break;
            }
            probed += batch.len();

            // collect() acts as the round barrier: it resolves only once
            // every probe in the batch has returned. Each probe carries its
            // own timeout, so a hung candidate sets the round's floor
            // latency but cannot stall it forever.
            let outcomes: Vec<ProbeOutcome> = stream::iter(batch)
                .map(|candidate| probe.probe(candidate))
                .buffer_unordered(self.batch_size)
                .collect()
                .await;

            for outcome in outcomes {
                match outcome {
                    ProbeOutcome::Accepted(candidate) => {
                        info!(proxy = %candidate, "found valid proxy");
                        accepted.push(candidate);
                    }
                    ProbeOutcome::Rejected(candidate, reason) => {
                        debug!(candidate = %candidate, reason = %reason, "candidate rejected");
                    }
                }
            }

            info!(
                accepted = accepted.len(),
                quota = self.quota,
                probed,
                "validation progress"
            );
        }

        accepted.truncate(self.quota);
        accepted
    }
}
