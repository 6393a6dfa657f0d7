use super::SubmissionError;
use crate::{
    bundle::SignedBundle,
    relay::{BundleRelay, BundleStatsV2},
    tasks::{
        resolve::{Resolution, ResolveInclusion},
        simulate::{SimulationGate, SimulationPolicy},
        stats::StatsCollector,
    },
};
use alloy::primitives::B256;
use init4_bin_base::deps::metrics::{counter, histogram};
use std::time::Instant;
use tracing::{Instrument, debug, debug_span, info};

/// Knobs for a submission run.
#[derive(Debug, Clone, Copy)]
pub struct SubmitSettings {
    /// How a failed pre-submission simulation is treated.
    pub simulation_policy: SimulationPolicy,
    /// Fetch relay statistics after each resolved attempt.
    pub collect_stats: bool,
}

impl Default for SubmitSettings {
    fn default() -> Self {
        Self { simulation_policy: SimulationPolicy::Advisory, collect_stats: true }
    }
}

/// One submission of the bundle against one target block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionAttempt {
    /// Block the bundle was submitted for.
    pub target_block: u64,
    /// Bundle hash returned by the relay.
    pub bundle_hash: B256,
    /// How the attempt resolved.
    pub resolution: Resolution,
    /// Relay statistics, if collected.
    pub stats: Option<BundleStatsV2>,
}

/// A successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inclusion {
    /// The attempt that was included.
    pub attempt: SubmissionAttempt,
    /// Number of submissions made, including the successful one.
    pub submissions: u64,
}

impl Inclusion {
    /// The block the bundle landed in.
    pub const fn block(&self) -> u64 {
        self.attempt.target_block
    }
}

/// Control flow after a resolved attempt.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ControlFlow {
    /// Try the next block.
    Retry,
    /// Included.
    Done,
    /// Inclusion is impossible.
    Halt,
}

impl From<Resolution> for ControlFlow {
    fn from(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Included => Self::Done,
            Resolution::NotIncludedInBlock => Self::Retry,
            Resolution::NonceTooHigh => Self::Halt,
        }
    }
}

/// Submits a signed bundle against successive blocks until it is included,
/// rejected, or can no longer be included.
///
/// Attempts are strictly serial: attempt `k + 1` is only issued after
/// attempt `k` resolved.
#[derive(Debug)]
pub struct SubmitTask<R, W> {
    relay: R,
    resolver: W,
    settings: SubmitSettings,
}

impl<R, W> SubmitTask<R, W>
where
    R: BundleRelay,
    W: ResolveInclusion,
{
    /// Creates a new `SubmitTask`.
    pub const fn new(relay: R, resolver: W, settings: SubmitSettings) -> Self {
        Self { relay, resolver, settings }
    }

    /// The relay in use.
    pub const fn relay(&self) -> &R {
        &self.relay
    }

    /// The resolver in use.
    pub const fn resolver(&self) -> &W {
        &self.resolver
    }

    /// Simulates `bundle` against `start_block`, then submits it against
    /// `start_block`, `start_block + 1`, ... for at most `max_attempts`
    /// blocks.
    pub async fn run_submission(
        &self,
        bundle: &SignedBundle,
        start_block: u64,
        max_attempts: u64,
    ) -> Result<Inclusion, SubmissionError> {
        let submitting_start_time = Instant::now();

        let result = self.submission_loop(bundle, start_block, max_attempts).await;

        let elapsed = submitting_start_time.elapsed().as_millis() as f64;
        histogram!("bundler.submit_timer").record(elapsed);
        match &result {
            Ok(inclusion) => info!(
                block = inclusion.block(),
                submissions = inclusion.submissions,
                submit_time = ?elapsed,
                "bundle included"
            ),
            Err(err) => info!(%err, fatal = err.is_fatal(), submit_time = ?elapsed, "bundle submission ended"),
        }
        result
    }

    async fn submission_loop(
        &self,
        bundle: &SignedBundle,
        start_block: u64,
        max_attempts: u64,
    ) -> Result<Inclusion, SubmissionError> {
        let span = debug_span!("SubmitTask::simulate", block = start_block);
        SimulationGate::new(&self.relay, self.settings.simulation_policy)
            .check(bundle, start_block)
            .instrument(span)
            .await?;

        for offset in 0..max_attempts {
            // Targets are a fixed window from `start_block`. The chain head is
            // deliberately not re-read between attempts.
            let Some(target_block) = start_block.checked_add(offset) else {
                return Err(SubmissionError::UnexpectedResponse(format!(
                    "block window from {start_block} overflows after {offset} attempts"
                )));
            };
            let span = debug_span!(
                "SubmitTask::attempt",
                target_block,
                attempt = offset + 1,
                max_attempts,
            );

            span_debug!(span, "submitting bundle");
            let attempt = self.attempt(bundle, target_block).instrument(span.clone()).await?;

            match ControlFlow::from(attempt.resolution) {
                ControlFlow::Retry if offset + 1 == max_attempts => {
                    counter!("bundler.not_included").increment(1);
                    span_warn!(span, "bundle not included - no attempts left");
                }
                ControlFlow::Retry => {
                    counter!("bundler.not_included").increment(1);
                    span_info!(span, "bundle not included - retrying next block");
                }
                ControlFlow::Done => {
                    counter!("bundler.included").increment(1);
                    span_info!(span, bundle_hash = %attempt.bundle_hash, "bundle included");
                    return Ok(Inclusion { attempt, submissions: offset + 1 });
                }
                ControlFlow::Halt => {
                    counter!("bundler.nonce_too_high").increment(1);
                    span_error!(span, "nonce too high - halting submission");
                    return Err(SubmissionError::NonceTooHigh { block: target_block });
                }
            }
        }

        Err(SubmissionError::ExhaustedRetries { start_block, attempts: max_attempts })
    }

    /// Submits for a single block and waits for its resolution.
    async fn attempt(
        &self,
        bundle: &SignedBundle,
        target_block: u64,
    ) -> Result<SubmissionAttempt, SubmissionError> {
        counter!("bundler.submissions").increment(1);

        let bundle_hash = self
            .relay
            .send_bundle(bundle, target_block)
            .await
            .map_err(SubmissionError::Rpc)?
            .into_result()
            .map_err(|reason| SubmissionError::SubmissionRejected { block: target_block, reason })?
            .bundle_hash;
        debug!(%bundle_hash, "bundle sent to relay");

        let resolution = self.resolver.await_resolution(bundle, target_block).await?;
        debug!(?resolution, "attempt resolved");

        let stats = match resolution {
            Resolution::NonceTooHigh => None,
            _ if !self.settings.collect_stats => None,
            _ => StatsCollector::new(&self.relay).collect(bundle_hash, target_block).await,
        };

        Ok(SubmissionAttempt { target_block, bundle_hash, resolution, stats })
    }
}
