use crate::relay::{BundleRelay, BundleStatsV2};
use alloy::primitives::B256;
use init4_bin_base::deps::metrics::counter;
use tracing::{info, warn};

/// Fetches and logs relay statistics for submitted bundles.
///
/// Purely diagnostic: every failure is logged and swallowed.
#[derive(Debug)]
pub struct StatsCollector<'a, R> {
    relay: &'a R,
}

impl<'a, R: BundleRelay> StatsCollector<'a, R> {
    /// Creates a collector over `relay`.
    pub const fn new(relay: &'a R) -> Self {
        Self { relay }
    }

    /// Fetches statistics for `bundle_hash` at `block`, returning `None` on
    /// any failure.
    pub async fn collect(&self, bundle_hash: B256, block: u64) -> Option<BundleStatsV2> {
        let reply = match self.relay.bundle_stats(bundle_hash, block).await {
            Ok(reply) => reply,
            Err(err) => {
                counter!("bundler.stats_failures").increment(1);
                warn!(%err, %bundle_hash, block, "failed to fetch bundle stats");
                return None;
            }
        };

        match reply.into_result() {
            Ok(stats) => {
                info!(
                    %bundle_hash,
                    block,
                    is_simulated = stats.is_simulated,
                    is_high_priority = stats.is_high_priority,
                    received_at = stats.received_at.as_deref().unwrap_or_default(),
                    simulated_at = stats.simulated_at.as_deref().unwrap_or_default(),
                    considered_by = stats.considered_by_builders_at.len(),
                    sealed_by = stats.sealed_by_builders_at.len(),
                    "bundle stats"
                );
                Some(stats)
            }
            Err(err) => {
                counter!("bundler.stats_failures").increment(1);
                warn!(%err, %bundle_hash, block, "relay refused bundle stats");
                None
            }
        }
    }
}
