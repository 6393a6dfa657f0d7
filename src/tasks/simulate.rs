use crate::{
    bundle::SignedBundle,
    relay::{BundleRelay, RelayError},
};
use alloy::{primitives::B256, rpc::types::mev::EthCallBundleResponse};
use init4_bin_base::deps::metrics::counter;
use tracing::{debug, instrument, warn};

/// What a failed simulation means for the submission that follows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SimulationPolicy {
    /// Log the failure and submit anyway. Chain state may change between
    /// the simulation and the target block.
    #[default]
    Advisory,
    /// Abort the run before any submission.
    Blocking,
}

impl SimulationPolicy {
    /// `Blocking` if `strict`, else `Advisory`.
    pub const fn from_strict(strict: bool) -> Self {
        if strict { Self::Blocking } else { Self::Advisory }
    }
}

/// A failed bundle simulation.
#[derive(thiserror::Error, Debug)]
pub enum SimulationError {
    /// The simulation request did not complete.
    #[error("simulation request failed: {0}")]
    Transport(eyre::Report),

    /// The relay answered with an error.
    #[error("simulation rejected: {0}")]
    Relay(#[from] RelayError),

    /// A bundle transaction reverted.
    #[error("transaction {index} ({tx_hash}) reverted in simulation: {reason}")]
    Reverted {
        /// Position of the transaction in the bundle.
        index: usize,
        /// Hash of the reverting transaction.
        tx_hash: B256,
        /// Revert reason reported by the relay.
        reason: String,
    },
}

impl SimulationError {
    /// True if a transaction reverted, as opposed to the request failing.
    pub const fn is_revert(&self) -> bool {
        matches!(self, Self::Reverted { .. })
    }
}

/// Dry-runs a signed bundle through the relay before submission.
#[derive(Debug)]
pub struct SimulationGate<'a, R> {
    relay: &'a R,
    policy: SimulationPolicy,
}

impl<'a, R: BundleRelay> SimulationGate<'a, R> {
    /// Creates a gate over `relay` applying `policy` to failures.
    pub const fn new(relay: &'a R, policy: SimulationPolicy) -> Self {
        Self { relay, policy }
    }

    /// Simulates `bundle` against `block`, classifying every failure.
    pub async fn simulate(
        &self,
        bundle: &SignedBundle,
        block: u64,
    ) -> Result<EthCallBundleResponse, SimulationError> {
        let resp = self
            .relay
            .simulate(bundle, block)
            .await
            .map_err(SimulationError::Transport)?
            .into_result()?;

        if let Some((index, result)) =
            resp.results.iter().enumerate().find(|(_, result)| result.revert.is_some())
        {
            return Err(SimulationError::Reverted {
                index,
                tx_hash: result.tx_hash,
                reason: result.revert.clone().unwrap_or_default(),
            });
        }

        Ok(resp)
    }

    /// Simulates and applies the policy. Under [`SimulationPolicy::Advisory`]
    /// failures are logged and `Ok(None)` is returned.
    #[instrument(skip(self, bundle), fields(policy = ?self.policy))]
    pub async fn check(
        &self,
        bundle: &SignedBundle,
        block: u64,
    ) -> Result<Option<EthCallBundleResponse>, SimulationError> {
        match self.simulate(bundle, block).await {
            Ok(resp) => {
                debug!(
                    total_gas_used = resp.total_gas_used,
                    bundle_hash = %resp.bundle_hash,
                    "bundle simulated"
                );
                Ok(Some(resp))
            }
            Err(err) => {
                counter!("bundler.simulation_failures").increment(1);
                match self.policy {
                    SimulationPolicy::Advisory => {
                        warn!(%err, "bundle simulation failed - submitting anyway");
                        Ok(None)
                    }
                    SimulationPolicy::Blocking => Err(err),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeRelay, SimBehavior, signed_test_bundle};

    #[tokio::test]
    async fn success_returns_response() {
        let relay = FakeRelay::default();
        let bundle = signed_test_bundle(1).await;

        let gate = SimulationGate::new(&relay, SimulationPolicy::Blocking);
        assert!(gate.check(&bundle, 10).await.unwrap().is_some());
        assert_eq!(relay.simulated(), vec![10]);
    }

    #[tokio::test]
    async fn revert_is_classified() {
        let relay = FakeRelay::default().with_simulation(SimBehavior::Revert("bad".into()));
        let bundle = signed_test_bundle(2).await;

        let err = SimulationGate::new(&relay, SimulationPolicy::Blocking)
            .simulate(&bundle, 10)
            .await
            .unwrap_err();

        let SimulationError::Reverted { index, tx_hash, reason } = err else {
            panic!("expected revert");
        };
        assert_eq!(index, 0);
        assert_eq!(tx_hash, bundle.txs()[0].hash);
        assert_eq!(reason, "bad");
    }

    #[tokio::test]
    async fn advisory_swallows_failures() {
        let behaviors =
            [SimBehavior::RelayError, SimBehavior::Transport, SimBehavior::Revert("x".into())];
        for behavior in behaviors {
            let relay = FakeRelay::default().with_simulation(behavior);
            let bundle = signed_test_bundle(1).await;

            let gate = SimulationGate::new(&relay, SimulationPolicy::Advisory);
            assert!(gate.check(&bundle, 5).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn blocking_surfaces_failures() {
        let relay = FakeRelay::default().with_simulation(SimBehavior::RelayError);
        let bundle = signed_test_bundle(1).await;

        let err = SimulationGate::new(&relay, SimulationPolicy::Blocking)
            .check(&bundle, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, SimulationError::Relay(_)));
        assert!(!err.is_revert());
    }

    #[test]
    fn policy_from_strict() {
        assert_eq!(SimulationPolicy::from_strict(true), SimulationPolicy::Blocking);
        assert_eq!(SimulationPolicy::from_strict(false), SimulationPolicy::Advisory);
    }
}
