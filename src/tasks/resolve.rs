//! Resolution of a single submission attempt.
//!
//! An attempt ends in exactly one of three states, see [`Resolution`].
//! Anything the chain reports outside of those states is a
//! [`ResolutionError`], never silently mapped onto one of them.
use crate::{bundle::SignedBundle, chain::ChainClient};
use alloy::{eips::BlockId, primitives::Address};
use std::{
    collections::{HashMap, HashSet},
    future::Future,
    time::Duration,
};
use tracing::{debug, instrument, trace};

/// The outcome of one submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The bundle landed in the target block.
    Included,
    /// The target block passed without the bundle. The bundle nonces are
    /// still unused, so a later block may include it.
    NotIncludedInBlock,
    /// A sender's on-chain nonce moved past a bundle transaction's nonce.
    /// The bundle can never be included as built.
    NonceTooHigh,
}

/// Failure to determine a resolution.
#[derive(thiserror::Error, Debug)]
pub enum ResolutionError {
    /// A chain query failed.
    #[error("chain query failed: {0}")]
    Rpc(eyre::Report),

    /// The head passed the target block, but the node does not return it.
    #[error("block {0} has passed but the node returned no block")]
    MissingBlock(u64),
}

/// Waits for the resolution of a bundle submitted for a target block.
pub trait ResolveInclusion: Send + Sync {
    /// Blocks until `target_block` resolves for `bundle`.
    fn await_resolution(
        &self,
        bundle: &SignedBundle,
        target_block: u64,
    ) -> impl Future<Output = Result<Resolution, ResolutionError>> + Send;
}

/// Resolves attempts by polling the chain.
#[derive(Debug, Clone)]
pub struct ResolutionTracker<C> {
    chain: C,
    poll_interval: Duration,
}

impl<C: ChainClient> ResolutionTracker<C> {
    /// Creates a tracker polling `chain` every `poll_interval`.
    pub const fn new(chain: C, poll_interval: Duration) -> Self {
        Self { chain, poll_interval }
    }

    /// True if, as of block `at`, any sender's nonce is past the nonce its
    /// bundle transaction was signed with.
    ///
    /// Nonces are read at a fixed block, never `latest`: a block mined after
    /// `at` may be the target block carrying the bundle itself.
    async fn nonce_consumed(&self, bundle: &SignedBundle, at: u64) -> Result<bool, ResolutionError> {
        let mut onchain: HashMap<Address, u64> = HashMap::new();

        for tx in bundle.txs() {
            let count = match onchain.get(&tx.from) {
                Some(count) => *count,
                None => {
                    let count = self
                        .chain
                        .transaction_count(tx.from, BlockId::number(at))
                        .await
                        .map_err(ResolutionError::Rpc)?;
                    onchain.insert(tx.from, count);
                    count
                }
            };

            if count > tx.nonce {
                debug!(from = %tx.from, tx_nonce = tx.nonce, onchain_nonce = count, at, "nonce consumed");
                return Ok(true);
            }
        }

        Ok(false)
    }
}

impl<C: ChainClient> ResolveInclusion for ResolutionTracker<C> {
    #[instrument(skip(self, bundle))]
    async fn await_resolution(
        &self,
        bundle: &SignedBundle,
        target_block: u64,
    ) -> Result<Resolution, ResolutionError> {
        loop {
            let head = self.chain.block_number().await.map_err(ResolutionError::Rpc)?;

            if head < target_block {
                if self.nonce_consumed(bundle, head).await? {
                    return Ok(Resolution::NonceTooHigh);
                }
                trace!(head, "waiting for target block");
                tokio::time::sleep(self.poll_interval).await;
                continue;
            }

            let hashes = self
                .chain
                .block_tx_hashes(target_block)
                .await
                .map_err(ResolutionError::Rpc)?
                .ok_or(ResolutionError::MissingBlock(target_block))?;
            let in_block: HashSet<_> = hashes.into_iter().collect();

            if bundle.tx_hashes().all(|hash| in_block.contains(&hash)) {
                return Ok(Resolution::Included);
            }

            if self.nonce_consumed(bundle, target_block).await? {
                return Ok(Resolution::NonceTooHigh);
            }

            return Ok(Resolution::NotIncludedInBlock);
        }
    }
}
