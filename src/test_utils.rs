//! In-memory fakes and fixtures for testing the submission pipeline.
use crate::{
    bundle::{BundleBuilder, SignedBundle, TransactionSpec},
    chain::ChainClient,
    constants::SEPOLIA_CHAIN_ID,
    provider::EndpointProbe,
    relay::{BundleRelay, BundleStatsV2, RelayReply},
    tasks::resolve::{Resolution, ResolutionError, ResolveInclusion},
    utils::gwei_to_wei,
};
use alloy::{
    eips::{BlockId, BlockNumberOrTag},
    primitives::{Address, B256, Bytes, TxHash, keccak256},
    rpc::types::mev::{EthBundleHash, EthCallBundleResponse, EthCallBundleTransactionResult},
    signers::local::PrivateKeySigner,
};
use init4_bin_base::deps::tracing_subscriber::{
    EnvFilter, Layer, fmt, layer::SubscriberExt, registry, util::SubscriberInitExt,
};
use std::{
    collections::{HashMap, HashSet},
    sync::{
        Mutex,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
};
use url::Url;

/// Initializes a logger that prints during testing
pub fn setup_logging() {
    let filter = EnvFilter::from_default_env();
    let fmt = fmt::layer().with_filter(filter);
    let registry = registry().with(fmt);
    let _ = registry.try_init();
}

/// A call to a fixed address on Sepolia with the default gas parameters.
pub fn test_spec() -> TransactionSpec {
    TransactionSpec::new(Address::repeat_byte(0x11), Bytes::from_static(&[0xde, 0xad]), SEPOLIA_CHAIN_ID)
        .with_gas_limit(100_000)
        .with_fees(gwei_to_wei(8), gwei_to_wei(2))
}

/// Signs a bundle of `n` [`test_spec`] transactions from a fresh random
/// account, with nonces `0..n`.
pub async fn signed_test_bundle(n: usize) -> SignedBundle {
    let signer = PrivateKeySigner::random();
    let bundle = BundleBuilder::new()
        .extend(std::iter::repeat_n(test_spec(), n), |_, _| signer.clone())
        .build()
        .expect("bundle is not empty");
    bundle.sign(&FakeChain::new(0)).await.expect("signing with a local key succeeds")
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// An in-memory chain.
#[derive(Debug, Default)]
pub struct FakeChain {
    head: AtomicU64,
    advancing: bool,
    head_polls: AtomicUsize,
    blocks: HashMap<u64, Vec<TxHash>>,
    /// Per account `(from_block, count)` history, ordered by block.
    nonces: HashMap<Address, Vec<(u64, u64)>>,
}

impl FakeChain {
    /// A chain whose head is `head`.
    pub fn new(head: u64) -> Self {
        Self { head: AtomicU64::new(head), ..Default::default() }
    }

    /// Advance the head by one block after every head query.
    pub const fn advancing(mut self) -> Self {
        self.advancing = true;
        self
    }

    /// Adds block `number` holding `hashes`.
    pub fn with_block(mut self, number: u64, hashes: Vec<TxHash>) -> Self {
        self.blocks.insert(number, hashes);
        self
    }

    /// Sets the transaction count of `address` from genesis on. Unknown
    /// accounts have none.
    pub fn with_nonce(self, address: Address, nonce: u64) -> Self {
        self.with_nonce_at(address, 0, nonce)
    }

    /// Sets the transaction count of `address` as of block `block` onwards.
    /// Queries for earlier blocks still see the previous count.
    pub fn with_nonce_at(mut self, address: Address, block: u64, nonce: u64) -> Self {
        let history = self.nonces.entry(address).or_default();
        history.push((block, nonce));
        history.sort_unstable_by_key(|(block, _)| *block);
        self
    }

    /// Number of head queries made so far.
    pub fn head_polls(&self) -> usize {
        self.head_polls.load(Ordering::SeqCst)
    }
}

impl ChainClient for FakeChain {
    async fn block_number(&self) -> eyre::Result<u64> {
        self.head_polls.fetch_add(1, Ordering::SeqCst);
        if self.advancing {
            Ok(self.head.fetch_add(1, Ordering::SeqCst))
        } else {
            Ok(self.head.load(Ordering::SeqCst))
        }
    }

    async fn block_tx_hashes(&self, number: u64) -> eyre::Result<Option<Vec<TxHash>>> {
        Ok(self.blocks.get(&number).cloned())
    }

    async fn transaction_count(&self, address: Address, block: BlockId) -> eyre::Result<u64> {
        let at = match block {
            BlockId::Number(BlockNumberOrTag::Number(number)) => number,
            _ => u64::MAX,
        };
        let count = self.nonces.get(&address).and_then(|history| {
            history.iter().take_while(|(from, _)| *from <= at).last().map(|(_, count)| *count)
        });
        Ok(count.unwrap_or_default())
    }
}

/// How [`FakeRelay`] answers simulation requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SimBehavior {
    /// Every transaction succeeds.
    #[default]
    Success,
    /// The first transaction reverts with the given reason.
    Revert(String),
    /// The relay answers with an error.
    RelayError,
    /// The request never completes.
    Transport,
}

/// A relay that records every request and answers from a script.
#[derive(Debug, Default)]
pub struct FakeRelay {
    simulation: SimBehavior,
    reject_at: Option<u64>,
    unreachable_at: Option<u64>,
    failing_stats: bool,
    simulated: Mutex<Vec<u64>>,
    sent: Mutex<Vec<u64>>,
    stats_requested: Mutex<Vec<u64>>,
}

impl FakeRelay {
    /// Sets the simulation behavior.
    pub fn with_simulation(mut self, behavior: SimBehavior) -> Self {
        self.simulation = behavior;
        self
    }

    /// Rejects submissions for `block`.
    pub const fn rejecting_at(mut self, block: u64) -> Self {
        self.reject_at = Some(block);
        self
    }

    /// Fails submissions for `block` at the transport level.
    pub const fn unreachable_at(mut self, block: u64) -> Self {
        self.unreachable_at = Some(block);
        self
    }

    /// Fails every stats request.
    pub const fn with_failing_stats(mut self) -> Self {
        self.failing_stats = true;
        self
    }

    /// Blocks simulated against, in request order.
    pub fn simulated(&self) -> Vec<u64> {
        lock(&self.simulated).clone()
    }

    /// Target blocks submitted for, in request order.
    pub fn sent(&self) -> Vec<u64> {
        lock(&self.sent).clone()
    }

    /// Blocks stats were requested for, in request order.
    pub fn stats_requested(&self) -> Vec<u64> {
        lock(&self.stats_requested).clone()
    }

    /// The bundle hash this relay reports for `bundle`.
    pub fn bundle_hash(bundle: &SignedBundle) -> B256 {
        keccak256(bundle.tx_hashes().flat_map(|hash| hash.0).collect::<Vec<u8>>())
    }
}

impl BundleRelay for FakeRelay {
    async fn simulate(
        &self,
        bundle: &SignedBundle,
        block: u64,
    ) -> eyre::Result<RelayReply<EthCallBundleResponse>> {
        lock(&self.simulated).push(block);

        let revert = match &self.simulation {
            SimBehavior::Success => None,
            SimBehavior::Revert(reason) => Some(reason.clone()),
            SimBehavior::RelayError => return Ok(RelayReply::failure("simulation unavailable")),
            SimBehavior::Transport => eyre::bail!("connection reset"),
        };

        let results = bundle
            .tx_hashes()
            .enumerate()
            .map(|(i, tx_hash)| EthCallBundleTransactionResult {
                tx_hash,
                gas_used: 21_000,
                revert: if i == 0 { revert.clone() } else { None },
                ..Default::default()
            })
            .collect::<Vec<_>>();

        Ok(RelayReply::success(EthCallBundleResponse {
            bundle_hash: Self::bundle_hash(bundle),
            total_gas_used: 21_000 * results.len() as u64,
            results,
            state_block_number: block,
            ..Default::default()
        }))
    }

    async fn send_bundle(
        &self,
        bundle: &SignedBundle,
        target_block: u64,
    ) -> eyre::Result<RelayReply<EthBundleHash>> {
        lock(&self.sent).push(target_block);

        if self.unreachable_at == Some(target_block) {
            eyre::bail!("relay unreachable");
        }
        if self.reject_at == Some(target_block) {
            return Ok(RelayReply::failure("block param must be a hex int"));
        }

        Ok(RelayReply::success(EthBundleHash { bundle_hash: Self::bundle_hash(bundle) }))
    }

    async fn bundle_stats(
        &self,
        _bundle_hash: B256,
        block: u64,
    ) -> eyre::Result<RelayReply<BundleStatsV2>> {
        lock(&self.stats_requested).push(block);

        if self.failing_stats {
            eyre::bail!("stats endpoint unavailable");
        }

        Ok(RelayReply::success(BundleStatsV2 {
            is_simulated: true,
            received_at: Some("2024-01-01T00:00:00.000Z".into()),
            ..Default::default()
        }))
    }
}

#[derive(Debug, Clone, Copy)]
enum Scripted {
    Resolve(Resolution),
    MissingBlock,
    Fail,
}

/// A resolver answering from a per-block script. Unscripted blocks resolve
/// to [`Resolution::NotIncludedInBlock`].
#[derive(Debug, Default)]
pub struct ScriptedResolver {
    script: HashMap<u64, Scripted>,
    resolved: Mutex<Vec<u64>>,
}

impl ScriptedResolver {
    /// Resolves `block` to `resolution`.
    pub fn resolve_at(mut self, block: u64, resolution: Resolution) -> Self {
        self.script.insert(block, Scripted::Resolve(resolution));
        self
    }

    /// Reports `block` as missing once passed.
    pub fn missing_block_at(mut self, block: u64) -> Self {
        self.script.insert(block, Scripted::MissingBlock);
        self
    }

    /// Fails the chain query for `block`.
    pub fn failing_at(mut self, block: u64) -> Self {
        self.script.insert(block, Scripted::Fail);
        self
    }

    /// Target blocks resolution was awaited for, in order.
    pub fn resolved(&self) -> Vec<u64> {
        lock(&self.resolved).clone()
    }
}

impl ResolveInclusion for ScriptedResolver {
    async fn await_resolution(
        &self,
        _bundle: &SignedBundle,
        target_block: u64,
    ) -> Result<Resolution, ResolutionError> {
        lock(&self.resolved).push(target_block);

        match self.script.get(&target_block) {
            None => Ok(Resolution::NotIncludedInBlock),
            Some(Scripted::Resolve(resolution)) => Ok(*resolution),
            Some(Scripted::MissingBlock) => Err(ResolutionError::MissingBlock(target_block)),
            Some(Scripted::Fail) => Err(ResolutionError::Rpc(eyre::eyre!("node went away"))),
        }
    }
}

/// A probe that only reaches a fixed set of endpoints, recording every
/// probe.
#[derive(Debug, Default)]
pub struct FakeProbe {
    reachable: HashSet<Url>,
    probed: Mutex<Vec<Url>>,
}

impl FakeProbe {
    /// A probe reaching exactly `urls`.
    pub fn reachable<'a>(urls: impl IntoIterator<Item = &'a Url>) -> Self {
        Self { reachable: urls.into_iter().cloned().collect(), ..Default::default() }
    }

    /// A probe reaching nothing.
    pub fn unreachable() -> Self {
        Self::default()
    }

    /// Endpoints probed so far, in order.
    pub fn probed(&self) -> Vec<Url> {
        lock(&self.probed).clone()
    }
}

impl EndpointProbe for FakeProbe {
    type Connection = Url;

    async fn probe(&self, url: &Url) -> eyre::Result<Url> {
        lock(&self.probed).push(url.clone());
        if self.reachable.contains(url) {
            Ok(url.clone())
        } else {
            eyre::bail!("connection refused")
        }
    }
}
