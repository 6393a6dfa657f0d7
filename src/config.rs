use crate::{
    bundle::TransactionSpec,
    constants::{DEFAULT_FALLBACK_RPC_URLS, DEFAULT_MAX_ATTEMPTS, SEPOLIA_CHAIN_ID},
    provider::{HttpProbe, ResolvedProvider, resolve_provider},
    relay::FlashbotsRelay,
    tasks::{resolve::ResolutionTracker, simulate::SimulationPolicy, submit::SubmitSettings},
    utils::{gwei_to_wei, parse_endpoints},
};
use alloy::{
    network::Ethereum,
    primitives::{Address, Bytes, U256},
    providers::RootProvider,
};
use init4_bin_base::utils::{from_env::FromEnv, signer::LocalOrAws};
use std::time::Duration;
use url::Url;

/// Type alias for the provider used to read the host chain.
pub type HostProvider = RootProvider<Ethereum>;

/// Default per-transaction gas limit.
pub const DEFAULT_GAS_LIMIT: u64 = 100_000;
/// Default max fee per gas, in gwei.
pub const DEFAULT_MAX_FEE_PER_GAS_GWEI: u64 = 8;
/// Default max priority fee per gas, in gwei.
pub const DEFAULT_MAX_PRIORITY_FEE_PER_GAS_GWEI: u64 = 2;
/// Default interval between chain polls while awaiting a resolution.
pub const DEFAULT_RESOLUTION_POLL_MS: u64 = 1_000;
/// Default relay request timeout.
pub const DEFAULT_RELAY_TIMEOUT_MS: u64 = 30_000;

/// Configuration for submitting the presale bundle to a Flashbots relay.
#[derive(Debug, Clone, FromEnv)]
pub struct SubmitterConfig {
    /// URL for the primary host RPC node.
    #[from_env(var = "HOST_RPC_URL", desc = "URL for the primary host RPC node, tried first")]
    pub host_rpc_url: Url,

    /// Comma separated fallback RPC URLs, tried in order after the primary.
    #[from_env(
        var = "FALLBACK_RPC_URLS",
        desc = "Comma separated fallback RPC URLs, tried in order after HOST_RPC_URL. Defaults to public Sepolia endpoints",
        infallible,
        optional
    )]
    pub fallback_rpc_urls: Option<String>,

    /// Chain id the bundle transactions are signed for.
    #[from_env(
        var = "HOST_CHAIN_ID",
        desc = "Chain id the bundle transactions are signed for. Defaults to Sepolia"
    )]
    pub host_chain_id: Option<u64>,

    /// Flashbots relay endpoint.
    #[from_env(var = "FLASHBOTS_ENDPOINT", desc = "Flashbots relay endpoint")]
    pub flashbots_endpoint: Url,

    /// Key of the bundle transaction signer - AWS Key ID _OR_ local private key.
    #[from_env(
        var = "SIGNER_KEY",
        desc = "Key of the bundle transaction signer - AWS Key ID _OR_ local private key",
        infallible
    )]
    pub signer_key: String,

    /// Key used to sign relay requests - AWS Key ID _OR_ local private key.
    #[from_env(
        var = "FLASHBOTS_RELAY_SIGNING_KEY",
        desc = "Key used to sign relay requests, identifying the searcher - AWS Key ID _OR_ local private key",
        infallible
    )]
    pub relay_signing_key: String,

    /// Address of the presale contract.
    #[from_env(var = "PRESALE_CONTRACT", desc = "Address of the presale contract")]
    pub presale_contract: Address,

    /// When set, a `presale(amount)` call follows `enablePresale()`.
    #[from_env(
        var = "PRESALE_AMOUNT",
        desc = "When set, a presale(amount) call is bundled after enablePresale()"
    )]
    pub presale_amount: Option<u64>,

    /// Value sent with the `presale` call, in gwei.
    #[from_env(var = "PRESALE_VALUE_GWEI", desc = "Value sent with the presale call, in gwei")]
    pub presale_value_gwei: Option<u64>,

    /// Per-transaction gas limit.
    #[from_env(var = "GAS_LIMIT", desc = "Per-transaction gas limit")]
    pub gas_limit: Option<u64>,

    /// Max fee per gas, in gwei.
    #[from_env(var = "MAX_FEE_PER_GAS_GWEI", desc = "Max fee per gas, in gwei")]
    pub max_fee_per_gas_gwei: Option<u64>,

    /// Max priority fee per gas, in gwei.
    #[from_env(var = "MAX_PRIORITY_FEE_PER_GAS_GWEI", desc = "Max priority fee per gas, in gwei")]
    pub max_priority_fee_per_gas_gwei: Option<u64>,

    /// Number of consecutive blocks the bundle is submitted for.
    #[from_env(
        var = "MAX_ATTEMPTS",
        desc = "Number of consecutive blocks the bundle is submitted for"
    )]
    pub max_attempts: Option<u64>,

    /// Abort before submitting when simulation fails.
    #[from_env(
        var = "STRICT_SIMULATION",
        desc = "Abort before submitting when the bundle fails simulation. By default failures are only logged"
    )]
    pub strict_simulation: Option<bool>,

    /// Fetch relay statistics after every resolved attempt.
    #[from_env(
        var = "COLLECT_BUNDLE_STATS",
        desc = "Fetch relay statistics after every resolved attempt"
    )]
    pub collect_bundle_stats: Option<bool>,

    /// Milliseconds between chain polls while awaiting an attempt's resolution.
    #[from_env(
        var = "RESOLUTION_POLL_MS",
        desc = "Milliseconds between chain polls while awaiting an attempt's resolution"
    )]
    pub resolution_poll_ms: Option<u64>,

    /// Relay request timeout, in milliseconds.
    #[from_env(var = "RELAY_TIMEOUT_MS", desc = "Relay request timeout, in milliseconds")]
    pub relay_timeout_ms: Option<u64>,

    /// Hex encoded signed transaction placed first in the bundle.
    #[from_env(
        var = "BACKRUN_RAW_TX",
        desc = "Hex encoded, already signed transaction placed first in the bundle, ahead of the presale calls",
        infallible,
        optional
    )]
    pub backrun_raw_tx: Option<String>,
}

impl SubmitterConfig {
    /// Chain id of the bundle transactions.
    pub fn chain_id(&self) -> u64 {
        self.host_chain_id.unwrap_or(SEPOLIA_CHAIN_ID)
    }

    /// Candidate RPC endpoints in priority order: the primary, then the
    /// fallbacks.
    pub fn endpoints(&self) -> Result<Vec<Url>, url::ParseError> {
        let fallbacks = match self.fallback_rpc_urls.as_deref() {
            Some(list) => parse_endpoints(list)?,
            None => DEFAULT_FALLBACK_RPC_URLS
                .iter()
                .map(|url| Url::parse(url))
                .collect::<Result<_, _>>()?,
        };

        let mut endpoints = Vec::with_capacity(fallbacks.len() + 1);
        endpoints.push(self.host_rpc_url.clone());
        endpoints.extend(fallbacks);
        Ok(endpoints)
    }

    /// Connects to the first reachable host endpoint serving the configured
    /// chain.
    pub async fn connect_provider(&self) -> eyre::Result<ResolvedProvider<HostProvider>> {
        let endpoints = self.endpoints()?;
        Ok(resolve_provider(&HttpProbe::for_chain(self.chain_id()), &endpoints).await?)
    }

    /// Connect to the bundle transaction signer.
    pub async fn connect_tx_signer(&self) -> eyre::Result<LocalOrAws> {
        LocalOrAws::load(&self.signer_key, Some(self.chain_id())).await.map_err(Into::into)
    }

    /// Connect to the relay request signer.
    pub async fn connect_relay_signer(&self) -> eyre::Result<LocalOrAws> {
        LocalOrAws::load(&self.relay_signing_key, Some(self.chain_id())).await.map_err(Into::into)
    }

    /// Connect to the Flashbots relay.
    pub async fn connect_relay(&self) -> eyre::Result<FlashbotsRelay> {
        let signer = self.connect_relay_signer().await?;
        FlashbotsRelay::new(self.flashbots_endpoint.clone(), signer, self.relay_timeout())
    }

    /// A resolution tracker polling `provider` at the configured interval.
    pub fn resolution_tracker(&self, provider: HostProvider) -> ResolutionTracker<HostProvider> {
        ResolutionTracker::new(provider, self.poll_interval())
    }

    /// A call to the presale contract carrying `input`, with the configured
    /// gas parameters.
    pub fn presale_spec(&self, input: impl Into<Bytes>) -> TransactionSpec {
        let max_fee = self.max_fee_per_gas_gwei.unwrap_or(DEFAULT_MAX_FEE_PER_GAS_GWEI);
        let priority_fee =
            self.max_priority_fee_per_gas_gwei.unwrap_or(DEFAULT_MAX_PRIORITY_FEE_PER_GAS_GWEI);

        TransactionSpec::new(self.presale_contract, input, self.chain_id())
            .with_gas_limit(self.gas_limit.unwrap_or(DEFAULT_GAS_LIMIT))
            .with_fees(gwei_to_wei(max_fee), gwei_to_wei(priority_fee))
    }

    /// Wei sent with the `presale` call.
    pub fn presale_value(&self) -> U256 {
        U256::from(gwei_to_wei(self.presale_value_gwei.unwrap_or_default()))
    }

    /// The decoded transaction to backrun, if one is configured.
    pub fn backrun_tx(&self) -> eyre::Result<Option<Bytes>> {
        let Some(hex) = self.backrun_raw_tx.as_deref() else { return Ok(None) };
        Ok(Some(hex.trim().parse()?))
    }

    /// The attempt cap.
    pub fn max_attempts(&self) -> u64 {
        self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS)
    }

    /// The configured simulation policy.
    pub fn simulation_policy(&self) -> SimulationPolicy {
        SimulationPolicy::from_strict(self.strict_simulation.unwrap_or_default())
    }

    /// Settings for the submission task.
    pub fn submit_settings(&self) -> SubmitSettings {
        SubmitSettings {
            simulation_policy: self.simulation_policy(),
            collect_stats: self.collect_bundle_stats.unwrap_or(true),
        }
    }

    /// Interval between chain polls while awaiting a resolution.
    pub const fn poll_interval(&self) -> Duration {
        let ms = match self.resolution_poll_ms {
            Some(ms) => ms,
            None => DEFAULT_RESOLUTION_POLL_MS,
        };
        Duration::from_millis(ms)
    }

    /// Relay request timeout.
    pub fn relay_timeout(&self) -> Duration {
        Duration::from_millis(self.relay_timeout_ms.unwrap_or(DEFAULT_RELAY_TIMEOUT_MS))
    }
}
