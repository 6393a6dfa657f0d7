//! Ordered failover across candidate RPC endpoints.
use alloy::{network::Ethereum, providers::{Provider, RootProvider}};
use init4_bin_base::deps::tracing::{debug, error, info, warn};
use std::future::Future;
use url::Url;

/// Every candidate endpoint failed its connectivity probe.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("no reachable RPC endpoint ({attempted} tried)")]
pub struct ProviderUnavailable {
    /// Number of endpoints probed.
    pub attempted: usize,
}

/// A lightweight connectivity check against a single endpoint.
pub trait EndpointProbe: Send + Sync {
    /// The live connection produced by a successful probe.
    type Connection: Send;

    /// Probes `url`, returning a connection to it on success.
    fn probe(&self, url: &Url) -> impl Future<Output = eyre::Result<Self::Connection>> + Send;
}

/// Probes HTTP endpoints with `eth_chainId`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpProbe {
    /// When set, endpoints reporting another chain are treated as failed.
    pub expected_chain_id: Option<u64>,
}

impl HttpProbe {
    /// Creates a probe that only accepts endpoints on `chain_id`.
    pub const fn for_chain(chain_id: u64) -> Self {
        Self { expected_chain_id: Some(chain_id) }
    }

    /// True if an endpoint reporting `chain_id` is acceptable.
    pub const fn accepts(&self, chain_id: u64) -> bool {
        match self.expected_chain_id {
            Some(expected) => expected == chain_id,
            None => true,
        }
    }
}

impl EndpointProbe for HttpProbe {
    type Connection = RootProvider<Ethereum>;

    async fn probe(&self, url: &Url) -> eyre::Result<RootProvider<Ethereum>> {
        let provider = RootProvider::<Ethereum>::new_http(url.clone());
        let chain_id = provider.get_chain_id().await?;

        if !self.accepts(chain_id) {
            eyre::bail!("endpoint is on chain {chain_id}, expected {:?}", self.expected_chain_id);
        }

        Ok(provider)
    }
}

/// The first endpoint that answered its probe.
#[derive(Debug, Clone)]
pub struct ResolvedProvider<C> {
    /// The endpoint URL.
    pub url: Url,
    /// Position of the endpoint in the priority list.
    pub index: usize,
    /// Live connection to the endpoint.
    pub connection: C,
}

/// Probes `endpoints` strictly in order and returns the first that responds.
/// Later endpoints are never contacted once one succeeds.
pub async fn resolve_provider<P: EndpointProbe>(
    probe: &P,
    endpoints: &[Url],
) -> Result<ResolvedProvider<P::Connection>, ProviderUnavailable> {
    for (index, url) in endpoints.iter().enumerate() {
        debug!(%url, index, "probing endpoint");
        match probe.probe(url).await {
            Ok(connection) => {
                info!(%url, index, "connected to provider");
                return Ok(ResolvedProvider { url: url.clone(), index, connection });
            }
            Err(err) => warn!(%url, index, %err, "failed to connect to provider"),
        }
    }

    error!(attempted = endpoints.len(), "failed to connect to any provider");
    Err(ProviderUnavailable { attempted: endpoints.len() })
}
