//! A Flashbots relay client.
//!
//! Every request body is signed with the relay signing key, which is
//! distinct from the keys that sign bundle transactions.
use super::{BundleRelay, BundleStatsV2, RelayReply};
use crate::{bundle::SignedBundle, constants::FLASHBOTS_SIGNATURE_HEADER};
use alloy::{
    eips::BlockNumberOrTag,
    primitives::{B256, U64, keccak256},
    rpc::types::mev::{EthBundleHash, EthCallBundle, EthCallBundleResponse, EthSendBundle},
    signers::Signer,
};
use eyre::Context as _;
use init4_bin_base::utils::signer::LocalOrAws;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, trace};

/// A Flashbots compatible relay, authenticated with the
/// `X-Flashbots-Signature` header.
#[derive(Debug, Clone)]
pub struct FlashbotsRelay<S = LocalOrAws> {
    /// The relay URL.
    pub relay_url: url::Url,
    client: reqwest::Client,
    /// Relay signing key, loaded once at startup.
    signer: S,
}

impl<S> FlashbotsRelay<S>
where
    S: Signer + Send + Sync,
{
    /// Creates a relay client whose requests time out after `timeout`.
    pub fn new(relay_url: url::Url, signer: S, timeout: Duration) -> eyre::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { relay_url, client, signer })
    }

    /// The address of the relay signing key.
    pub fn signer_address(&self) -> alloy::primitives::Address {
        self.signer.address()
    }

    /// Makes a signed JSON-RPC call and decodes the reply.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> eyre::Result<RelayReply<T>> {
        let body_bz = serde_json::to_vec(&request_body(method, params))?;
        let signature = self.compute_signature(&body_bz).await?;

        let resp = self
            .client
            .post(self.relay_url.as_str())
            .header(CONTENT_TYPE, "application/json")
            .header(FLASHBOTS_SIGNATURE_HEADER, signature)
            .body(body_bz)
            .send()
            .await
            .wrap_err_with(|| format!("{method} request failed"))?;

        let status = resp.status();
        let text = resp.text().await?;
        trace!(method, %status, body = %text, "relay response");

        serde_json::from_str(&text)
            .wrap_err_with(|| format!("unexpected {method} response (HTTP {status}): {text}"))
    }

    /// Builds the `address:signature` header value: an EIP-191 signature
    /// over the hex encoded keccak256 of the body.
    pub async fn compute_signature(&self, body_bz: &[u8]) -> eyre::Result<String> {
        let payload = format!("0x{:x}", keccak256(body_bz));
        let signature = self.signer.sign_message(payload.as_bytes()).await?;
        let address = self.signer.address();
        Ok(format!("{address}:{signature}"))
    }
}

impl<S> BundleRelay for FlashbotsRelay<S>
where
    S: Signer + Send + Sync,
{
    async fn simulate(
        &self,
        bundle: &SignedBundle,
        block: u64,
    ) -> eyre::Result<RelayReply<EthCallBundleResponse>> {
        debug!(block, txs = bundle.len(), "simulating bundle");
        let params = EthCallBundle {
            txs: bundle.raw_txs(),
            block_number: block,
            state_block_number: BlockNumberOrTag::Latest,
            ..Default::default()
        };
        self.call("eth_callBundle", serde_json::to_value(params)?).await
    }

    async fn send_bundle(
        &self,
        bundle: &SignedBundle,
        target_block: u64,
    ) -> eyre::Result<RelayReply<EthBundleHash>> {
        debug!(target_block, txs = bundle.len(), "sending bundle");
        self.call("eth_sendBundle", send_bundle_params(bundle, target_block)?).await
    }

    async fn bundle_stats(
        &self,
        bundle_hash: B256,
        block: u64,
    ) -> eyre::Result<RelayReply<BundleStatsV2>> {
        let params = json!({ "bundleHash": bundle_hash, "blockNumber": U64::from(block) });
        self.call("flashbots_getBundleStatsV2", params).await
    }
}

fn send_bundle_params(bundle: &SignedBundle, target_block: u64) -> eyre::Result<serde_json::Value> {
    let params =
        EthSendBundle { txs: bundle.raw_txs(), block_number: target_block, ..Default::default() };
    Ok(serde_json::to_value(params)?)
}

/// Wraps `params` into a JSON-RPC 2.0 request body.
fn request_body(method: &str, params: serde_json::Value) -> serde_json::Value {
    let params = match params {
        serde_json::Value::Array(_) => params,
        other => serde_json::Value::Array(vec![other]),
    };
    json!({ "jsonrpc": "2.0", "id": 1, "method": method, "params": params })
}
