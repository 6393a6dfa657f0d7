//! Relay access for bundle simulation, submission and statistics.
//!
//! Relay replies are decoded into [`RelayReply`], so an error reported by
//! the relay is a typed outcome rather than a field to probe for.
//! Transport failures stay as [`eyre::Report`]s.

use crate::bundle::SignedBundle;
use alloy::{
    primitives::B256,
    rpc::types::mev::{EthBundleHash, EthCallBundleResponse},
};
use serde::Deserialize;
use std::{fmt, future::Future};

/// Flashbots relay client.
pub mod flashbots;
pub use flashbots::FlashbotsRelay;

mod stats;
pub use stats::{BuilderTimestamp, BundleStatsV2};

/// A JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RpcErrorObject {
    /// Error code.
    pub code: i64,
    /// Error message.
    pub message: String,
    /// Optional error data.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// An error reported by the relay in place of a result.
///
/// Relays answer either with a JSON-RPC error object, or with a bare
/// `{"error": "<message>"}` body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RelayError {
    /// A JSON-RPC error object.
    Rpc(RpcErrorObject),
    /// A bare error message.
    Message(String),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rpc(err) => write!(f, "relay error {}: {}", err.code, err.message),
            Self::Message(message) => write!(f, "relay error: {message}"),
        }
    }
}

impl std::error::Error for RelayError {}

/// A relay reply: either a result or an error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RelayReply<T> {
    /// The relay reported an error.
    Failure {
        /// The reported error.
        error: RelayError,
    },
    /// The relay returned a result.
    Success {
        /// The returned value.
        result: T,
    },
}

impl<T> RelayReply<T> {
    /// Wraps a result.
    pub const fn success(result: T) -> Self {
        Self::Success { result }
    }

    /// Wraps a relay error message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure { error: RelayError::Message(message.into()) }
    }

    /// Converts into a standard [`Result`].
    pub fn into_result(self) -> Result<T, RelayError> {
        match self {
            Self::Success { result } => Ok(result),
            Self::Failure { error } => Err(error),
        }
    }
}

/// The relay operations the submission pipeline depends on.
pub trait BundleRelay: Send + Sync {
    /// Simulates `bundle` as if included in `block`.
    fn simulate(
        &self,
        bundle: &SignedBundle,
        block: u64,
    ) -> impl Future<Output = eyre::Result<RelayReply<EthCallBundleResponse>>> + Send;

    /// Submits `bundle` for inclusion in `target_block`.
    fn send_bundle(
        &self,
        bundle: &SignedBundle,
        target_block: u64,
    ) -> impl Future<Output = eyre::Result<RelayReply<EthBundleHash>>> + Send;

    /// Fetches relay statistics for a submitted bundle.
    fn bundle_stats(
        &self,
        bundle_hash: B256,
        block: u64,
    ) -> impl Future<Output = eyre::Result<RelayReply<BundleStatsV2>>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_success() {
        let hash = B256::repeat_byte(0xab);
        let reply: RelayReply<EthBundleHash> = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "bundleHash": hash }
        }))
        .unwrap();
        assert_eq!(reply.into_result().unwrap().bundle_hash, hash);
    }

    #[test]
    fn decodes_bare_error() {
        let reply: RelayReply<EthBundleHash> =
            serde_json::from_value(json!({ "error": "block param must be a hex int" })).unwrap();
        let err = reply.into_result().unwrap_err();
        assert_eq!(err, RelayError::Message("block param must be a hex int".into()));
        assert_eq!(err.to_string(), "relay error: block param must be a hex int");
    }

    #[test]
    fn decodes_rpc_error() {
        let reply: RelayReply<EthBundleHash> = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32000, "message": "nonce too low" }
        }))
        .unwrap();
        let RelayError::Rpc(payload) = reply.into_result().unwrap_err() else {
            panic!("expected rpc error");
        };
        assert_eq!(payload.code, -32000);
        assert_eq!(payload.message, "nonce too low");
    }

    #[test]
    fn rejects_reply_without_result_or_error() {
        let reply = serde_json::from_value::<RelayReply<EthBundleHash>>(json!({ "id": 1 }));
        assert!(reply.is_err());
    }
}
