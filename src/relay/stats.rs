use serde::{Deserialize, Serialize};

/// A builder public key with the time it handled a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderTimestamp {
    /// Builder public key.
    pub pubkey: String,
    /// RFC 3339 timestamp.
    pub timestamp: String,
}

/// Bundle statistics as returned by `flashbots_getBundleStatsV2`.
///
/// Timestamps are kept as the relay's RFC 3339 strings, since they are
/// only logged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleStatsV2 {
    /// Whether the relay simulated the bundle.
    #[serde(default)]
    pub is_simulated: bool,
    /// Whether the bundle was treated as high priority.
    #[serde(default)]
    pub is_high_priority: bool,
    /// When the relay simulated the bundle.
    #[serde(default)]
    pub simulated_at: Option<String>,
    /// When the relay received the bundle.
    #[serde(default)]
    pub received_at: Option<String>,
    /// Builders that considered the bundle.
    #[serde(default)]
    pub considered_by_builders_at: Vec<BuilderTimestamp>,
    /// Builders that sealed a block containing the bundle.
    #[serde(default)]
    pub sealed_by_builders_at: Vec<BuilderTimestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_partial_stats() {
        let stats: BundleStatsV2 = serde_json::from_value(json!({
            "isSimulated": true,
            "isHighPriority": false,
            "simulatedAt": "2024-06-01T10:00:01.123Z",
            "receivedAt": "2024-06-01T10:00:00.900Z",
            "consideredByBuildersAt": [
                { "pubkey": "0x81babe", "timestamp": "2024-06-01T10:00:02.000Z" }
            ]
        }))
        .unwrap();

        assert!(stats.is_simulated);
        assert_eq!(stats.considered_by_builders_at.len(), 1);
        assert!(stats.sealed_by_builders_at.is_empty());
    }
}
