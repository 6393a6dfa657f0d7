use alloy::consensus::constants::GWEI_TO_WEI;
use url::Url;

/// Converts a gwei amount into wei.
pub const fn gwei_to_wei(gwei: u64) -> u128 {
    gwei as u128 * GWEI_TO_WEI as u128
}

/// Parses a comma separated list of endpoint URLs, skipping blank entries.
pub fn parse_endpoints(list: &str) -> Result<Vec<Url>, url::ParseError> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty()).map(Url::parse).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gwei_to_wei() {
        assert_eq!(gwei_to_wei(0), 0);
        assert_eq!(gwei_to_wei(8), 8_000_000_000);
    }

    #[test]
    fn test_parse_endpoints_keeps_order() {
        let urls = parse_endpoints(" http://a.example , ,https://b.example/rpc").unwrap();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].as_str(), "http://a.example/");
        assert_eq!(urls[1].as_str(), "https://b.example/rpc");
    }

    #[test]
    fn test_parse_endpoints_rejects_garbage() {
        assert!(parse_endpoints("http://ok.example,not a url").is_err());
    }
}
