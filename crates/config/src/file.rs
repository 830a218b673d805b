use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Representation of the on-disk `.fixture.toml` configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Default)]
pub struct FileConfig {
    /// JSON-RPC endpoint of the node under test.
    pub node_url: Option<String>,
    /// Hex-encoded private key of the initial signing identity.
    pub private_key: Option<String>,
    /// Upstream node to fork from.
    pub fork_url: Option<String>,
    /// API key appended to the fork URL as a trailing path segment.
    pub fork_api_key: Option<String>,
    /// Default block height to fork at.
    pub fork_block: Option<u64>,
    /// Gas limit attached to every transaction.
    pub gas_limit: Option<u64>,
    /// Gas price (wei) attached to every transaction.
    pub gas_price: Option<u128>,
    /// Seconds a send waits for its receipt.
    pub receipt_timeout_secs: Option<u64>,
    /// Milliseconds between receipt polls.
    pub receipt_poll_interval_ms: Option<u64>,
    /// Seconds a single JSON-RPC round trip may take.
    pub request_timeout_secs: Option<u64>,
}

/// Parse and load the configuration file, returning `Ok(None)` when it is missing.
pub fn load_file(path: &Path) -> Result<Option<FileConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: FileConfig =
        toml::from_str(&contents).map_err(|source| ConfigError::TomlParse { source })?;
    Ok(Some(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn missing_file_is_not_an_error() {
        let loaded = load_file(Path::new("definitely/not/here/.fixture.toml")).unwrap();
        assert!(loaded.is_none());
    }

    #[rstest]
    fn parses_all_fields() {
        let parsed: FileConfig = toml::from_str(
            r#"
            node_url = "http://127.0.0.1:8545"
            private_key = "0x01"
            fork_url = "https://eth-mainnet.g.alchemy.com/v2"
            fork_api_key = "secret"
            fork_block = 14390000
            gas_limit = 8000000
            gas_price = 1000000000
            receipt_timeout_secs = 5
            receipt_poll_interval_ms = 10
            request_timeout_secs = 3
            "#,
        )
        .unwrap();
        assert_eq!(parsed.fork_block, Some(14_390_000));
        assert_eq!(parsed.gas_limit, Some(8_000_000));
        assert_eq!(parsed.fork_api_key.as_deref(), Some("secret"));
        assert_eq!(parsed.request_timeout_secs, Some(3));
    }

    #[rstest]
    fn rejects_wrong_types() {
        let result = toml::from_str::<FileConfig>("fork_block = \"latest\"");
        assert!(result.is_err());
    }
}
