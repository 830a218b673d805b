use crate::ConfigError;
use crate::PrivateKey;
use crate::constants::{
    DEFAULT_GAS_LIMIT, DEFAULT_GAS_PRICE, DEFAULT_RECEIPT_POLL_INTERVAL_MS,
    DEFAULT_RECEIPT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use http::Uri;
use std::str::FromStr;
use std::time::Duration;

/// Fully resolved session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    node_url: Uri,
    private_key: PrivateKey,
    fork: Option<ForkSource>,
    transactions: TransactionSettings,
}

impl Config {
    /// Construct a new [`Config`].
    pub const fn new(
        node_url: Uri,
        private_key: PrivateKey,
        fork: Option<ForkSource>,
        transactions: TransactionSettings,
    ) -> Self {
        Self {
            node_url,
            private_key,
            fork,
            transactions,
        }
    }

    /// JSON-RPC endpoint of the node under test.
    pub const fn node_url(&self) -> &Uri {
        &self.node_url
    }

    /// Key material of the initial signing identity.
    pub const fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Upstream chain to fork from, if configured.
    pub const fn fork(&self) -> Option<&ForkSource> {
        self.fork.as_ref()
    }

    /// Gas ceilings and wait bounds applied to every send.
    pub const fn transactions(&self) -> &TransactionSettings {
        &self.transactions
    }
}

/// Upstream node a local node can be reset onto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkSource {
    url: Uri,
    configured: String,
    block: Option<u64>,
}

impl ForkSource {
    /// Construct a new [`ForkSource`]. The URL already carries any API key.
    pub fn new(url: Uri, block: Option<u64>) -> Self {
        Self {
            configured: url.to_string(),
            url,
            block,
        }
    }

    /// Validate `url` and keep it exactly as written, without the
    /// normalisation [`Uri`] applies when displayed.
    pub fn parse(url: &str, block: Option<u64>) -> Result<Self, ConfigError> {
        let configured = url.trim().to_string();
        let url = Uri::from_str(&configured).map_err(|source| ConfigError::ForkUrl {
            value: configured.clone(),
            source,
        })?;
        Ok(Self {
            url,
            configured,
            block,
        })
    }

    /// Upstream JSON-RPC endpoint.
    pub const fn url(&self) -> &Uri {
        &self.url
    }

    /// The endpoint as it was configured; this is what the node is sent.
    pub fn as_str(&self) -> &str {
        &self.configured
    }

    /// Default block height to fork at.
    pub const fn block(&self) -> Option<u64> {
        self.block
    }
}

/// Fixed gas ceilings and timing bounds for submitted transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionSettings {
    /// Gas limit attached to every transaction.
    pub gas_limit: u64,
    /// Gas price (wei) attached to every transaction.
    pub gas_price: u128,
    /// How long a send waits for its receipt before giving up.
    pub receipt_timeout: Duration,
    /// Delay between receipt polls.
    pub receipt_poll_interval: Duration,
    /// Upper bound on a single JSON-RPC round trip.
    pub request_timeout: Duration,
}

impl Default for TransactionSettings {
    fn default() -> Self {
        Self {
            gas_limit: DEFAULT_GAS_LIMIT,
            gas_price: DEFAULT_GAS_PRICE,
            receipt_timeout: Duration::from_secs(DEFAULT_RECEIPT_TIMEOUT_SECS),
            receipt_poll_interval: Duration::from_millis(DEFAULT_RECEIPT_POLL_INTERVAL_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}
