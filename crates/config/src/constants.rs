//! Constants used by the configuration.

/// Default JSON-RPC endpoint of the local development node.
pub const DEFAULT_NODE_URL: &str = "http://127.0.0.1:8545";

/// Default on-disk configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = ".fixture.toml";

/// Gas limit attached to every transaction the session submits.
pub const DEFAULT_GAS_LIMIT: u64 = 6_721_975;

/// Gas price ceiling (wei) attached to every transaction the session submits.
pub const DEFAULT_GAS_PRICE: u128 = 20_000_000_000;

/// Upper bound on how long a send waits for its receipt.
pub const DEFAULT_RECEIPT_TIMEOUT_SECS: u64 = 30;

/// Delay between two receipt polls.
pub const DEFAULT_RECEIPT_POLL_INTERVAL_MS: u64 = 50;

/// Upper bound on a single JSON-RPC round trip.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
