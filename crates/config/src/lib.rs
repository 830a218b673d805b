//! Configuration loading and resolution logic for the fixture session client.
//!
//! Values are read once from an optional `.fixture.toml`, merged with
//! command-line overrides and completed with defaults. The resulting
//! [`Config`] is immutable for the lifetime of a session.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod config;
mod constants;
mod errors;
mod file;
mod overrides;
mod resolver;
mod secret;

pub use config::{Config, ForkSource, TransactionSettings};
pub use constants::{
    DEFAULT_CONFIG_PATH, DEFAULT_GAS_LIMIT, DEFAULT_GAS_PRICE, DEFAULT_NODE_URL,
    DEFAULT_RECEIPT_POLL_INTERVAL_MS, DEFAULT_RECEIPT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS,
};
pub use errors::ConfigError;
pub use file::{FileConfig, load_file};
pub use overrides::Overrides;
pub use resolver::{resolve_config, resolve_fork_url};
pub use secret::PrivateKey;
