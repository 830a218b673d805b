use crate::Config;
use crate::ConfigError;
use crate::FileConfig;
use crate::ForkSource;
use crate::Overrides;
use crate::PrivateKey;
use crate::TransactionSettings;
use crate::constants::DEFAULT_NODE_URL;
use http::Uri;
use std::str::FromStr;
use std::time::Duration;

/// Resolve the final configuration by merging file values with CLI overrides.
pub fn resolve_config(
    file: Option<FileConfig>,
    overrides: Overrides,
) -> Result<Config, ConfigError> {
    let file = file.unwrap_or_default();

    let node_url = if let Some(uri) = overrides.node_url().cloned() {
        uri
    } else if let Some(value) = file.node_url.as_deref() {
        parse_node_url(value)?
    } else {
        parse_node_url(DEFAULT_NODE_URL)?
    };

    let private_key = if let Some(key) = overrides.private_key() {
        *key
    } else if let Some(value) = file.private_key.as_deref() {
        PrivateKey::from_str(value)?
    } else {
        return Err(ConfigError::MissingPrivateKey);
    };

    let fork_url = overrides.fork_url().or(file.fork_url.as_deref());
    let fork_api_key = overrides.fork_api_key().or(file.fork_api_key.as_deref());
    let fork_block = overrides.fork_block().or(file.fork_block);

    let fork = match fork_url {
        Some(url) => Some(ForkSource::parse(
            &join_fork_url(url, fork_api_key),
            fork_block,
        )?),
        None if fork_api_key.is_some() || fork_block.is_some() => {
            return Err(ConfigError::ForkWithoutUrl);
        }
        None => None,
    };

    let defaults = TransactionSettings::default();
    let transactions = TransactionSettings {
        gas_limit: file.gas_limit.unwrap_or(defaults.gas_limit),
        gas_price: file.gas_price.unwrap_or(defaults.gas_price),
        receipt_timeout: file
            .receipt_timeout_secs
            .map_or(defaults.receipt_timeout, Duration::from_secs),
        receipt_poll_interval: file
            .receipt_poll_interval_ms
            .map_or(defaults.receipt_poll_interval, Duration::from_millis),
        request_timeout: file
            .request_timeout_secs
            .map_or(defaults.request_timeout, Duration::from_secs),
    };

    Ok(Config::new(node_url, private_key, fork, transactions))
}

/// Join an upstream URL with its API key, which hosted providers expect as
/// the last path segment.
pub fn resolve_fork_url(url: &str, api_key: Option<&str>) -> Result<Uri, ConfigError> {
    let joined = join_fork_url(url, api_key);
    Uri::from_str(&joined).map_err(|source| ConfigError::ForkUrl {
        value: joined.clone(),
        source,
    })
}

fn join_fork_url(url: &str, api_key: Option<&str>) -> String {
    let url = url.trim();
    match api_key.map(str::trim).filter(|key| !key.is_empty()) {
        Some(key) => format!("{}/{key}", url.trim_end_matches('/')),
        None => url.to_string(),
    }
}

fn parse_node_url(value: &str) -> Result<Uri, ConfigError> {
    Uri::from_str(value.trim()).map_err(|source| ConfigError::NodeUrl {
        value: value.to_string(),
        source,
    })
}
