use crate::accounts::{DEV_ACCOUNTS, DevAccount};
use crate::methods::NODE_CONTROL_METHODS;
use fixture_config::{Config, DEFAULT_NODE_URL, ForkSource, TransactionSettings};
use http::Uri;

/// Preconfigured session against a local Hardhat node, signing with one of its
/// development accounts.
#[derive(Debug, Clone)]
pub struct HardhatLocal {
    node_url: Uri,
    account: DevAccount,
    fork: Option<ForkSource>,
    transactions: TransactionSettings,
}

impl HardhatLocal {
    /// Create a preset for the node at `node_url`, signing with account #0.
    pub fn new(node_url: Uri) -> Self {
        Self {
            node_url,
            account: DEV_ACCOUNTS[0],
            fork: None,
            transactions: TransactionSettings::default(),
        }
    }

    /// Sign with development account `index`, or `None` if there is no such account.
    pub fn with_account(mut self, index: usize) -> Option<Self> {
        self.account = *DEV_ACCOUNTS.get(index)?;
        Some(self)
    }

    /// Fork the given upstream chain.
    pub fn with_fork(mut self, fork: ForkSource) -> Self {
        self.fork = Some(fork);
        self
    }

    /// Replace the transaction defaults.
    pub const fn with_transactions(mut self, transactions: TransactionSettings) -> Self {
        self.transactions = transactions;
        self
    }

    /// Node endpoint URL.
    pub const fn node_url(&self) -> &Uri {
        &self.node_url
    }

    /// Account the session will sign with.
    pub const fn account(&self) -> &DevAccount {
        &self.account
    }

    /// Node-control methods a session built from this preset calls.
    pub const fn methods() -> &'static [&'static str] {
        NODE_CONTROL_METHODS
    }

    /// Convert the preset into a [`Config`].
    pub fn into_config(self) -> Config {
        Config::new(
            self.node_url,
            self.account.private_key(),
            self.fork,
            self.transactions,
        )
    }

    /// Borrowed variant of [`into_config`](Self::into_config).
    pub fn to_config(&self) -> Config {
        Config::new(
            self.node_url.clone(),
            self.account.private_key(),
            self.fork.clone(),
            self.transactions,
        )
    }
}

impl Default for HardhatLocal {
    fn default() -> Self {
        Self::new(Uri::from_static(DEFAULT_NODE_URL))
    }
}

impl From<HardhatLocal> for Config {
    fn from(value: HardhatLocal) -> Self {
        value.into_config()
    }
}
