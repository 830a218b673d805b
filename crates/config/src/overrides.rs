use crate::PrivateKey;
use http::Uri;

/// Overrides provided via the CLI.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    node_url: Option<Uri>,
    private_key: Option<PrivateKey>,
    fork_url: Option<String>,
    fork_api_key: Option<String>,
    fork_block: Option<u64>,
}

impl Overrides {
    /// Create a new overrides instance.
    pub const fn new(
        node_url: Option<Uri>,
        private_key: Option<PrivateKey>,
        fork_url: Option<String>,
        fork_api_key: Option<String>,
        fork_block: Option<u64>,
    ) -> Self {
        Self {
            node_url,
            private_key,
            fork_url,
            fork_api_key,
            fork_block,
        }
    }

    /// Returns `true` if no overriding values were provided.
    pub const fn is_empty(&self) -> bool {
        self.node_url.is_none()
            && self.private_key.is_none()
            && self.fork_url.is_none()
            && self.fork_api_key.is_none()
            && self.fork_block.is_none()
    }

    /// Accessor for the node URL override.
    pub const fn node_url(&self) -> Option<&Uri> {
        self.node_url.as_ref()
    }

    /// Accessor for the private key override.
    pub const fn private_key(&self) -> Option<&PrivateKey> {
        self.private_key.as_ref()
    }

    /// Accessor for the fork URL override.
    pub fn fork_url(&self) -> Option<&str> {
        self.fork_url.as_deref()
    }

    /// Accessor for the fork API key override.
    pub fn fork_api_key(&self) -> Option<&str> {
        self.fork_api_key.as_deref()
    }

    /// Accessor for the fork block override.
    pub const fn fork_block(&self) -> Option<u64> {
        self.fork_block
    }
}
