use alloy_primitives::U64;
use fixture_config::ForkSource;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Opaque node-issued identifier of a chain-state snapshot.
///
/// Reverting consumes the snapshot on the node, so restoring takes the handle
/// by value.
#[derive(Debug, PartialEq, Eq)]
pub struct SnapshotHandle(Value);

impl SnapshotHandle {
    pub(crate) const fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// Handle for an identifier obtained outside this session, such as one
    /// printed by an earlier process.
    pub fn from_id(id: impl Into<String>) -> Self {
        Self(Value::String(id.into()))
    }

    /// The identifier exactly as the node returned it.
    pub const fn as_raw(&self) -> &Value {
        &self.0
    }

    pub(crate) fn into_raw(self) -> Value {
        self.0
    }
}

impl fmt::Display for SnapshotHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(id) => f.write_str(id),
            other => write!(f, "{other}"),
        }
    }
}

/// Upstream chain and block height a fork-reset should mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkSpec {
    source_uri: String,
    at_block: u64,
}

impl ForkSpec {
    /// Fork `source_uri` at `at_block`.
    pub fn new(source_uri: impl Into<String>, at_block: u64) -> Self {
        Self {
            source_uri: source_uri.into(),
            at_block,
        }
    }

    /// Build from configuration, preferring an explicit block over the configured one.
    pub fn from_source(source: &ForkSource, at_block: Option<u64>) -> Option<Self> {
        let at_block = at_block.or(source.block())?;
        Some(Self::new(source.as_str(), at_block))
    }

    /// Upstream JSON-RPC endpoint.
    pub fn source_uri(&self) -> &str {
        &self.source_uri
    }

    /// Block height to fork at.
    pub const fn at_block(&self) -> u64 {
        self.at_block
    }
}

/// Height and timestamp of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    /// Block height.
    pub number: u64,
    /// Block timestamp in seconds.
    pub timestamp: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawBlock {
    number: U64,
    timestamp: U64,
}

impl From<RawBlock> for BlockInfo {
    fn from(raw: RawBlock) -> Self {
        Self {
            number: raw.number.to::<u64>(),
            timestamp: raw.timestamp.to::<u64>(),
        }
    }
}
