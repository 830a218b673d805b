use crate::outcome::TransactionOutcome;
use alloy_primitives::B256;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Boxed error type carried by transport and signing failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by the session coordinator and its collaborators.
///
/// The variants separate "the node call itself failed" ([`Transport`],
/// [`Protocol`]) from "the node executed the transaction and it failed
/// on-chain" ([`TransactionRejected`]).
///
/// [`Transport`]: SessionError::Transport
/// [`Protocol`]: SessionError::Protocol
/// [`TransactionRejected`]: SessionError::TransactionRejected
#[derive(Debug, Error)]
pub enum SessionError {
    /// Network or connection failure, including request timeouts.
    #[error("transport failure calling {method}: {source}")]
    Transport {
        /// JSON-RPC method that was being called.
        method: String,
        /// Underlying transport error.
        source: BoxError,
    },
    /// The node answered with a JSON-RPC error object.
    #[error("node rejected {method} (code {code}): {message}")]
    Protocol {
        /// JSON-RPC method that was rejected.
        method: String,
        /// JSON-RPC error code.
        code: i64,
        /// Error message reported by the node.
        message: String,
        /// Optional structured error data.
        data: Option<Value>,
    },
    /// The node answered, but not with a result of the expected shape.
    #[error("unexpected result for {method}: {reason}")]
    InvalidResponse {
        /// JSON-RPC method whose result could not be interpreted.
        method: String,
        /// Why the result was rejected.
        reason: String,
    },
    /// The transaction was mined or refused and its outcome is a failure.
    #[error("transaction failed: {}", .0.failure_reason().unwrap_or("reverted"))]
    TransactionRejected(Box<TransactionOutcome>),
    /// Simulated time advanced but the follow-up block could not be mined.
    #[error("clock advanced by {seconds}s but mining the follow-up block failed: {source}")]
    PartialTimeTravelFailure {
        /// Seconds the clock was advanced by.
        seconds: u64,
        /// Failure of the mining call.
        source: Box<SessionError>,
    },
    /// A send handle was used after the session it belongs to was rebuilt.
    #[error("send handle from session epoch {epoch} used after the session was rebuilt")]
    StaleStateAccess {
        /// Epoch of the retired session state that produced the handle.
        epoch: u64,
    },
    /// No receipt appeared within the configured bound.
    #[error("no receipt for transaction {transaction_hash} after {waited:?}")]
    Timeout {
        /// Hash of the submitted transaction.
        transaction_hash: B256,
        /// How long the send waited.
        waited: Duration,
    },
    /// The node answered `false` to a revert request.
    #[error("node refused to revert to snapshot {snapshot}")]
    RevertRejected {
        /// Rendered snapshot identifier.
        snapshot: String,
    },
    /// An impersonated call was requested without a sender.
    #[error("impersonated calls require a `from` address")]
    MissingSender,
    /// Key material does not form a valid secp256k1 secret.
    #[error("invalid signing key: {0}")]
    InvalidKey(BoxError),
    /// Local transaction signing failed.
    #[error("failed to sign transaction: {0}")]
    Signing(BoxError),
}

impl SessionError {
    /// Returns `true` when the node executed the transaction and it failed on-chain.
    pub const fn is_on_chain_failure(&self) -> bool {
        matches!(self, Self::TransactionRejected(_))
    }

    /// Returns `true` for network-level failures.
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Returns `true` when the node refused a well-formed request.
    pub const fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }

    pub(crate) fn transport(method: &str, source: impl Into<BoxError>) -> Self {
        Self::Transport {
            method: method.to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn invalid_response(method: &str, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            method: method.to_string(),
            reason: reason.into(),
        }
    }
}
