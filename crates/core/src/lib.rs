//! Stateful session client for driving a development node in integration tests.
//!
//! A [`ConnectionCoordinator`] owns one [`RpcChannel`] and one session state:
//! the current [`SigningIdentity`] plus the [`SignedHandle`] and
//! [`UnsignedHandle`] derived from it. Operations that change node-side chain
//! state out from under the client (snapshot revert, fork reset, identity
//! swap) rebuild that state under a lock before anyone can use it again, and
//! handles from before a rebuild refuse to send.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod channel;
mod coordinator;
mod errors;
mod facade;
mod handles;
mod identity;
mod jsonrpc;
pub mod methods;
mod outcome;
pub mod quantity;
mod session;
mod types;

#[cfg(test)]
mod test_utils;

pub use channel::{HttpChannel, RpcChannel, request};
pub use coordinator::ConnectionCoordinator;
pub use errors::{BoxError, SessionError};
pub use facade::{EventDecoder, SessionHandles, decode_events};
pub use handles::{SignedHandle, UnsignedHandle};
pub use identity::SigningIdentity;
pub use outcome::{
    FailureMessage, LogEntry, TransactionCall, TransactionOutcome, TransactionStatus,
    decode_revert_reason,
};
pub use session::SessionPhase;
pub use types::{BlockInfo, ForkSpec, SnapshotHandle};
