//! Narrow interface typed contract bindings are built on.

use crate::channel::RpcChannel;
use crate::coordinator::ConnectionCoordinator;
use crate::handles::{SignedHandle, UnsignedHandle};
use crate::outcome::{LogEntry, TransactionOutcome};
use alloy_primitives::Address;
use std::future::Future;

/// What a contract binding needs from a session.
///
/// Bindings should ask for a handle per call rather than keep one: handles
/// go stale when the session is rebuilt.
pub trait SessionHandles {
    /// Channel the handles submit through.
    type Channel: RpcChannel;

    /// Handle signing with the current identity.
    fn signed_send_handle(&self) -> impl Future<Output = SignedHandle<Self::Channel>> + Send;

    /// Handle relying on node-side impersonation.
    fn unsigned_send_handle(&self) -> impl Future<Output = UnsignedHandle<Self::Channel>> + Send;

    /// Address of the current signing identity.
    fn current_address(&self) -> impl Future<Output = Address> + Send;
}

impl<C: RpcChannel> SessionHandles for ConnectionCoordinator<C> {
    type Channel = C;

    fn signed_send_handle(&self) -> impl Future<Output = SignedHandle<C>> + Send {
        Self::signed_send_handle(self)
    }

    fn unsigned_send_handle(&self) -> impl Future<Output = UnsignedHandle<C>> + Send {
        Self::unsigned_send_handle(self)
    }

    fn current_address(&self) -> impl Future<Output = Address> + Send {
        Self::current_address(self)
    }
}

/// Decodes one event type out of raw logs.
pub trait EventDecoder {
    /// Decoded event.
    type Event;

    /// Decode `log`, or `None` if it is not this event.
    fn decode(log: &LogEntry) -> Option<Self::Event>;
}

/// All events of type `D` in `outcome`, in emission order.
pub fn decode_events<D: EventDecoder>(outcome: &TransactionOutcome) -> Vec<D::Event> {
    outcome.logs().iter().filter_map(D::decode).collect()
}
