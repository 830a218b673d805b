use crate::channel::RpcChannel;
use crate::handles::{Epoch, SharedChain, SignedHandle, UnsignedHandle};
use crate::identity::SigningIdentity;
use fixture_config::TransactionSettings;
use std::sync::Arc;
use tracing::debug;

/// Lifecycle of the session state slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No handles built yet.
    Fresh,
    /// Handles are current; the only phase in which sends are accepted.
    Active,
    /// A revert or reset returned and the handles are known stale. A session
    /// sharing its node with one that reverted stays here until next used.
    Invalidated,
}

/// The identity and the two send handles derived from it, built together and
/// replaced together.
#[derive(Debug)]
pub(crate) struct SessionState<C> {
    identity: SigningIdentity,
    epoch: Arc<Epoch>,
    unsigned: UnsignedHandle<C>,
    signed: SignedHandle<C>,
}

impl<C: RpcChannel> SessionState<C> {
    fn build(
        channel: &Arc<C>,
        settings: TransactionSettings,
        identity: SigningIdentity,
        epoch: Arc<Epoch>,
    ) -> Self {
        let unsigned = UnsignedHandle::new(Arc::clone(channel), settings, Arc::clone(&epoch));
        let signed = SignedHandle::new(
            Arc::clone(channel),
            settings,
            Arc::clone(&epoch),
            identity.clone(),
        );
        Self {
            identity,
            epoch,
            unsigned,
            signed,
        }
    }

    pub(crate) const fn identity(&self) -> &SigningIdentity {
        &self.identity
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch.id()
    }

    pub(crate) fn unsigned(&self) -> UnsignedHandle<C> {
        self.unsigned.clone()
    }

    pub(crate) fn signed(&self) -> SignedHandle<C> {
        self.signed.clone()
    }
}

/// The single mutable slot a coordinator guards with its lock.
pub(crate) struct SessionSlot<C> {
    channel: Arc<C>,
    chain: Arc<SharedChain>,
    settings: TransactionSettings,
    identity: SigningIdentity,
    phase: SessionPhase,
    state: Option<SessionState<C>>,
    epochs: u64,
}

impl<C: RpcChannel> SessionSlot<C> {
    pub(crate) const fn new(
        channel: Arc<C>,
        chain: Arc<SharedChain>,
        settings: TransactionSettings,
        identity: SigningIdentity,
    ) -> Self {
        Self {
            channel,
            chain,
            settings,
            identity,
            phase: SessionPhase::Fresh,
            state: None,
            epochs: 0,
        }
    }

    pub(crate) fn phase(&self) -> SessionPhase {
        match &self.state {
            Some(state) if state.epoch.is_retired() => SessionPhase::Invalidated,
            _ => self.phase,
        }
    }

    /// Current state, building it first if the slot is fresh or invalidated,
    /// or if another session on the node reverted since it was built.
    pub(crate) fn active(&mut self) -> &SessionState<C> {
        if self.state.as_ref().is_some_and(|state| state.epoch.is_retired()) {
            debug!("chain state changed under this session");
            self.invalidate();
        }
        if self.state.is_none() {
            self.epochs += 1;
            debug!(
                epoch = self.epochs,
                address = %self.identity.address(),
                from = ?self.phase,
                "building session handles"
            );
            self.phase = SessionPhase::Active;
        }
        let (channel, chain, settings, identity, id) = (
            &self.channel,
            &self.chain,
            self.settings,
            &self.identity,
            self.epochs,
        );
        self.state.get_or_insert_with(|| {
            let epoch = Arc::new(Epoch::new(id, Arc::clone(chain)));
            SessionState::build(channel, settings, identity.clone(), epoch)
        })
    }

    /// Retire the current handles. Callers must rebuild before releasing the lock.
    pub(crate) fn invalidate(&mut self) {
        if let Some(state) = self.state.take() {
            state.epoch.retire();
            debug!(epoch = state.epoch(), "session handles invalidated");
        }
        self.phase = SessionPhase::Invalidated;
    }

    /// Invalidate and immediately rebuild from the current identity.
    pub(crate) fn rebuild(&mut self) -> &SessionState<C> {
        self.invalidate();
        self.active()
    }

    /// Swap the identity and rebuild the handles around it.
    pub(crate) fn replace_identity(&mut self, identity: SigningIdentity) -> &SessionState<C> {
        self.invalidate();
        self.identity = identity;
        self.active()
    }

    pub(crate) const fn identity(&self) -> &SigningIdentity {
        &self.identity
    }
}
