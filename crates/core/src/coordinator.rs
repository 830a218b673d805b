use crate::channel::{HttpChannel, RpcChannel, request};
use crate::errors::SessionError;
use crate::handles::{SharedChain, SignedHandle, UnsignedHandle};
use crate::identity::SigningIdentity;
use crate::methods::{
    ETH_BLOCK_NUMBER, ETH_GET_BALANCE, ETH_GET_BLOCK_BY_NUMBER, ETH_GET_TRANSACTION_COUNT,
    EVM_INCREASE_TIME, EVM_MINE, EVM_REVERT, EVM_SNAPSHOT, HARDHAT_IMPERSONATE_ACCOUNT,
    HARDHAT_RESET, HARDHAT_SET_BALANCE, HARDHAT_STOP_IMPERSONATING_ACCOUNT,
};
use crate::outcome::{TransactionCall, TransactionOutcome};
use crate::quantity::{to_address, to_quantity};
use crate::session::{SessionPhase, SessionSlot};
use crate::types::{BlockInfo, ForkSpec, RawBlock, SnapshotHandle};
use alloy_primitives::{Address, U64, U256};
use fixture_config::{Config, TransactionSettings};
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Owns the RPC channel and the session state, and funnels every operation
/// that invalidates node-side state through a locked revert-then-rebuild path.
///
/// All operations are `async`; callers decide when to block. Send handles are
/// captured under the lock and used after it is released, so slow sends do
/// not hold up unrelated queries.
///
/// Coordinators derived with [`ConnectionCoordinator::with_identity`] share
/// their view of the node, so a revert through any of them stales all their
/// handles.
pub struct ConnectionCoordinator<C = HttpChannel> {
    channel: Arc<C>,
    chain: Arc<SharedChain>,
    settings: TransactionSettings,
    session: Mutex<SessionSlot<C>>,
}

impl<C> fmt::Debug for ConnectionCoordinator<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionCoordinator")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ConnectionCoordinator<HttpChannel> {
    /// Connect to the configured node with the configured identity.
    pub fn from_config(config: &Config) -> Result<Self, SessionError> {
        let settings = *config.transactions();
        let channel = HttpChannel::new(config.node_url().clone(), settings.request_timeout);
        let identity = SigningIdentity::from_private_key(config.private_key())?;
        info!(
            node_url = %config.node_url(),
            address = %identity.address(),
            "session configured"
        );
        Ok(Self::new(channel, settings, identity))
    }
}

impl<C: RpcChannel> ConnectionCoordinator<C> {
    /// Create a coordinator over any [`RpcChannel`].
    pub fn new(channel: C, settings: TransactionSettings, identity: SigningIdentity) -> Self {
        let channel = Arc::new(channel);
        let chain = Arc::new(SharedChain::default());
        let session = Mutex::new(SessionSlot::new(
            Arc::clone(&channel),
            Arc::clone(&chain),
            settings,
            identity,
        ));
        Self {
            channel,
            chain,
            settings,
            session,
        }
    }

    /// The channel every call goes through.
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// A second session on the same node acting as `identity`.
    ///
    /// The new coordinator builds its own handles; this one is left untouched
    /// and no node call is made. Reverts and resets through either one
    /// invalidate the handles of both.
    pub fn with_identity(&self, identity: SigningIdentity) -> Self {
        debug!(address = %identity.address(), "deriving session for another identity");
        Self {
            channel: Arc::clone(&self.channel),
            chain: Arc::clone(&self.chain),
            settings: self.settings,
            session: Mutex::new(SessionSlot::new(
                Arc::clone(&self.channel),
                Arc::clone(&self.chain),
                self.settings,
                identity,
            )),
        }
    }

    /// Swap this session's identity in place, rebuilding its handles.
    pub async fn set_identity(&self, identity: SigningIdentity) {
        let mut session = self.session.lock().await;
        debug!(
            from = %session.identity().address(),
            to = %identity.address(),
            "swapping signing identity"
        );
        session.replace_identity(identity);
    }

    /// Lifecycle phase of the session state.
    pub async fn phase(&self) -> SessionPhase {
        self.session.lock().await.phase()
    }

    /// Epoch of the current session state, building it if needed.
    pub async fn epoch(&self) -> u64 {
        self.session.lock().await.active().epoch()
    }

    /// Address of the current signing identity.
    pub async fn current_address(&self) -> Address {
        self.session.lock().await.active().identity().address()
    }

    /// Handle signing with the current identity.
    pub async fn signed_send_handle(&self) -> SignedHandle<C> {
        self.session.lock().await.active().signed()
    }

    /// Handle relying on node-side impersonation.
    pub async fn unsigned_send_handle(&self) -> UnsignedHandle<C> {
        self.session.lock().await.active().unsigned()
    }

    /// Balance of `address` in wei at the latest block.
    pub async fn get_ether_balance(&self, address: Address) -> Result<U256, SessionError> {
        request(
            &*self.channel,
            ETH_GET_BALANCE,
            vec![to_address(address), json!("latest")],
        )
        .await
    }

    /// Confirmed nonce of `address`.
    pub async fn transaction_count(&self, address: Address) -> Result<u64, SessionError> {
        let count: U64 = request(
            &*self.channel,
            ETH_GET_TRANSACTION_COUNT,
            vec![to_address(address), json!("latest")],
        )
        .await?;
        Ok(count.to::<u64>())
    }

    /// Latest block height.
    pub async fn block_number(&self) -> Result<u64, SessionError> {
        let number: U64 = request(&*self.channel, ETH_BLOCK_NUMBER, vec![]).await?;
        Ok(number.to::<u64>())
    }

    /// Height and timestamp of the latest block.
    pub async fn latest_block(&self) -> Result<BlockInfo, SessionError> {
        let block: Option<RawBlock> = request(
            &*self.channel,
            ETH_GET_BLOCK_BY_NUMBER,
            vec![json!("latest"), json!(false)],
        )
        .await?;
        block.map(BlockInfo::from).ok_or_else(|| {
            SessionError::invalid_response(ETH_GET_BLOCK_BY_NUMBER, "no latest block")
        })
    }

    /// Transfer `amount` wei to `to`, signed by the current identity.
    ///
    /// Failure receipts come back as `Ok` with a failed outcome; use
    /// [`TransactionOutcome::into_result`] to require success.
    pub async fn send_ether(
        &self,
        to: Address,
        amount: U256,
    ) -> Result<TransactionOutcome, SessionError> {
        let handle = self.signed_send_handle().await;
        info!(from = %handle.address(), %to, %amount, "sending ether");
        handle.send(TransactionCall::transfer(to, amount)).await
    }

    /// Advance the simulated clock by `seconds`, then mine a block.
    ///
    /// If the clock moved but mining failed the error is
    /// [`SessionError::PartialTimeTravelFailure`]. Handles are kept: clock
    /// changes do not touch nonces or accounts.
    pub async fn time_travel(&self, seconds: u64) -> Result<(), SessionError> {
        self.channel
            .call(EVM_INCREASE_TIME, vec![json!(seconds)])
            .await?;
        if let Err(error) = self.channel.call(EVM_MINE, vec![]).await {
            warn!(seconds, %error, "clock advanced but block was not mined");
            return Err(SessionError::PartialTimeTravelFailure {
                seconds,
                source: Box::new(error),
            });
        }
        debug!(seconds, "time travelled");
        Ok(())
    }

    /// Let the node accept unsigned transactions from `address`. Repeating the
    /// call for the same address has no further effect.
    pub async fn impersonate_account(&self, address: Address) -> Result<(), SessionError> {
        self.channel
            .call(HARDHAT_IMPERSONATE_ACCOUNT, vec![to_address(address)])
            .await?;
        debug!(%address, "impersonating account");
        Ok(())
    }

    /// Undo [`impersonate_account`](Self::impersonate_account).
    pub async fn stop_impersonating_account(&self, address: Address) -> Result<(), SessionError> {
        self.channel
            .call(HARDHAT_STOP_IMPERSONATING_ACCOUNT, vec![to_address(address)])
            .await?;
        debug!(%address, "stopped impersonating account");
        Ok(())
    }

    /// Overwrite the balance of `address`.
    pub async fn set_balance(&self, address: Address, amount: U256) -> Result<(), SessionError> {
        self.channel
            .call(
                HARDHAT_SET_BALANCE,
                vec![to_address(address), to_quantity(amount)],
            )
            .await?;
        Ok(())
    }

    /// Impersonate `call.from`, then submit `call` through the unsigned handle.
    ///
    /// The order is fixed: the node refuses the send unless impersonation is
    /// already enabled.
    pub async fn make_impersonated_call(
        &self,
        call: TransactionCall,
    ) -> Result<TransactionOutcome, SessionError> {
        let from = call.from.ok_or(SessionError::MissingSender)?;
        self.impersonate_account(from).await?;
        let handle = self.unsigned_send_handle().await;
        handle.send(call).await
    }

    /// Snapshot the full chain state.
    pub async fn make_snapshot(&self) -> Result<SnapshotHandle, SessionError> {
        let raw = self.channel.call(EVM_SNAPSHOT, vec![]).await?;
        if !(raw.is_string() || raw.is_number()) {
            return Err(SessionError::invalid_response(
                EVM_SNAPSHOT,
                format!("expected a snapshot id, got {raw}"),
            ));
        }
        let snapshot = SnapshotHandle::new(raw);
        debug!(%snapshot, "snapshot taken");
        Ok(snapshot)
    }

    /// Revert to `snapshot` and rebuild the session handles.
    ///
    /// The rebuild happens whatever the node answered: a revert can reset
    /// nonces the signed handle has cached.
    pub async fn restore_snapshot(&self, snapshot: SnapshotHandle) -> Result<(), SessionError> {
        let rendered = snapshot.to_string();
        let result = self
            .invalidating_call(EVM_REVERT, vec![snapshot.into_raw()])
            .await?;
        match result {
            Value::Bool(true) => {
                debug!(snapshot = %rendered, "snapshot restored");
                Ok(())
            }
            Value::Bool(false) => Err(SessionError::RevertRejected { snapshot: rendered }),
            other => Err(SessionError::invalid_response(
                EVM_REVERT,
                format!("expected a boolean, got {other}"),
            )),
        }
    }

    /// Reset the node onto a fork of `fork.source_uri()` at `fork.at_block()`,
    /// rebuilding the session handles. Returns the node's acknowledgement.
    pub async fn hardhat_reset(&self, fork: &ForkSpec) -> Result<bool, SessionError> {
        let params = json!({
            "forking": {
                "jsonRpcUrl": fork.source_uri(),
                "blockNumber": fork.at_block(),
            }
        });
        info!(block = fork.at_block(), "resetting node onto fork");
        let result = self.invalidating_call(HARDHAT_RESET, vec![params]).await?;
        acknowledgement(HARDHAT_RESET, &result)
    }

    /// Reset the node to a fresh local chain, rebuilding the session handles.
    pub async fn reset_local(&self) -> Result<bool, SessionError> {
        info!("resetting node to a local chain");
        let result = self.invalidating_call(HARDHAT_RESET, vec![]).await?;
        acknowledgement(HARDHAT_RESET, &result)
    }

    /// Issue `method` and rebuild the session as one critical section.
    ///
    /// The lock is held across the call so nobody can capture a handle between
    /// the node changing state and the rebuild finishing.
    async fn invalidating_call(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Value, SessionError> {
        let mut session = self.session.lock().await;
        let result = self.channel.call(method, params).await;
        let generation = self.chain.advance();
        let epoch = session.rebuild().epoch();
        debug!(
            method,
            epoch,
            generation,
            ok = result.is_ok(),
            "session rebuilt after state change"
        );
        result
    }
}

fn acknowledgement(method: &str, result: &Value) -> Result<bool, SessionError> {
    result.as_bool().ok_or_else(|| {
        SessionError::invalid_response(method, format!("expected a boolean, got {result}"))
    })
}
