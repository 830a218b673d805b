//! Send capabilities handed out by a session.
//!
//! Both handle kinds are tied to the [`Epoch`] of the session state that
//! built them. Rebuilding the session retires the epoch, after which every
//! send through an old handle fails with [`SessionError::StaleStateAccess`]
//! before reaching the node. A revert or reset made by any session on the
//! same node retires it too, through the [`SharedChain`] they hold.

use crate::channel::{RpcChannel, request};
use crate::errors::SessionError;
use crate::identity::SigningIdentity;
use crate::methods::{
    ETH_CHAIN_ID, ETH_GET_BALANCE, ETH_GET_TRANSACTION_COUNT, ETH_GET_TRANSACTION_RECEIPT,
    ETH_SEND_RAW_TRANSACTION, ETH_SEND_TRANSACTION,
};
use crate::outcome::{FailureMessage, TransactionCall, TransactionOutcome, parse_receipt};
use crate::quantity::{to_address, to_data, to_quantity};
use alloy_consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{Address, B256, TxKind, U64, U256};
use fixture_config::TransactionSettings;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

/// Node-side changes every session on one node has to observe.
#[derive(Debug, Default)]
pub(crate) struct SharedChain {
    generation: AtomicU64,
    unsigned_sends: std::sync::Mutex<HashMap<Address, u64>>,
}

impl SharedChain {
    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Record a revert or reset; epochs built before it become stale.
    pub(crate) fn advance(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Transactions submitted for `address` with a node-assigned nonce.
    fn unsigned_sends(&self, address: Address) -> u64 {
        self.unsigned_sends
            .lock()
            .map_or(0, |sends| sends.get(&address).copied().unwrap_or_default())
    }

    fn record_unsigned_send(&self, address: Address) {
        if let Ok(mut sends) = self.unsigned_sends.lock() {
            *sends.entry(address).or_default() += 1;
        }
    }
}

/// Generation marker shared by a session state and every handle it built.
#[derive(Debug)]
pub(crate) struct Epoch {
    id: u64,
    chain: Arc<SharedChain>,
    generation: u64,
    retired: AtomicBool,
}

impl Epoch {
    pub(crate) fn new(id: u64, chain: Arc<SharedChain>) -> Self {
        Self {
            id,
            generation: chain.generation(),
            chain,
            retired: AtomicBool::new(false),
        }
    }

    pub(crate) const fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn retire(&self) {
        self.retired.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst) || self.chain.generation() != self.generation
    }

    fn ensure_current(&self) -> Result<(), SessionError> {
        if self.is_retired() {
            warn!(epoch = self.id, "rejecting send through a stale handle");
            return Err(SessionError::StaleStateAccess { epoch: self.id });
        }
        Ok(())
    }
}

/// State common to both handle kinds.
struct HandleContext<C> {
    channel: Arc<C>,
    settings: TransactionSettings,
    epoch: Arc<Epoch>,
}

impl<C: RpcChannel> HandleContext<C> {
    /// Turn the submission result into an outcome, waiting for the receipt.
    ///
    /// Nodes that mine a failing transaction but answer the submission with an
    /// error still report its hash in the error data; that case resolves to
    /// the failure receipt rather than an error.
    async fn settle(
        &self,
        method: &str,
        submitted: Result<Value, SessionError>,
    ) -> Result<TransactionOutcome, SessionError> {
        match submitted {
            Ok(value) => {
                let hash: B256 = serde_json::from_value(value)
                    .map_err(|error| SessionError::invalid_response(method, error.to_string()))?;
                self.wait_for_receipt(hash).await
            }
            Err(error) => match mined_transaction_hash(&error) {
                Some(hash) => {
                    debug!(%hash, %error, "transaction mined despite submission error");
                    let outcome = self.wait_for_receipt(hash).await?;
                    Ok(outcome.with_failure_reason(error.failure_message()))
                }
                None => Err(error),
            },
        }
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionOutcome, SessionError> {
        let started = Instant::now();
        loop {
            let receipt = self
                .channel
                .call(ETH_GET_TRANSACTION_RECEIPT, vec![json!(hash)])
                .await?;
            if let Some(outcome) = parse_receipt(receipt)? {
                debug!(
                    %hash,
                    success = outcome.is_success(),
                    block = ?outcome.block_number(),
                    "transaction receipt obtained"
                );
                return Ok(outcome);
            }

            let waited = started.elapsed();
            if waited >= self.settings.receipt_timeout {
                return Err(SessionError::Timeout {
                    transaction_hash: hash,
                    waited,
                });
            }
            trace!(%hash, ?waited, "receipt not yet available");
            tokio::time::sleep(self.settings.receipt_poll_interval).await;
        }
    }
}

/// Hash of a transaction the node mined even though it answered with an error.
///
/// Hardhat reports it as `txHash`, EDR as `transactionHash`.
fn mined_transaction_hash(error: &SessionError) -> Option<B256> {
    let SessionError::Protocol {
        data: Some(Value::Object(data)),
        ..
    } = error
    else {
        return None;
    };
    data.get("txHash")
        .or_else(|| data.get("transactionHash"))?
        .as_str()?
        .parse()
        .ok()
}

/// Capability to submit transactions that the node accepts without a local
/// signature, i.e. from impersonated or node-managed accounts.
///
/// Every send is recorded against its sender, so a signed handle for that
/// address refetches its nonce instead of reusing a cached one.
pub struct UnsignedHandle<C> {
    context: Arc<HandleContext<C>>,
}

impl<C> Clone for UnsignedHandle<C> {
    fn clone(&self) -> Self {
        Self {
            context: Arc::clone(&self.context),
        }
    }
}

impl<C> fmt::Debug for UnsignedHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnsignedHandle")
            .field("epoch", &self.context.epoch.id())
            .field("stale", &self.context.epoch.is_retired())
            .finish()
    }
}

impl<C: RpcChannel> UnsignedHandle<C> {
    pub(crate) fn new(channel: Arc<C>, settings: TransactionSettings, epoch: Arc<Epoch>) -> Self {
        Self {
            context: Arc::new(HandleContext {
                channel,
                settings,
                epoch,
            }),
        }
    }

    /// Epoch of the session state that built this handle.
    pub fn epoch(&self) -> u64 {
        self.context.epoch.id()
    }

    /// Returns `true` once the session has been rebuilt past this handle.
    pub fn is_stale(&self) -> bool {
        self.context.epoch.is_retired()
    }

    /// Submit `call` with `eth_sendTransaction` and wait for its receipt.
    ///
    /// `call.from` is mandatory: the node decides whether it may send for it.
    pub async fn send(&self, call: TransactionCall) -> Result<TransactionOutcome, SessionError> {
        self.context.epoch.ensure_current()?;
        let from = call.from.ok_or(SessionError::MissingSender)?;
        let settings = &self.context.settings;

        let mut transaction = Map::new();
        transaction.insert("from".into(), to_address(from));
        if let Some(to) = call.to {
            transaction.insert("to".into(), to_address(to));
        }
        transaction.insert("value".into(), to_quantity(call.value));
        transaction.insert("data".into(), to_data(&call.data));
        transaction.insert(
            "gas".into(),
            to_quantity(call.gas_limit.unwrap_or(settings.gas_limit)),
        );
        transaction.insert("gasPrice".into(), to_quantity(settings.gas_price));

        debug!(%from, to = ?call.to, value = %call.value, "submitting unsigned transaction");
        let submitted = self
            .context
            .channel
            .call(ETH_SEND_TRANSACTION, vec![Value::Object(transaction)])
            .await;
        self.context.epoch.chain.record_unsigned_send(from);

        self.context.settle(ETH_SEND_TRANSACTION, submitted).await
    }
}

#[derive(Debug, Default)]
struct SignerCache {
    chain_id: Option<u64>,
    next_nonce: Option<u64>,
    /// Unsigned sends for this address seen when `next_nonce` was cached.
    unsigned_sends: u64,
}

struct SignedInner<C> {
    context: HandleContext<C>,
    identity: SigningIdentity,
    cache: Mutex<SignerCache>,
}

/// Capability to submit transactions signed locally by a [`SigningIdentity`].
///
/// The handle caches the chain id and the next nonce after its first send.
/// Those caches are only valid for the chain state the handle was built
/// against, which is why the session replaces the handle after every revert
/// or reset.
pub struct SignedHandle<C> {
    inner: Arc<SignedInner<C>>,
}

impl<C> Clone for SignedHandle<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> fmt::Debug for SignedHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedHandle")
            .field("address", &self.inner.identity.address())
            .field("epoch", &self.inner.context.epoch.id())
            .field("stale", &self.inner.context.epoch.is_retired())
            .finish()
    }
}

impl<C: RpcChannel> SignedHandle<C> {
    pub(crate) fn new(
        channel: Arc<C>,
        settings: TransactionSettings,
        epoch: Arc<Epoch>,
        identity: SigningIdentity,
    ) -> Self {
        Self {
            inner: Arc::new(SignedInner {
                context: HandleContext {
                    channel,
                    settings,
                    epoch,
                },
                identity,
                cache: Mutex::new(SignerCache::default()),
            }),
        }
    }

    /// Address transactions are signed for.
    pub fn address(&self) -> Address {
        self.inner.identity.address()
    }

    /// Epoch of the session state that built this handle.
    pub fn epoch(&self) -> u64 {
        self.inner.context.epoch.id()
    }

    /// Returns `true` once the session has been rebuilt past this handle.
    pub fn is_stale(&self) -> bool {
        self.inner.context.epoch.is_retired()
    }

    /// Sign `call`, submit it with `eth_sendRawTransaction` and wait for its receipt.
    ///
    /// A sender that cannot cover `value + gas_limit * gas_price` gets a
    /// refused [`TransactionOutcome`] without anything being submitted.
    pub async fn send(&self, call: TransactionCall) -> Result<TransactionOutcome, SessionError> {
        let context = &self.inner.context;
        context.epoch.ensure_current()?;

        let address = self.address();
        if call.from.is_some_and(|from| from != address) {
            debug!(from = ?call.from, %address, "ignoring `from` on a signed send");
        }
        let gas_limit = call.gas_limit.unwrap_or(context.settings.gas_limit);
        let gas_price = context.settings.gas_price;

        let balance: U256 = request(
            &*context.channel,
            ETH_GET_BALANCE,
            vec![to_address(address), json!("latest")],
        )
        .await?;
        let required = (U256::from(gas_limit) * U256::from(gas_price)).saturating_add(call.value);
        if balance < required {
            warn!(%address, %balance, %required, "sender cannot cover transaction cost");
            return Ok(TransactionOutcome::refused(format!(
                "insufficient funds: balance {balance} is below the required {required}"
            )));
        }

        let submitted = {
            let mut cache = self.inner.cache.lock().await;
            context.epoch.ensure_current()?;

            let chain_id = match cache.chain_id {
                Some(chain_id) => chain_id,
                None => {
                    let chain_id: U64 = request(&*context.channel, ETH_CHAIN_ID, vec![]).await?;
                    let chain_id = chain_id.to::<u64>();
                    cache.chain_id = Some(chain_id);
                    chain_id
                }
            };
            let unsigned_sends = context.epoch.chain.unsigned_sends(address);
            let nonce = match cache.next_nonce {
                Some(nonce) if cache.unsigned_sends == unsigned_sends => nonce,
                _ => {
                    let nonce: U64 = request(
                        &*context.channel,
                        ETH_GET_TRANSACTION_COUNT,
                        vec![to_address(address), json!("pending")],
                    )
                    .await?;
                    nonce.to::<u64>()
                }
            };

            let transaction = TxLegacy {
                chain_id: Some(chain_id),
                nonce,
                gas_price,
                gas_limit,
                to: call.to.map_or(TxKind::Create, TxKind::Call),
                value: call.value,
                input: call.data,
            };
            let signature = self.inner.identity.sign_hash(&transaction.signature_hash())?;
            let raw = TxEnvelope::from(transaction.into_signed(signature)).encoded_2718();

            debug!(%address, nonce, chain_id, "submitting signed transaction");
            let submitted = context
                .channel
                .call(ETH_SEND_RAW_TRANSACTION, vec![to_data(&raw)])
                .await;
            // Any failure may or may not have consumed the nonce; refetch next time.
            cache.next_nonce = submitted.as_ref().ok().map(|_| nonce + 1);
            cache.unsigned_sends = unsigned_sends;
            submitted
        };

        context.settle(ETH_SEND_RAW_TRANSACTION, submitted).await
    }
}
