use crate::errors::SessionError;
use alloy_primitives::{Address, B256, Bytes, U64, U256};
use serde::Deserialize;
use serde_json::Value;

/// Selector of `Error(string)`.
const ERROR_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];
/// Selector of `Panic(uint256)`.
const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

/// A prepared call or transfer, ready to be dispatched through a send handle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionCall {
    /// Sender. Ignored by signed sends, required by impersonated ones.
    pub from: Option<Address>,
    /// Recipient, `None` for contract creation.
    pub to: Option<Address>,
    /// Wei attached to the call.
    pub value: U256,
    /// Calldata.
    pub data: Bytes,
    /// Per-call gas limit, defaults to the configured ceiling.
    pub gas_limit: Option<u64>,
}

impl TransactionCall {
    /// Plain ether transfer.
    pub fn transfer(to: Address, value: U256) -> Self {
        Self {
            to: Some(to),
            value,
            ..Default::default()
        }
    }

    /// Call `to` with `data`.
    pub fn call(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to: Some(to),
            data: data.into(),
            ..Default::default()
        }
    }

    /// Set the sender.
    #[must_use]
    pub const fn from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    /// Attach wei to the call.
    #[must_use]
    pub const fn value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Override the configured gas ceiling for this call.
    #[must_use]
    pub const fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }
}

/// Whether a transaction achieved its effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Mined with a success receipt.
    Success,
    /// Mined with a failure receipt, or refused before it could be mined.
    Failure,
}

/// One log emitted by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogEntry {
    /// Emitting contract.
    pub address: Address,
    /// Indexed topics, the event signature first.
    pub topics: Vec<B256>,
    /// Non-indexed payload.
    pub data: Bytes,
}

/// Result of a state-mutating call, inspectable without unwinding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOutcome {
    status: TransactionStatus,
    transaction_hash: Option<B256>,
    block_number: Option<u64>,
    gas_used: u64,
    logs: Vec<LogEntry>,
    failure_reason: Option<String>,
}

impl TransactionOutcome {
    /// Outcome of a transaction that never made it into a block.
    pub fn refused(reason: impl Into<String>) -> Self {
        Self {
            status: TransactionStatus::Failure,
            transaction_hash: None,
            block_number: None,
            gas_used: 0,
            logs: Vec::new(),
            failure_reason: Some(reason.into()),
        }
    }

    /// Final status.
    pub const fn status(&self) -> TransactionStatus {
        self.status
    }

    /// Returns `true` for a success receipt.
    pub fn is_success(&self) -> bool {
        self.status == TransactionStatus::Success
    }

    /// Hash of the mined transaction, `None` if it was refused before mining.
    pub const fn transaction_hash(&self) -> Option<B256> {
        self.transaction_hash
    }

    /// Block the transaction was mined in.
    pub const fn block_number(&self) -> Option<u64> {
        self.block_number
    }

    /// Gas consumed by the transaction.
    pub const fn gas_used(&self) -> u64 {
        self.gas_used
    }

    /// Logs in emission order.
    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    /// Node-reported reason for a failure, when one is known.
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Convert a failure into [`SessionError::TransactionRejected`] for callers
    /// that require success.
    pub fn into_result(self) -> Result<Self, SessionError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(SessionError::TransactionRejected(Box::new(self)))
        }
    }

    pub(crate) fn with_failure_reason(mut self, reason: Option<String>) -> Self {
        if !self.is_success() && self.failure_reason.is_none() {
            self.failure_reason = reason;
        }
        self
    }
}

/// Receipt fields the session reads, as a node serializes them.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: B256,
    block_number: Option<U64>,
    #[serde(default)]
    gas_used: U64,
    status: Option<U64>,
    #[serde(default)]
    logs: Vec<LogEntry>,
}

/// Decode an `eth_getTransactionReceipt` result. `Ok(None)` means not yet mined.
pub(crate) fn parse_receipt(value: Value) -> Result<Option<TransactionOutcome>, SessionError> {
    if value.is_null() {
        return Ok(None);
    }

    let receipt: RawReceipt = serde_json::from_value(value).map_err(|error| {
        SessionError::invalid_response("eth_getTransactionReceipt", error.to_string())
    })?;

    // Receipts without a status field predate Byzantium and carry no failure signal.
    let succeeded = receipt.status.is_none_or(|status| status == U64::from(1));

    Ok(Some(TransactionOutcome {
        status: if succeeded {
            TransactionStatus::Success
        } else {
            TransactionStatus::Failure
        },
        transaction_hash: Some(receipt.transaction_hash),
        block_number: receipt.block_number.map(|number| number.to::<u64>()),
        gas_used: receipt.gas_used.to::<u64>(),
        logs: receipt.logs,
        failure_reason: None,
    }))
}

/// Decode an ABI revert payload into a readable message.
///
/// Understands `Error(string)` and `Panic(uint256)`; anything else is `None`.
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    let (selector, body) = data.split_first_chunk::<4>()?;
    match *selector {
        ERROR_SELECTOR => {
            let offset = read_word(body, 0)?;
            let length = read_word(body, offset)?;
            let start = offset.checked_add(32)?;
            let bytes = body.get(start..start.checked_add(length)?)?;
            String::from_utf8(bytes.to_vec()).ok()
        }
        PANIC_SELECTOR => {
            let code = U256::from_be_slice(body.get(..32)?);
            Some(format!("panic: code {code:#x}"))
        }
        _ => None,
    }
}

fn read_word(body: &[u8], at: usize) -> Option<usize> {
    let word = body.get(at..at.checked_add(32)?)?;
    usize::try_from(U256::from_be_slice(word)).ok()
}

/// Capability to explain why something failed.
///
/// Typed event bindings implement this for their failure events so tests can
/// ask any decoded value for a message without knowing its type.
pub trait FailureMessage {
    /// Human-readable failure message, if the value carries one.
    fn failure_message(&self) -> Option<String>;
}

impl FailureMessage for [u8] {
    fn failure_message(&self) -> Option<String> {
        decode_revert_reason(self)
    }
}

impl FailureMessage for Bytes {
    fn failure_message(&self) -> Option<String> {
        decode_revert_reason(self)
    }
}

impl FailureMessage for TransactionOutcome {
    fn failure_message(&self) -> Option<String> {
        if self.is_success() {
            None
        } else {
            self.failure_reason.clone()
        }
    }
}

impl FailureMessage for SessionError {
    fn failure_message(&self) -> Option<String> {
        match self {
            Self::Protocol { message, data, .. } => revert_data(data.as_ref())
                .and_then(|bytes| decode_revert_reason(&bytes))
                .or_else(|| Some(message.clone())),
            Self::TransactionRejected(outcome) => outcome.failure_message(),
            _ => None,
        }
    }
}

/// Revert payload inside a node error's `data`, either bare hex or `{ data: hex }`.
pub(crate) fn revert_data(data: Option<&Value>) -> Option<Bytes> {
    let hex = match data? {
        Value::String(hex) => hex.as_str(),
        Value::Object(object) => object.get("data")?.as_str()?,
        _ => return None,
    };
    hex.parse().ok()
}
