//! In-memory development node used by the unit tests.

use crate::channel::RpcChannel;
use crate::errors::SessionError;
use crate::methods::*;
use crate::quantity::{to_address, to_data, to_quantity};
use alloy_consensus::TxEnvelope;
use alloy_eips::eip2718::Decodable2718;
use alloy_primitives::{Address, B256, Bytes, TxKind, U256, keccak256};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;
use std::sync::Mutex;

pub(crate) const CHAIN_ID: u64 = 31_337;
pub(crate) const GENESIS_TIMESTAMP: u64 = 1_700_000_000;
const TRANSFER_GAS: u64 = 21_000;
const REVERT_MESSAGE: &str = "nope";

/// Outcome injected in place of a method's normal answer.
#[derive(Debug, Clone)]
pub(crate) enum Injected {
    Transport,
    Protocol(i64, &'static str),
    /// Answer with this value without touching the chain.
    Answer(Value),
}

/// Chain state captured by `evm_snapshot`.
#[derive(Debug, Clone)]
struct Chain {
    number: u64,
    timestamp: u64,
    pending_offset: u64,
    balances: HashMap<Address, U256>,
    nonces: HashMap<Address, u64>,
    receipts: HashMap<B256, Value>,
}

impl Chain {
    fn genesis(balances: HashMap<Address, U256>) -> Self {
        Self {
            number: 0,
            timestamp: GENESIS_TIMESTAMP,
            pending_offset: 0,
            balances,
            nonces: HashMap::new(),
            receipts: HashMap::new(),
        }
    }

    fn balance(&self, address: &Address) -> U256 {
        self.balances.get(address).copied().unwrap_or_default()
    }

    fn nonce(&self, address: &Address) -> u64 {
        self.nonces.get(address).copied().unwrap_or_default()
    }

    fn mine(&mut self) {
        self.number += 1;
        self.timestamp += 1 + self.pending_offset;
        self.pending_offset = 0;
    }
}

#[derive(Debug)]
struct Node {
    chain: Chain,
    snapshots: BTreeMap<u64, Chain>,
    next_snapshot: u64,
    impersonated: HashSet<Address>,
    reverting: HashSet<Address>,
    fork_balances: HashMap<Address, U256>,
    forked_from: Option<(String, u64)>,
    receipt_delay: u32,
    pending_polls: HashMap<B256, u32>,
}

/// A scripted stand-in for a Hardhat-style node.
///
/// Every transfer mines its own block and emits a `Transfer(from, to, value)`
/// log from the recipient address.
#[derive(Debug)]
pub(crate) struct MemoryNode {
    node: Mutex<Node>,
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, Injected>>,
}

pub(crate) fn transfer_topic() -> B256 {
    keccak256("Transfer(address,address,uint256)")
}

impl MemoryNode {
    pub(crate) fn new() -> Self {
        Self {
            node: Mutex::new(Node {
                chain: Chain::genesis(HashMap::new()),
                snapshots: BTreeMap::new(),
                next_snapshot: 1,
                impersonated: HashSet::new(),
                reverting: HashSet::new(),
                fork_balances: HashMap::new(),
                forked_from: None,
                receipt_delay: 0,
                pending_polls: HashMap::new(),
            }),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn fund(&self, address: Address, amount: U256) {
        self.node.lock().unwrap().chain.balances.insert(address, amount);
    }

    pub(crate) fn balance(&self, address: Address) -> U256 {
        self.node.lock().unwrap().chain.balance(&address)
    }

    pub(crate) fn nonce(&self, address: Address) -> u64 {
        self.node.lock().unwrap().chain.nonce(&address)
    }

    pub(crate) fn block_number(&self) -> u64 {
        self.node.lock().unwrap().chain.number
    }

    /// Transfers to `address` are mined with a failure receipt.
    pub(crate) fn mark_reverting(&self, address: Address) {
        self.node.lock().unwrap().reverting.insert(address);
    }

    /// Balances visible after a fork reset.
    pub(crate) fn set_fork_balances(&self, balances: HashMap<Address, U256>) {
        self.node.lock().unwrap().fork_balances = balances;
    }

    pub(crate) fn forked_from(&self) -> Option<(String, u64)> {
        self.node.lock().unwrap().forked_from.clone()
    }

    pub(crate) fn is_impersonating(&self, address: Address) -> bool {
        self.node.lock().unwrap().impersonated.contains(&address)
    }

    /// Receipts only show up after this many polls.
    pub(crate) fn set_receipt_delay(&self, polls: u32) {
        self.node.lock().unwrap().receipt_delay = polls;
    }

    pub(crate) fn fail(&self, method: &str, failure: Injected) {
        self.failures
            .lock()
            .unwrap()
            .insert(method.to_string(), failure);
    }

    pub(crate) fn clear_failure(&self, method: &str) {
        self.failures.lock().unwrap().remove(method);
    }

    /// Methods called so far, in order.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count_calls(&self, method: &str) -> usize {
        self.calls().iter().filter(|call| *call == method).count()
    }

    fn dispatch(&self, method: &str, params: &[Value]) -> Result<Value, SessionError> {
        let mut node = self.node.lock().unwrap();
        match method {
            ETH_CHAIN_ID => Ok(to_quantity(CHAIN_ID)),
            ETH_BLOCK_NUMBER => Ok(to_quantity(node.chain.number)),
            ETH_GET_BLOCK_BY_NUMBER => Ok(json!({
                "number": to_quantity(node.chain.number),
                "timestamp": to_quantity(node.chain.timestamp),
                "transactions": [],
            })),
            ETH_GET_BALANCE => {
                let address: Address = param(method, params, 0)?;
                Ok(to_quantity(node.chain.balance(&address)))
            }
            ETH_GET_TRANSACTION_COUNT => {
                let address: Address = param(method, params, 0)?;
                Ok(to_quantity(node.chain.nonce(&address)))
            }
            ETH_SEND_RAW_TRANSACTION => {
                let raw: Bytes = param(method, params, 0)?;
                let envelope = TxEnvelope::decode_2718(&mut raw.as_ref())
                    .map_err(|_| invalid_params(method))?;
                let TxEnvelope::Legacy(signed) = &envelope else {
                    return Err(invalid_params(method));
                };
                let from = signed
                    .signature()
                    .recover_address_from_prehash(&signed.signature_hash())
                    .map_err(|_| invalid_params(method))?;
                let tx = signed.tx();
                if tx.chain_id != Some(CHAIN_ID) {
                    return Err(rpc_error(method, -32000, "invalid chain id"));
                }
                let to = match tx.to {
                    TxKind::Call(to) => Some(to),
                    TxKind::Create => None,
                };
                node.apply(
                    method,
                    Transfer {
                        from,
                        to,
                        value: tx.value,
                        gas_price: tx.gas_price,
                        gas_limit: tx.gas_limit,
                        nonce: Some(tx.nonce),
                        hash: keccak256(&raw),
                    },
                )
            }
            ETH_SEND_TRANSACTION => {
                let request = params.first().ok_or_else(|| invalid_params(method))?;
                let from: Address = field(method, request, "from")?;
                if !node.impersonated.contains(&from) {
                    return Err(rpc_error(method, -32000, "unknown account"));
                }
                let to: Option<Address> = field(method, request, "to")?;
                let value = parse_field(method, request, "value")?;
                let gas_price = parse_field(method, request, "gasPrice")?;
                let gas_limit = parse_field(method, request, "gas")?;
                let nonce = node.chain.nonce(&from);
                let mut preimage = from.to_vec();
                preimage.extend_from_slice(&nonce.to_be_bytes());
                let hash = keccak256(&preimage);
                node.apply(
                    method,
                    Transfer {
                        from,
                        to,
                        value,
                        gas_price: gas_price.to::<u128>(),
                        gas_limit: gas_limit.to::<u64>(),
                        nonce: None,
                        hash,
                    },
                )
            }
            ETH_GET_TRANSACTION_RECEIPT => {
                let hash: B256 = param(method, params, 0)?;
                if let Some(remaining) = node.pending_polls.get_mut(&hash) {
                    if *remaining > 0 {
                        *remaining -= 1;
                        return Ok(Value::Null);
                    }
                }
                Ok(node.chain.receipts.get(&hash).cloned().unwrap_or(Value::Null))
            }
            EVM_SNAPSHOT => {
                let id = node.next_snapshot;
                node.next_snapshot += 1;
                let chain = node.chain.clone();
                node.snapshots.insert(id, chain);
                Ok(to_quantity(id))
            }
            EVM_REVERT => {
                let id = params
                    .first()
                    .and_then(parse_u64)
                    .ok_or_else(|| invalid_params(method))?;
                let Some(chain) = node.snapshots.remove(&id) else {
                    return Ok(json!(false));
                };
                node.snapshots.retain(|later, _| *later < id);
                node.chain = chain;
                Ok(json!(true))
            }
            EVM_INCREASE_TIME => {
                let seconds = params
                    .first()
                    .and_then(parse_u64)
                    .ok_or_else(|| invalid_params(method))?;
                node.chain.pending_offset += seconds;
                Ok(json!(node.chain.pending_offset))
            }
            EVM_MINE => {
                node.chain.mine();
                Ok(json!("0x0"))
            }
            HARDHAT_IMPERSONATE_ACCOUNT => {
                let address: Address = param(method, params, 0)?;
                node.impersonated.insert(address);
                Ok(json!(true))
            }
            HARDHAT_STOP_IMPERSONATING_ACCOUNT => {
                let address: Address = param(method, params, 0)?;
                Ok(json!(node.impersonated.remove(&address)))
            }
            HARDHAT_SET_BALANCE => {
                let address: Address = param(method, params, 0)?;
                let amount: U256 = param(method, params, 1)?;
                node.chain.balances.insert(address, amount);
                Ok(json!(true))
            }
            HARDHAT_RESET => {
                let forking = params.first().map(|options| &options["forking"]);
                let mut chain = Chain::genesis(HashMap::new());
                let forked_from = match forking {
                    Some(forking) if !forking.is_null() => {
                        let url: String = field(method, forking, "jsonRpcUrl")?;
                        let block = forking["blockNumber"]
                            .as_u64()
                            .ok_or_else(|| invalid_params(method))?;
                        chain.number = block;
                        chain.balances = node.fork_balances.clone();
                        Some((url, block))
                    }
                    _ => None,
                };
                node.forked_from = forked_from;
                node.chain = chain;
                node.snapshots.clear();
                node.impersonated.clear();
                Ok(json!(true))
            }
            _ => Err(rpc_error(method, -32601, "Method not found")),
        }
    }
}

struct Transfer {
    from: Address,
    to: Option<Address>,
    value: U256,
    gas_price: u128,
    gas_limit: u64,
    nonce: Option<u64>,
    hash: B256,
}

impl Node {
    fn apply(&mut self, method: &str, transfer: Transfer) -> Result<Value, SessionError> {
        let expected = self.chain.nonce(&transfer.from);
        if let Some(nonce) = transfer.nonce {
            if nonce > expected {
                return Err(rpc_error(method, -32000, "nonce too high"));
            }
            if nonce < expected {
                return Err(rpc_error(method, -32000, "nonce too low"));
            }
        }

        let max_fee = U256::from(transfer.gas_limit) * U256::from(transfer.gas_price);
        if self.chain.balance(&transfer.from) < max_fee + transfer.value {
            return Err(rpc_error(
                method,
                -32003,
                "insufficient funds for gas * price + value",
            ));
        }

        let fee = U256::from(TRANSFER_GAS) * U256::from(transfer.gas_price);
        let reverted = transfer
            .to
            .is_some_and(|to| self.reverting.contains(&to));

        let sender_balance = self.chain.balance(&transfer.from);
        let debit = if reverted { fee } else { fee + transfer.value };
        self.chain
            .balances
            .insert(transfer.from, sender_balance.saturating_sub(debit));
        self.chain.nonces.insert(transfer.from, expected + 1);

        let mut logs = Vec::new();
        if !reverted {
            if let Some(to) = transfer.to {
                let credited = self.chain.balance(&to) + transfer.value;
                self.chain.balances.insert(to, credited);
                logs.push(json!({
                    "address": to_address(to),
                    "topics": [
                        transfer_topic(),
                        B256::left_padding_from(transfer.from.as_slice()),
                        B256::left_padding_from(to.as_slice()),
                    ],
                    "data": to_data(&transfer.value.to_be_bytes::<32>()),
                }));
            }
        }

        self.chain.mine();
        let status = if reverted { "0x0" } else { "0x1" };
        self.chain.receipts.insert(
            transfer.hash,
            json!({
                "transactionHash": transfer.hash,
                "blockNumber": to_quantity(self.chain.number),
                "gasUsed": to_quantity(TRANSFER_GAS),
                "status": status,
                "logs": logs,
            }),
        );
        if self.receipt_delay > 0 {
            self.pending_polls.insert(transfer.hash, self.receipt_delay);
        }

        if reverted {
            return Err(SessionError::Protocol {
                method: method.to_string(),
                code: -32603,
                message: format!(
                    "VM Exception while processing transaction: reverted with reason string '{REVERT_MESSAGE}'"
                ),
                data: Some(json!({
                    "txHash": transfer.hash,
                    "data": to_data(&revert_payload(REVERT_MESSAGE)),
                })),
            });
        }
        Ok(json!(transfer.hash))
    }
}

impl RpcChannel for MemoryNode {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, SessionError> {
        self.calls.lock().unwrap().push(method.to_string());
        let injected = self.failures.lock().unwrap().get(method).cloned();
        match injected {
            Some(Injected::Transport) => Err(SessionError::transport(method, "connection reset")),
            Some(Injected::Protocol(code, message)) => Err(rpc_error(method, code, message)),
            Some(Injected::Answer(value)) => Ok(value),
            None => self.dispatch(method, &params),
        }
    }
}

/// ABI encoding of `Error(message)`.
pub(crate) fn revert_payload(message: &str) -> Vec<u8> {
    let mut payload = vec![0x08, 0xc3, 0x79, 0xa0];
    payload.extend_from_slice(&U256::from(32).to_be_bytes::<32>());
    payload.extend_from_slice(&U256::from(message.len()).to_be_bytes::<32>());
    let mut padded = message.as_bytes().to_vec();
    padded.resize(message.len().div_ceil(32) * 32, 0);
    payload.extend_from_slice(&padded);
    payload
}

/// Read a quantity that may be a hex string, a decimal string or a JSON number.
pub(crate) fn parse_u256(value: &Value) -> Option<U256> {
    match value {
        Value::String(text) => U256::from_str(text.trim()).ok(),
        Value::Number(number) => number.as_u64().map(U256::from),
        _ => None,
    }
}

pub(crate) fn parse_u64(value: &Value) -> Option<u64> {
    parse_u256(value).and_then(|quantity| u64::try_from(quantity).ok())
}

fn rpc_error(method: &str, code: i64, message: &str) -> SessionError {
    SessionError::Protocol {
        method: method.to_string(),
        code,
        message: message.to_string(),
        data: None,
    }
}

fn invalid_params(method: &str) -> SessionError {
    rpc_error(method, -32602, "invalid params")
}

fn param<T: DeserializeOwned>(
    method: &str,
    params: &[Value],
    index: usize,
) -> Result<T, SessionError> {
    let value = params.get(index).ok_or_else(|| invalid_params(method))?;
    serde_json::from_value(value.clone()).map_err(|_| invalid_params(method))
}

fn field<T: DeserializeOwned>(
    method: &str,
    object: &Value,
    name: &str,
) -> Result<T, SessionError> {
    serde_json::from_value(object.get(name).cloned().unwrap_or(Value::Null))
        .map_err(|_| invalid_params(method))
}

fn parse_field(method: &str, object: &Value, name: &str) -> Result<U256, SessionError> {
    object
        .get(name)
        .and_then(parse_u256)
        .ok_or_else(|| invalid_params(method))
}

mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::hex(json!("0x2a"), Some(42))]
    #[case::decimal(json!("42"), Some(42))]
    #[case::number(json!(42), Some(42))]
    #[case::garbage(json!("0xzz"), None)]
    #[case::object(json!({}), None)]
    fn parses_loose_quantities(#[case] input: Value, #[case] expected: Option<u64>) {
        assert_eq!(parse_u64(&input), expected);
    }
}
