//! JSON-RPC method names spoken by the session.

/// Take a snapshot of the full chain state.
pub const EVM_SNAPSHOT: &str = "evm_snapshot";
/// Restore (and consume) a snapshot.
pub const EVM_REVERT: &str = "evm_revert";
/// Advance the simulated clock.
pub const EVM_INCREASE_TIME: &str = "evm_increaseTime";
/// Mine one block.
pub const EVM_MINE: &str = "evm_mine";
/// Accept unsigned transactions from an address.
pub const HARDHAT_IMPERSONATE_ACCOUNT: &str = "hardhat_impersonateAccount";
/// Stop accepting unsigned transactions from an address.
pub const HARDHAT_STOP_IMPERSONATING_ACCOUNT: &str = "hardhat_stopImpersonatingAccount";
/// Overwrite an account balance.
pub const HARDHAT_SET_BALANCE: &str = "hardhat_setBalance";
/// Reset the chain, optionally onto a fork of an upstream node.
pub const HARDHAT_RESET: &str = "hardhat_reset";

/// Chain id of the node.
pub const ETH_CHAIN_ID: &str = "eth_chainId";
/// Latest block height.
pub const ETH_BLOCK_NUMBER: &str = "eth_blockNumber";
/// Block header lookup.
pub const ETH_GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";
/// Account balance lookup.
pub const ETH_GET_BALANCE: &str = "eth_getBalance";
/// Account nonce lookup.
pub const ETH_GET_TRANSACTION_COUNT: &str = "eth_getTransactionCount";
/// Submit a transaction the node signs or impersonates.
pub const ETH_SEND_TRANSACTION: &str = "eth_sendTransaction";
/// Submit a locally signed transaction.
pub const ETH_SEND_RAW_TRANSACTION: &str = "eth_sendRawTransaction";
/// Receipt lookup.
pub const ETH_GET_TRANSACTION_RECEIPT: &str = "eth_getTransactionReceipt";
