use std::collections::HashSet;

/// Node-control methods outside the standard `eth_` namespace that a session calls.
pub const NODE_CONTROL_METHODS: &[&str] = &[
    "evm_increaseTime",
    "evm_mine",
    "evm_revert",
    "evm_snapshot",
    "hardhat_impersonateAccount",
    "hardhat_reset",
    "hardhat_setBalance",
    "hardhat_stopImpersonatingAccount",
];

/// Returns a [`HashSet`] of the node-control methods, lowercased.
pub fn node_control_method_set() -> HashSet<String> {
    NODE_CONTROL_METHODS
        .iter()
        .map(|method| method.to_ascii_lowercase())
        .collect()
}
