//! Presets for driving a local Hardhat node.
//!
//! [`HardhatLocal`] produces a ready [`fixture_config::Config`] signing with
//! one of the node's [`DEV_ACCOUNTS`]; [`NODE_CONTROL_METHODS`] lists the
//! non-standard methods a session relies on.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod accounts;
mod hardhat;
mod methods;

pub use accounts::{DEV_ACCOUNTS, DevAccount};
pub use hardhat::HardhatLocal;
pub use methods::{NODE_CONTROL_METHODS, node_control_method_set};
