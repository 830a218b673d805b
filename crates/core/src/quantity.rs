//! Helpers for the hex quantities and byte strings nodes exchange.

use alloy_primitives::{Address, hex};
use serde_json::Value;
use std::fmt;

/// Encode a number as a `0x`-prefixed JSON-RPC quantity.
pub fn to_quantity(value: impl fmt::LowerHex) -> Value {
    Value::String(format!("{value:#x}"))
}

/// Encode an address as lowercase `0x`-prefixed hex.
pub fn to_address(address: Address) -> Value {
    Value::String(format!("{address:#x}"))
}

/// Encode raw bytes as `0x`-prefixed hex.
pub fn to_data(bytes: &[u8]) -> Value {
    Value::String(hex::encode_prefixed(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::zero(0, "0x0")]
    #[case::small(16, "0x10")]
    #[case::large(1_000_000_000_000_000_000, "0xde0b6b3a7640000")]
    fn quantities_are_minimal_hex(#[case] input: u128, #[case] expected: &str) {
        assert_eq!(to_quantity(input), json!(expected));
    }

    #[rstest]
    fn addresses_are_lowercase_hex() {
        let encoded = to_address(address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"));
        assert_eq!(encoded, json!("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"));
    }

    #[rstest]
    fn data_is_prefixed() {
        assert_eq!(to_data(&[0xde, 0xad]), json!("0xdead"));
        assert_eq!(to_data(&[]), json!("0x"));
    }
}
