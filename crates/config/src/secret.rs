use crate::ConfigError;
use alloy_primitives::B256;
use std::fmt;
use std::str::FromStr;

/// 32 bytes of secp256k1 secret key material.
///
/// `Debug` never prints the bytes, so a [`Config`](crate::Config) can be
/// logged freely.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PrivateKey(B256);

impl PrivateKey {
    /// Wrap raw key bytes.
    pub const fn new(bytes: B256) -> Self {
        Self(bytes)
    }

    /// Borrow the raw key bytes.
    pub const fn as_bytes(&self) -> &B256 {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

impl FromStr for PrivateKey {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        B256::from_str(value.trim())
            .map(Self)
            .map_err(|source| ConfigError::PrivateKey { source })
    }
}

impl From<B256> for PrivateKey {
    fn from(bytes: B256) -> Self {
        Self(bytes)
    }
}
