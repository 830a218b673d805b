use crate::errors::SessionError;
use alloy_primitives::{Address, B256, Signature};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use fixture_config::PrivateKey;
use std::fmt;

/// A private key and the address derived from it.
///
/// Identities are values: swapping identities means building a new one, the
/// key inside is never mutated.
#[derive(Clone)]
pub struct SigningIdentity {
    signer: PrivateKeySigner,
}

impl SigningIdentity {
    /// Build an identity from configured key material.
    pub fn from_private_key(key: &PrivateKey) -> Result<Self, SessionError> {
        PrivateKeySigner::from_bytes(key.as_bytes())
            .map(|signer| Self { signer })
            .map_err(|error| SessionError::InvalidKey(error.to_string().into()))
    }

    /// Fresh identity with a random key.
    pub fn random() -> Self {
        Self {
            signer: PrivateKeySigner::random(),
        }
    }

    /// Address derived from the key.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Sign a 32-byte digest.
    pub(crate) fn sign_hash(&self, hash: &B256) -> Result<Signature, SessionError> {
        self.signer
            .sign_hash_sync(hash)
            .map_err(|error| SessionError::Signing(Box::new(error)))
    }
}

impl PartialEq for SigningIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for SigningIdentity {}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, keccak256};
    use rstest::rstest;

    #[rstest]
    fn derives_the_well_known_development_address() {
        let key: PrivateKey = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
            .parse()
            .unwrap();
        let identity = SigningIdentity::from_private_key(&key).unwrap();
        assert_eq!(
            identity.address(),
            address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
    }

    #[rstest]
    fn zero_key_is_rejected() {
        let err = SigningIdentity::from_private_key(&PrivateKey::new(B256::ZERO)).unwrap_err();
        assert!(matches!(err, SessionError::InvalidKey(_)));
    }

    #[rstest]
    fn signatures_recover_to_the_identity() {
        let identity = SigningIdentity::random();
        let digest = keccak256(b"fixture");
        let signature = identity.sign_hash(&digest).unwrap();
        assert_eq!(
            signature.recover_address_from_prehash(&digest).unwrap(),
            identity.address()
        );
    }

    #[rstest]
    fn debug_shows_only_the_address() {
        let identity = SigningIdentity::random();
        let rendered = format!("{identity:?}");
        assert!(rendered.contains(&format!("{:?}", identity.address())));
        assert!(!rendered.contains("signer"));
    }
}
