use alloy_primitives::{Address, B256, address, b256};
use fixture_config::PrivateKey;

/// A prefunded account of the default Hardhat mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DevAccount {
    address: Address,
    private_key: B256,
}

impl DevAccount {
    const fn new(address: Address, private_key: B256) -> Self {
        Self {
            address,
            private_key,
        }
    }

    /// Account address.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Signing key for the account.
    pub const fn private_key(&self) -> PrivateKey {
        PrivateKey::new(self.private_key)
    }
}

/// The first accounts Hardhat funds on startup (`test test ... junk`).
pub const DEV_ACCOUNTS: [DevAccount; 5] = [
    DevAccount::new(
        address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
        b256!("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"),
    ),
    DevAccount::new(
        address!("70997970C51812dc3A010C7d01b50e0d17dc79C8"),
        b256!("59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d"),
    ),
    DevAccount::new(
        address!("3C44CdDdB6a900fa2b585dd299e03d12FA4293BC"),
        b256!("5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a"),
    ),
    DevAccount::new(
        address!("90F79bf6EB2c4f870365E785982E1f101E93b906"),
        b256!("7c852118294e51e653712a81e05800f419141751be58f605c371e15141b007a6"),
    ),
    DevAccount::new(
        address!("15d34AAf54267DB7D7c367839AAf71A00a2C6A65"),
        b256!("47e179ec197488593b187f80a00eb0da91f1b9d0b13f8733639f19c30a34926a"),
    ),
];
