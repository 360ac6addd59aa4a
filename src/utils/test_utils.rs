//! Shared helpers for unit tests.

#[cfg(test)]
pub mod utils {
    use crate::core::genesis::Genesis;
    use crate::core::transaction::Transaction;
    use crate::crypto::key_pair::PrivateKey;
    use crate::types::address::Address;

    pub const TEST_CHAIN_ID: u64 = 12345;

    /// Deterministic key derived from `seed`, so tests see stable addresses.
    pub fn test_key(seed: u8) -> PrivateKey {
        let mut bytes = [0u8; 32];
        bytes[31] = seed.max(1);
        bytes[0] = 0x11;
        PrivateKey::from_bytes(&bytes).expect("valid test scalar")
    }

    pub fn addr(value: &str) -> Address {
        Address::new(value).expect("valid test address")
    }

    /// Transfer from `key` to `recipient` signed for [`TEST_CHAIN_ID`].
    pub fn signed_transfer(
        key: &PrivateKey,
        recipient: &str,
        amount: u64,
        timestamp: u64,
    ) -> Transaction {
        Transaction::new(key, addr(recipient), amount, timestamp, None, TEST_CHAIN_ID)
    }

    pub fn genesis(allocations: &[(&str, u64)]) -> Genesis {
        Genesis::new(
            allocations
                .iter()
                .map(|(address, amount)| (addr(address), *amount)),
        )
    }
}
