//! Initial balance allocations.

use crate::types::address::Address;
use serde::{Deserialize, Serialize};
use simplecoin_derive::Error;
use std::collections::BTreeMap;

/// Balances credited once when the chain starts.
///
/// Ordered by address so iteration, and therefore the order writes reach
/// the ledger, is the same on every node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genesis {
    #[serde(default)]
    pub allocations: BTreeMap<Address, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenesisError {
    #[error("genesis has no allocations")]
    NoAllocations,
    #[error("total genesis supply overflows u64")]
    SupplyOverflow,
    #[error("chain already initialized at height {height}")]
    AlreadyInitialized { height: u64 },
}

impl Genesis {
    pub fn new(allocations: impl IntoIterator<Item = (Address, u64)>) -> Self {
        Self {
            allocations: allocations.into_iter().collect(),
        }
    }

    /// Checks the allocations and returns the total supply they mint.
    pub fn validate(&self) -> Result<u64, GenesisError> {
        if self.allocations.is_empty() {
            return Err(GenesisError::NoAllocations);
        }
        self.allocations
            .values()
            .try_fold(0u64, |total, amount| total.checked_add(*amount))
            .ok_or(GenesisError::SupplyOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::utils::addr;

    #[test]
    fn validate_returns_total_supply() {
        let genesis = Genesis::new([(addr("a"), 100), (addr("b"), 0), (addr("c"), 25)]);
        assert_eq!(genesis.validate(), Ok(125));
    }

    #[test]
    fn validate_rejects_empty() {
        assert_eq!(Genesis::default().validate(), Err(GenesisError::NoAllocations));
    }

    #[test]
    fn validate_rejects_overflowing_supply() {
        let genesis = Genesis::new([(addr("a"), u64::MAX), (addr("b"), 1)]);
        assert_eq!(genesis.validate(), Err(GenesisError::SupplyOverflow));
    }

    #[test]
    fn duplicate_addresses_keep_last_value() {
        let genesis = Genesis::new([(addr("a"), 1), (addr("a"), 7)]);
        assert_eq!(genesis.allocations.len(), 1);
        assert_eq!(genesis.allocations[&addr("a")], 7);
    }

    #[test]
    fn deserializes_from_toml_table() {
        let genesis: Genesis = toml::from_str(
            r#"
            [allocations]
            alice = 100
            bob = 0
            "#,
        )
        .unwrap();
        assert_eq!(genesis.allocations[&addr("alice")], 100);
        assert_eq!(genesis.allocations[&addr("bob")], 0);
    }

    #[test]
    fn rejects_oversized_address_in_toml() {
        let long = "x".repeat(crate::types::address::MAX_ADDRESS_LEN + 1);
        let source = format!("[allocations]\n{long} = 1\n");
        assert!(toml::from_str::<Genesis>(&source).is_err());
    }
}
