//! Transactions delivered in the currently open block.

use crate::core::transaction::Transaction;

/// Ordered buffer of the transactions accepted since the last BeginBlock.
///
/// Keeps delivery order and duplicates as-is; the merkle root over
/// [`all`](Self::all) must match what every other node computes.
#[derive(Debug, Default)]
pub struct BlockAccumulator {
    txs: Vec<Transaction>,
}

impl BlockAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties the buffer for a new block.
    pub fn reset(&mut self) {
        self.txs.clear();
    }

    pub fn append(&mut self, tx: Transaction) {
        self.txs.push(tx);
    }

    pub fn all(&self) -> &[Transaction] {
        &self.txs
    }

    pub fn len(&self) -> usize {
        self.txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::utils::{signed_transfer, test_key};

    #[test]
    fn keeps_delivery_order_and_duplicates() {
        let key = test_key(1);
        let a = signed_transfer(&key, "bob", 1, 10);
        let b = signed_transfer(&key, "carol", 2, 11);

        let mut acc = BlockAccumulator::new();
        acc.append(a.clone());
        acc.append(b.clone());
        acc.append(a.clone());

        assert_eq!(acc.len(), 3);
        assert_eq!(acc.all(), &[a.clone(), b, a]);
    }

    #[test]
    fn reset_clears() {
        let mut acc = BlockAccumulator::new();
        acc.append(signed_transfer(&test_key(1), "bob", 1, 10));
        assert!(!acc.is_empty());

        acc.reset();
        assert!(acc.is_empty());
        assert!(acc.all().is_empty());
    }
}
