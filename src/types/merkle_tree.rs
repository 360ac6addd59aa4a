//! Merkle root over the transactions committed in a block.
//!
//! This root becomes the app hash, so every node must compute it bit for bit
//! identically. The construction is fixed:
//! - Leaves are [`Transaction::id`] values, in delivery order.
//! - Inner nodes are `SHA3-256("MERKLE_NODE" || left || right)`.
//! - A level with an odd number of nodes pairs its last node with itself.
//! - A single leaf is its own root.
//! - An empty list yields the all-zero hash (`Hash::zero()`).

use crate::core::transaction::Transaction;
use crate::types::hash::Hash;

/// Root of an empty leaf list.
pub const EMPTY_ROOT: Hash = Hash::zero();
const MERKLE_NODE_SEPARATION: &[u8] = b"MERKLE_NODE";

pub struct MerkleTree;

impl MerkleTree {
    fn hash_pair(left: Hash, right: Hash) -> Hash {
        let mut h = Hash::sha3();
        h.update(MERKLE_NODE_SEPARATION);
        h.update(left.as_slice());
        h.update(right.as_slice());
        h.finalize()
    }

    /// Computes a Merkle root from the provided leaf hashes.
    ///
    /// Reduces the level in place, so only the leaf vector is allocated.
    pub fn from_raw(mut nodes: Vec<Hash>) -> Hash {
        if nodes.is_empty() {
            return EMPTY_ROOT;
        }

        let mut len = nodes.len();

        while len > 1 {
            let mut write = 0;
            let mut read = 0;

            while read < len {
                let left = nodes[read];
                let right = if read + 1 < len {
                    nodes[read + 1]
                } else {
                    left
                };

                nodes[write] = Self::hash_pair(left, right);

                write += 1;
                read += 2;
            }

            len = write;
        }

        nodes[0]
    }

    /// Computes the root of `txs` in the given order.
    pub fn from_transactions(txs: &[Transaction]) -> Hash {
        Self::from_raw(txs.iter().map(Transaction::id).collect())
    }
}
