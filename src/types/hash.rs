//! 32-byte SHA3-256 hash type.

use crate::types::encoding::EncodeSink;
use sha3::{Digest, Sha3_256};
use simplecoin_derive::BinaryCodec;
use std::fmt;

/// SHA3-256 hash length in bytes.
pub const HASH_LEN: usize = 32;

/// Fixed-size 32-byte digest used for app hashes and merkle nodes.
///
/// `Copy` so it can be passed around by value like an integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BinaryCodec, Default, Hash, Ord, PartialOrd)]
pub struct Hash(pub [u8; HASH_LEN]);

impl Hash {
    /// Creates a zero-valued hash (all bytes are 0x00).
    ///
    /// This is the app hash of a chain before its first non-empty block and
    /// the merkle root of an empty transaction list.
    pub const fn zero() -> Hash {
        Hash([0u8; HASH_LEN])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_LEN]
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Builds a hash from a slice, returning `None` unless it is exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Hash> {
        <[u8; HASH_LEN]>::try_from(bytes).ok().map(Hash)
    }

    /// Creates a new SHA3-256 hash builder for incremental hashing.
    pub fn sha3() -> HashBuilder {
        HashBuilder::new()
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Incremental SHA3-256 hash builder.
///
/// Implements [`EncodeSink`] so encodable types can be hashed directly
/// without intermediate byte buffers.
pub struct HashBuilder {
    hasher: Sha3_256,
}

impl HashBuilder {
    pub fn new() -> Self {
        Self {
            hasher: Sha3_256::new(),
        }
    }

    /// Feeds data into the hash computation.
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Builder-style [`update`](Self::update).
    pub fn chain(mut self, data: &[u8]) -> Self {
        self.update(data);
        self
    }

    /// Consumes the builder and returns the final hash.
    pub fn finalize(self) -> Hash {
        Hash(self.hasher.finalize().into())
    }
}

impl Default for HashBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EncodeSink for HashBuilder {
    fn write(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::encoding::{Decode, Encode};

    #[test]
    fn sha3_of_empty_input_matches_known_vector() {
        let hash = Hash::sha3().finalize();
        assert_eq!(
            hash.to_string(),
            "a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a"
        );
    }

    #[test]
    fn chain_equals_update() {
        let mut h = Hash::sha3();
        h.update(b"app");
        h.update(b"hash");
        assert_eq!(h.finalize(), Hash::sha3().chain(b"app").chain(b"hash").finalize());
    }

    #[test]
    fn zero_hash() {
        assert!(Hash::zero().is_zero());
        assert!(!Hash::sha3().finalize().is_zero());
    }

    #[test]
    fn from_slice_requires_exact_length() {
        assert_eq!(Hash::from_slice(&[7u8; HASH_LEN]), Some(Hash([7u8; HASH_LEN])));
        assert_eq!(Hash::from_slice(&[7u8; HASH_LEN - 1]), None);
    }

    #[test]
    fn codec_is_raw_bytes() {
        let hash = Hash::sha3().chain(b"x").finalize();
        let bytes = hash.to_bytes();
        assert_eq!(bytes.as_slice(), hash.as_slice());
        assert_eq!(Hash::from_bytes(&bytes).unwrap(), hash);
    }
}
