//! Core type definitions shared by every component.
//!
//! - `Address`: opaque account identifier
//! - `Bytes`: shared, immutable byte buffer
//! - `encoding`: the canonical binary codec (`Encode`/`Decode`)
//! - `Hash`: 32-byte SHA3-256 digest
//! - `MerkleTree`: deterministic root over committed transactions

pub mod address;
pub mod bytes;
pub mod encoding;
pub mod hash;
pub mod merkle_tree;
