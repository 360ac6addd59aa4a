//! Signature keys. The Schnorr algorithm itself is provided by `k256`.

pub mod key_pair;
