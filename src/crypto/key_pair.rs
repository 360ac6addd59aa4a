//! Schnorr signature key pairs on secp256k1.
//!
//! A signing address is the lowercase hex encoding of the 32-byte x-only
//! verifying key, so a transaction's sender field is enough to verify it.

use crate::types::address::Address;
use crate::types::encoding::{Decode, DecodeError, Encode, EncodeSink};
use k256::schnorr::signature::{Signer, Verifier};
use k256::schnorr::{Signature, SigningKey, VerifyingKey};
use rand_core::OsRng;

/// Length of an encoded Schnorr signature.
pub const SIGNATURE_LEN: usize = 64;

/// Private key for signing transactions.
///
/// Never serialized or transmitted.
#[derive(Clone)]
pub struct PrivateKey {
    key: SigningKey,
}

/// Public key and the address derived from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    pub key: VerifyingKey,
    pub address: Address,
}

impl PrivateKey {
    /// Generates a new random private key using OS-provided entropy.
    pub fn new() -> Self {
        Self {
            key: SigningKey::random(&mut OsRng),
        }
    }

    /// Creates a private key from raw bytes.
    ///
    /// Returns `None` if the bytes do not represent a valid scalar for secp256k1.
    pub fn from_bytes(bytes: &[u8; 32]) -> Option<Self> {
        SigningKey::from_bytes(bytes).ok().map(|key| Self { key })
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_verifying_key(*self.key.verifying_key())
    }

    /// Signs arbitrary data, producing a Schnorr signature.
    pub fn sign(&self, data: &[u8]) -> SerializableSignature {
        SerializableSignature(self.key.sign(data))
    }
}

impl Default for PrivateKey {
    fn default() -> Self {
        Self::new()
    }
}

impl PublicKey {
    fn from_verifying_key(key: VerifyingKey) -> Self {
        Self {
            key,
            address: Address::from_key_hex(hex::encode(key.to_bytes())),
        }
    }

    /// Recovers the verifying key an address claims to be.
    ///
    /// Returns `None` for addresses that are not 64 lowercase hex characters
    /// naming a valid x-only point; such addresses can receive funds but
    /// never sign.
    pub fn from_address(address: &Address) -> Option<Self> {
        let text = address.as_str();
        if text.len() != 64 || text.bytes().any(|b| b.is_ascii_uppercase()) {
            return None;
        }
        let raw = hex::decode(text).ok()?;
        let key = VerifyingKey::from_bytes(&raw).ok()?;
        Some(Self {
            key,
            address: address.clone(),
        })
    }

    /// Verifies a Schnorr signature against the given data.
    pub fn verify(&self, data: &[u8], signature: &SerializableSignature) -> bool {
        self.key.verify(data, &signature.0).is_ok()
    }
}

/// Schnorr signature with the crate's binary encoding (64 raw bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializableSignature(pub Signature);

impl Encode for SerializableSignature {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        out.write(&self.0.to_bytes());
    }
}

impl Decode for SerializableSignature {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        let bytes = <[u8; SIGNATURE_LEN]>::decode(input)?;
        Signature::try_from(bytes.as_slice())
            .map(SerializableSignature)
            .map_err(|_| DecodeError::InvalidValue)
    }
}
