//! Account identifiers.

use crate::types::encoding::{Decode, DecodeError, Encode, EncodeSink, read_bytes, read_len};
use serde::{Deserialize, Serialize};
use simplecoin_derive::Error;
use std::fmt;

/// Longest address accepted on the wire or in genesis, in bytes.
pub const MAX_ADDRESS_LEN: usize = 128;

/// Opaque UTF-8 account identifier.
///
/// Any non-empty string up to [`MAX_ADDRESS_LEN`] bytes can hold funds.
/// Only addresses that are the hex encoding of a Schnorr verifying key can
/// sign transfers (see [`crate::crypto::key_pair::PublicKey::from_address`]).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,
    #[error("address is {len} bytes, limit is {max}")]
    TooLong { len: usize, max: usize },
}

impl Address {
    pub fn new(value: impl Into<String>) -> Result<Self, AddressError> {
        let value = value.into();
        if value.is_empty() {
            return Err(AddressError::Empty);
        }
        if value.len() > MAX_ADDRESS_LEN {
            return Err(AddressError::TooLong {
                len: value.len(),
                max: MAX_ADDRESS_LEN,
            });
        }
        Ok(Self(value))
    }

    /// Wraps the 64-character hex encoding of a verifying key, which always
    /// satisfies the length rules.
    pub(crate) fn from_key_hex(hex: String) -> Self {
        debug_assert_eq!(hex.len(), 64);
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::new(value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl Encode for Address {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        self.as_str().encode(out);
    }
}

impl Decode for Address {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        let len = read_len(input, MAX_ADDRESS_LEN)?;
        let raw = read_bytes(input, len)?;
        let value = std::str::from_utf8(raw).map_err(|_| DecodeError::InvalidValue)?;
        Address::new(value).map_err(|_| DecodeError::InvalidValue)
    }
}
