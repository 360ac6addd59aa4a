//! Signed coin transfers and their wire codec.
//!
//! A transaction travels as the canonical encoding of [`Transaction`]:
//! `sender | recipient | amount | timestamp | payload | signature`. Decoding
//! that layout is the only way raw bytes become a transaction.

use crate::crypto::key_pair::{PrivateKey, PublicKey, SerializableSignature};
use crate::types::address::Address;
use crate::types::bytes::Bytes;
use crate::types::encoding::{Decode, DecodeError, Encode, EncodeSink, read_bytes, read_len};
use crate::types::hash::Hash;
use simplecoin_derive::BinaryCodec;

/// Largest payload a transaction may carry, in bytes.
pub const MAX_PAYLOAD_LEN: usize = 1024;

/// Small opaque data attached to a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload(Bytes);

impl Payload {
    /// Returns `None` if `data` exceeds [`MAX_PAYLOAD_LEN`].
    pub fn new(data: impl Into<Bytes>) -> Option<Self> {
        let data = data.into();
        (data.len() <= MAX_PAYLOAD_LEN).then_some(Self(data))
    }

    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl Encode for Payload {
    fn encode<S: EncodeSink>(&self, out: &mut S) {
        self.0.encode(out);
    }
}

impl Decode for Payload {
    fn decode(input: &mut &[u8]) -> Result<Self, DecodeError> {
        let len = read_len(input, MAX_PAYLOAD_LEN)?;
        Ok(Self(Bytes::new(read_bytes(input, len)?)))
    }
}

/// A transfer of `amount` coins from `sender` to `recipient`.
///
/// Field order is the wire order. The signature comes last and covers
/// every other field plus the chain id (see [`Transaction::signing_hash`]).
#[derive(Debug, Clone, PartialEq, Eq, BinaryCodec)]
pub struct Transaction {
    pub sender: Address,
    pub recipient: Address,
    pub amount: u64,
    /// Creation time in seconds since the Unix epoch.
    pub timestamp: u64,
    pub payload: Option<Payload>,
    pub signature: SerializableSignature,
}

impl Transaction {
    /// Creates a transfer signed by `key`; the sender is the key's address.
    pub fn new(
        key: &PrivateKey,
        recipient: Address,
        amount: u64,
        timestamp: u64,
        payload: Option<Payload>,
        chain_id: u64,
    ) -> Self {
        let sender = key.public_key().address;
        let signing_hash = Self::signing_hash_from_parts(
            chain_id, &sender, &recipient, amount, timestamp, &payload,
        );

        Transaction {
            signature: key.sign(signing_hash.as_slice()),
            sender,
            recipient,
            amount,
            timestamp,
            payload,
        }
    }

    /// Hash of everything the signature commits to.
    pub fn signing_hash(&self, chain_id: u64) -> Hash {
        Self::signing_hash_from_parts(
            chain_id,
            &self.sender,
            &self.recipient,
            self.amount,
            self.timestamp,
            &self.payload,
        )
    }

    /// Verifies the signature against the key named by the sender address.
    ///
    /// Senders that are not key addresses never verify.
    pub fn verify(&self, chain_id: u64) -> bool {
        match PublicKey::from_address(&self.sender) {
            Some(public) => public.verify(self.signing_hash(chain_id).as_slice(), &self.signature),
            None => false,
        }
    }

    /// Merkle leaf for this transaction: `SHA3-256("TXID" || encoding)`.
    pub fn id(&self) -> Hash {
        let mut h = Hash::sha3();
        h.update(b"TXID");
        self.encode(&mut h);
        h.finalize()
    }

    fn signing_hash_from_parts(
        chain_id: u64,
        sender: &Address,
        recipient: &Address,
        amount: u64,
        timestamp: u64,
        payload: &Option<Payload>,
    ) -> Hash {
        let mut buf = Hash::sha3();
        buf.update(b"TX");
        chain_id.encode(&mut buf);
        sender.encode(&mut buf);
        recipient.encode(&mut buf);
        amount.encode(&mut buf);
        timestamp.encode(&mut buf);
        payload.encode(&mut buf);
        buf.finalize()
    }
}
