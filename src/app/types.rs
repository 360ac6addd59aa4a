//! Request and response values of the consensus callbacks.

use crate::core::genesis::Genesis;
use crate::types::hash::Hash;

/// Query path answered with an account balance.
pub const BALANCE_PATH: &str = "balance";

/// Result code of an answered query.
pub const CODE_OK: u32 = 0;
/// Result code of a query whose data could not be interpreted.
pub const CODE_INVALID_DATA: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseInfo {
    pub last_height: u64,
    pub last_app_hash: Hash,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInitChain {
    pub genesis: Genesis,
}

/// Outcome of CheckTx or DeliverTx.
///
/// `log` carries the rejection reason; it is empty for accepted transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxResponse {
    pub accepted: bool,
    pub log: String,
}

impl TxResponse {
    pub fn accepted() -> Self {
        Self {
            accepted: true,
            log: String::new(),
        }
    }

    pub fn rejected(log: impl Into<String>) -> Self {
        Self {
            accepted: false,
            log: log.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseEndBlock {
    /// Height the ledger advanced to.
    pub height: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseCommit {
    pub app_hash: Hash,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestQuery {
    pub path: String,
    pub data: Vec<u8>,
}

impl RequestQuery {
    pub fn balance(address: &str) -> Self {
        Self {
            path: BALANCE_PATH.to_string(),
            data: address.as_bytes().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseQuery {
    pub code: u32,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl ResponseQuery {
    /// Decodes the 8-byte big-endian balance of a successful balance query.
    pub fn balance(&self) -> Option<u64> {
        if self.code != CODE_OK {
            return None;
        }
        <[u8; 8]>::try_from(self.value.as_slice())
            .ok()
            .map(u64::from_be_bytes)
    }
}
