//! Admission rules shared by mempool checks and block execution.
//!
//! [`validate`] is pure: it reads nothing but its arguments, so CheckTx and
//! DeliverTx cannot drift apart. The only difference between the two is which
//! [`Checks`] they pass.

use crate::core::transaction::Transaction;
use crate::storage::ledger_store::StoreError;
use crate::types::encoding::DecodeError;
use simplecoin_derive::Error;
use std::fmt;

/// Default tolerance between a transaction's timestamp and the local clock.
pub const DEFAULT_MAX_TX_LAG_SECS: u64 = 2 * 60 * 60;

/// Why a transaction was refused.
///
/// The `Display` text is the log string returned to the consensus engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxError {
    #[error("txn syntax invalid")]
    Malformed(DecodeError),
    #[error("insufficient funds")]
    InsufficientFunds { available: u64, required: u64 },
    #[error("signature invalid")]
    InvalidSignature,
    #[error("lag time is more than {limit}")]
    StaleTimestamp { timestamp: u64, now: u64, limit: LagLimit },
    #[error("{0}")]
    Ledger(StoreError),
}

impl From<DecodeError> for TxError {
    fn from(err: DecodeError) -> Self {
        TxError::Malformed(err)
    }
}

impl From<StoreError> for TxError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InsufficientFunds {
                available,
                required,
            } => TxError::InsufficientFunds {
                available,
                required,
            },
            other => TxError::Ledger(other),
        }
    }
}

/// Configured timestamp tolerance, printed in whole hours when it has no
/// leftover seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LagLimit(pub u64);

impl fmt::Display for LagLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0;
        match (secs / 3600, secs % 3600) {
            (1, 0) => write!(f, "1 hour"),
            (hours, 0) if hours > 0 => write!(f, "{hours} hours"),
            _ if secs == 1 => write!(f, "1 second"),
            _ => write!(f, "{secs} seconds"),
        }
    }
}

/// Which rules to apply on top of the funds and signature checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checks {
    /// Local wall clock in Unix seconds. `None` skips the timestamp rule.
    pub now: Option<u64>,
    pub max_lag_secs: u64,
}

impl Checks {
    /// Mempool admission: every rule, against the given clock.
    pub fn admission(now: u64, max_lag_secs: u64) -> Self {
        Self {
            now: Some(now),
            max_lag_secs,
        }
    }

    /// Block execution: funds and signature only.
    ///
    /// Clocks differ between nodes, so a timestamp rule here would let two
    /// honest nodes disagree on the same block.
    pub fn delivery() -> Self {
        Self {
            now: None,
            max_lag_secs: DEFAULT_MAX_TX_LAG_SECS,
        }
    }
}

/// Applies the admission rules in order: funds, signature, timestamp.
///
/// The first failing rule wins, so a transaction that is both underfunded
/// and badly signed reports insufficient funds.
pub fn validate(
    tx: &Transaction,
    sender_balance: u64,
    chain_id: u64,
    checks: &Checks,
) -> Result<(), TxError> {
    if tx.amount > sender_balance {
        return Err(TxError::InsufficientFunds {
            available: sender_balance,
            required: tx.amount,
        });
    }

    if !tx.verify(chain_id) {
        return Err(TxError::InvalidSignature);
    }

    if let Some(now) = checks.now
        && tx.timestamp.saturating_add(checks.max_lag_secs) < now
    {
        return Err(TxError::StaleTimestamp {
            timestamp: tx.timestamp,
            now,
            limit: LagLimit(checks.max_lag_secs),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::utils::{TEST_CHAIN_ID, signed_transfer, test_key};

    const NOW: u64 = 1_700_000_000;

    fn admission() -> Checks {
        Checks::admission(NOW, DEFAULT_MAX_TX_LAG_SECS)
    }

    #[test]
    fn accepts_funded_signed_fresh_transfer() {
        let tx = signed_transfer(&test_key(1), "bob", 30, NOW);
        assert_eq!(validate(&tx, 100, TEST_CHAIN_ID, &admission()), Ok(()));
    }

    #[test]
    fn exact_balance_is_enough() {
        let tx = signed_transfer(&test_key(1), "bob", 100, NOW);
        assert_eq!(validate(&tx, 100, TEST_CHAIN_ID, &admission()), Ok(()));
    }

    #[test]
    fn rejects_amount_above_balance() {
        let tx = signed_transfer(&test_key(1), "bob", 101, NOW);
        let err = validate(&tx, 100, TEST_CHAIN_ID, &admission()).unwrap_err();
        assert_eq!(
            err,
            TxError::InsufficientFunds {
                available: 100,
                required: 101
            }
        );
        assert_eq!(err.to_string(), "insufficient funds");
    }

    #[test]
    fn funds_are_checked_before_signature() {
        let mut tx = signed_transfer(&test_key(1), "bob", 500, NOW);
        tx.amount = 501;
        let err = validate(&tx, 10, TEST_CHAIN_ID, &admission()).unwrap_err();
        assert!(matches!(err, TxError::InsufficientFunds { .. }));
    }

    #[test]
    fn rejects_bad_signature() {
        let mut tx = signed_transfer(&test_key(1), "bob", 5, NOW);
        tx.amount = 6;
        let err = validate(&tx, 100, TEST_CHAIN_ID, &admission()).unwrap_err();
        assert_eq!(err, TxError::InvalidSignature);
        assert_eq!(err.to_string(), "signature invalid");
    }

    #[test]
    fn rejects_signature_from_other_chain() {
        let tx = signed_transfer(&test_key(1), "bob", 5, NOW);
        assert_eq!(
            validate(&tx, 100, TEST_CHAIN_ID + 1, &admission()),
            Err(TxError::InvalidSignature)
        );
    }

    #[test]
    fn rejects_stale_timestamp_on_admission() {
        let stale = NOW - DEFAULT_MAX_TX_LAG_SECS - 1;
        let tx = signed_transfer(&test_key(1), "bob", 5, stale);
        let err = validate(&tx, 100, TEST_CHAIN_ID, &admission()).unwrap_err();
        assert!(matches!(err, TxError::StaleTimestamp { .. }));
        assert_eq!(err.to_string(), "lag time is more than 2 hours");
    }

    #[test]
    fn timestamp_at_tolerance_edge_is_accepted() {
        let edge = NOW - DEFAULT_MAX_TX_LAG_SECS;
        let tx = signed_transfer(&test_key(1), "bob", 5, edge);
        assert_eq!(validate(&tx, 100, TEST_CHAIN_ID, &admission()), Ok(()));
    }

    #[test]
    fn delivery_ignores_timestamp() {
        let tx = signed_transfer(&test_key(1), "bob", 5, 0);
        assert_eq!(
            validate(&tx, 100, TEST_CHAIN_ID, &Checks::delivery()),
            Ok(())
        );
    }

    #[test]
    fn future_timestamp_is_accepted() {
        let tx = signed_transfer(&test_key(1), "bob", 5, NOW + 3_600);
        assert_eq!(validate(&tx, 100, TEST_CHAIN_ID, &admission()), Ok(()));
    }

    #[test]
    fn lag_limit_display() {
        assert_eq!(LagLimit(3_600).to_string(), "1 hour");
        assert_eq!(LagLimit(7_200).to_string(), "2 hours");
        assert_eq!(LagLimit(90).to_string(), "90 seconds");
        assert_eq!(LagLimit(1).to_string(), "1 second");
        assert_eq!(LagLimit(0).to_string(), "0 seconds");
    }

    #[test]
    fn store_errors_map_to_tx_errors() {
        let funds: TxError = StoreError::InsufficientFunds {
            available: 1,
            required: 2,
        }
        .into();
        assert_eq!(
            funds,
            TxError::InsufficientFunds {
                available: 1,
                required: 2
            }
        );

        let overflow: TxError = StoreError::BalanceOverflow.into();
        assert_eq!(overflow, TxError::Ledger(StoreError::BalanceOverflow));
    }

    #[test]
    fn malformed_log_string() {
        assert_eq!(
            TxError::from(DecodeError::UnexpectedEof).to_string(),
            "txn syntax invalid"
        );
    }
}
