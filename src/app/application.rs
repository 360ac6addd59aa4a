//! The callback state machine driven by the consensus engine.
//!
//! The engine calls, strictly in sequence:
//! `InitChain` once, then per block `BeginBlock → DeliverTx × N → EndBlock →
//! Commit`, with `CheckTx`, `Query` and `Info` allowed at any time. Only
//! `Commit` makes anything durable.

use crate::app::block_accumulator::BlockAccumulator;
use crate::app::types::{
    BALANCE_PATH, CODE_INVALID_DATA, CODE_OK, RequestInitChain, RequestQuery, ResponseCommit,
    ResponseEndBlock, ResponseInfo, ResponseQuery, TxResponse,
};
use crate::core::genesis::GenesisError;
use crate::core::transaction::Transaction;
use crate::core::validation::{Checks, DEFAULT_MAX_TX_LAG_SECS, TxError, validate};
use crate::storage::ledger_store::{LedgerStore, StoreError};
use crate::types::address::Address;
use crate::types::encoding::Decode;
use crate::types::hash::Hash;
use crate::types::merkle_tree::MerkleTree;
use crate::{info, warn};
use simplecoin_derive::Error;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the wall-clock time used by CheckTx, in Unix seconds.
pub type Clock = fn() -> u64;

pub fn system_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Where the adapter is in the block lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No genesis applied yet.
    Uninitialized,
    /// Between blocks.
    Ready,
    /// After BeginBlock, accepting DeliverTx.
    BlockOpen,
    /// After EndBlock, waiting for Commit.
    BlockEnded,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Uninitialized => "uninitialized",
            Phase::Ready => "ready",
            Phase::BlockOpen => "block open",
            Phase::BlockEnded => "block ended",
        };
        f.write_str(name)
    }
}

/// Fatal conditions. The node must halt rather than answer the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("genesis rejected: {0}")]
    Genesis(GenesisError),
    #[error("commit failed: {0}")]
    Persistence(StoreError),
    #[error("unexpected {call} while {phase}")]
    UnexpectedCall { call: &'static str, phase: Phase },
}

/// Chain parameters the adapter needs at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppConfig {
    pub chain_id: u64,
    pub max_tx_lag_secs: u64,
}

impl AppConfig {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            max_tx_lag_secs: DEFAULT_MAX_TX_LAG_SECS,
        }
    }
}

/// One method per consensus callback.
pub trait Application {
    fn info(&self) -> ResponseInfo;

    fn init_chain(&mut self, request: RequestInitChain) -> Result<(), AppError>;

    /// Mempool admission. Never mutates state.
    fn check_tx(&self, raw: &[u8]) -> TxResponse;

    fn begin_block(&mut self) -> Result<(), AppError>;

    fn deliver_tx(&mut self, raw: &[u8]) -> Result<TxResponse, AppError>;

    fn end_block(&mut self, height: u64) -> Result<ResponseEndBlock, AppError>;

    fn commit(&mut self) -> Result<ResponseCommit, AppError>;

    /// Returns `None` for paths this application does not answer.
    fn query(&self, request: &RequestQuery) -> Option<ResponseQuery>;
}

/// Coin-transfer application over a [`LedgerStore`].
pub struct SimpleCoin<L: LedgerStore> {
    ledger: L,
    block: BlockAccumulator,
    config: AppConfig,
    phase: Phase,
    clock: Clock,
}

impl<L: LedgerStore> SimpleCoin<L> {
    /// Wraps `ledger`. A ledger with committed genesis resumes between blocks.
    pub fn new(ledger: L, config: AppConfig) -> Self {
        let phase = if ledger.is_committed_initialized() {
            Phase::Ready
        } else {
            Phase::Uninitialized
        };
        Self {
            ledger,
            block: BlockAccumulator::new(),
            config,
            phase,
            clock: system_clock,
        }
    }

    /// Replaces the wall clock used by CheckTx.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn expect_phase(&self, call: &'static str, expected: Phase) -> Result<(), AppError> {
        if self.phase != expected {
            return Err(AppError::UnexpectedCall {
                call,
                phase: self.phase,
            });
        }
        Ok(())
    }

    fn admit(&self, raw: &[u8], checks: &Checks) -> Result<Transaction, TxError> {
        let tx = Transaction::from_bytes(raw)?;
        let balance = self.ledger.get_balance(&tx.sender);
        validate(&tx, balance, self.config.chain_id, checks)?;
        Ok(tx)
    }

    fn execute(&mut self, raw: &[u8]) -> Result<(), TxError> {
        let tx = self.admit(raw, &Checks::delivery())?;
        self.ledger.transfer(&tx.sender, &tx.recipient, tx.amount)?;
        self.block.append(tx);
        Ok(())
    }
}

impl<L: LedgerStore> Application for SimpleCoin<L> {
    fn info(&self) -> ResponseInfo {
        let committed = self.ledger.state().committed();
        ResponseInfo {
            last_height: committed.height,
            last_app_hash: committed.app_hash,
        }
    }

    fn init_chain(&mut self, request: RequestInitChain) -> Result<(), AppError> {
        if self.ledger.is_initialized() || self.ledger.height() != 0 {
            return Err(AppError::Genesis(GenesisError::AlreadyInitialized {
                height: self.ledger.height(),
            }));
        }
        self.expect_phase("InitChain", Phase::Uninitialized)?;

        let supply = request.genesis.validate().map_err(AppError::Genesis)?;
        self.ledger
            .apply_genesis(&request.genesis)
            .map_err(|_| AppError::Genesis(GenesisError::AlreadyInitialized { height: 0 }))?;
        self.ledger.set_height(0);
        self.ledger.set_app_hash(Hash::zero());

        info!(
            "Genesis applied: accounts={} supply={} chain_id={}",
            request.genesis.allocations.len(),
            supply,
            self.config.chain_id
        );
        self.phase = Phase::Ready;
        Ok(())
    }

    fn check_tx(&self, raw: &[u8]) -> TxResponse {
        let checks = Checks::admission((self.clock)(), self.config.max_tx_lag_secs);
        match self.admit(raw, &checks) {
            Ok(_) => TxResponse::accepted(),
            Err(e) => TxResponse::rejected(e.to_string()),
        }
    }

    fn begin_block(&mut self) -> Result<(), AppError> {
        self.expect_phase("BeginBlock", Phase::Ready)?;
        self.block.reset();
        self.phase = Phase::BlockOpen;
        Ok(())
    }

    fn deliver_tx(&mut self, raw: &[u8]) -> Result<TxResponse, AppError> {
        self.expect_phase("DeliverTx", Phase::BlockOpen)?;
        Ok(match self.execute(raw) {
            Ok(()) => TxResponse::accepted(),
            Err(e) => {
                warn!("DeliverTx rejected: {e}");
                TxResponse::rejected(e.to_string())
            }
        })
    }

    fn end_block(&mut self, height: u64) -> Result<ResponseEndBlock, AppError> {
        self.expect_phase("EndBlock", Phase::BlockOpen)?;

        let next = self.ledger.height() + 1;
        if height != next {
            warn!("EndBlock requested height {height}, ledger advances to {next}");
        }
        self.ledger.set_height(next);

        if !self.block.is_empty() {
            self.ledger
                .set_app_hash(MerkleTree::from_transactions(self.block.all()));
        }

        info!(
            "Block ended: height={} txs={} app_hash={}",
            next,
            self.block.len(),
            self.ledger.app_hash()
        );
        self.phase = Phase::BlockEnded;
        Ok(ResponseEndBlock { height: next })
    }

    fn commit(&mut self) -> Result<ResponseCommit, AppError> {
        self.expect_phase("Commit", Phase::BlockEnded)?;

        if let Err(e) = self.ledger.persist() {
            crate::error!("Commit failed at height {}: {e}", self.ledger.height());
            return Err(AppError::Persistence(e));
        }

        let app_hash = self.ledger.app_hash();
        info!(
            "Committed height={} app_hash={}",
            self.ledger.height(),
            app_hash
        );
        self.phase = Phase::Ready;
        Ok(ResponseCommit { app_hash })
    }

    fn query(&self, request: &RequestQuery) -> Option<ResponseQuery> {
        if request.path != BALANCE_PATH {
            return None;
        }

        let address = std::str::from_utf8(&request.data)
            .ok()
            .and_then(|text| Address::new(text).ok());

        Some(match address {
            Some(address) => ResponseQuery {
                code: CODE_OK,
                key: BALANCE_PATH.as_bytes().to_vec(),
                value: self.ledger.get_balance(&address).to_be_bytes().to_vec(),
            },
            None => ResponseQuery {
                code: CODE_INVALID_DATA,
                key: BALANCE_PATH.as_bytes().to_vec(),
                value: Vec::new(),
            },
        })
    }
}
