//! Ledger storage abstraction.
//!
//! Every mutator writes into a [`PendingWrites`] overlay that reads fall
//! through; only [`LedgerStore::persist`] makes anything durable. A crash
//! between EndBlock and Commit therefore loses the whole overlay and the node
//! restarts from its last committed state.

use crate::core::genesis::Genesis;
use crate::types::address::Address;
use crate::types::hash::Hash;
use simplecoin_derive::Error;
use std::collections::BTreeMap;

/// Errors that can occur while reading or mutating the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("insufficient funds: available {available}, required {required}")]
    InsufficientFunds { available: u64, required: u64 },
    #[error("recipient balance would overflow")]
    BalanceOverflow,
    #[error("genesis already applied")]
    GenesisAlreadyApplied,
    /// The storage engine refused a read or write.
    #[error("storage backend failure: {0}")]
    Backend(String),
    /// Persisted bytes do not decode to the expected layout.
    #[error("corrupted ledger data: {0}")]
    Corrupted(String),
}

/// State as of the last successful persist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommittedState {
    pub balances: BTreeMap<Address, u64>,
    pub height: u64,
    pub app_hash: Hash,
    pub genesis_applied: bool,
}

/// Writes buffered since the last persist.
///
/// `None` fields leave the committed value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingWrites {
    pub balances: BTreeMap<Address, u64>,
    pub height: Option<u64>,
    pub app_hash: Option<Hash>,
    pub genesis_applied: bool,
}

impl PendingWrites {
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
            && self.height.is_none()
            && self.app_hash.is_none()
            && !self.genesis_applied
    }
}

/// Committed state plus the overlay of pending writes on top of it.
///
/// Backends own one of these and differ only in how [`persist`](LedgerStore::persist)
/// makes the overlay durable.
#[derive(Debug, Clone, Default)]
pub struct LedgerState {
    committed: CommittedState,
    pending: PendingWrites,
}

impl LedgerState {
    pub fn new(committed: CommittedState) -> Self {
        Self {
            committed,
            pending: PendingWrites::default(),
        }
    }

    pub fn committed(&self) -> &CommittedState {
        &self.committed
    }

    pub fn pending(&self) -> &PendingWrites {
        &self.pending
    }

    /// Folds the overlay into the committed state.
    ///
    /// Call only once the backend has durably written [`pending`](Self::pending).
    pub fn commit_pending(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        self.committed.balances.extend(pending.balances);
        if let Some(height) = pending.height {
            self.committed.height = height;
        }
        if let Some(app_hash) = pending.app_hash {
            self.committed.app_hash = app_hash;
        }
        self.committed.genesis_applied |= pending.genesis_applied;
    }

    /// Drops every write made since the last commit.
    #[cfg(test)]
    pub fn discard_pending(&mut self) {
        self.pending = PendingWrites::default();
    }

    fn balance(&self, address: &Address) -> u64 {
        self.pending
            .balances
            .get(address)
            .or_else(|| self.committed.balances.get(address))
            .copied()
            .unwrap_or(0)
    }

    fn genesis_applied(&self) -> bool {
        self.committed.genesis_applied || self.pending.genesis_applied
    }
}

/// Account balances, chain height and app hash.
///
/// Backends expose their [`LedgerState`]; every operation but `persist` is
/// provided on top of it.
pub trait LedgerStore {
    fn state(&self) -> &LedgerState;

    fn state_mut(&mut self) -> &mut LedgerState;

    /// Makes all pending writes durable in one atomic step.
    ///
    /// On failure the pending writes stay buffered and the durable state is
    /// unchanged.
    fn persist(&mut self) -> Result<(), StoreError>;

    /// Returns the balance of `address`, or 0 if it has never held funds.
    fn get_balance(&self, address: &Address) -> u64 {
        self.state().balance(address)
    }

    /// Sets each allocated balance directly, overwriting any previous value.
    ///
    /// Allowed once per chain lifetime, across restarts.
    fn apply_genesis(&mut self, genesis: &Genesis) -> Result<(), StoreError> {
        let state = self.state_mut();
        if state.genesis_applied() {
            return Err(StoreError::GenesisAlreadyApplied);
        }
        for (address, amount) in &genesis.allocations {
            state.pending.balances.insert(address.clone(), *amount);
        }
        state.pending.genesis_applied = true;
        Ok(())
    }

    /// Moves `amount` from `sender` to `recipient`.
    ///
    /// Either both balances change or neither does. A transfer to oneself
    /// only checks that the sender can cover it.
    fn transfer(
        &mut self,
        sender: &Address,
        recipient: &Address,
        amount: u64,
    ) -> Result<(), StoreError> {
        let state = self.state_mut();
        let available = state.balance(sender);
        if available < amount {
            return Err(StoreError::InsufficientFunds {
                available,
                required: amount,
            });
        }
        if sender == recipient {
            return Ok(());
        }

        let credited = state
            .balance(recipient)
            .checked_add(amount)
            .ok_or(StoreError::BalanceOverflow)?;

        state
            .pending
            .balances
            .insert(sender.clone(), available - amount);
        state.pending.balances.insert(recipient.clone(), credited);
        Ok(())
    }

    fn height(&self) -> u64 {
        let state = self.state();
        state.pending.height.unwrap_or(state.committed.height)
    }

    fn set_height(&mut self, height: u64) {
        self.state_mut().pending.height = Some(height);
    }

    fn app_hash(&self) -> Hash {
        let state = self.state();
        state.pending.app_hash.unwrap_or(state.committed.app_hash)
    }

    fn set_app_hash(&mut self, app_hash: Hash) {
        self.state_mut().pending.app_hash = Some(app_hash);
    }

    /// Whether genesis has been applied, persisted or not.
    fn is_initialized(&self) -> bool {
        self.state().genesis_applied()
    }

    /// Whether genesis is part of the durable state.
    fn is_committed_initialized(&self) -> bool {
        self.state().committed.genesis_applied
    }
}
