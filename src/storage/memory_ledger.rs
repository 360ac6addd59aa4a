//! In-memory ledger for tests and tooling.

use crate::storage::ledger_store::{CommittedState, LedgerState, LedgerStore, StoreError};

/// Ledger kept entirely in memory.
///
/// `persist` folds the overlay into the committed snapshot, so the
/// committed/pending split behaves exactly like the durable backend minus
/// the disk.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: LedgerState,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an already committed state, as if reopened after a restart.
    #[cfg(test)]
    pub fn from_committed(committed: CommittedState) -> Self {
        Self {
            state: LedgerState::new(committed),
        }
    }

    /// Snapshot of the last persisted state.
    pub fn committed(&self) -> &CommittedState {
        self.state.committed()
    }
}

impl LedgerStore for MemoryLedger {
    fn state(&self) -> &LedgerState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut LedgerState {
        &mut self.state
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        self.state.commit_pending();
        Ok(())
    }
}
