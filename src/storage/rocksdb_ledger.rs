//! RocksDB-backed ledger.
//!
//! Balances live in the [`CF_BALANCES`] column family keyed by address bytes;
//! height, app hash and the genesis marker live in [`CF_META`]. Integers are
//! stored as 8-byte big-endian values.
//!
//! The committed state is loaded into memory when the database is opened.
//! Mutations only touch the in-memory overlay until [`LedgerStore::persist`]
//! writes it out as one synced `WriteBatch`.

use crate::storage::ledger_store::{CommittedState, LedgerState, LedgerStore, StoreError};
use crate::types::address::Address;
use crate::types::hash::Hash;
use crate::{info, warn};
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch, WriteOptions,
};
use std::path::Path;
use std::sync::Arc;

/// Column family name for account balances indexed by address.
pub const CF_BALANCES: &str = "balances";
/// Column family name for metadata (height, app hash, genesis marker).
pub const CF_META: &str = "meta";

/// Metadata keys stored in the meta column family.
pub mod meta_keys {
    /// Height of the last committed block.
    pub const HEIGHT: &[u8] = b"height";
    /// App hash returned by the last commit.
    pub const APP_HASH: &[u8] = b"app_hash";
    /// Present once genesis allocations have been committed.
    pub const GENESIS: &[u8] = b"genesis";
}

const GENESIS_MARKER: &[u8] = &[1];

fn backend(err: rocksdb::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn decode_u64(bytes: &[u8], what: &str) -> Result<u64, StoreError> {
    <[u8; 8]>::try_from(bytes)
        .map(u64::from_be_bytes)
        .map_err(|_| StoreError::Corrupted(format!("{what}: expected 8 bytes, got {}", bytes.len())))
}

pub fn cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![
        ColumnFamilyDescriptor::new(CF_BALANCES, Options::default()),
        ColumnFamilyDescriptor::new(CF_META, Options::default()),
    ]
}

/// Opens (creating if needed) a ledger database at `path`.
pub fn open_db(path: &Path) -> Result<Arc<DB>, StoreError> {
    let mut opts = Options::default();
    opts.create_if_missing(true);
    opts.create_missing_column_families(true);

    DB::open_cf_descriptors(&opts, path, cf_descriptors())
        .map(Arc::new)
        .map_err(backend)
}

fn cf<'a>(db: &'a DB, name: &str) -> Result<&'a ColumnFamily, StoreError> {
    db.cf_handle(name)
        .ok_or_else(|| StoreError::Backend(format!("missing column family {name}")))
}

/// Durable ledger on top of RocksDB.
pub struct RocksDbLedger {
    db: Arc<DB>,
    state: LedgerState,
}

impl RocksDbLedger {
    /// Opens the database at `path` and loads its committed state.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::new(open_db(path.as_ref())?)
    }

    /// Wraps an already opened database, loading its committed state.
    ///
    /// The database must have been opened with [`cf_descriptors`].
    pub fn new(db: Arc<DB>) -> Result<Self, StoreError> {
        let committed = Self::load_committed(&db)?;
        if committed.genesis_applied {
            info!(
                "Loading existing ledger: height={} app_hash={} accounts={}",
                committed.height,
                committed.app_hash,
                committed.balances.len()
            );
        } else {
            info!("Initializing fresh ledger");
        }
        Ok(Self {
            db,
            state: LedgerState::new(committed),
        })
    }

    /// Rebuilds the committed state from the column families.
    fn load_committed(db: &DB) -> Result<CommittedState, StoreError> {
        let cf_balances = cf(db, CF_BALANCES)?;
        let cf_meta = cf(db, CF_META)?;

        let mut committed = CommittedState::default();
        for item in db.iterator_cf(cf_balances, IteratorMode::Start) {
            let (key, value) = item.map_err(backend)?;
            let text = std::str::from_utf8(&key)
                .map_err(|_| StoreError::Corrupted("balance key is not UTF-8".into()))?;
            let address = Address::new(text)
                .map_err(|e| StoreError::Corrupted(format!("balance key {text:?}: {e}")))?;
            let balance = decode_u64(&value, "balance")?;
            committed.balances.insert(address, balance);
        }

        if let Some(bytes) = db.get_cf(cf_meta, meta_keys::HEIGHT).map_err(backend)? {
            committed.height = decode_u64(&bytes, "height")?;
        }
        if let Some(bytes) = db.get_cf(cf_meta, meta_keys::APP_HASH).map_err(backend)? {
            committed.app_hash = Hash::from_slice(&bytes)
                .ok_or_else(|| StoreError::Corrupted("invalid app hash".into()))?;
        }
        committed.genesis_applied = db
            .get_cf(cf_meta, meta_keys::GENESIS)
            .map_err(backend)?
            .is_some();

        if !committed.genesis_applied && (committed.height > 0 || !committed.balances.is_empty()) {
            return Err(StoreError::Corrupted(
                "ledger has state but no genesis marker".into(),
            ));
        }

        Ok(committed)
    }

    #[cfg(test)]
    fn db(&self) -> &Arc<DB> {
        &self.db
    }
}

impl LedgerStore for RocksDbLedger {
    fn state(&self) -> &LedgerState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut LedgerState {
        &mut self.state
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let pending = self.state.pending();
        if pending.is_empty() {
            return Ok(());
        }

        let cf_balances = cf(&self.db, CF_BALANCES)?;
        let cf_meta = cf(&self.db, CF_META)?;

        let mut batch = WriteBatch::default();
        for (address, balance) in &pending.balances {
            batch.put_cf(cf_balances, address.as_bytes(), balance.to_be_bytes());
        }
        if let Some(height) = pending.height {
            batch.put_cf(cf_meta, meta_keys::HEIGHT, height.to_be_bytes());
        }
        if let Some(app_hash) = pending.app_hash {
            batch.put_cf(cf_meta, meta_keys::APP_HASH, app_hash.as_slice());
        }
        if pending.genesis_applied {
            batch.put_cf(cf_meta, meta_keys::GENESIS, GENESIS_MARKER);
        }

        let mut opts = WriteOptions::default();
        opts.set_sync(true);
        if let Err(e) = self.db.write_opt(batch, &opts) {
            warn!("ledger persist failed, keeping pending writes: {e}");
            return Err(backend(e));
        }

        self.state.commit_pending();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::utils::{addr, genesis};

    fn open(dir: &tempfile::TempDir) -> RocksDbLedger {
        RocksDbLedger::open(dir.path()).expect("failed to open ledger")
    }

    #[test]
    fn fresh_database_is_uninitialized() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = open(&dir);
        assert!(!ledger.is_initialized());
        assert_eq!(ledger.height(), 0);
        assert_eq!(ledger.app_hash(), Hash::zero());
    }

    #[test]
    fn persisted_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let root = Hash::sha3().chain(b"block 1").finalize();
        {
            let mut ledger = open(&dir);
            ledger
                .apply_genesis(&genesis(&[("alice", 100), ("bob", 0)]))
                .unwrap();
            ledger.transfer(&addr("alice"), &addr("bob"), 30).unwrap();
            ledger.set_height(1);
            ledger.set_app_hash(root);
            ledger.persist().unwrap();
        }

        let ledger = open(&dir);
        assert!(ledger.is_committed_initialized());
        assert_eq!(ledger.get_balance(&addr("alice")), 70);
        assert_eq!(ledger.get_balance(&addr("bob")), 30);
        assert_eq!(ledger.height(), 1);
        assert_eq!(ledger.app_hash(), root);
    }

    #[test]
    fn unpersisted_writes_are_lost_on_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut ledger = open(&dir);
            ledger.apply_genesis(&genesis(&[("alice", 100)])).unwrap();
            ledger.persist().unwrap();

            ledger.transfer(&addr("alice"), &addr("bob"), 40).unwrap();
            ledger.set_height(1);
            assert_eq!(ledger.get_balance(&addr("bob")), 40);
        }

        let ledger = open(&dir);
        assert_eq!(ledger.get_balance(&addr("alice")), 100);
        assert_eq!(ledger.get_balance(&addr("bob")), 0);
        assert_eq!(ledger.height(), 0);
    }

    #[test]
    fn genesis_cannot_be_applied_twice_across_restarts() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut ledger = open(&dir);
            ledger.apply_genesis(&genesis(&[("alice", 100)])).unwrap();
            ledger.persist().unwrap();
        }

        let mut ledger = open(&dir);
        assert_eq!(
            ledger.apply_genesis(&genesis(&[("alice", 5)])),
            Err(StoreError::GenesisAlreadyApplied)
        );
        assert_eq!(ledger.get_balance(&addr("alice")), 100);
    }

    #[test]
    fn values_are_big_endian_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = open(&dir);
        ledger.apply_genesis(&genesis(&[("alice", 0x0102)])).unwrap();
        ledger.set_height(7);
        ledger.persist().unwrap();

        let db = ledger.db();
        let balance = db
            .get_cf(cf(db, CF_BALANCES).unwrap(), b"alice")
            .unwrap()
            .unwrap();
        assert_eq!(balance, 0x0102u64.to_be_bytes().to_vec());

        let height = db
            .get_cf(cf(db, CF_META).unwrap(), meta_keys::HEIGHT)
            .unwrap()
            .unwrap();
        assert_eq!(height, 7u64.to_be_bytes().to_vec());
    }

    #[test]
    fn corrupted_balance_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        {
            let db = open_db(dir.path()).unwrap();
            db.put_cf(cf(&db, CF_META).unwrap(), meta_keys::GENESIS, GENESIS_MARKER)
                .unwrap();
            db.put_cf(cf(&db, CF_BALANCES).unwrap(), b"alice", [1u8, 2, 3])
                .unwrap();
        }

        assert!(matches!(
            RocksDbLedger::open(dir.path()),
            Err(StoreError::Corrupted(_))
        ));
    }

    #[test]
    fn state_without_genesis_marker_is_corrupted() {
        let dir = tempfile::tempdir().unwrap();
        {
            let db = open_db(dir.path()).unwrap();
            db.put_cf(cf(&db, CF_META).unwrap(), meta_keys::HEIGHT, 3u64.to_be_bytes())
                .unwrap();
        }

        assert!(matches!(
            RocksDbLedger::open(dir.path()),
            Err(StoreError::Corrupted(_))
        ));
    }

    #[test]
    fn persist_clears_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let mut ledger = open(&dir);
        ledger.apply_genesis(&genesis(&[("alice", 1)])).unwrap();
        assert!(!ledger.state().pending().is_empty());
        ledger.persist().unwrap();
        assert!(ledger.state().pending().is_empty());
        assert_eq!(ledger.state().committed().balances.len(), 1);
    }
}
