//! Ledger storage subsystem.
//!
//! - [`ledger_store`]: the [`LedgerStore`](ledger_store::LedgerStore) trait and the
//!   pending-write overlay shared by every backend
//! - [`memory_ledger`]: in-memory implementation for tests and tooling
//! - [`rocksdb_ledger`]: durable RocksDB-backed implementation

pub mod ledger_store;
pub mod memory_ledger;
pub mod rocksdb_ledger;
