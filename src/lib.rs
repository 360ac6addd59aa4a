//! SimpleCoin ledger application.
//!
//! The deterministic state machine behind a BFT-replicated coin ledger: it
//! decodes and validates transfers, applies them to a durable ledger, and
//! commits each block to a merkle app hash that every replica reproduces.

pub mod app;
pub mod config;
pub mod core;
pub mod crypto;
pub mod storage;
pub mod types;
pub mod utils;
