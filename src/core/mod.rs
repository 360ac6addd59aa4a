//! Core ledger data structures.
//!
//! - `Transaction`: signed coin transfer with its canonical wire codec
//! - `validation`: the admission rules shared by CheckTx and DeliverTx
//! - `Genesis`: initial balance allocations applied once per chain

pub mod genesis;
pub mod transaction;
pub mod validation;
