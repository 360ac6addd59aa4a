//! Consensus-facing application layer.
//!
//! - [`application`]: the [`Application`](application::Application) callback trait and
//!   [`SimpleCoin`](application::SimpleCoin), its ledger-backed implementation
//! - [`block_accumulator`]: transactions delivered in the open block
//! - [`types`]: request and response values exchanged with the engine

pub mod application;
pub mod block_accumulator;
pub mod types;
