//! Ledger Submitter - sequenced transaction submission for Move ledgers
//!
//! Builds, signs and submits transactions against a ledger node's REST API,
//! then waits for them to commit. On top of that workflow sit a resource
//! reader, a faucet client, a wallet bridge and three demonstration
//! scenarios (coin transfer, module publishing, NFT minting).

pub mod account;
pub mod api;
pub mod chain;
pub mod config;
pub mod error;
pub mod metrics;
pub mod resource;
pub mod scenarios;
pub mod tx;
pub mod types;
pub mod wallet;

#[cfg(test)]
mod testing;

pub use error::{LedgerError, LedgerResult};

/// Wall clock in whole seconds since the Unix epoch
pub fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
