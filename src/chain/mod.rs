//! Chain module - the ledger and faucet collaborators
//!
//! This module provides:
//! - The `LedgerClient` capability the submission workflow is written against
//! - A REST implementation with read failover across node URLs
//! - Confirmation polling with expiry and timeout detection
//! - Faucet funding

pub mod faucet;
pub mod finality;
pub mod provider;

pub use faucet::{fund_and_wait, FaucetClient, HttpFaucetClient};
pub use finality::ConfirmationTracker;
pub use provider::RestClient;

use crate::error::LedgerResult;
use crate::types::{AccountAddress, ChainId, HashValue, SignedTransaction};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Poll interval used by `LedgerClient::wait_for_transaction`
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// On-chain account metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountData {
    pub sequence_number: u64,
    pub authentication_key: String,
}

/// A typed, namespaced blob of on-chain state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub data: serde_json::Value,
}

/// Result of executing a committed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInfo {
    pub hash: HashValue,
    pub version: u64,
    pub success: bool,
    pub vm_status: String,
    pub gas_used: u64,
}

/// What the ledger currently knows about a hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Accepted into mempool, not yet executed
    Pending,
    Committed(TransactionInfo),
}

/// Returned by submission; `hash` is the polling key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub hash: HashValue,
    pub sender: AccountAddress,
    pub sequence_number: u64,
    pub expiration_timestamp_secs: u64,
}

/// A transaction the ledger executed successfully
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedTransaction {
    pub hash: HashValue,
    pub sender: AccountAddress,
    pub sequence_number: u64,
    pub version: u64,
    pub gas_used: u64,
    pub vm_status: String,
}

/// Remote ledger capability consumed by the submission workflow
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Account metadata; `NotFound` if the address has never been created
    async fn get_account(&self, address: AccountAddress) -> LedgerResult<AccountData>;

    /// A single resource, `None` when the account does not hold it
    async fn get_account_resource(
        &self,
        address: AccountAddress,
        resource_type: &str,
    ) -> LedgerResult<Option<AccountResource>>;

    /// All resources held by an account (empty for unknown accounts)
    async fn get_account_resources(
        &self,
        address: AccountAddress,
    ) -> LedgerResult<Vec<AccountResource>>;

    /// Chain id for building transactions; implementations may cache it
    async fn get_chain_id(&self) -> LedgerResult<ChainId>;

    /// Ask the node for its chain id right now, bypassing any cache
    async fn check_health(&self) -> LedgerResult<ChainId> {
        self.get_chain_id().await
    }

    /// Submit the BCS encoding of a signed transaction
    async fn submit_signed_transaction(
        &self,
        txn: &SignedTransaction,
    ) -> LedgerResult<PendingTransaction>;

    /// `None` when the ledger has never seen the hash (or has dropped it)
    async fn get_transaction_by_hash(
        &self,
        hash: HashValue,
    ) -> LedgerResult<Option<TransactionStatus>>;

    /// Poll until the hash is committed or `timeout` elapses
    async fn wait_for_transaction(
        &self,
        hash: HashValue,
        timeout: Duration,
    ) -> LedgerResult<TransactionInfo> {
        ConfirmationTracker::new(DEFAULT_POLL_INTERVAL, timeout)
            .wait_for_hash(self, hash, None)
            .await
    }
}
