//! Error types for the ledger submitter

use crate::types::{AccountAddress, HashValue};
use thiserror::Error;

/// Main error type for ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{what} not found")]
    NotFound { what: String },

    #[error("Sequence number {sequence_number} for {sender} conflicts: {message}")]
    SequenceConflict {
        sender: AccountAddress,
        sequence_number: u64,
        message: String,
    },

    #[error("Transaction {} expired at {expiration_timestamp_secs}", display_hash(.hash))]
    Expired {
        hash: Option<HashValue>,
        expiration_timestamp_secs: u64,
    },

    #[error("Execution rejected: {vm_status}")]
    ExecutionRejected { vm_status: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Transaction {hash} still pending after {waited_secs}s")]
    Timeout { hash: HashValue, waited_secs: u64 },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Faucet error (status {status}): {message}")]
    Faucet { status: u16, message: String },

    #[error("Wallet is not connected")]
    WalletNotConnected,
}

fn display_hash(hash: &Option<HashValue>) -> String {
    hash.map(|h| h.to_string())
        .unwrap_or_else(|| "<unsubmitted>".to_string())
}

impl LedgerError {
    /// Check if the caller may retry with freshly fetched state
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::SequenceConflict { .. }
                | LedgerError::Transport(_)
                | LedgerError::Timeout { .. }
        )
    }

    /// Stable label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::Config(_) => "config",
            LedgerError::NotFound { .. } => "not_found",
            LedgerError::SequenceConflict { .. } => "sequence_conflict",
            LedgerError::Expired { .. } => "expired",
            LedgerError::ExecutionRejected { .. } => "execution_rejected",
            LedgerError::Transport(_) => "transport",
            LedgerError::Timeout { .. } => "timeout",
            LedgerError::Serialization(_) => "serialization",
            LedgerError::Signing(_) => "signing",
            LedgerError::InvalidInput(_) => "invalid_input",
            LedgerError::Faucet { .. } => "faucet",
            LedgerError::WalletNotConnected => "wallet_not_connected",
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        LedgerError::NotFound { what: what.into() }
    }
}

impl From<bcs::Error> for LedgerError {
    fn from(e: bcs::Error) -> Self {
        LedgerError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for LedgerError {
    fn from(e: reqwest::Error) -> Self {
        LedgerError::Transport(e.to_string())
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
