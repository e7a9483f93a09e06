//! Confirmation polling for submitted transactions
//!
//! A submitted transaction ends in exactly one of:
//! - committed and successful
//! - committed with a failed VM status (`ExecutionRejected`)
//! - dropped after its expiration passed (`Expired`)
//! - still pending when the wait bound is reached (`Timeout`)

use super::{ConfirmedTransaction, LedgerClient, PendingTransaction, TransactionInfo, TransactionStatus};
use crate::config::TransactionConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::types::HashValue;

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Polls the ledger until a hash settles or the bound is reached
#[derive(Debug, Clone)]
pub struct ConfirmationTracker {
    poll_interval: Duration,
    timeout: Duration,
}

impl ConfirmationTracker {
    pub fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval,
            timeout,
        }
    }

    pub fn from_config(config: &TransactionConfig) -> Self {
        Self::new(
            Duration::from_millis(config.poll_interval_ms),
            Duration::from_secs(config.confirmation_timeout_secs),
        )
    }

    /// Wait for a pending transaction, reporting the sender's view of the outcome
    pub async fn wait<C: LedgerClient + ?Sized>(
        &self,
        client: &C,
        pending: &PendingTransaction,
    ) -> LedgerResult<ConfirmedTransaction> {
        let info = self
            .wait_for_hash(client, pending.hash, Some(pending.expiration_timestamp_secs))
            .await?;

        Ok(ConfirmedTransaction {
            hash: info.hash,
            sender: pending.sender,
            sequence_number: pending.sequence_number,
            version: info.version,
            gas_used: info.gas_used,
            vm_status: info.vm_status,
        })
    }

    /// Poll `hash` until committed. With an expiration, an unknown hash past
    /// that time is reported as expired instead of waiting out the bound.
    pub async fn wait_for_hash<C: LedgerClient + ?Sized>(
        &self,
        client: &C,
        hash: HashValue,
        expiration_timestamp_secs: Option<u64>,
    ) -> LedgerResult<TransactionInfo> {
        let started = Instant::now();

        loop {
            match client.get_transaction_by_hash(hash).await? {
                Some(TransactionStatus::Committed(info)) => {
                    if info.success {
                        info!(
                            "Transaction {} committed at version {} (gas used {})",
                            hash, info.version, info.gas_used
                        );
                        return Ok(info);
                    }
                    warn!("Transaction {} failed on chain: {}", hash, info.vm_status);
                    return Err(LedgerError::ExecutionRejected {
                        vm_status: info.vm_status,
                    });
                }
                Some(TransactionStatus::Pending) => {
                    debug!("Transaction {} still pending", hash);
                }
                None => {
                    if let Some(expiration) = expiration_timestamp_secs {
                        if crate::now_secs() > expiration {
                            warn!("Transaction {} expired before commit", hash);
                            return Err(LedgerError::Expired {
                                hash: Some(hash),
                                expiration_timestamp_secs: expiration,
                            });
                        }
                    }
                    debug!("Transaction {} not yet visible", hash);
                }
            }

            let elapsed = started.elapsed();
            if elapsed >= self.timeout {
                warn!(
                    "Transaction {} unconfirmed after {}s",
                    hash,
                    elapsed.as_secs()
                );
                return Err(LedgerError::Timeout {
                    hash,
                    waited_secs: elapsed.as_secs(),
                });
            }

            let remaining = self.timeout - elapsed;
            tokio::time::sleep(std::cmp::min(self.poll_interval, remaining)).await;
        }
    }
}

impl Default for ConfirmationTracker {
    fn default() -> Self {
        Self::from_config(&TransactionConfig::default())
    }
}
