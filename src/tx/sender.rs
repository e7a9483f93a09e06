//! Sequenced submission: build, sign, submit and await confirmation
//!
//! Each call reads the sender's sequence number fresh from the ledger. The
//! chain id may come from the client's cache. Sequence numbers are never
//! cached, so two submissions racing on the same account may read the same
//! one; the ledger accepts one and the other surfaces as `SequenceConflict`.

use super::factory::TransactionFactory;
use crate::account::LocalAccount;
use crate::chain::{ConfirmationTracker, ConfirmedTransaction, LedgerClient, PendingTransaction};
use crate::config::TransactionConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::types::{RawTransaction, TransactionPayload};

use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Metrics label for transactions awaited without a known payload
const EXTERNAL_PAYLOAD: &str = "external";

/// Drives transactions through the ledger on behalf of local accounts
pub struct TransactionSender {
    /// Ledger the transactions are sent to
    ledger: Arc<dyn LedgerClient>,
    /// Gas and expiration settings
    config: TransactionConfig,
    /// Confirmation polling
    tracker: ConfirmationTracker,
}

impl TransactionSender {
    pub fn new(ledger: Arc<dyn LedgerClient>, config: TransactionConfig) -> Self {
        let tracker = ConfirmationTracker::from_config(&config);
        Self {
            ledger,
            config,
            tracker,
        }
    }

    /// Replace the confirmation tracker (tests use short polls)
    pub fn with_tracker(mut self, tracker: ConfirmationTracker) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn tracker(&self) -> &ConfirmationTracker {
        &self.tracker
    }

    /// Build an unsigned transaction for `account`.
    ///
    /// The account's sequence number and the chain id are fetched
    /// concurrently; either failure fails the build.
    pub async fn build_raw(
        &self,
        account: &LocalAccount,
        payload: TransactionPayload,
    ) -> LedgerResult<RawTransaction> {
        let sender = account.address();
        let (account_data, chain_id) = tokio::try_join!(
            self.ledger.get_account(sender),
            self.ledger.get_chain_id()
        )?;

        debug!(
            "Building transaction for {} at seq {} on chain {}",
            sender, account_data.sequence_number, chain_id
        );

        TransactionFactory::from_config(&self.config, chain_id)
            .payload(payload)
            .sender(sender)
            .sequence_number(account_data.sequence_number)
            .build()
    }

    /// Build, sign and submit. Returns once the ledger has accepted the
    /// transaction; it may still fail or expire before commit.
    pub async fn submit(
        &self,
        account: &LocalAccount,
        payload: TransactionPayload,
    ) -> LedgerResult<PendingTransaction> {
        let raw = match self.build_raw(account, payload).await {
            Ok(raw) => raw,
            Err(e) => {
                crate::metrics::record_tx_failed(&e);
                return Err(e);
            }
        };
        self.submit_raw(account, raw).await
    }

    /// Sign and submit a transaction built elsewhere
    pub async fn submit_raw(
        &self,
        account: &LocalAccount,
        raw: RawTransaction,
    ) -> LedgerResult<PendingTransaction> {
        if raw.sender() != account.address() {
            return Err(LedgerError::InvalidInput(format!(
                "transaction sender {} does not match signing account {}",
                raw.sender(),
                account.address()
            )));
        }

        let payload_kind = raw.payload().kind();
        let signed = account.sign_transaction(raw)?;

        match self.ledger.submit_signed_transaction(&signed).await {
            Ok(pending) => {
                crate::metrics::record_tx_submitted(payload_kind);
                info!(
                    "Submitted {} transaction {} (sender {}, seq {})",
                    payload_kind, pending.hash, pending.sender, pending.sequence_number
                );
                Ok(pending)
            }
            Err(e) => {
                crate::metrics::record_tx_failed(&e);
                warn!(
                    "Submission of {} transaction from {} seq {} failed: {}",
                    payload_kind,
                    signed.sender(),
                    signed.sequence_number(),
                    e
                );
                Err(e)
            }
        }
    }

    /// Await a transaction submitted outside this sender. Its payload is not
    /// known here, so metrics record it under `external`.
    pub async fn wait(&self, pending: &PendingTransaction) -> LedgerResult<ConfirmedTransaction> {
        self.wait_labelled(pending, EXTERNAL_PAYLOAD).await
    }

    async fn wait_labelled(
        &self,
        pending: &PendingTransaction,
        payload_kind: &str,
    ) -> LedgerResult<ConfirmedTransaction> {
        let started = Instant::now();
        let result = self.tracker.wait(self.ledger.as_ref(), pending).await;

        match &result {
            Ok(_) => {
                crate::metrics::record_tx_confirmed(payload_kind, started.elapsed().as_secs_f64())
            }
            Err(e) => crate::metrics::record_tx_failed(e),
        }
        result
    }

    /// Full workflow: submit then wait for commit
    pub async fn submit_and_wait(
        &self,
        account: &LocalAccount,
        payload: TransactionPayload,
    ) -> LedgerResult<ConfirmedTransaction> {
        let payload_kind = payload.kind();
        let pending = self.submit(account, payload).await?;
        self.wait_labelled(&pending, payload_kind).await
    }
}
