use super::{Balances, ScenarioContext};
use crate::account::LocalAccount;
use crate::chain::ConfirmedTransaction;
use crate::error::LedgerResult;
use crate::tx::payload;
use crate::types::AccountAddress;

use serde::Serialize;
use std::fmt;

pub const ALICE_FUNDING: u64 = 5_000;
pub const BOB_FUNDING: u64 = 0;
pub const TRANSFER_AMOUNT: u64 = 1_000;

#[derive(Debug, Clone, Serialize)]
pub struct TransferReport {
    pub alice: AccountAddress,
    pub bob: AccountAddress,
    pub initial: Balances,
    pub transfer: ConfirmedTransaction,
    #[serde(rename = "final")]
    pub final_balances: Balances,
}

/// Fund Alice (not Bob), then have Alice send Bob 1000 coins
pub async fn basic_transfer(ctx: &ScenarioContext) -> LedgerResult<TransferReport> {
    let alice = LocalAccount::generate();
    let bob = LocalAccount::generate();

    ctx.fund(alice.address(), ALICE_FUNDING).await?;
    ctx.fund(bob.address(), BOB_FUNDING).await?;
    let initial = ctx.balances(alice.address(), bob.address()).await?;

    let transfer = ctx
        .sender()
        .submit_and_wait(&alice, payload::coin_transfer(bob.address(), TRANSFER_AMOUNT)?)
        .await?;
    let final_balances = ctx.balances(alice.address(), bob.address()).await?;

    Ok(TransferReport {
        alice: alice.address(),
        bob: bob.address(),
        initial,
        transfer,
        final_balances,
    })
}

impl fmt::Display for TransferReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Addresses ===")?;
        writeln!(f, "Alice: {}", self.alice)?;
        writeln!(f, "Bob: {}", self.bob)?;
        writeln!(f, "\n=== Initial Balances ===\n{}", self.initial)?;
        writeln!(
            f,
            "\nTransfer {} committed at version {} (gas used {})",
            self.transfer.hash, self.transfer.version, self.transfer.gas_used
        )?;
        write!(f, "\n=== Final Balances ===\n{}", self.final_balances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ConfirmationTracker;
    use crate::config::TransactionConfig;
    use crate::error::LedgerError;
    use crate::testing::InMemoryLedger;
    use crate::types::ChainId;
    use std::sync::Arc;
    use std::time::Duration;

    fn context(ledger: Arc<InMemoryLedger>) -> ScenarioContext {
        ScenarioContext::new(ledger.clone(), ledger, TransactionConfig::default()).with_tracker(
            ConfirmationTracker::new(Duration::from_millis(10), Duration::from_secs(1)),
        )
    }

    #[tokio::test]
    async fn test_basic_transfer_balances() {
        let ledger = Arc::new(InMemoryLedger::new(ChainId::new(4)));
        let report = basic_transfer(&context(ledger)).await.unwrap();

        assert_eq!(report.initial.alice, Some(5_000));
        assert_eq!(report.initial.bob, None);
        assert_eq!(
            report.final_balances.alice,
            Some(4_000 - report.transfer.gas_used)
        );
        assert_eq!(report.final_balances.bob, Some(1_000));
        assert_eq!(report.transfer.sender, report.alice);
        assert_eq!(report.transfer.sequence_number, 0);
    }

    #[tokio::test]
    async fn test_faucet_failure_aborts_scenario() {
        let ledger = Arc::new(InMemoryLedger::new(ChainId::new(4)));
        ledger.set_faucet_enabled(false);

        let err = basic_transfer(&context(ledger)).await.unwrap_err();
        assert!(matches!(err, LedgerError::Faucet { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_report_renders_missing_coin_store() {
        let ledger = Arc::new(InMemoryLedger::new(ChainId::new(4)));
        let report = basic_transfer(&context(ledger)).await.unwrap();
        let rendered = report.to_string();
        assert!(rendered.contains("Bob: no coin store"));
        assert!(rendered.contains("Bob: 1000"));
    }
}
