use super::{Balances, ScenarioContext};
use crate::account::LocalAccount;
use crate::chain::{AccountResource, ConfirmedTransaction};
use crate::error::LedgerResult;
use crate::tx::payload::{self, TokenSpec};
use crate::types::AccountAddress;

use serde::Serialize;
use std::fmt;

pub const FUNDING: u64 = 200_000_000;
pub const COLLECTION_NAME: &str = "Alice NFT's";
pub const COLLECTION_DESCRIPTION: &str = "Collection of Alice's NFT's";
pub const COLLECTION_URI: &str = "example.com";
pub const TOKEN_NAME: &str = "First Token";
pub const TOKEN_DESCRIPTION: &str = "Minted this token first";
pub const TOKEN_URI: &str = "https://aptos.dev/img/nyan.jpeg";

#[derive(Debug, Clone, Serialize)]
pub struct NftReport {
    pub alice: AccountAddress,
    pub bob: AccountAddress,
    pub initial: Balances,
    pub collection: ConfirmedTransaction,
    pub token: ConfirmedTransaction,
    pub alice_resources: Vec<AccountResource>,
    #[serde(rename = "final")]
    pub final_balances: Balances,
}

/// Alice creates a collection and mints a single token into it
pub async fn first_nft(ctx: &ScenarioContext) -> LedgerResult<NftReport> {
    let alice = LocalAccount::generate();
    let bob = LocalAccount::generate();

    ctx.fund(alice.address(), FUNDING).await?;
    ctx.fund(bob.address(), FUNDING).await?;
    let initial = ctx.balances(alice.address(), bob.address()).await?;

    let collection = ctx
        .sender()
        .submit_and_wait(
            &alice,
            payload::create_collection(
                COLLECTION_NAME,
                COLLECTION_DESCRIPTION,
                COLLECTION_URI,
                payload::UNLIMITED,
            )?,
        )
        .await?;

    let token = TokenSpec::new(
        alice.address(),
        COLLECTION_NAME,
        TOKEN_NAME,
        TOKEN_DESCRIPTION,
        1,
        TOKEN_URI,
    );
    let token = ctx
        .sender()
        .submit_and_wait(&alice, payload::create_token(&token)?)
        .await?;

    let alice_resources = ctx.reader().resources(alice.address()).await?;
    let final_balances = ctx.balances(alice.address(), bob.address()).await?;

    Ok(NftReport {
        alice: alice.address(),
        bob: bob.address(),
        initial,
        collection,
        token,
        alice_resources,
        final_balances,
    })
}

impl fmt::Display for NftReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Addresses ===")?;
        writeln!(f, "Alice: {}", self.alice)?;
        writeln!(f, "Bob: {}", self.bob)?;
        writeln!(f, "\n=== Initial Balances ===\n{}", self.initial)?;
        writeln!(f, "\nCreated collection {:?} in {}", COLLECTION_NAME, self.collection.hash)?;
        writeln!(f, "Minted {:?} in {}", TOKEN_NAME, self.token.hash)?;
        writeln!(f, "\n=== Alice Resources ===")?;
        for resource in &self.alice_resources {
            writeln!(f, "{}: {}", resource.resource_type, resource.data)?;
        }
        write!(f, "\n=== Final Balances ===\n{}", self.final_balances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ConfirmationTracker;
    use crate::config::TransactionConfig;
    use crate::resource::{TOKEN_COLLECTIONS, TOKEN_STORE};
    use crate::testing::InMemoryLedger;
    use crate::types::ChainId;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_collection_and_token_show_up_in_resources() {
        let ledger = Arc::new(InMemoryLedger::new(ChainId::new(4)));
        let ctx = ScenarioContext::new(ledger.clone(), ledger, TransactionConfig::default())
            .with_tracker(ConfirmationTracker::new(
                Duration::from_millis(10),
                Duration::from_secs(1),
            ));

        let report = first_nft(&ctx).await.unwrap();

        let types: Vec<&str> = report
            .alice_resources
            .iter()
            .map(|r| r.resource_type.as_str())
            .collect();
        assert!(types.contains(&TOKEN_COLLECTIONS));
        assert!(types.contains(&TOKEN_STORE));

        let store = report
            .alice_resources
            .iter()
            .find(|r| r.resource_type == TOKEN_STORE)
            .unwrap();
        assert_eq!(store.data["tokens"][0]["name"], TOKEN_NAME);
        assert_eq!(store.data["tokens"][0]["amount"], "1");

        assert_eq!(report.initial.alice, Some(FUNDING));
        assert_eq!(
            report.final_balances.alice,
            Some(FUNDING - report.collection.gas_used - report.token.gas_used)
        );
        assert_eq!(report.final_balances.bob, Some(FUNDING));
    }
}
