use super::{Balances, ScenarioContext};
use crate::account::LocalAccount;
use crate::chain::ConfirmedTransaction;
use crate::error::{LedgerError, LedgerResult};
use crate::tx::payload;
use crate::types::AccountAddress;

use serde::Serialize;
use std::fmt;
use tracing::info;

pub const FUNDING: u64 = 5_000;
pub const GREETING: &str = "Hello, Blockchain";

/// One account's message before and after calling `set_message`
#[derive(Debug, Clone, Serialize)]
pub struct MessageRound {
    pub account: AccountAddress,
    pub initial: Option<String>,
    pub set: ConfirmedTransaction,
    pub updated: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HelloBlockchainReport {
    pub alice: AccountAddress,
    pub bob: AccountAddress,
    pub initial: Balances,
    pub publish: ConfirmedTransaction,
    pub alice_round: MessageRound,
    pub bob_round: MessageRound,
}

/// Alice publishes the message module, then both Alice and Bob set a
/// message through it. The module bytecode must be compiled for Alice's
/// address, so the caller supplies her account.
pub async fn hello_blockchain(
    ctx: &ScenarioContext,
    alice: &LocalAccount,
    bob: &LocalAccount,
    modules: Vec<Vec<u8>>,
) -> LedgerResult<HelloBlockchainReport> {
    if modules.is_empty() {
        return Err(LedgerError::InvalidInput(
            "at least one compiled module is required".to_string(),
        ));
    }

    ctx.fund(alice.address(), FUNDING).await?;
    ctx.fund(bob.address(), FUNDING).await?;
    let initial = ctx.balances(alice.address(), bob.address()).await?;

    info!("Publishing {} module(s) from {}", modules.len(), alice.address());
    let publish = ctx
        .sender()
        .submit_and_wait(alice, payload::publish_modules(modules))
        .await?;

    let contract = alice.address();
    let alice_round = set_and_read(ctx, contract, alice).await?;
    let bob_round = set_and_read(ctx, contract, bob).await?;

    Ok(HelloBlockchainReport {
        alice: alice.address(),
        bob: bob.address(),
        initial,
        publish,
        alice_round,
        bob_round,
    })
}

async fn set_and_read(
    ctx: &ScenarioContext,
    contract: AccountAddress,
    account: &LocalAccount,
) -> LedgerResult<MessageRound> {
    let initial = ctx.reader().message(contract, account.address()).await?;
    let set = ctx
        .sender()
        .submit_and_wait(account, payload::set_message(contract, GREETING)?)
        .await?;
    let updated = ctx.reader().message(contract, account.address()).await?;

    Ok(MessageRound {
        account: account.address(),
        initial,
        set,
        updated,
    })
}

impl fmt::Display for MessageRound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Initial value: {}",
            self.initial.as_deref().unwrap_or("<none>")
        )?;
        writeln!(f, "Setting the message to {:?} ({})", GREETING, self.set.hash)?;
        write!(
            f,
            "New value: {}",
            self.updated.as_deref().unwrap_or("<none>")
        )
    }
}

impl fmt::Display for HelloBlockchainReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Addresses ===")?;
        writeln!(f, "Alice: {}", self.alice)?;
        writeln!(f, "Bob: {}", self.bob)?;
        writeln!(f, "\n=== Initial Balances ===\n{}", self.initial)?;
        writeln!(f, "\nPublished module in {}", self.publish.hash)?;
        writeln!(f, "\n=== Testing Alice ===\n{}", self.alice_round)?;
        write!(f, "\n=== Testing Bob ===\n{}", self.bob_round)
    }
}
