//! Demonstration flows built on the submission workflow
//!
//! Each scenario returns a report; rendering is left to the caller.

mod first_nft;
mod hello_blockchain;
mod transfer;

pub use first_nft::{first_nft, NftReport, COLLECTION_NAME, TOKEN_NAME};
pub use hello_blockchain::{hello_blockchain, HelloBlockchainReport, MessageRound, GREETING};
pub use transfer::{basic_transfer, TransferReport};

use crate::chain::{fund_and_wait, ConfirmationTracker, FaucetClient, LedgerClient};
use crate::config::TransactionConfig;
use crate::error::LedgerResult;
use crate::resource::ResourceReader;
use crate::tx::TransactionSender;
use crate::types::AccountAddress;

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Collaborators every scenario needs
pub struct ScenarioContext {
    ledger: Arc<dyn LedgerClient>,
    faucet: Arc<dyn FaucetClient>,
    sender: TransactionSender,
    reader: ResourceReader,
}

impl ScenarioContext {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        faucet: Arc<dyn FaucetClient>,
        config: TransactionConfig,
    ) -> Self {
        Self {
            sender: TransactionSender::new(ledger.clone(), config),
            reader: ResourceReader::new(ledger.clone()),
            ledger,
            faucet,
        }
    }

    pub fn with_tracker(mut self, tracker: ConfirmationTracker) -> Self {
        self.sender = self.sender.with_tracker(tracker);
        self
    }

    pub fn sender(&self) -> &TransactionSender {
        &self.sender
    }

    pub fn reader(&self) -> &ResourceReader {
        &self.reader
    }

    /// Fund through the faucet and wait for its transactions to commit
    pub async fn fund(&self, address: AccountAddress, amount: u64) -> LedgerResult<()> {
        info!("Funding {} with {}", address, amount);
        fund_and_wait(
            self.faucet.as_ref(),
            self.ledger.as_ref(),
            self.sender.tracker(),
            address,
            amount,
        )
        .await
    }

    /// Balances of both participants, read concurrently
    pub async fn balances(
        &self,
        alice: AccountAddress,
        bob: AccountAddress,
    ) -> LedgerResult<Balances> {
        let (alice, bob) = futures::future::try_join(
            self.reader.coin_balance(alice),
            self.reader.coin_balance(bob),
        )
        .await?;
        Ok(Balances { alice, bob })
    }
}

/// Coin balances of the two scenario accounts. `None` means no coin store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Balances {
    pub alice: Option<u64>,
    pub bob: Option<u64>,
}

impl fmt::Display for Balances {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Alice: {}", display_balance(self.alice))?;
        write!(f, "Bob: {}", display_balance(self.bob))
    }
}

fn display_balance(balance: Option<u64>) -> String {
    balance
        .map(|b| b.to_string())
        .unwrap_or_else(|| "no coin store".to_string())
}
