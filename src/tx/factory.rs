//! Gas budget, gas price and expiration for new transactions

use crate::config::TransactionConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::types::{AccountAddress, ChainId, RawTransaction, TransactionPayload};

use tracing::debug;

/// Stamps transactions with the chain id and the configured gas and expiry settings
#[derive(Debug, Clone)]
pub struct TransactionFactory {
    max_gas_amount: u64,
    gas_unit_price: u64,
    /// Seconds from build time until expiry
    expiration_secs: u64,
    chain_id: ChainId,
}

impl TransactionFactory {
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            max_gas_amount: 1_000,
            gas_unit_price: 1,
            expiration_secs: 10,
            chain_id,
        }
    }

    pub fn from_config(config: &TransactionConfig, chain_id: ChainId) -> Self {
        Self::new(chain_id)
            .with_max_gas_amount(config.max_gas_amount)
            .with_gas_unit_price(config.gas_unit_price)
            .with_transaction_expiration_time(config.expiration_secs)
    }

    pub fn with_max_gas_amount(mut self, max_gas_amount: u64) -> Self {
        self.max_gas_amount = max_gas_amount;
        self
    }

    pub fn with_gas_unit_price(mut self, gas_unit_price: u64) -> Self {
        self.gas_unit_price = gas_unit_price;
        self
    }

    pub fn with_transaction_expiration_time(mut self, expiration_secs: u64) -> Self {
        self.expiration_secs = expiration_secs;
        self
    }

    /// Most the sender can be charged: gas budget times unit price
    pub fn max_transaction_fee(&self) -> u64 {
        self.max_gas_amount.saturating_mul(self.gas_unit_price)
    }

    /// Absolute expiry for a transaction built now
    pub fn expiration_timestamp_secs(&self) -> u64 {
        crate::now_secs().saturating_add(self.expiration_secs)
    }

    /// Start a builder for `payload`; sender and sequence number must be set before `build`
    pub fn payload(&self, payload: TransactionPayload) -> TransactionBuilder {
        TransactionBuilder {
            sender: None,
            sequence_number: None,
            payload,
            max_gas_amount: self.max_gas_amount,
            gas_unit_price: self.gas_unit_price,
            expiration_timestamp_secs: self.expiration_timestamp_secs(),
            chain_id: self.chain_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    sender: Option<AccountAddress>,
    sequence_number: Option<u64>,
    payload: TransactionPayload,
    max_gas_amount: u64,
    gas_unit_price: u64,
    expiration_timestamp_secs: u64,
    chain_id: ChainId,
}

impl TransactionBuilder {
    pub fn sender(mut self, sender: AccountAddress) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn sequence_number(mut self, sequence_number: u64) -> Self {
        self.sequence_number = Some(sequence_number);
        self
    }

    /// Override the computed expiry with an absolute timestamp
    pub fn expiration_timestamp_secs(mut self, expiration_timestamp_secs: u64) -> Self {
        self.expiration_timestamp_secs = expiration_timestamp_secs;
        self
    }

    pub fn build(self) -> LedgerResult<RawTransaction> {
        let sender = self
            .sender
            .ok_or_else(|| LedgerError::InvalidInput("transaction sender not set".to_string()))?;
        let sequence_number = self.sequence_number.ok_or_else(|| {
            LedgerError::InvalidInput("transaction sequence number not set".to_string())
        })?;
        if self.max_gas_amount == 0 {
            return Err(LedgerError::InvalidInput(
                "max gas amount must be positive".to_string(),
            ));
        }

        debug!(
            "Built {} transaction for {} seq {} (gas {} x {}, expires {})",
            self.payload.kind(),
            sender,
            sequence_number,
            self.max_gas_amount,
            self.gas_unit_price,
            self.expiration_timestamp_secs
        );

        Ok(RawTransaction::new(
            sender,
            sequence_number,
            self.payload,
            self.max_gas_amount,
            self.gas_unit_price,
            self.expiration_timestamp_secs,
            self.chain_id,
        ))
    }
}
