//! Typed reads of on-chain account resources

use crate::chain::{AccountResource, LedgerClient};
use crate::error::{LedgerError, LedgerResult};
use crate::types::AccountAddress;

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Coin store holding an account's native balance
pub const COIN_STORE: &str = "0x1::coin::CoinStore<0x1::aptos_coin::AptosCoin>";

/// Collections created by an account through `0x3::token`
pub const TOKEN_COLLECTIONS: &str = "0x3::token::Collections";

/// Tokens owned by an account
pub const TOKEN_STORE: &str = "0x3::token::TokenStore";

/// Resource written by the hello-blockchain `message` module
pub fn message_holder_type(contract: AccountAddress) -> String {
    format!("{}::message::MessageHolder", contract.to_hex_literal())
}

/// Read-only view over account resources
#[derive(Clone)]
pub struct ResourceReader {
    ledger: Arc<dyn LedgerClient>,
}

impl ResourceReader {
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self { ledger }
    }

    /// A missing resource or a missing account is `None`
    pub async fn resource(
        &self,
        address: AccountAddress,
        resource_type: &str,
    ) -> LedgerResult<Option<AccountResource>> {
        let resource = self
            .ledger
            .get_account_resource(address, resource_type)
            .await?;
        if resource.is_none() {
            debug!("{} holds no {}", address, resource_type);
        }
        Ok(resource)
    }

    pub async fn resources(&self, address: AccountAddress) -> LedgerResult<Vec<AccountResource>> {
        self.ledger.get_account_resources(address).await
    }

    /// Native coin balance. An account that never received coins has no
    /// coin store and reports `None` rather than zero.
    pub async fn coin_balance(&self, address: AccountAddress) -> LedgerResult<Option<u64>> {
        match self.resource(address, COIN_STORE).await? {
            Some(store) => parse_u64(&store.data["coin"]["value"]).map(Some),
            None => Ok(None),
        }
    }

    /// Message `address` stored through `contract`'s message module
    pub async fn message(
        &self,
        contract: AccountAddress,
        address: AccountAddress,
    ) -> LedgerResult<Option<String>> {
        let holder = self
            .resource(address, &message_holder_type(contract))
            .await?;
        Ok(holder.and_then(|r| r.data["message"].as_str().map(str::to_string)))
    }
}

/// Node JSON carries u64 as a decimal string; tolerate plain numbers
fn parse_u64(value: &Value) -> LedgerResult<u64> {
    match value {
        Value::String(s) => s
            .parse()
            .map_err(|e| LedgerError::Serialization(format!("invalid u64 {:?}: {}", s, e))),
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| LedgerError::Serialization(format!("invalid u64 {}", n))),
        other => Err(LedgerError::Serialization(format!(
            "expected u64, found {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockLedgerClient;
    use serde_json::json;

    fn reader(mock: MockLedgerClient) -> ResourceReader {
        ResourceReader::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn test_balance_from_string_value() {
        let mut mock = MockLedgerClient::new();
        mock.expect_get_account_resource()
            .withf(|a, t| *a == AccountAddress::THREE && t == COIN_STORE)
            .returning(|_, t| {
                Ok(Some(AccountResource {
                    resource_type: t.to_string(),
                    data: json!({"coin": {"value": "5000"}, "frozen": false}),
                }))
            });

        let balance = reader(mock).coin_balance(AccountAddress::THREE).await.unwrap();
        assert_eq!(balance, Some(5_000));
    }

    #[tokio::test]
    async fn test_balance_from_number_value() {
        let mut mock = MockLedgerClient::new();
        mock.expect_get_account_resource().returning(|_, t| {
            Ok(Some(AccountResource {
                resource_type: t.to_string(),
                data: json!({"coin": {"value": 42}}),
            }))
        });

        let balance = reader(mock).coin_balance(AccountAddress::ONE).await.unwrap();
        assert_eq!(balance, Some(42));
    }

    #[tokio::test]
    async fn test_missing_coin_store_is_none() {
        let mut mock = MockLedgerClient::new();
        mock.expect_get_account_resource().returning(|_, _| Ok(None));

        let balance = reader(mock).coin_balance(AccountAddress::ONE).await.unwrap();
        assert_eq!(balance, None);
    }

    #[tokio::test]
    async fn test_malformed_balance_is_serialization_error() {
        let mut mock = MockLedgerClient::new();
        mock.expect_get_account_resource().returning(|_, t| {
            Ok(Some(AccountResource {
                resource_type: t.to_string(),
                data: json!({"coin": {}}),
            }))
        });

        let err = reader(mock)
            .coin_balance(AccountAddress::ONE)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_message_reads_holder() {
        let contract = AccountAddress::from_hex_literal("0xa11ce").unwrap();
        let holder = message_holder_type(contract);
        let mut mock = MockLedgerClient::new();
        mock.expect_get_account_resource()
            .withf(move |_, t| t == holder)
            .returning(|_, t| {
                Ok(Some(AccountResource {
                    resource_type: t.to_string(),
                    data: json!({"message": "Hello, Blockchain"}),
                }))
            });

        let message = reader(mock)
            .message(contract, AccountAddress::THREE)
            .await
            .unwrap();
        assert_eq!(message.as_deref(), Some("Hello, Blockchain"));
    }
}
