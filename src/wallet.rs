//! Wallet bridge: the connect/disconnect/account capability a front end talks to

use crate::account::LocalAccount;
use crate::error::{LedgerError, LedgerResult};
use crate::types::AccountAddress;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Public identity a connected wallet exposes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAccount {
    pub address: AccountAddress,
    /// Hex-encoded Ed25519 public key with `0x` prefix
    pub public_key: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletBridge: Send + Sync {
    async fn connect(&self) -> LedgerResult<WalletAccount>;

    async fn disconnect(&self) -> LedgerResult<()>;

    async fn is_connected(&self) -> bool;

    /// Fails with `WalletNotConnected` until `connect` succeeds
    async fn account(&self) -> LedgerResult<WalletAccount>;
}

/// Wallet backed by a key held in this process
pub struct LocalWalletBridge {
    account: Arc<LocalAccount>,
    connected: AtomicBool,
}

impl LocalWalletBridge {
    pub fn new(account: Arc<LocalAccount>) -> Self {
        Self {
            account,
            connected: AtomicBool::new(false),
        }
    }

    /// Key from the environment variable named in config, or a fresh one
    pub fn from_env_or_generate(private_key_env: Option<&str>) -> LedgerResult<Self> {
        let account = match private_key_env {
            Some(var) if std::env::var(var).is_ok() => LocalAccount::from_env(var)?,
            _ => {
                info!("No wallet key configured, generated an ephemeral account");
                LocalAccount::generate()
            }
        };
        Ok(Self::new(Arc::new(account)))
    }

    fn wallet_account(&self) -> WalletAccount {
        WalletAccount {
            address: self.account.address(),
            public_key: format!("0x{}", hex::encode(self.account.public_key().as_bytes())),
        }
    }
}

#[async_trait]
impl WalletBridge for LocalWalletBridge {
    async fn connect(&self) -> LedgerResult<WalletAccount> {
        if !self.connected.swap(true, Ordering::SeqCst) {
            info!("Wallet {} connected", self.account.address());
        }
        Ok(self.wallet_account())
    }

    async fn disconnect(&self) -> LedgerResult<()> {
        if self.connected.swap(false, Ordering::SeqCst) {
            info!("Wallet {} disconnected", self.account.address());
        }
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn account(&self) -> LedgerResult<WalletAccount> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(LedgerError::WalletNotConnected);
        }
        Ok(self.wallet_account())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_lifecycle() {
        let local = Arc::new(LocalAccount::generate());
        let bridge = LocalWalletBridge::new(local.clone());

        assert!(!bridge.is_connected().await);
        assert!(matches!(
            bridge.account().await,
            Err(LedgerError::WalletNotConnected)
        ));

        let connected = bridge.connect().await.unwrap();
        assert_eq!(connected.address, local.address());
        assert!(bridge.is_connected().await);
        assert_eq!(bridge.account().await.unwrap(), connected);

        bridge.disconnect().await.unwrap();
        assert!(!bridge.is_connected().await);
        assert!(bridge.account().await.is_err());
    }

    #[test]
    fn test_connect_is_idempotent() {
        let bridge = LocalWalletBridge::new(Arc::new(LocalAccount::generate()));
        let first = tokio_test::block_on(bridge.connect()).unwrap();
        let second = tokio_test::block_on(bridge.connect()).unwrap();
        assert_eq!(first, second);
        assert!(tokio_test::block_on(bridge.is_connected()));
    }

    #[test]
    fn test_unset_key_env_generates_account() {
        let bridge =
            LocalWalletBridge::from_env_or_generate(Some("LEDGER_TEST_UNSET_WALLET_KEY")).unwrap();
        assert!(!tokio_test::block_on(bridge.is_connected()));
    }

    #[test]
    fn test_key_from_env_is_used() {
        let account = LocalAccount::generate();
        std::env::set_var("LEDGER_TEST_WALLET_KEY", account.private_key_hex());
        let bridge =
            LocalWalletBridge::from_env_or_generate(Some("LEDGER_TEST_WALLET_KEY")).unwrap();
        let connected = tokio_test::block_on(bridge.connect()).unwrap();
        assert_eq!(connected.address, account.address());
    }
}
