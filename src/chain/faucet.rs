//! Faucet funding for test networks
//!
//! Faucets are best-effort: they may be rate limited or disabled outside
//! test networks, so every failure is surfaced to the caller.

use super::{ConfirmationTracker, LedgerClient};
use crate::config::NodeConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::types::{AccountAddress, HashValue};

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

/// Grants test funds to an address
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FaucetClient: Send + Sync {
    /// Create (if needed) and fund `address`; returns the hashes of the
    /// transactions the faucet submitted on its behalf
    async fn fund_account(&self, address: AccountAddress, amount: u64)
        -> LedgerResult<Vec<HashValue>>;
}

/// Faucet reached over HTTP (`POST /mint?amount=..&address=..`)
#[derive(Debug)]
pub struct HttpFaucetClient {
    faucet_url: Url,
    http: HttpClient,
}

impl HttpFaucetClient {
    pub fn new(faucet_url: &str, request_timeout: Duration) -> LedgerResult<Self> {
        let faucet_url = Url::parse(faucet_url)
            .map_err(|e| LedgerError::Config(format!("Invalid faucet URL {}: {}", faucet_url, e)))?;
        let http = HttpClient::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| LedgerError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { faucet_url, http })
    }

    /// `None` when no faucet is configured (e.g. mainnet)
    pub fn from_config(config: &NodeConfig) -> LedgerResult<Option<Self>> {
        config
            .faucet_url
            .as_deref()
            .map(|url| Self::new(url, Duration::from_secs(config.request_timeout_secs)))
            .transpose()
    }
}

#[async_trait]
impl FaucetClient for HttpFaucetClient {
    async fn fund_account(
        &self,
        address: AccountAddress,
        amount: u64,
    ) -> LedgerResult<Vec<HashValue>> {
        let mut url = self.faucet_url.clone();
        url.path_segments_mut()
            .map_err(|_| LedgerError::Config(format!("{} cannot be a base URL", self.faucet_url)))?
            .pop_if_empty()
            .push("mint");
        url.query_pairs_mut()
            .append_pair("amount", &amount.to_string())
            .append_pair("address", &address.to_hex_literal());

        let response = self.http.post(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Faucet refused to fund {}: {} {}", address, status, body);
            crate::metrics::record_faucet_request(false);
            return Err(LedgerError::Faucet {
                status: status.as_u16(),
                message: body,
            });
        }

        let hashes: Vec<HashValue> = serde_json::from_str(&body)?;
        crate::metrics::record_faucet_request(true);
        info!(
            "Faucet funded {} with {} ({} transactions)",
            address,
            amount,
            hashes.len()
        );
        Ok(hashes)
    }
}

/// Fund an account and wait until every faucet transaction is committed
pub async fn fund_and_wait<F, C>(
    faucet: &F,
    ledger: &C,
    tracker: &ConfirmationTracker,
    address: AccountAddress,
    amount: u64,
) -> LedgerResult<()>
where
    F: FaucetClient + ?Sized,
    C: LedgerClient + ?Sized,
{
    for hash in faucet.fund_account(address, amount).await? {
        tracker.wait_for_hash(ledger, hash, None).await?;
    }
    Ok(())
}
