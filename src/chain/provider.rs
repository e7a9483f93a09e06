//! REST ledger client with multi-URL read failover

use super::{
    AccountData, AccountResource, LedgerClient, PendingTransaction, TransactionInfo,
    TransactionStatus,
};
use crate::config::NodeConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::types::{AccountAddress, ChainId, HashValue, SignedTransaction};

use async_trait::async_trait;
use reqwest::{Client as HttpClient, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use url::Url;

const BCS_SIGNED_TRANSACTION: &str = "application/x.aptos.signed_transaction+bcs";

/// Error codes on a 404 that mean the requested item does not exist
const ABSENT_ERROR_CODES: &[&str] = &[
    "account_not_found",
    "resource_not_found",
    "transaction_not_found",
];

/// Ledger client over the node's REST API
pub struct RestClient {
    /// Node base URLs (e.g. `http://localhost:8080/v1`), tried in order on read failure
    base_urls: Vec<Url>,
    /// Current active URL index
    current: AtomicUsize,
    http: HttpClient,
    /// The chain id never changes for a node, so it is fetched once
    chain_id: OnceCell<ChainId>,
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_urls", &self.base_urls)
            .finish()
    }
}

#[derive(Deserialize)]
struct IndexResponse {
    chain_id: u8,
}

#[derive(Deserialize)]
struct AccountResponse {
    sequence_number: StringU64,
    authentication_key: String,
}

#[derive(Deserialize)]
struct SubmitResponse {
    hash: HashValue,
}

/// Error body returned by the node
#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    vm_error_code: Option<u64>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TransactionResponse {
    PendingTransaction,
    UserTransaction {
        hash: HashValue,
        version: StringU64,
        success: bool,
        vm_status: String,
        gas_used: StringU64,
    },
    #[serde(other)]
    Other,
}

/// Node JSON encodes u64 as decimal strings; accept numbers too
#[derive(Deserialize)]
#[serde(untagged)]
enum StringU64 {
    Str(String),
    Num(u64),
}

impl StringU64 {
    fn get(&self) -> LedgerResult<u64> {
        match self {
            StringU64::Num(n) => Ok(*n),
            StringU64::Str(s) => s
                .parse()
                .map_err(|e| LedgerError::Serialization(format!("invalid u64 {:?}: {}", s, e))),
        }
    }
}

impl RestClient {
    /// Create a client for the given node base URLs
    pub fn new(urls: &[String], request_timeout: Duration) -> LedgerResult<Self> {
        let mut base_urls = Vec::new();
        for url in urls {
            match Url::parse(url) {
                Ok(parsed) if !parsed.cannot_be_a_base() => {
                    debug!("Added ledger endpoint {}", parsed);
                    base_urls.push(parsed);
                }
                Ok(_) => warn!("Ignoring ledger URL that cannot be a base: {}", url),
                Err(e) => warn!("Ignoring invalid ledger URL {}: {}", url, e),
            }
        }

        if base_urls.is_empty() {
            return Err(LedgerError::Config("No valid ledger REST URLs".to_string()));
        }

        let http = HttpClient::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| LedgerError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_urls,
            current: AtomicUsize::new(0),
            http,
            chain_id: OnceCell::new(),
        })
    }

    pub fn from_config(config: &NodeConfig) -> LedgerResult<Self> {
        Self::new(
            &config.rest_urls,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn base(&self) -> &Url {
        let idx = self.current.load(Ordering::Relaxed);
        &self.base_urls[idx % self.base_urls.len()]
    }

    /// Switch to the next configured URL
    fn failover(&self) {
        if self.base_urls.len() < 2 {
            return;
        }
        let current = self.current.load(Ordering::Relaxed);
        let next = (current + 1) % self.base_urls.len();
        self.current.store(next, Ordering::Relaxed);
        warn!("Ledger client failover to {}", self.base_urls[next]);
    }

    /// Append percent-encoded path segments to the active base URL
    fn url(&self, segments: &[&str]) -> LedgerResult<Url> {
        let mut url = self.base().clone();
        url.path_segments_mut()
            .map_err(|_| LedgerError::Config(format!("{} cannot be a base URL", self.base())))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET with failover across base URLs on transport errors.
    /// Returns `None` when the node reports the item as not found.
    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> LedgerResult<Option<T>> {
        let mut last_error = None;

        for _ in 0..self.base_urls.len() {
            let url = self.url(segments)?;
            match self.http.get(url.clone()).send().await {
                Ok(response) => return Self::decode_optional(response).await,
                Err(e) => {
                    warn!("Ledger request to {} failed: {}", url, e);
                    last_error = Some(LedgerError::from(e));
                    self.failover();
                }
            }
        }

        Err(last_error.unwrap_or_else(|| LedgerError::Transport("All ledger endpoints failed".into())))
    }

    /// Read the node index
    async fn fetch_chain_id(&self) -> LedgerResult<ChainId> {
        let index: IndexResponse = self
            .get_json(&[""])
            .await?
            .ok_or_else(|| LedgerError::not_found("Ledger index"))?;
        debug!("Ledger chain id is {}", index.chain_id);
        Ok(ChainId::new(index.chain_id))
    }

    async fn decode_optional<T: DeserializeOwned>(response: Response) -> LedgerResult<Option<T>> {
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            // Only the node's own not-found codes mean absent; any other 404
            // points at a wrong base URL or path
            let api_error = serde_json::from_str::<ApiError>(&body).unwrap_or_default();
            return match api_error.error_code.as_deref() {
                Some(code) if ABSENT_ERROR_CODES.contains(&code) => Ok(None),
                _ => Err(LedgerError::Transport(format!(
                    "ledger returned {} without a not-found code: {}",
                    status, body
                ))),
            };
        }

        if !status.is_success() {
            let api_error = serde_json::from_str::<ApiError>(&body).unwrap_or_default();
            let message = if api_error.message.is_empty() {
                body
            } else {
                api_error.message
            };
            return Err(LedgerError::Transport(format!(
                "ledger returned {}: {}",
                status, message
            )));
        }

        Ok(Some(serde_json::from_str(&body)?))
    }
}

/// Map a rejected submission onto the error taxonomy
fn classify_submit_error(
    status: StatusCode,
    body: &str,
    txn: &SignedTransaction,
) -> LedgerError {
    if status.is_server_error() {
        return LedgerError::Transport(format!("ledger returned {}: {}", status, body));
    }

    let api_error = serde_json::from_str::<ApiError>(body).unwrap_or_else(|_| ApiError {
        message: body.to_string(),
        ..Default::default()
    });
    let code = api_error.error_code.as_deref().unwrap_or_default();
    let message = api_error.message.as_str();

    if message.contains("SEQUENCE_NUMBER_TOO_OLD")
        || code == "sequence_number_too_old"
        || code == "invalid_transaction_update"
    {
        return LedgerError::SequenceConflict {
            sender: txn.sender(),
            sequence_number: txn.sequence_number(),
            message: message.to_string(),
        };
    }

    if message.contains("TRANSACTION_EXPIRED") || code == "transaction_expired" {
        return LedgerError::Expired {
            hash: txn.committed_hash().ok(),
            expiration_timestamp_secs: txn.expiration_timestamp_secs(),
        };
    }

    let vm_status = match api_error.vm_error_code {
        Some(vm_code) => format!("{} (vm error code {})", message, vm_code),
        None => message.to_string(),
    };
    LedgerError::ExecutionRejected { vm_status }
}

#[async_trait]
impl LedgerClient for RestClient {
    async fn get_account(&self, address: AccountAddress) -> LedgerResult<AccountData> {
        let addr = address.to_hex_literal();
        let account: AccountResponse = self
            .get_json(&["accounts", &addr])
            .await?
            .ok_or_else(|| LedgerError::not_found(format!("Account {}", addr)))?;

        Ok(AccountData {
            sequence_number: account.sequence_number.get()?,
            authentication_key: account.authentication_key,
        })
    }

    async fn get_account_resource(
        &self,
        address: AccountAddress,
        resource_type: &str,
    ) -> LedgerResult<Option<AccountResource>> {
        let addr = address.to_hex_literal();
        self.get_json(&["accounts", &addr, "resource", resource_type])
            .await
    }

    async fn get_account_resources(
        &self,
        address: AccountAddress,
    ) -> LedgerResult<Vec<AccountResource>> {
        let addr = address.to_hex_literal();
        Ok(self
            .get_json(&["accounts", &addr, "resources"])
            .await?
            .unwrap_or_default())
    }

    async fn get_chain_id(&self) -> LedgerResult<ChainId> {
        self.chain_id
            .get_or_try_init(|| self.fetch_chain_id())
            .await
            .copied()
    }

    async fn check_health(&self) -> LedgerResult<ChainId> {
        self.fetch_chain_id().await
    }

    async fn submit_signed_transaction(
        &self,
        txn: &SignedTransaction,
    ) -> LedgerResult<PendingTransaction> {
        let body = txn.to_bytes()?;
        let url = self.url(&["transactions"])?;

        // No failover here: a resend after a lost response is the caller's decision
        let response = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, BCS_SIGNED_TRANSACTION)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(classify_submit_error(status, &text, txn));
        }

        let local_hash = txn.committed_hash()?;
        let hash = match serde_json::from_str::<SubmitResponse>(&text) {
            Ok(submitted) if submitted.hash == local_hash => submitted.hash,
            Ok(submitted) => {
                warn!(
                    "Ledger reported hash {} but transaction hashes to {}; using local hash",
                    submitted.hash, local_hash
                );
                local_hash
            }
            Err(e) => {
                warn!("Could not read submission hash ({}); using local hash", e);
                local_hash
            }
        };

        Ok(PendingTransaction {
            hash,
            sender: txn.sender(),
            sequence_number: txn.sequence_number(),
            expiration_timestamp_secs: txn.expiration_timestamp_secs(),
        })
    }

    async fn get_transaction_by_hash(
        &self,
        hash: HashValue,
    ) -> LedgerResult<Option<TransactionStatus>> {
        let hex = hash.to_hex_literal();
        let response: Option<TransactionResponse> =
            self.get_json(&["transactions", "by_hash", &hex]).await?;

        let status = match response {
            None => None,
            Some(TransactionResponse::PendingTransaction) => Some(TransactionStatus::Pending),
            Some(TransactionResponse::UserTransaction {
                hash,
                version,
                success,
                vm_status,
                gas_used,
            }) => Some(TransactionStatus::Committed(TransactionInfo {
                hash,
                version: version.get()?,
                success,
                vm_status,
                gas_used: gas_used.get()?,
            })),
            Some(TransactionResponse::Other) => {
                return Err(LedgerError::Serialization(format!(
                    "hash {} does not belong to a user transaction",
                    hex
                )))
            }
        };
        Ok(status)
    }
}
