//! HTTP API for health checks, account lookups and the wallet bridge

use crate::chain::LedgerClient;
use crate::config::ApiConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::resource::ResourceReader;
use crate::types::AccountAddress;
use crate::wallet::{WalletAccount, WalletBridge};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<dyn LedgerClient>,
    pub reader: ResourceReader,
    pub wallet: Arc<dyn WalletBridge>,
}

impl AppState {
    pub fn new(ledger: Arc<dyn LedgerClient>, wallet: Arc<dyn WalletBridge>) -> Self {
        Self {
            reader: ResourceReader::new(ledger.clone()),
            ledger,
            wallet,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/accounts/:address", get(get_account))
        .route("/wallet/connect", post(wallet_connect))
        .route("/wallet/disconnect", post(wallet_disconnect))
        .route("/wallet/status", get(wallet_status))
        .route("/wallet/account", get(wallet_account))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the HTTP API server until `shutdown` resolves
pub async fn run_server(
    config: ApiConfig,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> LedgerResult<()> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| LedgerError::Config(format!("Failed to bind API address {}: {}", addr, e)))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| LedgerError::Transport(format!("API server failed: {}", e)))?;

    Ok(())
}

/// Error body returned by every failing handler
struct ApiError(LedgerError);

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            LedgerError::NotFound { .. } => StatusCode::NOT_FOUND,
            LedgerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            LedgerError::WalletNotConnected => StatusCode::CONFLICT,
            LedgerError::Transport(_) | LedgerError::Timeout { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!("API request failed: {}", self.0);
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.kind(),
                message: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

/// Health check endpoint - basic liveness
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check - the ledger must answer with its chain id
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let chain_id = state.ledger.check_health().await;
    crate::metrics::record_ledger_health(chain_id.is_ok());

    match chain_id {
        Ok(chain_id) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                ready: true,
                chain_id: Some(chain_id.id()),
                error: None,
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                ready: false,
                chain_id: None,
                error: Some(e.to_string()),
            }),
        ),
    }
}

/// Sequence number and balance for an address
async fn get_account(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<AccountResponse>, ApiError> {
    let address: AccountAddress = address.parse()?;
    let (account, balance) = tokio::try_join!(
        state.ledger.get_account(address),
        state.reader.coin_balance(address)
    )?;

    Ok(Json(AccountResponse {
        address,
        sequence_number: account.sequence_number,
        balance,
    }))
}

async fn wallet_connect(State(state): State<AppState>) -> Result<Json<WalletAccount>, ApiError> {
    Ok(Json(state.wallet.connect().await?))
}

async fn wallet_disconnect(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.wallet.disconnect().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn wallet_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(WalletStatusResponse {
        connected: state.wallet.is_connected().await,
    })
}

async fn wallet_account(State(state): State<AppState>) -> Result<Json<WalletAccount>, ApiError> {
    Ok(Json(state.wallet.account().await?))
}

// Response types

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    chain_id: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct AccountResponse {
    address: AccountAddress,
    sequence_number: u64,
    /// Absent coin store serializes as null
    balance: Option<u64>,
}

#[derive(Serialize)]
struct WalletStatusResponse {
    connected: bool,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}
