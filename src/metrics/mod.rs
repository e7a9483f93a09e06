//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Transaction submission and confirmation outcomes
//! - Confirmation latency
//! - Faucet requests
//! - Ledger reachability

use crate::error::{LedgerError, LedgerResult};

use axum::{http::StatusCode, routing::get, Router};
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram_vec, CounterVec, Encoder, Gauge,
    HistogramVec, TextEncoder,
};
use std::net::SocketAddr;
use tracing::info;

lazy_static! {
    pub static ref TX_SUBMITTED: CounterVec = register_counter_vec!(
        "ledger_submitter_transactions_submitted_total",
        "Total transactions accepted by the ledger",
        &["payload"]
    ).unwrap();

    pub static ref TX_CONFIRMED: CounterVec = register_counter_vec!(
        "ledger_submitter_transactions_confirmed_total",
        "Total transactions committed successfully",
        &["payload"]
    ).unwrap();

    pub static ref TX_FAILED: CounterVec = register_counter_vec!(
        "ledger_submitter_transactions_failed_total",
        "Total failed submissions and confirmations by error kind",
        &["kind"]
    ).unwrap();

    pub static ref TX_LATENCY: HistogramVec = register_histogram_vec!(
        "ledger_submitter_confirmation_latency_seconds",
        "Time from submission to commit",
        &["payload"],
        vec![0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    ).unwrap();

    pub static ref FAUCET_REQUESTS: CounterVec = register_counter_vec!(
        "ledger_submitter_faucet_requests_total",
        "Faucet funding requests by outcome",
        &["outcome"]
    ).unwrap();

    pub static ref LEDGER_REACHABLE: Gauge = register_gauge!(
        "ledger_submitter_ledger_reachable",
        "Ledger reachability from the last readiness check (1=reachable, 0=unreachable)"
    ).unwrap();
}

/// Prometheus metrics server
pub struct MetricsServer {
    port: u16,
}

impl MetricsServer {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub async fn run(&self) -> LedgerResult<()> {
        let app = Router::new().route("/metrics", get(metrics_handler));

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Starting metrics server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| LedgerError::Config(format!("Failed to bind metrics port {}: {}", addr, e)))?;
        axum::serve(listener, app)
            .await
            .map_err(|e| LedgerError::Transport(format!("Metrics server failed: {}", e)))?;

        Ok(())
    }
}

async fn metrics_handler() -> Result<String, (StatusCode, String)> {
    render().map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e))
}

/// Text exposition of every registered metric
pub fn render() -> Result<String, String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| e.to_string())?;
    String::from_utf8(buffer).map_err(|e| e.to_string())
}

// Helper functions to record metrics

pub fn record_tx_submitted(payload: &str) {
    TX_SUBMITTED.with_label_values(&[payload]).inc();
}

pub fn record_tx_confirmed(payload: &str, latency_secs: f64) {
    TX_CONFIRMED.with_label_values(&[payload]).inc();
    TX_LATENCY.with_label_values(&[payload]).observe(latency_secs);
}

pub fn record_tx_failed(error: &LedgerError) {
    TX_FAILED.with_label_values(&[error.kind()]).inc();
}

pub fn record_faucet_request(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    FAUCET_REQUESTS.with_label_values(&[outcome]).inc();
}

pub fn record_ledger_health(reachable: bool) {
    LEDGER_REACHABLE.set(if reachable { 1.0 } else { 0.0 });
}
