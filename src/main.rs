//! Ledger Submitter - command line entry point
//!
//! Runs the demonstration scenarios against a ledger node and faucet, looks
//! up accounts, or serves the HTTP API with the wallet bridge.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use ledger_submitter::account::LocalAccount;
use ledger_submitter::api::{self, AppState};
use ledger_submitter::chain::{HttpFaucetClient, LedgerClient, RestClient};
use ledger_submitter::config::{Settings, CONFIG_ENV};
use ledger_submitter::metrics::MetricsServer;
use ledger_submitter::resource::ResourceReader;
use ledger_submitter::scenarios::{self, ScenarioContext};
use ledger_submitter::types::AccountAddress;
use ledger_submitter::wallet::LocalWalletBridge;

#[derive(Parser)]
#[command(name = "ledger-submitter", version, about)]
struct Cli {
    /// Configuration file (defaults to config/default.toml)
    #[arg(long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fund Alice, then transfer 1000 coins to Bob
    Transfer,
    /// Publish the hello-blockchain module and set messages from two accounts
    HelloBlockchain {
        /// Compiled module bytecode (.mv); repeat for several modules
        #[arg(long = "module", required = true)]
        modules: Vec<PathBuf>,
        /// Hex private key for Alice; the module must be compiled for her address
        #[arg(long, env = "ALICE_PRIVATE_KEY")]
        alice_key: Option<String>,
    },
    /// Create a collection and mint a token into it
    FirstNft,
    /// Show sequence number and balance of an address
    Account { address: String },
    /// Serve the HTTP API and wallet bridge
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    info!("Starting Ledger Submitter v{}", env!("CARGO_PKG_VERSION"));

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    let ledger: Arc<dyn LedgerClient> = Arc::new(
        RestClient::from_config(&settings.node).context("Failed to create ledger client")?,
    );

    match cli.command {
        Command::Transfer => {
            let ctx = scenario_context(&settings, ledger)?;
            let report = scenarios::basic_transfer(&ctx)
                .await
                .context("Transfer scenario failed")?;
            print_report(&report, cli.json)?;
        }
        Command::HelloBlockchain { modules, alice_key } => {
            let ctx = scenario_context(&settings, ledger)?;
            let alice = match alice_key {
                Some(key) => LocalAccount::from_private_key_hex(&key)
                    .context("Invalid Alice private key")?,
                None => {
                    let alice = LocalAccount::generate();
                    wait_for_module_build(&alice).await?;
                    alice
                }
            };
            let bob = LocalAccount::generate();

            let mut bytecode = Vec::with_capacity(modules.len());
            for path in &modules {
                bytecode.push(
                    tokio::fs::read(path)
                        .await
                        .with_context(|| format!("Failed to read module {:?}", path))?,
                );
            }

            let report = scenarios::hello_blockchain(&ctx, &alice, &bob, bytecode)
                .await
                .context("Hello blockchain scenario failed")?;
            print_report(&report, cli.json)?;
        }
        Command::FirstNft => {
            let ctx = scenario_context(&settings, ledger)?;
            let report = scenarios::first_nft(&ctx)
                .await
                .context("NFT scenario failed")?;
            print_report(&report, cli.json)?;
        }
        Command::Account { address } => {
            let address: AccountAddress = address.parse()?;
            let reader = ResourceReader::new(ledger.clone());
            let (account, balance) =
                tokio::try_join!(ledger.get_account(address), reader.coin_balance(address))?;
            let summary = AccountSummary {
                address,
                sequence_number: account.sequence_number,
                balance,
            };
            print_report(&summary, cli.json)?;
        }
        Command::Serve => serve(settings, ledger).await?,
    }

    Ok(())
}

fn scenario_context(settings: &Settings, ledger: Arc<dyn LedgerClient>) -> Result<ScenarioContext> {
    let Some(faucet) = HttpFaucetClient::from_config(&settings.node)? else {
        bail!("Scenarios need funding but no faucet_url is configured");
    };
    Ok(ScenarioContext::new(
        ledger,
        Arc::new(faucet),
        settings.transaction.clone(),
    ))
}

/// The module has to be compiled for Alice's address, which only exists once
/// her key does. Print it and wait until the user has built the module.
async fn wait_for_module_build(alice: &LocalAccount) -> Result<()> {
    use tokio::io::AsyncBufReadExt;

    println!("Alice: {}", alice.address());
    println!("Alice key: 0x{}", alice.private_key_hex());
    println!(
        "Update the module with Alice's address, build, copy to the provided path, and press enter."
    );

    let mut line = String::new();
    tokio::io::BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read from stdin")?;
    Ok(())
}

async fn serve(settings: Settings, ledger: Arc<dyn LedgerClient>) -> Result<()> {
    let wallet = Arc::new(
        LocalWalletBridge::from_env_or_generate(settings.wallet.private_key_env.as_deref())
            .context("Failed to load wallet key")?,
    );

    let metrics_handle = if settings.metrics.enabled {
        let server = MetricsServer::new(settings.metrics.port);
        Some(tokio::spawn(async move {
            if let Err(e) = server.run().await {
                error!("Metrics server error: {}", e);
            }
        }))
    } else {
        None
    };

    info!("API server: http://{}:{}", settings.api.host, settings.api.port);
    if settings.metrics.enabled {
        info!("Metrics: http://0.0.0.0:{}/metrics", settings.metrics.port);
    }

    let state = AppState::new(ledger, wallet);
    let result = api::run_server(settings.api, state, shutdown_signal()).await;

    info!("Shutdown signal received, stopping...");
    if let Some(h) = metrics_handle {
        h.abort();
    }

    result.context("API server failed")?;
    info!("Ledger Submitter stopped");
    Ok(())
}

#[derive(Serialize)]
struct AccountSummary {
    address: AccountAddress,
    sequence_number: u64,
    balance: Option<u64>,
}

impl std::fmt::Display for AccountSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Address: {}", self.address)?;
        writeln!(f, "Sequence number: {}", self.sequence_number)?;
        match self.balance {
            Some(balance) => write!(f, "Balance: {}", balance),
            None => write!(f, "Balance: no coin store"),
        }
    }
}

fn print_report<T: Serialize + Display>(report: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", report);
    }
    Ok(())
}

fn init_logging(json: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,ledger_submitter=debug,hyper=warn,reqwest=warn")
    });

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(true))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
