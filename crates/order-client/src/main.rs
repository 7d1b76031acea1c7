//! Order Client
//!
//! Builds the reference buy and sell orders for the configured pair, signs
//! them through the node or a local keyring and prints the signed orders.

mod orders;

use std::path::PathBuf;
use std::sync::Arc;

use alloy_primitives::Address;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use order_core::api::ChainClient;
use order_core::config::ExchangeConfig;
use order_core::signing::{LocalKeyring, OrderSigner, RpcSigner, SigningService};
use order_core::types::current_nonce;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::orders::{reference_orders, Roles};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SignerKind {
    /// Accounts held by the node, signed with `eth_sign`.
    Rpc,
    /// Keys from ORDER_SIGNER_PRIVATE_KEYS.
    Local,
}

#[derive(Debug, Parser)]
#[command(name = "order-client", version, about = "Sign exchange orders")]
struct Cli {
    /// Configuration file; environment variables are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where signing keys live.
    #[arg(long, value_enum, default_value_t = SignerKind::Rpc)]
    signer: SignerKind,

    /// Order nonce in milliseconds (defaults to now).
    #[arg(long)]
    nonce: Option<u64>,

    /// Matcher account (defaults to the first signing account).
    #[arg(long)]
    matcher: Option<Address>,

    /// Buyer account (defaults to the second signing account).
    #[arg(long)]
    buyer: Option<Address>,

    /// Seller account (defaults to the third signing account).
    #[arg(long)]
    seller: Option<Address>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "order_client=info,order_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => ExchangeConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => ExchangeConfig::from_env()?,
    };

    info!(
        rpc = %config.rpc_endpoint,
        exchange = %config.exchange_address,
        base = %config.assets.base,
        quote = %config.assets.quote,
        "Starting Order Client"
    );

    let client = ChainClient::new(config.rpc_endpoint.clone());
    let network_id = client
        .network_id()
        .await
        .context("Failed to query network id")?;
    if let Some(expected) = config.network_id {
        anyhow::ensure!(
            expected == network_id,
            "Node reports network {} but configuration expects {}",
            network_id,
            expected
        );
    }
    info!(network_id, "Connected to node");

    let service: Arc<dyn SigningService> = match cli.signer {
        SignerKind::Rpc => Arc::new(RpcSigner::new(client)),
        SignerKind::Local => Arc::new(LocalKeyring::from_env()?),
    };

    let accounts = service.accounts().await.context("Failed to list accounts")?;
    let roles = Roles::resolve(&accounts, cli.matcher, cli.buyer, cli.seller)?;
    info!(matcher = %roles.matcher, buyer = %roles.buyer, seller = %roles.seller, "Resolved accounts");

    let nonce = cli.nonce.unwrap_or_else(current_nonce);
    let orders = reference_orders(&config, &roles, nonce)?;

    let mut signer = OrderSigner::new(service);
    if let Some(timeout) = config.sign_timeout() {
        signer = signer.with_timeout(timeout);
    }

    let mut failures = 0;
    for result in signer.sign_all(orders).await {
        match result {
            Ok(signed) => println!("{}", serde_json::to_string_pretty(&signed)?),
            Err(e) => {
                error!(error = %e, recoverable = e.is_recoverable(), "Order abandoned");
                failures += 1;
            }
        }
    }

    anyhow::ensure!(failures == 0, "{} order(s) could not be signed", failures);
    Ok(())
}
