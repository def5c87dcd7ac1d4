//! Command-line bridge for GateLink doors and gates.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use gatelink_client::{HttpApiConfig, HttpRemoteApi, RemoteApi};
use gatelink_core::BridgeConfig;
use gatelink_devices::discover;

/// GateLink bridge - expose garage doors and gates as accessories.
#[derive(Parser, Debug)]
#[command(name = "gatelink")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// Path to the bridge configuration file.
    #[arg(short, long, global = true, default_value = "gatelink.json")]
    config: PathBuf,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Run the bridge until interrupted.
    Run,
    /// List the devices on the account and exit.
    Devices,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let config = BridgeConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let api: Arc<dyn RemoteApi> =
        Arc::new(HttpRemoteApi::new(HttpApiConfig::from(&config.api))?);

    match args.command {
        Command::Run => run(api, &config).await,
        Command::Devices => list_devices(api).await,
    }
}

async fn run(api: Arc<dyn RemoteApi>, config: &BridgeConfig) -> Result<()> {
    let accessories = discover(api, config).await?;
    if accessories.is_empty() {
        info!("no devices exposed, check include_gates if gates are expected");
    }
    for accessory in &accessories {
        accessory.start().await;
    }
    info!(count = accessories.len(), "bridge running, ctrl-c to stop");

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;

    info!("shutting down");
    for accessory in &accessories {
        accessory.stop().await;
    }
    Ok(())
}

async fn list_devices(api: Arc<dyn RemoteApi>) -> Result<()> {
    let devices = api
        .get_devices()
        .await
        .map_err(gatelink_core::Error::from)?;
    for device in devices {
        println!(
            "{}\t{}\t{}\t{}",
            device.id, device.nickname, device.status, device.product_code
        );
    }
    Ok(())
}
