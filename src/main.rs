mod cli;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use eth_block_window::{
    api::{self, AppState},
    client::ChainClient,
    config::Config,
    coordinator::{forward_feed, load_chain_label, StreamCoordinator},
    eth::EthClient,
    models::Snapshot,
    numeric::BigNum,
    observer::LoggingObserver,
    stats::Statistics,
    window::WindowBuilder,
};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    match cli.command {
        Commands::Watch => run_dashboard(&config, None).await?,
        Commands::Serve { addr } => {
            let bind = addr.unwrap_or_else(|| config.http_bind_addr.clone());
            run_dashboard(&config, Some(bind)).await?;
        }
        Commands::Window { latest } => print_window(&config, latest).await?,
    }

    Ok(())
}

async fn run_dashboard(config: &Config, http_bind: Option<String>) -> anyhow::Result<()> {
    let client = Arc::new(EthClient::connect(&config.eth_ws_url).await?);
    let (stream, handle) = StreamCoordinator::new(Arc::clone(&client), config.coordinator());
    let stream = stream.with_observer(Arc::new(LoggingObserver));

    if let Some(bind) = http_bind {
        let state = AppState {
            handle: handle.clone(),
            ether_price: config.ether_price,
        };
        tokio::spawn(async move {
            if let Err(err) = api::run_http_server(&bind, state).await {
                tracing::error!("HTTP server stopped: {:#}", err);
            }
        });
    }

    {
        let client = Arc::clone(&client);
        let handle = handle.clone();
        tokio::spawn(async move {
            load_chain_label(client.as_ref(), &handle).await;
        });
    }

    let feed = client.subscribe_block_numbers().await?;
    tracing::info!(url = %config.eth_ws_url, "following chain head");

    tokio::select! {
        _ = stream.run() => {}
        _ = forward_feed(feed, &handle) => anyhow::bail!("block number feed closed"),
        res = tokio::signal::ctrl_c() => {
            res.context("failed to listen for ctrl-c")?;
            tracing::info!("shutting down");
        }
    }

    Ok(())
}

async fn print_window(config: &Config, latest: Option<u64>) -> anyhow::Result<()> {
    let client = Arc::new(EthClient::connect(&config.eth_ws_url).await?);
    let latest = match latest {
        Some(number) => BigNum::from(number),
        None => client.latest_block_number().await?,
    };

    let builder = WindowBuilder::new(Arc::clone(&client), config.window_size);
    let window = builder
        .build_window(&latest)
        .await
        .context("failed to build block window")?;
    let statistics = Statistics::aggregate(window.confirmed());
    let chain_label = match client.chain_label().await {
        Ok(label) => label,
        Err(err) => {
            tracing::warn!("failed to resolve chain label: {}", err);
            config.default_chain_label.clone()
        }
    };

    let snapshot = Snapshot {
        chain_label,
        latest_block_number: latest,
        window,
        statistics,
    };
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
}
