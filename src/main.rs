use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use url::Url;

use countersync::config::Config;
use countersync::dispatch::{HttpDispatcher, RegionStore};
use countersync::driver::{run_driver, DriverContext};
use countersync::logging::init_tracing;
use countersync::prefetch::Prefetcher;
use countersync::server::SyncServer;
use countersync::sync::{CounterSync, SyncOptions};

#[derive(Parser, Debug)]
#[command(name = "countersync", version, about = "Debounced counter sync client and server")]
struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the sync endpoint
    Serve {
        /// Override server.bind_addr
        #[arg(long)]
        bind: Option<String>,
    },
    /// Read bump/reset/hover/show/quit commands from stdin
    Drive {
        /// Override sync.endpoint
        #[arg(long)]
        endpoint: Option<String>,
        /// Override sync.quiet_period_ms
        #[arg(long = "quiet-ms")]
        quiet_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("loading configuration")?;

    match cli.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind_addr = bind;
            }
            config.validate()?;
            serve(&config).await
        }
        Command::Drive { endpoint, quiet_ms } => {
            if let Some(endpoint) = endpoint {
                config.sync.endpoint = endpoint;
            }
            if let Some(quiet_ms) = quiet_ms {
                config.sync.quiet_period_ms = quiet_ms;
            }
            config.validate()?;
            drive(&config).await
        }
    }
}

async fn serve(config: &Config) -> Result<()> {
    let server = SyncServer::bind(config).await?;
    server.run().await?;
    Ok(())
}

async fn drive(config: &Config) -> Result<()> {
    let regions = RegionStore::new();
    let dispatcher = Arc::new(HttpDispatcher::new(config, regions.clone())?);

    if let Err(err) = dispatcher.prime(&config.sync.page_path).await {
        tracing::warn!(error = %err, "Could not load counter page; syncing without CSRF cookie");
    }

    let sync = CounterSync::new(dispatcher.clone(), SyncOptions::from(&config.sync))?;

    let prefetcher = if config.prefetch.enabled {
        let origin = Url::parse(&config.sync.endpoint)?;
        Prefetcher::from_config(origin, &config.prefetch, dispatcher.clone())
    } else {
        None
    };

    let ctx = DriverContext {
        sync: &sync,
        prefetcher: prefetcher.as_ref(),
        regions: &regions,
        target: &config.sync.target,
    };

    let stdin = BufReader::new(tokio::io::stdin());
    run_driver(stdin, tokio::io::stdout(), &ctx).await?;
    Ok(())
}
