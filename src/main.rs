use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crypto_dashboard::{
    render::{format_change, format_usd},
    server::{self, AppState},
    CoinGeckoProvider, CsvExporter, DashboardConfig, DashboardStore, MarketPoller,
    RefreshInterval, SnapshotExporter,
};

/// Live cryptocurrency dashboard
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Seconds between refreshes (30-600, step 30)
    #[arg(long, global = true)]
    refresh_secs: Option<u64>,

    /// Spreadsheet (CSV) written on every refresh
    #[arg(long, global = true)]
    export_path: Option<PathBuf>,

    /// Do not write the spreadsheet export
    #[arg(long, global = true)]
    no_export: bool,

    /// CoinGecko API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the poller and serve the dashboard (default)
    Serve {
        /// Address to bind
        #[arg(long)]
        bind: Option<String>,

        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run a single refresh, print the summary and exit
    Fetch,
}

impl Cli {
    fn apply(&self, cfg: &mut DashboardConfig) -> Result<()> {
        if let Some(secs) = self.refresh_secs {
            cfg.refresh_interval = RefreshInterval::from_secs(secs)?;
        }
        if let Some(path) = &self.export_path {
            cfg.export_path = path.clone();
        }
        if self.no_export {
            cfg.export_enabled = false;
        }
        if let Some(url) = &self.api_url {
            cfg.api_url = url.clone();
        }
        if let Some(Command::Serve { bind, port }) = &self.command {
            if let Some(bind) = bind {
                cfg.bind = bind.clone();
            }
            if let Some(port) = port {
                cfg.port = *port;
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut cfg = DashboardConfig::from_env().context("invalid environment configuration")?;
    cli.apply(&mut cfg)?;

    let provider = Arc::new(
        CoinGeckoProvider::with_options(&cfg.api_url, cfg.request_timeout)
            .context("failed to build HTTP client")?,
    );
    let exporter: Option<Arc<dyn SnapshotExporter>> = cfg
        .export_enabled
        .then(|| Arc::new(CsvExporter::new(&cfg.export_path)) as Arc<dyn SnapshotExporter>);

    let store = Arc::new(DashboardStore::new());
    let poller = Arc::new(MarketPoller::new(
        provider,
        store,
        exporter,
        cfg.refresh_interval,
    ));

    match cli.command {
        Some(Command::Fetch) => fetch_once(&poller).await,
        Some(Command::Serve { .. }) | None => {
            let addr = cfg.socket_addr()?;
            tracing::info!(
                version = env!("CARGO_PKG_VERSION"),
                refresh_interval = %cfg.refresh_interval,
                export = cfg.export_enabled,
                "Starting crypto dashboard"
            );

            let poll_task = poller.spawn();
            server::serve(addr, AppState::new(poller))
                .await
                .context("dashboard server failed")?;
            poll_task.abort();
            Ok(())
        }
    }
}

async fn fetch_once(poller: &MarketPoller) -> Result<()> {
    let view = poller.run_cycle().await.context("failed to fetch market data")?;
    let summary = &view.summary;

    println!("Fetched {} coins from {}", view.snapshot.len(), view.snapshot.source);
    println!();
    println!("Top 5 by Market Cap");
    for (i, entry) in summary.top_by_market_cap.iter().enumerate() {
        println!("  {}. {:<20} {}", i + 1, entry.name, format_usd(entry.market_cap));
    }
    println!();
    match summary.average_price {
        Some(avg) => println!("Average Price (USD): {}", format_usd(avg)),
        None => println!("Average Price (USD): n/a"),
    }
    if let Some(high) = &summary.highest_change {
        println!(
            "Highest Change (24h): {} ({})",
            format_change(high.price_change_percentage_24h),
            high.name
        );
    }
    if let Some(low) = &summary.lowest_change {
        println!(
            "Lowest Change (24h):  {} ({})",
            format_change(low.price_change_percentage_24h),
            low.name
        );
    }
    if let Some(path) = poller.export_path() {
        println!();
        println!("Data exported to {}", path.display());
    }

    Ok(())
}
