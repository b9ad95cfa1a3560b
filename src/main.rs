//! Latency Arbitrage Monitor
//!
//! Read-only HTTP API over the measurement process's JSONL output.
//!
//! Usage:
//!   latarb-monitor --output-dir /opt/latency-validator/output --bind 0.0.0.0:8088
//!
//! Environment:
//!   OUTPUT_DIR - Directory holding metrics.jsonl, signals.jsonl, paper_trades.jsonl
//!   BIND_ADDR - Listen address (default: 0.0.0.0:8088)
//!   STATIC_DIR - Dashboard assets served for non-API paths (default: static)
//!   HISTORY_LIMIT - Default record count for history endpoints (default: 100)

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use latarb_monitor::{
    api::{create_router, AppState},
    models::{
        Config, DEFAULT_BIND_ADDR, DEFAULT_HISTORY_LIMIT, DEFAULT_OUTPUT_DIR, DEFAULT_STATIC_DIR,
    },
    RecordStore,
};

#[derive(Parser, Debug)]
#[command(name = "latarb-monitor")]
#[command(about = "Latency arbitrage monitor - serve measurement logs over HTTP")]
struct Args {
    /// Directory containing the JSONL record logs
    #[arg(long, env = "OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Listen address
    #[arg(long, env = "BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
    bind: String,

    /// Directory of static dashboard assets
    #[arg(long, env = "STATIC_DIR", default_value = DEFAULT_STATIC_DIR)]
    static_dir: PathBuf,

    /// Records returned by history endpoints when no limit is given
    #[arg(long, env = "HISTORY_LIMIT", default_value_t = DEFAULT_HISTORY_LIMIT)]
    history_limit: usize,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            output_dir: args.output_dir,
            bind_addr: args.bind,
            static_dir: args.static_dir,
            history_limit: args.history_limit,
        }
    }
}

/// Only this crate logs; request lines come from `middleware::request_logging`.
const DEFAULT_LOG_FILTER: &str = "latarb_monitor=debug";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    let config: Config = Args::parse().into();

    info!("Latency arbitrage monitor starting");
    info!("  Output dir: {}", config.output_dir.display());
    info!("  Static dir: {}", config.static_dir.display());

    if !config.output_dir.is_dir() {
        warn!(
            output_dir = %config.output_dir.display(),
            "Output directory does not exist yet; endpoints will report no data"
        );
    }

    let state = AppState::new(RecordStore::new(&config.output_dir))
        .with_history_limit(config.history_limit)
        .with_static_dir(&config.static_dir);
    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("API server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
