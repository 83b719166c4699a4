//! Plate Sentinel - fleet plate-sighting intake and live watchlist alerting
//!
//! # Usage
//!
//! ```bash
//! # Against PostgreSQL
//! DATABASE_URL=postgres://localhost/sentinel ./plate-sentinel
//!
//! # Development, no database
//! ./plate-sentinel --in-memory --log-json
//! ```
//!
//! # Environment Variables
//!
//! | Variable            | Required | Description                              |
//! |---------------------|----------|------------------------------------------|
//! | `DATABASE_URL`      | Yes*     | PostgreSQL connection string             |
//! | `SENTINEL_API_KEY`  | Yes      | Shared key for ingest and dashboards     |
//! | `NEVDIS_API_URL`    | No       | Registry base URL (unset = no enrichment)|
//! | `NEVDIS_API_KEY`    | With URL | Registry bearer credential               |
//! | `SENTINEL_CONFIG`   | No       | Path to a TOML config file               |
//! | `RUST_LOG`          | No       | Log filter (default: info)               |
//!
//! *Not needed with `--in-memory`.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use plate_sentinel::api::build_router;
use plate_sentinel::bootstrap::{assemble, build_registry};
use plate_sentinel::config::ServiceConfig;
use plate_sentinel::notify::{LogSink, NotificationSink, PgJobSink};
use plate_sentinel::storage::{postgres, MemoryStore, PgStore, SightingStore, WatchlistStore};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "plate-sentinel")]
#[command(about = "Plate Sentinel fleet watchlist alerting service")]
#[command(version)]
struct CliArgs {
    /// TOML config file
    #[arg(long, env = "SENTINEL_CONFIG")]
    config: Option<PathBuf>,

    /// PostgreSQL connection URL (overrides DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    /// Port to listen on
    #[arg(long, short)]
    port: Option<u16>,

    /// Bind address (overrides --port)
    #[arg(long)]
    bind_address: Option<String>,

    /// Use the in-process store instead of PostgreSQL
    #[arg(long)]
    in_memory: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

impl CliArgs {
    fn apply(&self, config: &mut ServiceConfig) {
        if let Some(url) = &self.database_url {
            config.database.url = url.clone();
        }
        if let Some(addr) = &self.bind_address {
            config.server.bind_address = addr.clone();
        } else if let Some(p) = self.port {
            config.server.bind_address = format!("0.0.0.0:{p}");
        }
        if self.in_memory {
            config.database.in_memory = true;
        }
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,plate_sentinel=debug"));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

type Stores = (
    Arc<dyn SightingStore>,
    Arc<dyn WatchlistStore>,
    Box<dyn NotificationSink>,
);

async fn open_stores(config: &ServiceConfig) -> Result<Stores> {
    if config.database.in_memory {
        warn!("Running with the in-memory store; nothing survives a restart");
        let store = Arc::new(MemoryStore::new());
        let sightings: Arc<dyn SightingStore> = store.clone();
        let watchlist: Arc<dyn WatchlistStore> = store;
        let sink: Box<dyn NotificationSink> = Box::new(LogSink);
        return Ok((sightings, watchlist, sink));
    }

    let pool = postgres::create_pool(&config.database.url)
        .await
        .context("Failed to connect to PostgreSQL")?;
    postgres::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let store = Arc::new(PgStore::new(pool.clone()));
    let sightings: Arc<dyn SightingStore> = store.clone();
    let watchlist: Arc<dyn WatchlistStore> = store;
    let sink: Box<dyn NotificationSink> = Box::new(PgJobSink::new(pool));
    Ok((sightings, watchlist, sink))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = CliArgs::parse();
    init_tracing(args.log_json);

    let mut config = ServiceConfig::load(args.config.as_deref()).context("Failed to load config")?;
    config.apply_env();
    args.apply(&mut config);
    config.validate()?;

    info!(bind = %config.server.bind_address, "Starting Plate Sentinel");

    let (store, watchlist, sink) = open_stores(&config).await?;
    info!(backend = store.backend_name(), "Store ready");

    let registry = build_registry(&config).context("Failed to build registry client")?;
    let bind_address = config.server.bind_address.clone();

    // ── Background Tasks ──────────────────────────────────────────────────────
    let shutdown = CancellationToken::new();
    let (state, tasks) = assemble(config, store, watchlist, registry, sink).spawn(&shutdown);
    info!("Dashboard hub and notification worker started");

    // ── HTTP Server ───────────────────────────────────────────────────────────
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    info!(address = %bind_address, "Plate Sentinel listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    for task in tasks {
        if let Err(e) = task.await {
            error!(error = %e, "Background task ended abnormally");
        }
    }

    info!("Plate Sentinel shut down gracefully");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!(error = %e, "Failed to install Ctrl+C handler; stop the process externally");
            std::future::pending::<()>().await;
        }
    }
    shutdown.cancel();
}
