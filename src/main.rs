//! sensor-explorer: machine sensor dashboard backend
//!
//! # Usage
//!
//! ```bash
//! # Serve the dashboard API over the default dataset (maquinas_limpo.csv)
//! sensor-explorer serve
//!
//! # Serve a synthetic dataset
//! sensor-explorer serve --demo
//!
//! # Print the filtered view as JSON
//! sensor-explorer summary --csv data.csv --machines M1,M2
//!
//! # Write the filtered table
//! sensor-explorer export --out dados.csv --columns timestamp,machine,temperature
//! ```
//!
//! # Environment Variables
//!
//! - `SENSOR_EXPLORER_CONFIG`: path to the TOML config file
//! - `SENSOR_EXPLORER_ADDR`: HTTP bind address
//! - `SENSOR_EXPLORER_CORS_ORIGINS`: comma-separated allowed origins
//! - `RUST_LOG`: logging level (default: info)

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sensor_explorer::api::{create_app, DashboardState};
use sensor_explorer::config::{self, DashboardConfig};
use sensor_explorer::export::{write_csv, ColumnSelection};
use sensor_explorer::pipeline::{recompute, Dataset, LoadOptions, ViewMetrics};
use sensor_explorer::types::{FilterCriteria, TableShape};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "sensor-explorer")]
#[command(about = "Filter and aggregate machine sensor data for the dashboard")]
#[command(version)]
struct CliArgs {
    /// Path to a TOML config file (overrides SENSOR_EXPLORER_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the dashboard HTTP API (default)
    Serve {
        #[command(flatten)]
        source: SourceArgs,

        /// Override the server address (default: "0.0.0.0:8080")
        #[arg(short, long, env = "SENSOR_EXPLORER_ADDR")]
        addr: Option<String>,
    },

    /// Print the filtered view (metrics, no rows) as JSON
    Summary {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        filter: FilterArgs,

        /// Length of the anomaly ranking
        #[arg(long)]
        top_n: Option<usize>,
    },

    /// Write the filtered table as CSV
    Export {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        filter: FilterArgs,

        /// Output file
        #[arg(long)]
        out: PathBuf,

        /// Comma-separated columns to keep (default: all)
        #[arg(long)]
        columns: Option<String>,
    },
}

#[derive(Args, Debug, Default, Clone)]
struct SourceArgs {
    /// CSV dataset to load (default: [dataset].path from config)
    #[arg(long, conflicts_with = "demo")]
    csv: Option<PathBuf>,

    /// Use a generated dataset instead of a CSV file
    #[arg(long)]
    demo: bool,

    /// Skip malformed rows instead of refusing the file
    #[arg(long)]
    skip_invalid_rows: bool,
}

/// Sidebar filters. Omitted lists select everything.
#[derive(Args, Debug, Default, Clone)]
struct FilterArgs {
    /// Period start (inclusive)
    #[arg(long)]
    start: Option<String>,

    /// Period end (inclusive; a bare date covers the whole day)
    #[arg(long)]
    end: Option<String>,

    /// Comma-separated machines
    #[arg(long)]
    machines: Option<String>,

    /// Comma-separated machine statuses
    #[arg(long)]
    statuses: Option<String>,

    /// Comma-separated failure types
    #[arg(long)]
    failure_types: Option<String>,
}

impl FilterArgs {
    fn criteria(&self) -> Result<FilterCriteria> {
        FilterCriteria::from_parts(
            self.start.as_deref(),
            self.end.as_deref(),
            self.machines.as_deref(),
            self.statuses.as_deref(),
            self.failure_types.as_deref(),
        )
        .map_err(|e| anyhow::anyhow!("Invalid filter: {e}"))
    }
}

// ============================================================================
// Setup
// ============================================================================

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&Path>) -> Result<DashboardConfig> {
    match path {
        Some(p) => DashboardConfig::load_from_file(p)
            .with_context(|| format!("Failed to load config {}", p.display())),
        None => Ok(DashboardConfig::load()),
    }
}

/// Fold the source flags into the config so the API's reload uses them too.
fn apply_source_args(config: &mut DashboardConfig, source: &SourceArgs) {
    if let Some(csv) = &source.csv {
        config.dataset.path.clone_from(csv);
    }
    config.dataset.skip_invalid_rows |= source.skip_invalid_rows;
}

fn load_dataset(config: &DashboardConfig, demo: bool) -> Result<Dataset> {
    if demo {
        let dataset = Dataset::synthetic(config.demo.spec());
        info!(records = dataset.len(), seed = config.demo.seed, "Generated demo dataset");
        return Ok(dataset);
    }
    let path = &config.dataset.path;
    let options = LoadOptions {
        skip_invalid_rows: config.dataset.skip_invalid_rows,
    };
    Dataset::load(path, options)
        .with_context(|| format!("Failed to load dataset from {}", path.display()))
}

// ============================================================================
// Commands
// ============================================================================

async fn run_serve(config: &DashboardConfig, demo: bool) -> Result<()> {
    let dataset = load_dataset(config, demo)?;
    let addr: SocketAddr = config
        .server
        .addr
        .parse()
        .with_context(|| format!("Invalid server address '{}'", config.server.addr))?;

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Machine Sensor Explorer v{}", env!("CARGO_PKG_VERSION"));
    info!("  Source: {} | {}", dataset.source(), dataset.shape());
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let state = DashboardState::new(dataset, config);
    let app = create_app(state, Duration::from_secs(config.server.request_timeout_secs));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!("HTTP server listening on http://{addr}");

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, initiating shutdown...");
                shutdown_token.cancel();
            }
            Err(e) => error!(error = %e, "Failed to listen for Ctrl+C"),
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
        })
        .await
        .context("HTTP server error")?;

    info!("Graceful shutdown complete");
    Ok(())
}

#[derive(Serialize)]
struct SummaryOutput<'a> {
    source: String,
    dataset_version: u64,
    shape: TableShape,
    caption: String,
    criteria: &'a FilterCriteria,
    metrics: &'a ViewMetrics,
}

fn run_summary(config: &DashboardConfig, demo: bool, filter: &FilterArgs, top_n: Option<usize>) -> Result<()> {
    let criteria = filter.criteria()?;
    let dataset = Arc::new(load_dataset(config, demo)?);
    let view = recompute(&dataset, &criteria, top_n.unwrap_or(config.view.top_n));

    let output = SummaryOutput {
        source: dataset.source().to_string(),
        dataset_version: dataset.version(),
        shape: view.shape(),
        caption: view.shape().to_string(),
        criteria: view.criteria(),
        metrics: view.metrics(),
    };
    let json = serde_json::to_string_pretty(&output).context("Failed to serialize summary")?;
    println!("{json}");
    Ok(())
}

fn run_export(
    config: &DashboardConfig,
    demo: bool,
    filter: &FilterArgs,
    out: &Path,
    columns: Option<&str>,
) -> Result<()> {
    let criteria = filter.criteria()?;
    let dataset = Arc::new(load_dataset(config, demo)?);
    let selection = match columns {
        Some(list) => ColumnSelection::parse(list)?,
        None => ColumnSelection::all(dataset.columns()),
    };
    let view = recompute(&dataset, &criteria, config.view.top_n);

    let file = File::create(out).with_context(|| format!("Failed to create {}", out.display()))?;
    let mut writer = BufWriter::new(file);
    let rows = write_csv(&mut writer, view.rows(), &selection)?;
    writer.flush().with_context(|| format!("Failed to write {}", out.display()))?;

    info!(
        path = %out.display(),
        rows,
        columns = selection.len(),
        "Exported filtered table"
    );
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.log_json);

    let mut dashboard_config = load_config(args.config.as_deref())?;
    let command = args.command.unwrap_or(Command::Serve {
        source: SourceArgs::default(),
        addr: std::env::var("SENSOR_EXPLORER_ADDR").ok(),
    });

    match command {
        Command::Serve { source, addr } => {
            apply_source_args(&mut dashboard_config, &source);
            if let Some(addr) = addr {
                dashboard_config.server.addr = addr;
            }
            config::init(dashboard_config);
            run_serve(config::get(), source.demo).await
        }
        Command::Summary { source, filter, top_n } => {
            apply_source_args(&mut dashboard_config, &source);
            config::init(dashboard_config);
            run_summary(config::get(), source.demo, &filter, top_n)
        }
        Command::Export {
            source,
            filter,
            out,
            columns,
        } => {
            apply_source_args(&mut dashboard_config, &source);
            config::init(dashboard_config);
            run_export(config::get(), source.demo, &filter, &out, columns.as_deref())
        }
    }
}
