//! Scottish COVID-19 statistics service entry point.

use std::fs::OpenOptions;
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

use scovid19::api::{create_router, AppState};
use scovid19::config::Config;
use scovid19::dataset::{fetch_datasets, http_client, sample_dataset, Dataset};
use scovid19::metrics;
use scovid19::stats::{LocationsView, TrendQuery};
use scovid19::utils::shutdown_signal;

/// Scottish COVID-19 statistics service.
#[derive(Parser, Debug)]
#[command(name = "scovid19")]
#[command(about = "Serve Scottish COVID-19 statistics as HTML pages and a JSON API")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// Address to bind (overrides HOST).
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,

        /// Serve the built-in sample dataset instead of DATA_DIR.
        #[arg(long)]
        sample: bool,
    },

    /// Load the datasets and print a summary.
    CheckData {
        /// Check the built-in sample dataset instead of DATA_DIR.
        #[arg(long)]
        sample: bool,
    },

    /// Download the datasets from the configured URLs.
    Fetch,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration before logging so the log file location is known
    let config = Config::load()?;
    init_tracing(&config, args.verbose)?;

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    // Handle subcommands
    match args.command {
        Some(Command::Serve { host, port, sample }) => cmd_serve(config, host, port, sample).await,
        Some(Command::CheckData { sample }) => cmd_check_data(&config, sample),
        Some(Command::Fetch) => cmd_fetch(&config).await,
        None => cmd_serve(config, None, None, false).await,
    }
}

/// Set up stdout logging plus the optional `logs/app.log` sink.
fn init_tracing(config: &Config, verbose: bool) -> anyhow::Result<()> {
    let filter = if verbose {
        EnvFilter::new("scovid19=debug,tower_http=debug,info")
    } else {
        EnvFilter::try_new(&config.rust_log).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let stdout = if config.log_json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().boxed()
    };

    let file = match config.log_file() {
        Some(path) => {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stdout)
        .with(file)
        .with(filter)
        .init();

    Ok(())
}

/// Load the configured dataset, or the sample.
fn load_dataset(config: &Config, sample: bool) -> anyhow::Result<Dataset> {
    if sample {
        info!("Using built-in sample dataset");
        return Ok(sample_dataset());
    }

    let dir = config.data_dir();
    info!("Loading datasets from {}", dir.display());

    let _timer = metrics::timer_dataset_load();
    let dataset = Dataset::load(&dir).map_err(|e| {
        error!("Failed to load datasets: {}", e);
        e
    })?;

    if dataset.infections.is_empty() {
        warn!("Infection dataset is empty; pages will show zeros");
    }

    Ok(dataset)
}

/// Run the HTTP server.
async fn cmd_serve(
    config: Config,
    host_override: Option<String>,
    port_override: Option<u16>,
    sample: bool,
) -> anyhow::Result<()> {
    let handle = metrics::install_recorder()?;

    let dataset = load_dataset(&config, sample)?;
    metrics::record_dataset_sizes(&dataset);

    let state = AppState::from_dataset(dataset).with_metrics(handle);
    info!(
        "Accessors ready: {} infection records, {} vaccination records",
        state.infections.len(),
        state.vaccines.len()
    );

    // Start HTTP server
    let host = host_override.unwrap_or(config.host);
    let port = port_override.unwrap_or(config.port);
    let listener = TcpListener::bind((host.as_str(), port)).await?;
    info!("HTTP server listening on {}", listener.local_addr()?);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

/// Load the datasets and print a summary.
fn cmd_check_data(config: &Config, sample: bool) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("SCOVID19 - DATASET CHECK");
    println!("======================================================================");

    let dataset = load_dataset(config, sample)?;
    println!("  Infection records:   {}", dataset.infections.len());
    println!("  Vaccination records: {}", dataset.vaccinations.len());
    println!("  Population records:  {}", dataset.populations.len());

    let (infections, vaccines) = dataset.into_accessors();
    let summary = infections.summary();

    println!("----------------------------------------------------------------------");
    println!("Infections:");
    match infections.last_updated("%d %B %Y")? {
        Some(date) => println!("  Last updated: {}", date),
        None => println!("  Last updated: (no data)"),
    }
    println!("  Total cases: {}", summary.total_cases);
    println!("  New cases: {}", summary.new_cases);
    println!("  Last 7 days: {}", summary.last_7_days);
    println!("  Trend points: {}", infections.trend(&TrendQuery::default())?.len());
    println!("  Categories: {}", infections.breakdown().len());
    if let LocationsView::Names(names) = infections.locations(false) {
        println!("  Locations: {}", names.len());
    }
    match infections.prevalence().first() {
        Some(top) => println!("  Highest prevalence: {} ({} per 100k)", top.location, top.per_100k),
        None => println!("  Highest prevalence: (no population data)"),
    }

    println!("----------------------------------------------------------------------");
    println!("Vaccines:");
    println!("  Weeks: {}", vaccines.vaccines_weekly().len());
    println!("  Councils: {}", vaccines.council_breakdown().len());
    for uptake in vaccines.percentage_vaccinated() {
        println!("  {} dose: {}%", uptake.dose, uptake.percentage);
    }

    println!("======================================================================");
    println!("DATASET CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Download the datasets.
async fn cmd_fetch(config: &Config) -> anyhow::Result<()> {
    if config.sources().iter().all(|(_, url)| url.is_none()) {
        return Err(anyhow::anyhow!(
            "No dataset URLs configured; set INFECTIONS_URL, VACCINATIONS_URL or POPULATIONS_URL"
        ));
    }

    let client = http_client()?;
    info!("Downloading datasets into {}", config.data_dir().display());

    let written = fetch_datasets(&client, config).await.map_err(|e| {
        error!("Download failed: {}", e);
        e
    })?;

    for path in &written {
        info!("Wrote {}", path.display());
    }
    info!("{} dataset(s) updated", written.len());

    Ok(())
}
