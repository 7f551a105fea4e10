//! QuoteWatch CLI — update, backfill, and store status commands.
//!
//! Commands:
//! - `update` — fetch today's quote per instrument, merge into history,
//!   recompute indicators, refresh chart data
//! - `backfill` — seed or extend stored history from the source's daily table
//! - `status` — report stored instruments, date ranges and record counts

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use quotewatch_core::config::WatchConfig;
use quotewatch_core::data::{CsvStore, HttpQuoteProvider};
use quotewatch_core::pipeline::{self, RunSummary, StdoutProgress};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod sink;
use sink::ChartCsvSink;

#[derive(Parser)]
#[command(
    name = "quotewatch",
    about = "QuoteWatch CLI — rolling daily price histories with indicators"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch today's quote for each instrument, merge, and refresh charts.
    Update {
        /// Instruments to update (overrides the config list).
        instruments: Vec<String>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// History directory. Defaults to ./data (or the config value).
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Chart output directory. Defaults to ./charts (or the config value).
        #[arg(long)]
        chart_dir: Option<PathBuf>,

        /// Quote source base URL override.
        #[arg(long)]
        source_url: Option<String>,
    },
    /// Seed or extend stored history from the source's daily table.
    Backfill {
        /// Instruments to backfill (overrides the config list).
        instruments: Vec<String>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// History directory. Defaults to ./data (or the config value).
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Quote source base URL override.
        #[arg(long)]
        source_url: Option<String>,
    },
    /// Report stored instruments, date ranges and record counts.
    Status {
        /// Instruments to inspect (overrides the config list).
        instruments: Vec<String>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// History directory. Defaults to ./data (or the config value).
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Update {
            instruments,
            config,
            data_dir,
            chart_dir,
            source_url,
        } => {
            let config = resolve_config(config, instruments, data_dir, chart_dir)?;
            run_update(&config, source_url)
        }
        Commands::Backfill {
            instruments,
            config,
            data_dir,
            source_url,
        } => {
            let config = resolve_config(config, instruments, data_dir, None)?;
            run_backfill(&config, source_url)
        }
        Commands::Status {
            instruments,
            config,
            data_dir,
        } => {
            let config = resolve_config(config, instruments, data_dir, None)?;
            run_status(&config)
        }
    }
}

/// Merge CLI arguments over the config file (or the defaults).
fn resolve_config(
    path: Option<PathBuf>,
    instruments: Vec<String>,
    data_dir: Option<PathBuf>,
    chart_dir: Option<PathBuf>,
) -> Result<WatchConfig> {
    let mut config = match path {
        Some(p) => WatchConfig::from_file(&p)?,
        None => WatchConfig::default(),
    };
    if !instruments.is_empty() {
        config.instruments = instruments;
    }
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = chart_dir {
        config.chart_dir = dir;
    }
    if config.instruments.is_empty() {
        bail!("no instruments: pass names on the command line or list them in a config file");
    }
    Ok(config)
}

fn make_provider(source_url: Option<String>) -> HttpQuoteProvider {
    match source_url {
        Some(url) => HttpQuoteProvider::with_base_url(url),
        None => HttpQuoteProvider::new(),
    }
}

fn run_update(config: &WatchConfig, source_url: Option<String>) -> Result<()> {
    let provider = make_provider(source_url);
    let store = CsvStore::new(&config.data_dir);
    let sink = ChartCsvSink::new(&config.chart_dir);
    let names: Vec<&str> = config.instruments.iter().map(|s| s.as_str()).collect();

    let summary = pipeline::run(
        &names,
        &provider,
        &store,
        &sink,
        &config.indicators,
        &StdoutProgress,
    );

    println!("Charts written to: {}", config.chart_dir.display());
    finish(summary)
}

fn run_backfill(config: &WatchConfig, source_url: Option<String>) -> Result<()> {
    let provider = make_provider(source_url);
    let store = CsvStore::new(&config.data_dir);
    let names: Vec<&str> = config.instruments.iter().map(|s| s.as_str()).collect();

    let summary = pipeline::backfill(&names, &provider, &store, &StdoutProgress);

    for outcome in &summary.outcomes {
        if let Ok(report) = &outcome.result {
            if report.rejected > 0 {
                println!(
                    "WARNING: {}: {} history row(s) rejected",
                    outcome.instrument, report.rejected
                );
            }
        }
    }
    finish(summary)
}

fn run_status(config: &WatchConfig) -> Result<()> {
    let store = CsvStore::new(&config.data_dir);
    let names: Vec<&str> = config.instruments.iter().map(|s| s.as_str()).collect();
    let statuses = store.status(&names);

    println!("Store: {}", config.data_dir.display());
    println!();
    println!(
        "{:<24} {:<25} {:>8}",
        "Instrument", "Date Range", "Records"
    );
    println!("{}", "-".repeat(59));
    for status in &statuses {
        let range = match (status.start_date, status.end_date) {
            (Some(start), Some(end)) => format!("{start} to {end}"),
            _ => "(not stored)".to_string(),
        };
        let count = status
            .record_count
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<24} {:<25} {:>8}", status.instrument, range, count);
    }

    Ok(())
}

fn finish(summary: RunSummary) -> Result<()> {
    if !summary.all_succeeded() {
        for error in summary.errors() {
            eprintln!("Error: {error}");
        }
        std::process::exit(1);
    }
    Ok(())
}
