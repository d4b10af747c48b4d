mod cleaner;
mod config;
mod explorer;
mod models;
mod storage;
mod types;

use std::io::{stderr, stdout, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use crate::cleaner::{CleaningEngine, ParsePolicy};
use crate::config::{Config, MAX_HISTOGRAM_BINS};
use crate::explorer::{AmountRange, CategorySelection, FilterSelection, SelectionError, Session, TimeWindow};
use crate::models::TableFormat;
use crate::storage::{write_records, CsvStorage};

#[derive(Parser)]
#[command(name = "fraud-explorer")]
#[command(about = "Clean credit-card transaction exports and summarize fraud patterns")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (defaults to fraud-explorer.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// One of: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "error")]
    log_level: String,
    #[command(subcommand)]
    command: Commands
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a raw export into the cleaned dataset and print the report
    Clean {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum)]
        on_parse_error: Option<ParsePolicy>
    },
    /// Print the bounds and default selection of the cleaned dataset
    Inspect {
        #[arg(long)]
        data: Option<PathBuf>
    },
    /// Print every aggregate for a selection as JSON
    Summarize {
        #[arg(long)]
        data: Option<PathBuf>,
        #[command(flatten)]
        selection: SelectionArgs,
        /// Number of amount histogram bins
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..=MAX_HISTOGRAM_BINS as u64))]
        bins: Option<u64>
    },
    /// Write the transactions matching a selection to stdout as CSV
    Filter {
        #[arg(long)]
        data: Option<PathBuf>,
        #[command(flatten)]
        selection: SelectionArgs
    }
}

#[derive(Args)]
struct SelectionArgs {
    /// Start of the time-of-day window, inclusive (HH:MM[:SS])
    #[arg(long, default_value = "00:00")]
    from: String,
    /// End of the time-of-day window, exclusive (HH:MM[:SS], 24:00 for end of day)
    #[arg(long, default_value = "24:00")]
    to: String,
    #[arg(long, allow_hyphen_values = true)]
    min_amount: Option<Decimal>,
    #[arg(long, allow_hyphen_values = true)]
    max_amount: Option<Decimal>,
    /// Merchant category to keep; repeat for several, omit for all
    #[arg(long = "category")]
    categories: Vec<String>
}

impl SelectionArgs {
    fn to_selection(&self) -> Result<FilterSelection, SelectionError> {
        Ok(FilterSelection {
            time_window: TimeWindow::parse(&self.from, &self.to)?,
            amount_range: AmountRange {
                min: self.min_amount,
                max: self.max_amount
            },
            categories: CategorySelection::from_categories(&self.categories)
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(parse_log_level(&cli.log_level));

    let config = Config::load(cli.config.as_deref())?;
    let format = config.table_format()?;

    match cli.command {
        Commands::Clean { input, output, on_parse_error } => {
            let input = input.unwrap_or_else(|| config.raw_path.clone());
            let output = output.unwrap_or_else(|| config.cleaned_path.clone());
            let policy = on_parse_error.unwrap_or(config.on_parse_error);

            let engine = CleaningEngine::new(CsvStorage::new(&output, format.clone()), format, policy);

            let timer = Instant::now();
            let report = engine.run(&input).await
                .with_context(|| format!("Cleaning {} failed", input.display()))?;
            let duration = timer.elapsed();

            info!("Cleaned transactions in: {duration:?}");

            write_json(&report)?;
        }
        Commands::Inspect { data } => {
            let session = open_session(data, &config, format, config.histogram_bins)?;

            write_json(&json!({
                "rows": session.table().len(),
                "bounds": session.bounds(),
                "default_selection": session.default_selection()
            }))?;
        }
        Commands::Summarize { data, selection, bins } => {
            let bins = bins.map_or(config.histogram_bins, |bins| bins as usize);
            let session = open_session(data, &config, format, bins)?;

            let selection = selection.to_selection().context("Invalid selection")?;

            write_json(&session.summarize(&selection))?;
        }
        Commands::Filter { data, selection } => {
            let delimiter = format.delimiter;
            let session = open_session(data, &config, format, config.histogram_bins)?;
            let table = session.table();
            let selection = selection.to_selection().context("Invalid selection")?;
            let output = BufWriter::new(stdout().lock());

            match session.filter(&selection) {
                Ok(view) => write_records(output, table.schema(), view.records().iter().copied(), delimiter)?,
                Err(error) => {
                    warn!("Rejected filter selection: {error}");
                    eprintln!("{error}");
                    write_records(output, table.schema(), std::iter::empty(), delimiter)?;
                }
            }
        }
    }

    Ok(())
}

fn open_session(data: Option<PathBuf>, config: &Config, format: TableFormat, histogram_bins: usize) -> Result<Session> {
    let path = data.unwrap_or_else(|| config.cleaned_path.clone());
    let storage = CsvStorage::new(&path, format);

    Session::open(&storage, histogram_bins)
        .with_context(|| format!("Could not load cleaned dataset {}", storage.path().display()))
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'error'", level);
            LevelFilter::ERROR
        }
    }
}

fn setup_logging(level: LevelFilter) {
    //NOTE: stdout carries command output, so logging goes to stderr
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}

fn write_json<T: Serialize>(value: &T) -> Result<()> {
    let mut output = BufWriter::new(stdout().lock());

    serde_json::to_writer_pretty(&mut output, value)?;
    writeln!(output)?;
    output.flush()?;

    Ok(())
}
