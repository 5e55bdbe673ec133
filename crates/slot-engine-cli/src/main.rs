//! `slots` CLI — compute bookable slots and entry ceilings from a record file.
//!
//! ## Usage
//!
//! ```sh
//! # Bookable slots for a provider on a date (one "HH:mm" per line)
//! slots slots -i records.json --date 2026-03-16
//!
//! # Same, as a JSON report including per-source failures
//! slots slots -i records.json --date 2026-03-16 --json
//!
//! # Longest entry (in hours) a provider may create from 11:00
//! slots max-duration -i records.json --date 2026-03-16 --start 11:00
//!
//! # Validate a requested entry of 3 hours repeating for 4 weeks
//! slots check-entry -i records.json --date 2026-03-16 --start 11:00 --hours 3 --weeks 4
//!
//! # Use a configuration file and override the provider timezone
//! slots slots -i records.json --date 2026-03-16 --config engine.json --tz Europe/Berlin
//! ```

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use slot_engine::{
    validate_entry, EngineConfig, MemoryStore, ProviderId, ProviderRecords, SlotEngine, Source,
    SourceFailure, TimeOfDay,
};
use std::io::{self, Read};

#[derive(Parser)]
#[command(
    name = "slots",
    version,
    about = "Bookable slot computation for service providers"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine configuration file (JSON); defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<String>,

    /// Provider timezone (IANA name), overriding the configuration
    #[arg(long, global = true)]
    tz: Option<String>,

    /// Log engine diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Args)]
struct Query {
    /// Record file (reads from stdin if omitted)
    #[arg(short, long)]
    input: Option<String>,
    /// Calendar date to query (YYYY-MM-DD)
    #[arg(long)]
    date: NaiveDate,
    /// Provider to query (defaults to the record file's provider)
    #[arg(long)]
    provider: Option<String>,
    /// Simulate a failing record source (repeatable)
    #[arg(long, value_enum)]
    fail: Vec<SourceArg>,
}

#[derive(Subcommand)]
enum Commands {
    /// List bookable slot start times
    Slots {
        #[command(flatten)]
        query: Query,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the longest entry that fits from a start time
    MaxDuration {
        #[command(flatten)]
        query: Query,
        /// Candidate start time (HH:mm)
        #[arg(long)]
        start: String,
    },
    /// Validate a requested entry against the computed ceiling
    CheckEntry {
        #[command(flatten)]
        query: Query,
        /// Candidate start time (HH:mm)
        #[arg(long)]
        start: String,
        /// Requested length in hours
        #[arg(long)]
        hours: u32,
        /// Number of weeks for a recurring entry
        #[arg(long)]
        weeks: Option<u32>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    Rules,
    Available,
    Blocked,
    Bookings,
}

impl From<SourceArg> for Source {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Rules => Source::RecurringRules,
            SourceArg::Available => Source::OneOffAvailable,
            SourceArg::Blocked => Source::OneOffBlocked,
            SourceArg::Bookings => Source::Bookings,
        }
    }
}

/// On-disk shape of a record file: one provider and its records.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordFile {
    provider_id: ProviderId,
    #[serde(flatten)]
    records: ProviderRecords,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .init();

    let config = load_config(cli.config.as_deref(), cli.tz.as_deref())?;

    match cli.command {
        Commands::Slots { query, json } => {
            let (engine, provider) = build_engine(&query, config)?;
            let report = engine.compute_slots(&provider, query.date).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                report_failures(&report.failures);
                for label in &report.labels {
                    println!("{}", label);
                }
            }
        }
        Commands::MaxDuration { query, start } => {
            let start = parse_start(&start)?;
            let (engine, provider) = build_engine(&query, config)?;
            let report = engine
                .compute_max_duration(&provider, query.date, start)
                .await;
            report_failures(&report.failures);
            println!("{}", report.hours);
        }
        Commands::CheckEntry {
            query,
            start,
            hours,
            weeks,
        } => {
            let start = parse_start(&start)?;
            let (engine, provider) = build_engine(&query, config)?;
            let report = engine
                .compute_max_duration(&provider, query.date, start)
                .await;
            report_failures(&report.failures);
            validate_entry(hours, report.hours, weeks)
                .with_context(|| format!("Entry rejected (ceiling {}h)", report.hours))?;
            println!("ok: {}h from {} (ceiling {}h)", hours, start, report.hours);
        }
    }

    Ok(())
}

fn load_config(path: Option<&str>, tz: Option<&str>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path))?;
            EngineConfig::from_json(&json).context("Invalid engine configuration")?
        }
        None => EngineConfig::default(),
    };
    if let Some(tz) = tz {
        config = config.with_timezone(tz);
    }
    Ok(config)
}

fn build_engine(
    query: &Query,
    config: EngineConfig,
) -> Result<(SlotEngine<MemoryStore>, ProviderId)> {
    let json = read_input(query.input.as_deref())?;
    let file: RecordFile = serde_json::from_str(&json).context("Failed to parse record file")?;

    let provider = query
        .provider
        .clone()
        .map(ProviderId::new)
        .unwrap_or_else(|| file.provider_id.clone());

    let store = MemoryStore::new(file.provider_id, file.records);
    for source in &query.fail {
        store.fail(Source::from(*source));
    }

    let engine = SlotEngine::new(store, config).context("Invalid engine configuration")?;
    Ok((engine, provider))
}

fn parse_start(raw: &str) -> Result<TimeOfDay> {
    TimeOfDay::parse(raw).with_context(|| format!("Invalid --start value: '{}'", raw))
}

fn report_failures(failures: &[SourceFailure]) {
    for failure in failures {
        eprintln!("warning: {}", failure);
    }
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}
