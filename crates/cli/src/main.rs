//! # demandcast
//!
//! Command-line interface for hierarchical demand forecasting over lead
//! exports.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use demand_facade::prelude::*;

mod error;
mod loader;

use error::{CliError, CliResult};
use loader::load_leads;

#[derive(Parser)]
#[command(name = "demandcast")]
#[command(about = "Hierarchical demand forecasting CLI", long_about = None, version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast every level of the hierarchy and emit the JSON report
    Forecast(ForecastArgs),

    /// Print the weekly series built for one dimension
    Series(SeriesArgs),
}

#[derive(Args)]
struct ForecastArgs {
    /// Lead export (CSV)
    #[arg(short, long)]
    input: PathBuf,

    /// Weeks to forecast for state, dealer and location
    #[arg(long, default_value = "12", allow_negative_numbers = true)]
    horizon: i64,

    /// Measure to forecast (enquiries, order_value, both)
    #[arg(short, long, default_value = "both")]
    metric: String,

    /// Weeks to forecast for capacity ranges (defaults to --horizon)
    #[arg(long, allow_negative_numbers = true)]
    range_horizon: Option<i64>,

    /// Weeks to forecast for sectors (defaults to --horizon)
    #[arg(long, allow_negative_numbers = true)]
    sector_horizon: Option<i64>,

    #[command(flatten)]
    window: WindowArgs,

    /// Only these states (repeatable)
    #[arg(long)]
    state: Vec<String>,

    /// Only these dealers (repeatable)
    #[arg(long)]
    dealer: Vec<String>,

    /// Reference date; forecasts start at its week (defaults to today)
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Engine configuration (JSON)
    #[arg(short, long, env = "DEMANDCAST_CONFIG")]
    config: Option<PathBuf>,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct SeriesArgs {
    /// Lead export (CSV)
    #[arg(short, long)]
    input: PathBuf,

    /// Dimension to group by (state, dealer, location, capacity_range, sector)
    #[arg(short, long)]
    dimension: Dimension,

    /// Measure to aggregate (enquiries, order_value, both)
    #[arg(short, long, default_value = "both")]
    metric: String,

    #[command(flatten)]
    window: WindowArgs,

    /// Engine configuration (JSON)
    #[arg(short, long, env = "DEMANDCAST_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct WindowArgs {
    /// First enquiry date to use (inclusive)
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Last enquiry date to use (inclusive)
    #[arg(long)]
    end_date: Option<NaiveDate>,
}

impl WindowArgs {
    fn filter(&self) -> RecordFilter {
        RecordFilter::new().between(self.start_date, self.end_date)
    }
}

/// Load the engine configuration, defaults when no file is given.
fn load_config(path: Option<&Path>) -> CliResult<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let file = File::open(path).map_err(|source| CliError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let config: EngineConfig = serde_json::from_reader(BufReader::new(file))?;
    config.validate()?;
    info!(path = %path.display(), "Loaded engine configuration");
    Ok(config)
}

/// Write pretty JSON to `output` or stdout.
fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> CliResult<()> {
    match output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
            info!(path = %path.display(), "Report written");
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, value)?;
            writeln!(handle)?;
        }
    }
    Ok(())
}

fn run_forecast(args: ForecastArgs) -> CliResult<()> {
    let config = load_config(args.config.as_deref())?;
    let records = load_leads(&args.input)?;

    let mut filter = args.window.filter();
    for state in &args.state {
        filter = filter.with_value(Dimension::State, state);
    }
    for dealer in &args.dealer {
        filter = filter.with_value(Dimension::Dealer, dealer);
    }

    let mut request = ForecastRequest::new(args.horizon)
        .metric(args.metric)
        .filter(filter);
    if let Some(weeks) = args.range_horizon {
        request = request.range_horizon(weeks);
    }
    if let Some(weeks) = args.sector_horizon {
        request = request.sector_horizon(weeks);
    }
    if let Some(date) = args.as_of {
        request = request.as_of(date);
    }

    let engine = HierarchicalForecaster::new(InMemorySource::new(records), config);
    let report = engine.forecast(&request)?;

    info!(
        states = report.summary.num_states,
        dealers = report.summary.num_dealers,
        locations = report.summary.num_locations,
        total_enquiries = report.summary.total_forecasted_enquiries,
        confidence = %report.summary.confidence,
        "Forecast complete"
    );

    write_json(&report, args.output.as_deref())
}

fn run_series(args: SeriesArgs) -> CliResult<()> {
    let config = load_config(args.config.as_deref())?;
    let metric: Metric = args.metric.parse()?;
    let filter = args.window.filter();

    let records: Vec<ObservationRecord> = load_leads(&args.input)?
        .into_iter()
        .filter(|record| filter.matches(record))
        .collect();

    let series = SeriesBuilder::new(config.min_series_weeks).build(&records, args.dimension, metric);
    info!(
        dimension = %args.dimension,
        series = series.len(),
        "Built weekly series"
    );

    write_json(&series, None)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("demandcast=info,demand_core=info")),
        )
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Forecast(args) => run_forecast(args),
        Commands::Series(args) => run_series(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "demandcast failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
