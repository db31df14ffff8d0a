//! CLI entry point for the health plots pipeline.
//!
//! Provides subcommands for loading the IPPS, USDA restaurant and census
//! population CSVs into SQLite, and for rendering per-state discharge plots.

use anyhow::Result;
use clap::{Parser, Subcommand};
use health_plots::{
    config::{PlotPlan, Settings},
    output::{append_record, print_json},
    parser::{parse_ipps_file, parse_population_file, parse_usda_file},
    plot::{PlotKind, RenderContext, plot},
    query::{population_65_and_over_by_state, total_discharges_by_state},
    store::{Sex, SqliteStore},
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "health_plots")]
#[command(about = "Load hospital discharge data and plot it per state", long_about = None)]
struct Cli {
    /// SQLite database file (overrides DATABASE_PATH)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Directory for rendered plots (overrides RESULTS_DIR)
    #[arg(long, global = true)]
    results: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load an IPPS charge data CSV into the table for its year
    LoadIpps {
        /// Data year (2011, 2012 or 2013)
        #[arg(short, long)]
        year: u16,

        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Load a USDA restaurants CSV
    LoadUsda {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Load a census civilian population estimates CSV
    LoadPopulation {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Render one plot
    Plot {
        #[arg(value_enum)]
        kind: PlotKind,

        /// Substring of the DRG definition to match
        #[arg(short, long)]
        drg: String,

        /// Data year (2011, 2012 or 2013)
        #[arg(short, long)]
        year: u16,

        /// Output file name inside the results directory
        #[arg(short, long)]
        file: String,
    },
    /// Render every plot listed in a JSON plan
    PlotBatch {
        #[arg(value_name = "PLAN")]
        plan: PathBuf,
    },
    /// Print a per-state series as JSON
    Series {
        #[command(subcommand)]
        series: SeriesCommand,
    },
}

#[derive(Subcommand)]
enum SeriesCommand {
    /// Total discharges per state for a DRG substring
    Discharges {
        #[arg(short, long)]
        drg: String,

        #[arg(short, long)]
        year: u16,
    },
    /// Population aged 65 and over per state
    Population {
        #[arg(short, long, value_enum, default_value_t = Sex::Total)]
        sex: Sex,

        #[arg(short, long)]
        year: u16,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let cli = Cli::parse();
    let mut settings = Settings::from_env();
    if let Some(database) = cli.database {
        settings.database_path = database;
    }
    if let Some(results) = cli.results {
        settings.results_dir = results;
    }

    // Logging setup: colored stderr + JSON rolling log file
    let log_dir = settings
        .log_file_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = settings
        .log_file_path
        .file_name()
        .unwrap_or(OsStr::new("health_plots.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    match cli.command {
        Commands::LoadIpps { year, file } => {
            let rows = parse_ipps_file(&file)?;
            let mut store = SqliteStore::open(&settings.database_path)?;
            let stored = store.load_ipps(year, &rows)?;
            info!(year, stored, "IPPS load complete");
        }
        Commands::LoadUsda { file } => {
            let rows = parse_usda_file(&file)?;
            let mut store = SqliteStore::open(&settings.database_path)?;
            let stored = store.load_usda(&rows)?;
            info!(stored, "USDA load complete");
        }
        Commands::LoadPopulation { file } => {
            let rows = parse_population_file(&file)?;
            let mut store = SqliteStore::open(&settings.database_path)?;
            let stored = store.load_population(&rows)?;
            info!(stored, "population load complete");
        }
        Commands::Plot {
            kind,
            drg,
            year,
            file,
        } => {
            let store = SqliteStore::open(&settings.database_path)?;
            let ctx = RenderContext::new(&settings.results_dir);
            let record = plot(kind, &store, &ctx, &drg, year, &file)?;
            append_record(&settings.plot_ledger(), &record)?;
        }
        Commands::PlotBatch { plan } => {
            let plan = PlotPlan::load(&plan)?;
            let store = SqliteStore::open(&settings.database_path)?;
            let ctx = RenderContext::new(&settings.results_dir);

            info!(jobs = plan.jobs.len(), "Starting plot batch");
            for job in &plan.jobs {
                let record = plot(job.kind, &store, &ctx, &job.drg, job.year, &job.file)?;
                append_record(&settings.plot_ledger(), &record)?;
            }
            info!(results = %ctx.output_dir().display(), "Plot batch complete");
        }
        Commands::Series { series } => {
            let store = SqliteStore::open(&settings.database_path)?;
            match series {
                SeriesCommand::Discharges { drg, year } => {
                    print_json(&total_discharges_by_state(&store, &drg, year)?)?;
                }
                SeriesCommand::Population { sex, year } => {
                    print_json(&population_65_and_over_by_state(&store, sex, year)?)?;
                }
            }
        }
    }

    Ok(())
}
