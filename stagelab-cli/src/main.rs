//! StageLab CLI: stage classification batches and helpers.
//!
//! Commands:
//! - `run`: classify every security in a price file at a reference date
//!   and write `report.json` + `snapshot.csv`
//! - `stages`: print the stage table a config produces
//! - `synthetic`: write a seeded synthetic price universe as CSV

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use stagelab_core::data::MetadataSource;
use stagelab_core::domain::Stage;
use stagelab_runner::{
    generate_universe, open_price_source, run_batch, save_report, write_prices_csv, BatchConfig,
    BatchReport, CsvMetadataSource, SyntheticConfig,
};

#[derive(Parser)]
#[command(
    name = "stagelab",
    about = "StageLab CLI: momentum stage classification with dynamic levels"
)]
struct Cli {
    /// Also write logs to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the stage pipeline over a price file and export the snapshot.
    Run {
        /// Price file (.csv or .parquet) with security_id,date,open,high,low,close,volume.
        #[arg(long)]
        prices: PathBuf,

        /// Metadata CSV with id[,name,nse_code,bse_code,industry].
        #[arg(long)]
        meta: Option<PathBuf>,

        /// TOML batch config. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Reference date (YYYY-MM-DD). Overrides the config; defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// Run securities one at a time.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Worker threads (overrides the config).
        #[arg(long)]
        threads: Option<usize>,

        /// Output directory for report.json and snapshot.csv.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Print the stage table produced by a config.
    Stages {
        /// TOML batch config. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Write a synthetic price universe as CSV.
    Synthetic {
        /// Output CSV path.
        #[arg(long)]
        output: PathBuf,

        #[arg(long, default_value_t = 50)]
        securities: usize,

        /// Trading days per security.
        #[arg(long, default_value_t = 520)]
        days: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// First date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,
    },
}

fn init_tracing(log_file: Option<PathBuf>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if let Some(path) = log_file {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| anyhow!("failed to create log directory {parent:?}: {err}"))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| anyhow!("failed to open log file {path:?}: {err}"))?;
        let (writer, guard) = non_blocking(file);
        // Keep the writer alive for the rest of the process.
        let _guard = Box::leak(Box::new(guard));
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer);
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .with(file_layer)
            .try_init()
            .map_err(|err| anyhow!("failed to initialize tracing: {err}"))
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .try_init()
            .map_err(|err| anyhow!("failed to initialize tracing: {err}"))
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
}

fn load_config(path: Option<&Path>) -> Result<BatchConfig> {
    match path {
        Some(p) => BatchConfig::load(p).with_context(|| format!("loading {}", p.display())),
        None => Ok(BatchConfig::default()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file)?;

    match cli.command {
        Commands::Run {
            prices,
            meta,
            config,
            date,
            sequential,
            threads,
            output_dir,
        } => run_cmd(
            &prices,
            meta.as_deref(),
            config.as_deref(),
            date.as_deref(),
            sequential,
            threads,
            &output_dir,
        ),
        Commands::Stages { config } => stages_cmd(config.as_deref()),
        Commands::Synthetic {
            output,
            securities,
            days,
            seed,
            start,
        } => synthetic_cmd(&output, securities, days, seed, start.as_deref()),
    }
}

fn run_cmd(
    prices_path: &Path,
    meta_path: Option<&Path>,
    config_path: Option<&Path>,
    date: Option<&str>,
    sequential: bool,
    threads: Option<usize>,
    output_dir: &Path,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(d) = date {
        config.batch.reference_date = Some(parse_date(d)?);
    }
    if sequential {
        config.batch.parallel = false;
    }
    if threads.is_some() {
        config.batch.threads = threads;
    }

    let prices = open_price_source(prices_path)
        .with_context(|| format!("opening prices {}", prices_path.display()))?;
    let meta = meta_path
        .map(|p| {
            CsvMetadataSource::open(p).with_context(|| format!("opening metadata {}", p.display()))
        })
        .transpose()?;
    let meta_ref = meta.as_ref().map(|m| m as &dyn MetadataSource);

    let today = chrono::Local::now().date_naive();
    let report = run_batch(&config, prices.as_ref(), meta_ref, today)?;
    if report.universe == 0 {
        bail!("no securities found in {}", prices_path.display());
    }

    print_summary(&report);
    let (json, csv) = save_report(&report, output_dir)?;
    info!(json = %json.display(), csv = %csv.display(), "report written");
    println!("Report saved to: {}", json.display());
    println!("Snapshot saved to: {}", csv.display());
    Ok(())
}

fn print_summary(report: &BatchReport) {
    println!("Reference date: {}", report.reference_date);
    println!("Config hash:    {}", report.config_hash.short());
    println!(
        "Securities:     {} processed, {} in snapshot, {} excluded",
        report.universe,
        report.snapshots.len(),
        report.excluded.len()
    );
    println!("Stages:");
    for (stage, count) in &report.stage_distribution {
        println!("  {:<22} {count}", stage.to_string());
    }
    let entries: Vec<&str> = report
        .snapshots
        .iter()
        .filter(|s| s.row.trade.status.action == stagelab_core::lifecycle::TradeAction::Entry)
        .map(|s| s.ticker.as_str())
        .collect();
    if !entries.is_empty() {
        println!("Entries today:  {}", entries.join(", "));
    }
    println!("Elapsed:        {} ms", report.timing.elapsed_ms);
}

fn stages_cmd(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let table = config.classifier().stages.build();
    println!(
        "{:<24} {:>8} {:>9} {:>12}  rules",
        "stage", "optimal", "stop_pct", "target_pct"
    );
    for stage in Stage::ALL {
        let def = table.get(stage);
        let rules: Vec<&str> = def.rules.iter().map(|r| r.name()).collect();
        println!(
            "{:<24} {:>8} {:>9.1} {:>5.0}-{:<6.0}  {}",
            stage.to_string(),
            def.optimal_days,
            def.base_stop_pct,
            def.min_return_pct,
            def.max_return_pct,
            rules.join(" + ")
        );
    }
    println!("tie break: {:?}", table.tie_break());
    Ok(())
}

fn synthetic_cmd(
    output: &Path,
    securities: usize,
    days: usize,
    seed: u64,
    start: Option<&str>,
) -> Result<()> {
    let mut config = SyntheticConfig {
        securities,
        days,
        seed,
        ..SyntheticConfig::default()
    };
    if let Some(s) = start {
        config.start = parse_date(s)?;
    }
    let universe = generate_universe(&config);
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    write_prices_csv(&universe, output)?;
    println!(
        "Wrote {} securities x {} days to {}",
        universe.len(),
        days,
        output.display()
    );
    Ok(())
}
