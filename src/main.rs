use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use orpheus::diagnose;
use orpheus::ingest;
use orpheus::pipeline::{self, PipelineConfig, ProgressBarObserver};
use orpheus::store::{JsonlCleanStore, JsonlRawStore, RawSource};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "orpheus")]
#[command(about = "Clean and validate music-track metadata through bronze/silver layers")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a source CSV into the raw store (bronze layer)
    Ingest(IngestArgs),
    /// Validate and normalize the raw store into the clean store (silver layer)
    Clean(CleanArgs),
    /// Cross-check the CSV, raw store, and clean store against the schema
    Diagnose(DiagnoseArgs),
}

#[derive(Args)]
struct IngestArgs {
    /// Path to the source CSV file
    #[arg(short, long)]
    input: String,

    /// Path to the raw store (newline-delimited JSON)
    #[arg(long, default_value = "data/raw.jsonl")]
    raw_store: String,

    /// Rows per bulk append
    #[arg(long, default_value_t = orpheus::config::DEFAULT_BATCH_SIZE)]
    batch_size: usize,
}

#[derive(Args)]
struct CleanArgs {
    /// Path to the raw store (newline-delimited JSON)
    #[arg(long, default_value = "data/raw.jsonl")]
    raw_store: String,

    /// Path to the clean store (newline-delimited JSON)
    #[arg(long, default_value = "data/clean.jsonl")]
    clean_store: String,

    /// Records per batch
    #[arg(long, default_value_t = orpheus::config::DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Keep the dedupe seen-set for the whole run instead of per batch
    /// (catches cross-batch duplicates, costs O(run) memory)
    #[arg(long)]
    global_dedup: bool,
}

#[derive(Args)]
struct DiagnoseArgs {
    /// Path to the source CSV file (skipped if not given)
    #[arg(short, long)]
    input: Option<String>,

    /// Path to the raw store
    #[arg(long, default_value = "data/raw.jsonl")]
    raw_store: String,

    /// Path to the clean store
    #[arg(long, default_value = "data/clean.jsonl")]
    clean_store: String,
}

fn run_ingest(args: IngestArgs) -> Result<()> {
    let start = Instant::now();
    let store = JsonlRawStore::new(&args.raw_store);

    info!(input = %args.input, "Starting ingestion");
    let report = ingest::ingest_csv(&args.input, &store, args.batch_size)?;

    println!();
    println!("=== Summary ===");
    println!("Ingestion time:     {:.2}s", start.elapsed().as_secs_f64());
    println!("Rows read:          {}", report.rows);
    println!("Records stored:     {}", report.stored);
    println!("Raw store:          {}", args.raw_store);

    Ok(())
}

fn run_clean(args: CleanArgs) -> Result<()> {
    let start = Instant::now();
    let source = JsonlRawStore::new(&args.raw_store);
    let mut sink = JsonlCleanStore::new(&args.clean_store);

    let config = PipelineConfig {
        batch_size: args.batch_size,
        global_dedup: args.global_dedup,
    };

    // Size the bar up front; the pipeline re-emits the total on every batch
    // anyway, so a stale count only affects the first render.
    let total = source.count().unwrap_or(0);
    let mut observer = ProgressBarObserver::new(total);

    info!(raw_store = %args.raw_store, batch_size = args.batch_size, "Starting cleaning pass");
    let stats = pipeline::run_cleaning(&source, &mut sink, &mut observer, &config)?;
    observer.finish();

    println!();
    println!("=== Summary ===");
    println!("Cleaning time:      {:.2}s", start.elapsed().as_secs_f64());
    println!();
    println!("Records processed:  {}", stats.processed());
    println!("Valid saved:        {}", stats.valid());
    println!("Rejected:           {}", stats.rejected());
    println!("Clean store:        {}", args.clean_store);

    Ok(())
}

fn run_diagnose(args: DiagnoseArgs) -> Result<()> {
    let raw = JsonlRawStore::new(&args.raw_store);
    let clean = JsonlCleanStore::new(&args.clean_store);
    diagnose::run_diagnostics(args.input.as_deref(), &raw, &clean)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let result = match cli.command {
        Commands::Ingest(args) => run_ingest(args),
        Commands::Clean(args) => run_clean(args),
        Commands::Diagnose(args) => run_diagnose(args),
    };

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
