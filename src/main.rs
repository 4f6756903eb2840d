use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use wikimap::pipeline::{run_ingest, IngestConfig};
use wikimap::sink::{ArticleSink, CsvSink, MemorySink};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "wikimap")]
#[command(about = "Extract citation dates and coordinates from Wikipedia dumps")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a dump into an article CSV
    Ingest(IngestArgs),
}

#[derive(Args)]
struct IngestArgs {
    /// Path to the Wikipedia dump file (.xml or .xml.bz2)
    #[arg(short, long)]
    input: String,

    /// Output CSV file for article records
    #[arg(short, long)]
    output: String,

    /// Records per sink flush
    #[arg(long, default_value_t = wikimap::config::DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Extraction workers (0 = host concurrency)
    #[arg(long, default_value_t = 0)]
    workers: usize,

    /// Persist only articles that declare coordinates
    #[arg(long)]
    require_coordinates: bool,

    /// Start from page 1 even if the output already holds records
    #[arg(long)]
    no_resume: bool,

    /// Limit number of pages to process (for testing)
    #[arg(long)]
    limit: Option<u64>,

    /// Dry run - parse and extract but don't write output
    #[arg(long)]
    dry_run: bool,
}

fn run_ingest_command(args: IngestArgs) -> Result<()> {
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        ctrlc::set_handler(move || {
            warn!("Interrupt received; finishing in-flight work and flushing");
            cancel.store(true, Ordering::Relaxed);
        })
        .context("Failed to install interrupt handler")?;
    }

    let config = IngestConfig {
        input: args.input,
        batch_size: args.batch_size,
        workers: args.workers,
        require_coordinates: args.require_coordinates,
        resume: !args.no_resume && !args.dry_run,
        limit: args.limit,
    };

    let mut sink: Box<dyn ArticleSink> = if args.dry_run {
        info!("Dry run: discarding extracted records");
        Box::new(MemorySink::new())
    } else {
        Box::new(CsvSink::open(&args.output)?)
    };

    let start = Instant::now();
    let stats = run_ingest(&config, sink.as_mut(), &cancel)?;
    let duration = start.elapsed();

    println!();
    println!("=== Summary ===");
    println!("Ingestion time:     {:.2}s", duration.as_secs_f64());
    println!();
    println!("Pages seen:         {}", stats.pages());
    println!("Pages skipped:      {}", stats.skipped());
    println!("Pages without text: {}", stats.without_text());
    println!("Dates found:        {}", stats.dates());
    println!("Coordinates found:  {}", stats.coordinates());
    println!("Articles persisted: {}", stats.persisted());

    Ok(())
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
        Commands::Ingest(args) => run_ingest_command(args),
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
