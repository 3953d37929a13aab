//! Coastlines CLI - annual shorelines and rates of change from satellite stacks

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use coastlines_parallel::{set_num_threads, ProcessingMode, TileReport, TileStatus};
use coastlines_pipeline::{Config, Pipeline, PipelineError};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "coastlines")]
#[command(author, version, about = "Annual shorelines and rates of coastal change", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StageArgs {
    /// Pipeline configuration file (TOML)
    #[arg(short, long)]
    config: PathBuf,
    /// Tile to process; repeat for several, omit for the whole grid
    #[arg(short, long = "tile")]
    tiles: Vec<String>,
    /// Re-run tiles whose outputs already exist
    #[arg(long)]
    overwrite: bool,
    /// Worker threads (1 = sequential, default all cores)
    #[arg(short = 'j', long)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Tide-filtered annual and gapfill composites per tile
    Raster(StageArgs),
    /// Shorelines, certainty polygons and rates of change per tile
    Vector(StageArgs),
    /// Merge tile layers and aggregate hotspots
    Continental(StageArgs),
    /// Raster, vector and continental stages in sequence
    Run(StageArgs),
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Could not install the log subscriber: {}", e);
    }
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn load_pipeline(args: &StageArgs) -> Result<Pipeline> {
    let mut config = Config::load(&args.config)
        .with_context(|| format!("Failed to load configuration {}", args.config.display()))?;
    config.output.overwrite |= args.overwrite;
    if let Some(n) = args.threads.filter(|&n| n > 0) {
        set_num_threads(n);
    }
    Ok(Pipeline::new(config, ProcessingMode::from_threads(args.threads)))
}

/// Print per-tile outcomes; true when every tile completed or was skipped
fn summarize(stage: &str, reports: &[TileReport]) -> bool {
    let completed = reports.iter().filter(|r| r.status == TileStatus::Completed).count();
    let skipped = reports.iter().filter(|r| matches!(r.status, TileStatus::Skipped(_))).count();
    let failed: Vec<&TileReport> = reports.iter().filter(|r| r.is_failed()).collect();

    println!(
        "{}: {} completed, {} skipped, {} failed",
        stage,
        completed,
        skipped,
        failed.len()
    );
    for report in &failed {
        if let TileStatus::Failed(msg) = &report.status {
            println!("  {}: {}", report.tile, msg);
        }
    }
    failed.is_empty()
}

fn raster_stage(pipeline: &Pipeline, tiles: &[String]) -> Result<bool> {
    let start = Instant::now();
    let pb = spinner("Compositing tiles...");
    let reports = pipeline.run_raster(tiles);
    pb.finish_and_clear();
    let reports = reports.context("Raster stage failed")?;
    let ok = summarize("Raster stage", &reports);
    done("Composites", &pipeline.layout().root().join("raster"), start.elapsed());
    Ok(ok)
}

fn vector_stage(pipeline: &Pipeline, tiles: &[String]) -> Result<bool> {
    let start = Instant::now();
    let pb = spinner("Extracting shorelines...");
    let reports = pipeline.run_vector(tiles);
    pb.finish_and_clear();
    let reports = reports.context("Vector stage failed")?;
    let ok = summarize("Vector stage", &reports);
    done("Shorelines and rates of change", &pipeline.layout().root().join("vector"), start.elapsed());
    Ok(ok)
}

fn continental_stage(pipeline: &Pipeline, tiles: &[String]) -> Result<bool> {
    let start = Instant::now();
    let pb = spinner("Merging tiles and computing hotspots...");
    let summary = pipeline.run_continental(tiles);
    pb.finish_and_clear();
    let summary = summary.context("Continental stage failed")?;

    println!(
        "Continental stage: {} tiles merged, {} shorelines, {} rate points, {} hotspot layers",
        summary.tiles_merged, summary.shorelines, summary.rate_points, summary.hotspot_layers
    );
    if !summary.tiles_missing.is_empty() {
        warn!("Tiles without vector outputs: {}", summary.tiles_missing.join(", "));
    }
    done("Continental layers", &pipeline.layout().root().join("continental"), start.elapsed());
    Ok(true)
}

fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::Raster(args) => raster_stage(&load_pipeline(&args)?, &args.tiles),
        Commands::Vector(args) => vector_stage(&load_pipeline(&args)?, &args.tiles),
        Commands::Continental(args) => continental_stage(&load_pipeline(&args)?, &args.tiles),
        Commands::Run(args) => {
            let pipeline = load_pipeline(&args)?;
            info!("Running all stages from {}", args.config.display());
            let raster_ok = raster_stage(&pipeline, &args.tiles)?;
            let vector_ok = vector_stage(&pipeline, &args.tiles)?;
            let continental_ok = continental_stage(&pipeline, &args.tiles)?;
            Ok(raster_ok && vector_ok && continental_ok)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            error!("{:#}", err);
            let code = err.downcast_ref::<PipelineError>().map_or(1, PipelineError::exit_code);
            ExitCode::from(code as u8)
        }
    }
}
