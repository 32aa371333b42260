//! diskstats - compute the size of a directory tree.
//!
//! Usage:
//!   diskstats single  PATH     Walk the tree sequentially
//!   diskstats virtual PATH     One concurrent task per entry
//!   diskstats --help           Show help

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use fanout_core::{AnalyzeConfig, ScanReport, Strategy};
use fanout_scan::analyzer_for;

#[derive(Parser)]
#[command(
    name = "diskstats",
    version,
    about = "Compute the size of a directory tree",
    long_about = "diskstats walks a directory tree and adds up file sizes.\n\n\
                  `single` walks the tree one entry at a time; `virtual` spawns \
                  one task per file and folder and joins them per folder."
)]
struct Cli {
    /// Analysis strategy: single or virtual
    strategy: Strategy,

    /// Folder to analyze
    path: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = AnalyzeConfig::builder()
        .root(cli.path)
        .strategy(cli.strategy)
        .build()
        .context("Invalid configuration")?;

    let report = run_analysis(&config).await?;

    match cli.format {
        OutputFormat::Text => print_report(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}

/// Analyze the configured folder, stopping early on Ctrl-C.
async fn run_analysis(config: &AnalyzeConfig) -> Result<ScanReport> {
    let analyzer = analyzer_for(config.strategy);
    let root: &Path = &config.root;

    eprintln!("Analyzing '{}'...", root.display());
    info!(strategy = %config.strategy, "starting analysis");

    let start = Instant::now();
    let mut scan = analyzer.analyze_folder(root);
    let result = tokio::select! {
        result = &mut scan => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nInterrupt received, stopping...");
            analyzer.cancel();
            scan.await
        }
    };
    let elapsed = start.elapsed();

    let tree = result.with_context(|| format!("Failed to analyze '{}'", root.display()))?;
    Ok(ScanReport::new(
        tree,
        config.strategy,
        elapsed,
        analyzer.analyzer_stats().tasks_created,
    ))
}

fn print_report(report: &ScanReport) {
    let summary = &report.summary;

    println!("{}", report.root);
    println!(
        " {} - {}",
        report.root.path().display(),
        format_size(report.total_size())
    );
    println!(
        " {} files, {} directories",
        summary.total_files, summary.total_dirs
    );
    if let Some((path, size)) = &summary.largest_file {
        println!(" Largest file: {} ({})", path.display(), format_size(*size));
    }
    println!(
        "Done in {}ms\n(NOTE: This measurement is very unreliable for various reasons, e.g. disk caching.)",
        report.elapsed.as_millis()
    );
    if let Some(count) = report.tasks_created {
        println!("Number of created tasks: {count}");
    }
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("diskstats=debug,fanout_core=debug,fanout_scan=debug,warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("diskstats=info,fanout_core=info,fanout_scan=info,warn")
        })
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
