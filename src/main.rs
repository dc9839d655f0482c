//! strata - deduplicated modification history of the source files in a tree.
//!
//! Usage:
//!   strata scan [PATH]       Summary, yearly/weekday/hourly tables, growth
//!   strata top [PATH]        Largest files by lines or size
//!   strata export [PATH]     Full dataset as JSON
//!   strata --help            Show help

mod logging;

use std::path::{Path, PathBuf};
use std::thread;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use strata_analyze::ReportDataset;
use strata_scan::{ScanConfig, ScanError, Scanner};

#[derive(Parser)]
#[command(
    name = "strata",
    version,
    about = "Deduplicated, time-bucketed history of the source files under a directory",
    long_about = "strata walks a directory tree, keeps the oldest copy of every distinct \
                  source file, and reports when the code was written: by year, weekday, \
                  hour and cumulative growth per month."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). STRATA_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ScanArgs {
    /// Directory to analyze (default: config `root`, else the current directory)
    path: Option<PathBuf>,

    /// TOML file with scan settings (flags override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tracked extension, without the dot (repeatable; default: py)
    #[arg(short, long = "ext")]
    extensions: Vec<String>,

    /// Extra directory names or globs to skip (repeatable)
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Worker threads (0 = auto, 1 = fully serial)
    #[arg(short, long)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Scan and print the summary and time buckets
    Scan {
        #[command(flatten)]
        scan: ScanArgs,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the largest files
    Top {
        #[command(flatten)]
        scan: ScanArgs,

        /// Number of files to show
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,

        /// Ranking metric
        #[arg(short, long, default_value = "lines")]
        by: Metric,
    },

    /// Export the dataset to JSON
    Export {
        #[command(flatten)]
        scan: ScanArgs,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum Metric {
    #[default]
    Lines,
    Size,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Command::Scan { scan, format } => run_scan(&scan, format),
        Command::Top { scan, count, by } => run_top(&scan, count, by),
        Command::Export { scan, output } => run_export(&scan, output),
    }
}

/// Merge the optional config file with command-line flags.
fn load_config(args: &ScanArgs) -> Result<ScanConfig> {
    let base = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Cannot read config {}", path.display()))?;
            toml::from_str::<ScanConfig>(&text)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => ScanConfig::default(),
    };

    let extensions = if args.extensions.is_empty() {
        base.extensions
    } else {
        args.extensions.clone()
    };
    let mut extra_ignore = base.extra_ignore;
    extra_ignore.extend(args.ignore.iter().cloned());

    let config = ScanConfig::builder()
        .root(args.path.clone().unwrap_or(base.root))
        .extensions(extensions)
        .ignored_dirs(base.ignored_dirs)
        .kept_dirs(base.kept_dirs)
        .extra_ignore(extra_ignore)
        .threads(args.threads.unwrap_or(base.threads))
        .build()
        .context("Invalid scan settings")?;

    Ok(config)
}

/// A dataset and the canonical root it was scanned from.
struct Report {
    root: PathBuf,
    dataset: ReportDataset,
}

/// Run the scan and build the dataset. `None` means nothing qualified.
fn build_dataset(args: &ScanArgs) -> Result<Option<Report>> {
    let config = load_config(args)?;
    eprintln!("Scanning {}...", config.root.display());

    let scanner = Scanner::new();
    let mut progress_rx = scanner.subscribe();
    let reporter = thread::spawn(move || loop {
        match progress_rx.blocking_recv() {
            Ok(progress) if progress.finished => break,
            Ok(progress) => {
                eprint!(
                    "\r  {} files read, {} unique ({:.0} files/s)",
                    progress.files_processed,
                    progress.unique_files,
                    progress.files_per_second()
                );
            }
            Err(RecvError::Lagged(skipped)) => debug!(skipped, "progress updates dropped"),
            Err(RecvError::Closed) => break,
        }
    });

    let result = scanner.scan(&config);
    drop(scanner);
    let _ = reporter.join();
    eprint!("\r");

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err @ ScanError::NoQualifyingFiles { .. }) => {
            eprintln!("{err}; nothing to report.");
            return Ok(None);
        }
        Err(err) => return Err(err).context("Scan failed"),
    };

    if !outcome.warnings.is_empty() {
        eprintln!("{} file(s) could not be read", outcome.warnings.len());
    }
    eprintln!(
        "{} unique files ({} duplicates, {} directories skipped) in {:.2}s",
        outcome.records.len(),
        outcome.stats.duplicates_discarded,
        outcome.stats.dirs_pruned,
        outcome.duration.as_secs_f64()
    );

    Ok(Some(Report {
        root: outcome.root,
        dataset: ReportDataset::new(outcome.records),
    }))
}

/// Print summary and time buckets.
fn run_scan(args: &ScanArgs, format: OutputFormat) -> Result<()> {
    let Some(Report { root, dataset }) = build_dataset(args)? else {
        return Ok(());
    };

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&dataset)?);
        return Ok(());
    }

    let summary = dataset.summary();
    println!();
    println!("{}", "─".repeat(60));
    println!(" {}", root.display());
    println!(
        " {} unique files, {} lines, {}",
        summary.total_files,
        summary.total_lines,
        format_size((summary.total_kb * 1024.0) as u64)
    );
    if let (Some(first), Some(last)) = (summary.first_modified, summary.last_modified) {
        println!(
            " Period: {} - {}",
            first.format("%d/%m/%Y"),
            last.format("%d/%m/%Y")
        );
    }
    if summary.latin1_files > 0 {
        println!(" {} file(s) counted as Latin-1", summary.latin1_files);
    }
    println!("{}", "─".repeat(60));

    println!();
    println!(" Lines by year:");
    let max = dataset.annual_totals().iter().map(|y| y.lines).max().unwrap_or(0);
    for year in dataset.annual_totals() {
        let bar = make_bar(ratio(year.lines, max), 30);
        println!("   {:<10} {:>10}  {}", year.year, year.lines, bar);
    }

    println!();
    println!(" Files by year:");
    for share in dataset.yearly_file_share() {
        println!(
            "   {:<10} {:>10}  {:>5.1}%",
            share.year, share.files, share.percent
        );
    }

    println!();
    println!(" Lines by weekday:");
    let max = dataset.weekday_totals().iter().map(|w| w.lines).max().unwrap_or(0);
    for day in dataset.weekday_totals() {
        let bar = make_bar(ratio(day.lines, max), 30);
        println!("   {:<10} {:>10}  {}", day.weekday, day.lines, bar);
    }

    println!();
    println!(" Lines by hour:");
    let max = dataset.hourly_totals().iter().map(|h| h.lines).max().unwrap_or(0);
    for hour in dataset.hourly_totals() {
        let bar = make_bar(ratio(hour.lines, max), 30);
        println!("   {:02}:00      {:>10}  {}", hour.hour, hour.lines, bar);
    }

    println!();
    println!(" Cumulative growth:");
    for point in dataset.cumulative_series() {
        println!(
            "   {:<10} {:>10} lines {:>8} files",
            point.month.format("%Y-%m"),
            point.cumulative_lines,
            point.cumulative_files
        );
    }
    println!();

    Ok(())
}

/// Print the top files by a metric.
fn run_top(args: &ScanArgs, count: usize, by: Metric) -> Result<()> {
    let Some(Report { root, dataset }) = build_dataset(args)? else {
        return Ok(());
    };

    let ranked = match by {
        Metric::Lines => dataset.top_n_by_lines(count),
        Metric::Size => dataset.top_n_by_size(count),
    };

    println!();
    for (i, record) in ranked.iter().enumerate() {
        println!(
            " {:>3}. {:<40} {:>8} lines {:>10}  {}",
            i + 1,
            truncate(record.name.as_str(), 40),
            record.line_count,
            format_size(record.size_bytes()),
            relative(&record.path, &root).display()
        );
    }
    println!();

    Ok(())
}

/// Export the dataset to JSON.
fn run_export(args: &ScanArgs, output: Option<PathBuf>) -> Result<()> {
    let Some(Report { dataset, .. }) = build_dataset(args)? else {
        return Ok(());
    };

    let json = serde_json::to_string_pretty(&dataset)?;

    match output {
        Some(output_path) => {
            std::fs::write(&output_path, json)
                .with_context(|| format!("Cannot write {}", output_path.display()))?;
            eprintln!("Exported to {}", output_path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}

fn ratio(value: u64, max: u64) -> f64 {
    if max > 0 {
        value as f64 / max as f64
    } else {
        0.0
    }
}

/// Path relative to the scanned root when possible.
fn relative<'a>(path: &'a Path, root: &Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

/// Create a simple ASCII bar.
fn make_bar(ratio: f64, width: usize) -> String {
    let filled = (ratio * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Truncate a string to at most `max_len` characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{head}…")
    }
}
