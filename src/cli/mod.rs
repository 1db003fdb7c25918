//! # CLI Module
//!
//! Command-line interface for the near-duplicate photo finder.
//!
//! ## Usage
//! ```bash
//! # Scan a directory for near-duplicates
//! photo-stamp scan ~/Photos
//!
//! # Stricter comparison, keep the first photo of every pair
//! photo-stamp scan ~/Photos --policy exact --keep first
//!
//! # Show what would be deleted, then do it
//! photo-stamp scan ~/Photos --delete
//! photo-stamp scan ~/Photos --delete --apply
//!
//! # JSON output
//! photo-stamp scan ~/Photos --output json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use photo_stamp::core::actions::{
    ActionExecutor, ActionMode, ActionReport, FileAction, RemovalPlan, RenamePlan,
};
use photo_stamp::core::cluster::ClusterConfig;
use photo_stamp::core::comparator::MatchPolicy;
use photo_stamp::core::fingerprint::FingerprintConfig;
use photo_stamp::core::pipeline::{Pipeline, PipelineResult};
use photo_stamp::core::resolution::ResolutionRule;
use photo_stamp::core::scanner::ScanConfig;
use photo_stamp::error::Result;
use photo_stamp::events::{Event, EventChannel, FingerprintEvent, PipelineEvent, ScanEvent};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::thread;

/// Photo Stamp - Find near-duplicate pictures
#[derive(Parser, Debug)]
#[command(name = "photo-stamp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan directories for near-duplicate photos
    Scan(ScanArgs),
}

#[derive(clap::Args, Debug)]
struct ScanArgs {
    /// Directories to scan
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// How fingerprints are compared
    #[arg(short, long, default_value = "nearest")]
    policy: Policy,

    /// Share of the maximum score a pair needs (1-100)
    #[arg(short, long, default_value_t = 80)]
    similarity: u8,

    /// Which photo of a pair to keep
    #[arg(short, long, default_value = "larger")]
    keep: Keep,

    /// Grid width used for fingerprints (even)
    #[arg(long, default_value_t = 8)]
    grid_width: u32,

    /// Grid height used for fingerprints
    #[arg(long, default_value_t = 8)]
    grid_height: u32,

    /// Quantization levels per cell (2-8)
    #[arg(long, default_value_t = 8)]
    levels: u8,

    /// Maximum number of clusters
    #[arg(long, default_value_t = 10)]
    max_clusters: usize,

    /// Photos per cluster to aim for
    #[arg(long, default_value_t = 10)]
    group_size: usize,

    /// Seed for reproducible clustering
    #[arg(long)]
    seed: Option<u64>,

    /// Include hidden files
    #[arg(long)]
    include_hidden: bool,

    /// Maximum directory depth
    #[arg(long)]
    max_depth: Option<usize>,

    /// Output format
    #[arg(short, long, default_value = "pretty")]
    output: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Delete redundant photos (dry run unless --apply)
    #[arg(long)]
    delete: bool,

    /// Rename kept photos to their fingerprint (dry run unless --apply)
    #[arg(long)]
    rename: bool,

    /// Actually perform --delete / --rename
    #[arg(long)]
    apply: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    /// Every symbol equal
    Exact,
    /// Enough symbols equal
    Threshold,
    /// Equal and adjacent symbols vote (default)
    Nearest,
}

impl Policy {
    fn with_similarity(self, percent: u8) -> MatchPolicy {
        match self {
            Policy::Exact => MatchPolicy::Exact,
            Policy::Threshold => MatchPolicy::Threshold { percent },
            Policy::Nearest => MatchPolicy::NearestDistance { percent },
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Keep {
    First,
    Last,
    /// Keep the photo with more pixels (default)
    Larger,
    Smaller,
}

impl From<Keep> for ResolutionRule {
    fn from(keep: Keep) -> Self {
        match keep {
            Keep::First => ResolutionRule::KeepFirst,
            Keep::Last => ResolutionRule::KeepLast,
            Keep::Larger => ResolutionRule::KeepLarger,
            Keep::Smaller => ResolutionRule::KeepSmaller,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (redundant paths only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan(args) => run_scan(args),
    }
}

fn run_scan(args: ScanArgs) -> Result<()> {
    photo_stamp::init_tracing(if args.verbose { "debug" } else { "warn" });

    let term = Term::stderr();
    let pretty = matches!(args.output, OutputFormat::Pretty);

    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("Photo Stamp").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let pipeline = Pipeline::builder()
        .paths(args.paths.clone())
        .fingerprint(
            FingerprintConfig::new()
                .grid(args.grid_width, args.grid_height)
                .levels(args.levels),
        )
        .cluster(ClusterConfig {
            max_clusters: args.max_clusters,
            group_size: args.group_size,
            seed: args.seed,
            ..Default::default()
        })
        .policy(args.policy.with_similarity(args.similarity))
        .rule(args.keep.into())
        .scan_config(ScanConfig {
            include_hidden: args.include_hidden,
            max_depth: args.max_depth,
            ..Default::default()
        })
        .build()?;

    let (sender, receiver) = EventChannel::new();

    let progress = pretty.then(|| {
        let pb = ProgressBar::new(0);
        let bar = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|s| s.progress_chars("█▓░"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(bar);
        pb
    });

    let progress_clone = progress.clone();
    let verbose = args.verbose;

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        let Some(pb) = progress_clone else {
            return;
        };
        for event in receiver.iter() {
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_message(format!("{}", phase));
                }
                Event::Scan(ScanEvent::Completed { total_photos }) => {
                    pb.set_length(total_photos as u64);
                }
                Event::Fingerprint(FingerprintEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                    if verbose {
                        pb.set_message(
                            p.current_path
                                .file_name()
                                .unwrap_or_default()
                                .to_string_lossy()
                                .into_owned(),
                        );
                    }
                }
                Event::Fingerprint(FingerprintEvent::Error { path, message }) => {
                    if verbose {
                        pb.println(format!("  {} {}: {}", style("!").yellow(), path.display(), message));
                    }
                }
                Event::Pipeline(PipelineEvent::Completed { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    let result = pipeline.run_with_events(&sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    let result = result?;

    let mode = if args.apply {
        ActionMode::Apply
    } else {
        ActionMode::DryRun
    };
    let reports = run_actions(&result, args.delete, args.rename, mode);

    match args.output {
        OutputFormat::Pretty => print_pretty_results(&term, &result, &reports, mode, verbose),
        OutputFormat::Json => print_json_results(&result, &reports, mode)?,
        OutputFormat::Minimal => print_minimal_results(&result),
    }

    Ok(())
}

fn run_actions(
    result: &PipelineResult,
    delete: bool,
    rename: bool,
    mode: ActionMode,
) -> Vec<ActionReport> {
    let mut reports = Vec::new();

    let removed: HashSet<usize> = if delete {
        result.redundant().into_iter().collect()
    } else {
        HashSet::new()
    };

    if delete {
        let plan = RemovalPlan::from_decisions(&result.records, &result.decisions);
        reports.push(ActionExecutor::execute(&plan.actions, mode));
    }

    if rename {
        let plan = RenamePlan::from_records(&result.records, &removed);
        let mut report = ActionExecutor::execute(&plan.actions, mode);
        report.errors.extend(plan.conflicts);
        reports.push(report);
    }

    reports
}

fn print_pretty_results(
    term: &Term,
    result: &PipelineResult,
    reports: &[ActionReport],
    mode: ActionMode,
    verbose: bool,
) {
    let fingerprinted = result.fingerprinted();

    term.write_line(&format!("{} Scan Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} photos found in {:.1}s",
        style(result.records.len()).cyan(),
        result.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!(
        "  {} fingerprinted, {} failed",
        style(fingerprinted).cyan(),
        style(result.records.len() - fingerprinted).yellow()
    ))
    .ok();
    term.write_line(&format!("  {} clusters", style(result.clusters.len()).cyan()))
        .ok();
    term.write_line(&format!(
        "  {} duplicate pairs",
        style(result.pairs.len()).cyan()
    ))
    .ok();
    term.write_line("").ok();

    let unresolved = result.unresolved();

    if result.pairs.is_empty() {
        term.write_line(&format!("  {} No duplicates found!", style("🎉").green()))
            .ok();
    } else if !result.decisions.is_empty() {
        term.write_line(&format!("{}", style("Duplicate Pairs:").bold().underlined()))
            .ok();
        term.write_line("").ok();

        for (i, decision) in result.decisions.iter().enumerate() {
            let pair = &decision.pair;
            term.write_line(&format!(
                "  {} cluster {}, score {}",
                style(format!("Pair {}:", i + 1)).bold(),
                pair.cluster,
                style(pair.score).yellow()
            ))
            .ok();

            for index in [pair.first, pair.second] {
                let record = &result.records[index];
                let marker = if index == decision.redundant {
                    style("○").dim().to_string()
                } else {
                    style("★").green().to_string()
                };
                let fingerprint = record
                    .digest
                    .as_ref()
                    .map(|d| d.fingerprint.to_string())
                    .unwrap_or_default();

                term.write_line(&format!(
                    "    {} {} {}",
                    marker,
                    display_path(&record.path),
                    style(fingerprint).dim()
                ))
                .ok();
            }
            term.write_line("").ok();
        }
    }

    if !unresolved.is_empty() {
        term.write_line(&format!(
            "  {} {} pairs could not be resolved (image sizes unreadable)",
            style("!").yellow(),
            style(unresolved.len()).yellow()
        ))
        .ok();
        for pair in &unresolved {
            term.write_line(&format!(
                "    {} {}",
                display_path(&result.records[pair.first].path),
                display_path(&result.records[pair.second].path)
            ))
            .ok();
        }
        term.write_line("").ok();
    }

    if verbose {
        for error in &result.errors {
            term.write_line(&format!("  {} {}", style("!").yellow(), error))
                .ok();
        }
    }

    for report in reports {
        print_action_report(term, report, mode);
    }

    if reports.is_empty() || mode == ActionMode::DryRun {
        term.write_line(&format!(
            "{}",
            style("Remember: No files were changed. Pass --apply to act on the plan.").dim()
        ))
        .ok();
    }
}

fn print_action_report(term: &Term, report: &ActionReport, mode: ActionMode) {
    let prefix = match mode {
        ActionMode::DryRun => style("would").dim().to_string(),
        ActionMode::Apply => style("done").green().to_string(),
    };
    let listed = match mode {
        ActionMode::DryRun => &report.planned,
        ActionMode::Apply => &report.applied,
    };

    for action in listed {
        let line = match action {
            FileAction::Delete { path } => format!("delete {}", display_path(path)),
            FileAction::Rename { from, to } => {
                format!("rename {} -> {}", display_path(from), display_path(to))
            }
        };
        term.write_line(&format!("  {} {}", prefix, line)).ok();
    }
    for error in &report.errors {
        term.write_line(&format!("  {} {}", style("✗").red(), error))
            .ok();
    }
    term.write_line("").ok();
}

fn print_json_results(
    result: &PipelineResult,
    reports: &[ActionReport],
    mode: ActionMode,
) -> Result<()> {
    let output = serde_json::json!({
        "total_photos": result.records.len(),
        "fingerprinted": result.fingerprinted(),
        "clusters": result.clusters.len(),
        "duplicate_pairs": result.pairs.len(),
        "duration_ms": result.duration_ms,
        "records": result.records,
        "pairs": result.decisions.iter().map(|d| {
            serde_json::json!({
                "first": d.pair.first,
                "second": d.pair.second,
                "cluster": d.pair.cluster,
                "score": d.pair.score,
                "redundant": d.redundant,
            })
        }).collect::<Vec<_>>(),
        "redundant": result.redundant(),
        "unresolved": result.unresolved(),
        "errors": result.errors.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
        "actions": reports.iter().map(|r| {
            serde_json::json!({
                "mode": mode,
                "planned": r.planned,
                "applied": r.applied,
                "skipped": r.skipped,
                "errors": r.errors.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
            })
        }).collect::<Vec<_>>(),
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_minimal_results(result: &PipelineResult) {
    for index in result.redundant() {
        println!("{}", result.records[index].path.display());
    }
}

fn display_path(path: &Path) -> String {
    let home = dirs::home_dir().unwrap_or_default();
    match path.strip_prefix(&home) {
        Ok(rest) if !home.as_os_str().is_empty() => format!("~/{}", rest.display()),
        _ => path.display().to_string(),
    }
}
