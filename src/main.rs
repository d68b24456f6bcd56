//! linkscope - check that downloads and a media library stay hard-linked.
//!
//! Usage:
//!   linkscope scan --a DIR... --b DIR...      Classify files as synced, orphaned or conflicting
//!   linkscope delete --a ... --b ... -c both  Preview (or with --confirm, delete) orphans
//!   linkscope tab ID                          Scan using a saved tab
//!   linkscope config show|init                Inspect or create the settings file
//!   linkscope --help                          Show help

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail, eyre};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use linkscope_core::{
    AppSettings, ColumnSelector, PerColumn, ScanConfig, ScanMode, ScanResult, default_settings_path,
    depth_limit,
};
use linkscope_ops::{
    DeletionAction, DeletionResult, Job, JobOutput, JobRequest, JobStatus, JobTracker,
    TrackerConfig,
};

const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(
    name = "linkscope",
    version,
    about = "Hardlink sync checker for download and media library trees",
    long_about = "linkscope matches files in a downloads tree (column A) against a media \
                  library (column B) by inode identity, reporting which files are linked, \
                  which are orphaned on one side, and which links are ambiguous."
)]
struct Cli {
    /// Settings file (defaults to $LINKSCOPE_CONFIG or config/settings.json)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify files across both columns
    Scan {
        #[command(flatten)]
        roots: Roots,

        /// Treat a folder as linked once any file in it is linked
        #[arg(long)]
        folder: bool,

        /// Column(s) whose folders are aggregated in folder mode (a, b, both)
        #[arg(long, default_value = "a", requires = "folder")]
        check: ColumnSelector,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete orphaned files (dry run unless --confirm is given)
    Delete {
        #[command(flatten)]
        roots: Roots,

        /// Column(s) to delete orphans from (a, b, both)
        #[arg(short, long)]
        column: ColumnSelector,

        /// Actually delete files
        #[arg(long)]
        confirm: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Scan using a saved tab
    Tab {
        /// Tab id (e.g. "movies")
        id: String,

        /// Maximum depth to descend (-1 = unlimited)
        #[arg(short = 'd', long, default_value_t = -1, allow_negative_numbers = true)]
        max_depth: i64,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Inspect or create the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective settings
    Show,
    /// Write the default settings file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct Roots {
    /// Source roots (column A, e.g. downloads)
    #[arg(short = 'a', long = "a", required = true, num_args = 1..)]
    a: Vec<PathBuf>,

    /// Destination roots (column B, e.g. media library)
    #[arg(short = 'b', long = "b", required = true, num_args = 1..)]
    b: Vec<PathBuf>,

    /// Maximum depth to descend (-1 = unlimited)
    #[arg(short = 'd', long, default_value_t = -1, allow_negative_numbers = true)]
    max_depth: i64,

    /// Threads for directory reads (0 = auto)
    #[arg(short = 'j', long, default_value_t = 0)]
    threads: usize,
}

impl Roots {
    fn scan_config(&self) -> Result<ScanConfig> {
        ScanConfig::builder()
            .roots_a(self.a.clone())
            .roots_b(self.b.clone())
            .max_depth(depth_limit(self.max_depth))
            .threads(self.threads)
            .build()
            .context("Invalid scan configuration")
    }
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
    init_tracing();

    let cli = Cli::parse();
    let settings_path = cli.settings.unwrap_or_else(default_settings_path);
    tracing::debug!(path = %settings_path.display(), "settings file");
    let default_labels = PerColumn::new("A".to_string(), "B".to_string());

    match cli.command {
        Command::Scan {
            roots,
            folder,
            check,
            format,
        } => {
            let config = roots.scan_config()?;
            let request = if folder {
                JobRequest::ScanFolder { config, check }
            } else {
                JobRequest::ScanFile { config }
            };
            run_scan(request, format, &default_labels).await?;
        }
        Command::Delete {
            roots,
            column,
            confirm,
            format,
        } => {
            let request = JobRequest::DeleteOrphans {
                config: roots.scan_config()?,
                columns: column,
                dry_run: !confirm,
            };
            run_delete(request, format).await?;
        }
        Command::Tab {
            id,
            max_depth,
            format,
        } => {
            let settings = AppSettings::load(&settings_path);
            let tab = settings.tab(&id)?;
            let config = tab.scan_config(depth_limit(max_depth))?;
            let request = match tab.scan_mode {
                ScanMode::File => JobRequest::ScanFile { config },
                ScanMode::Folder => JobRequest::ScanFolder {
                    config,
                    check: tab.check_column,
                },
            };
            eprintln!("{} ({} mode)", tab.name, tab.scan_mode);
            let labels = PerColumn::new(tab.name_a.clone(), tab.name_b.clone());
            run_scan(request, format, &labels).await?;
        }
        Command::Config { action } => match action {
            ConfigAction::Show => show_settings(&settings_path)?,
            ConfigAction::Init { force } => init_settings(&settings_path, force)?,
        },
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG`.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "linkscope=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Submit a job and poll it to completion, drawing progress on stderr.
async fn run_job(request: JobRequest) -> Result<JobOutput> {
    let tracker = JobTracker::start(TrackerConfig::default());
    let id = tracker.submit(request).await;

    let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
    let job = loop {
        ticker.tick().await;
        let job = tracker.get(id)?;
        draw_progress(&job);
        if !job.is_running() {
            eprintln!();
            break job;
        }
    };
    tracker.shutdown();

    match (job.status, job.result) {
        (JobStatus::Completed, Some(output)) => Ok(output),
        (status, _) => Err(eyre!(
            "{} job {} ended with status {}: {}",
            job.kind,
            job.id,
            status,
            job.error.as_deref().unwrap_or("no result")
        )),
    }
}

fn draw_progress(job: &Job) {
    let item = job.current_item.as_deref().unwrap_or("");
    let mut stderr = std::io::stderr().lock();
    let _ = write!(
        stderr,
        "\r{:>5.1}% {:>8}/{:<8} {:<40}",
        job.percentage(),
        job.progress,
        job.total,
        truncate(item, 40)
    );
    let _ = stderr.flush();
}

async fn run_scan(request: JobRequest, format: OutputFormat, labels: &PerColumn<String>) -> Result<()> {
    let output = run_job(request).await?;
    let Some(result) = output.as_scan() else {
        bail!("Scan job returned no scan result");
    };

    match format {
        OutputFormat::Text => print_scan(result, labels),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
    }
    Ok(())
}

async fn run_delete(request: JobRequest, format: OutputFormat) -> Result<()> {
    let output = run_job(request).await?;
    let Some(result) = output.as_deletion() else {
        bail!("Delete job returned no deletion result");
    };

    match format {
        OutputFormat::Text => print_deletion(result),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
    }
    Ok(())
}

fn print_scan(result: &ScanResult, labels: &PerColumn<String>) {
    println!();
    println!("{}", "─".repeat(70));
    println!(
        " {} synced, {} orphaned in {}, {} orphaned in {}, {} conflicts",
        result.synced.len(),
        result.orphans_a.len(),
        labels.a,
        result.orphans_b.len(),
        labels.b,
        result.conflicts.len()
    );
    println!("{}", "─".repeat(70));

    if result.is_clean() {
        println!();
        println!(" Everything is linked.");
    }

    print_paths(&format!("Orphaned in {}", labels.a), &result.orphans_a);
    print_paths(&format!("Orphaned in {}", labels.b), &result.orphans_b);

    if !result.conflicts.is_empty() {
        println!();
        println!(" Conflicts:");
        for conflict in &result.conflicts {
            for path in &conflict.paths_a {
                println!("   {}: {}", labels.a, path.display());
            }
            for path in &conflict.paths_b {
                println!("   {}: {}", labels.b, path.display());
            }
            println!();
        }
    }

    if let Some(folders) = &result.synced_folders {
        let linked = folders.a.len() + folders.b.len();
        println!();
        println!(" {linked} linked folder(s)");
    }

    if !result.errors.is_empty() {
        println!();
        println!(" {} error(s) during scan:", result.errors.len());
        for error in &result.errors {
            println!("   {error}");
        }
    }
}

fn print_deletion(result: &DeletionResult) {
    let verb = if result.dry_run { "Would delete" } else { "Deleted" };

    println!();
    println!("{}", "─".repeat(70));
    println!(
        " {} {} file(s), {}",
        verb,
        result.total_deleted,
        format_size(result.bytes())
    );
    println!("{}", "─".repeat(70));
    println!();

    for file in &result.deleted_files {
        let marker = match file.action {
            DeletionAction::WouldDelete => "~",
            DeletionAction::Deleted => "-",
        };
        println!(" {} {:>10}  {}", marker, format_size(file.size), file.path.display());
    }

    if !result.errors.is_empty() {
        println!();
        println!(
            " {} error(s), {} during deletion:",
            result.errors.len(),
            result.total_errors
        );
        for error in &result.errors {
            println!("   {error}");
        }
    }

    if result.dry_run && result.total_deleted > 0 {
        println!();
        println!(" Dry run: nothing was removed. Re-run with --confirm to delete.");
    }
}

fn print_paths(title: &str, paths: &[PathBuf]) {
    if paths.is_empty() {
        return;
    }
    println!();
    println!(" {} ({}):", title, paths.len());
    for path in paths {
        println!("   {}", path.display());
    }
}

fn show_settings(path: &Path) -> Result<()> {
    let settings = AppSettings::load(path);
    eprintln!("Settings: {}", path.display());
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

fn init_settings(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    AppSettings::default().save(path)?;
    eprintln!("Wrote default settings to {}", path.display());
    Ok(())
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Truncate a string to at most `max_chars` characters, keeping the end.
fn truncate(s: &str, max_chars: usize) -> String {
    let count = s.chars().count();
    if count <= max_chars {
        s.to_string()
    } else {
        let tail: String = s.chars().skip(count - max_chars + 1).collect();
        format!("…{tail}")
    }
}
