use anyhow::Context;
use clap::{Parser, ValueEnum};
use fcompare_common::{
    load_config, AppConfig, Axis, AxisOutcome, AxisSelection, ComparisonReport, ContentReport,
    HashAlgorithm, HashComparison, IdentityResult, RestrictedModeSetting, SizeComparison,
};
use fcompare_core::ComparisonEngine;
use std::fmt;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const FALLBACK_WIDTH: usize = 80;

#[derive(Parser)]
#[command(name = "fcompare")]
#[command(author = "FCompare Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Compare two files using several methods", long_about = None)]
#[command(
    after_help = "Example: fcompare --file1 /path/to/file1 --file2 /path/to/file2 [--hash] [--size] [--compare] [--symlink]"
)]
struct Cli {
    /// Path to the first file
    #[arg(long)]
    file1: PathBuf,

    /// Path to the second file
    #[arg(long)]
    file2: PathBuf,

    /// Output hash information
    #[arg(long)]
    hash: bool,

    /// Output file size comparison
    #[arg(long)]
    size: bool,

    /// Output file comparison results
    #[arg(long)]
    compare: bool,

    /// Output symlink information
    #[arg(long)]
    symlink: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Override restricted-mode (FIPS) detection
    #[arg(long, value_enum)]
    restricted_mode: Option<RestrictedModeArg>,

    /// Prefer a config file next to the executable
    #[arg(long)]
    portable: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum RestrictedModeArg {
    Auto,
    On,
    Off,
}

impl From<RestrictedModeArg> for RestrictedModeSetting {
    fn from(arg: RestrictedModeArg) -> Self {
        match arg {
            RestrictedModeArg::Auto => RestrictedModeSetting::Auto,
            RestrictedModeArg::On => RestrictedModeSetting::On,
            RestrictedModeArg::Off => RestrictedModeSetting::Off,
        }
    }
}

impl Cli {
    fn requested_axes(&self) -> Vec<Axis> {
        [
            (self.hash, Axis::Hash),
            (self.size, Axis::Size),
            (self.compare, Axis::Content),
            (self.symlink, Axis::Identity),
        ]
        .into_iter()
        .filter_map(|(flag, axis)| flag.then_some(axis))
        .collect()
    }
}

fn main() {
    // Initialize tracing to stderr (so the report and JSON go cleanly to stdout)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("Comparison failed: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let loaded = load_config(cli.portable).context("loading configuration")?;
    info!("Using configuration {}", loaded.path.display());

    let mut config = loaded.config;
    if let Some(mode) = cli.restricted_mode {
        config.restricted_mode = mode.into();
    }

    let axes = select_axes(&cli.requested_axes(), &config);
    let engine = ComparisonEngine::from_config(&config);
    let report = engine.compare(&cli.file1, &cli.file2, &axes);

    if cli.json {
        let output = serde_json::to_string_pretty(&report)?;
        println!("{output}");
        return Ok(());
    }

    print!("{}", TextReport::new(&report, terminal_width()));
    Ok(())
}

/// Explicit flags win; otherwise the configured default axes; otherwise all.
fn select_axes(requested: &[Axis], config: &AppConfig) -> AxisSelection {
    if !requested.is_empty() {
        return requested.iter().copied().collect();
    }
    config.default_axes.iter().copied().collect()
}

fn terminal_width() -> usize {
    if !std::io::stdout().is_terminal() {
        return FALLBACK_WIDTH;
    }
    match crossterm::terminal::size() {
        Ok((cols, _)) if cols > 0 => cols as usize,
        _ => FALLBACK_WIDTH,
    }
}

/// Human-readable report, one divider-separated block per axis
struct TextReport<'a> {
    report: &'a ComparisonReport,
    width: usize,
}

impl<'a> TextReport<'a> {
    fn new(report: &'a ComparisonReport, width: usize) -> Self {
        Self { report, width }
    }

    fn write_hashes(&self, f: &mut fmt::Formatter<'_>, hashes: &HashComparison) -> fmt::Result {
        let (file1, file2) = (self.report.path_a.display(), self.report.path_b.display());
        writeln!(f, "Restricted mode: {}", hashes.restricted_mode)?;
        for algorithm in [HashAlgorithm::Md5, HashAlgorithm::Sha1] {
            let (Some(left), Some(right)) =
                (hashes.left.get(algorithm), hashes.right.get(algorithm))
            else {
                continue;
            };
            writeln!(f, "{file1} {} hash: {left}", algorithm.label())?;
            writeln!(f, "{file2} {} hash: {right}", algorithm.label())?;
        }
        Ok(())
    }

    fn write_sizes(&self, f: &mut fmt::Formatter<'_>, sizes: &SizeComparison) -> fmt::Result {
        writeln!(f, "{} size (bytes): {}", self.report.path_a.display(), sizes.size_a)?;
        writeln!(f, "{} size (bytes): {}", self.report.path_b.display(), sizes.size_b)?;
        writeln!(f, "Size difference (bytes): {}", sizes.delta)?;
        writeln!(f, "Are the same size: {}", sizes.equal)
    }

    fn write_content(&self, f: &mut fmt::Formatter<'_>, content: &ContentReport) -> fmt::Result {
        for verdict in [content.shallow, content.deep] {
            writeln!(
                f,
                "Byte comparing {} and {} ({}). Result: {}",
                self.report.path_a.display(),
                self.report.path_b.display(),
                verdict.mode,
                verdict.equal
            )?;
        }
        Ok(())
    }

    fn write_identity(&self, f: &mut fmt::Formatter<'_>, identity: &IdentityResult) -> fmt::Result {
        let (file1, file2) = (self.report.path_a.display(), self.report.path_b.display());
        writeln!(f, "Is {file1} a symlink: {}", identity.is_symlink_a)?;
        writeln!(f, "Is {file2} a symlink: {}", identity.is_symlink_b)?;
        writeln!(
            f,
            "Are {file1} and {file2} the same file on disk: {}",
            identity.same_filesystem_entity
        )
    }

    fn write_block<T>(
        &self,
        f: &mut fmt::Formatter<'_>,
        outcome: Option<&AxisOutcome<T>>,
        write_success: impl FnOnce(&Self, &mut fmt::Formatter<'_>, &T) -> fmt::Result,
    ) -> fmt::Result {
        let Some(outcome) = outcome else {
            return Ok(());
        };
        writeln!(f, "{}", "-".repeat(self.width))?;
        match outcome {
            AxisOutcome::Success(value) => write_success(self, f, value),
            AxisOutcome::Failure(err) => writeln!(f, "Error: {err}"),
        }
    }
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_block(f, self.report.hash.as_ref(), Self::write_hashes)?;
        self.write_block(f, self.report.size.as_ref(), Self::write_sizes)?;
        self.write_block(f, self.report.content.as_ref(), Self::write_content)?;
        self.write_block(f, self.report.identity.as_ref(), Self::write_identity)
    }
}
