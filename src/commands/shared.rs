//! Flags and plumbing shared by every bulk subcommand.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;

use repo_fleet::bulk::{self, BulkOptions};
use repo_fleet::cancel::CancelToken;
use repo_fleet::config::FleetConfig;
use repo_fleet::defaults::CONFIG_ENV_VAR;
use repo_fleet::dispatch::ProgressFn;
use repo_fleet::git::SystemGit;
use repo_fleet::outcome::BatchResult;
use repo_fleet::output::{self, OutputConfig};
use repo_fleet::pipeline::{PipelineOptions, SyncOperation};
use repo_fleet::scanner::ScanOptions;
use repo_fleet::suggestions;

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// One line per repository followed by a summary
    #[default]
    Text,
    /// The whole batch result as JSON
    Json,
}

/// Flags accepted by every command that walks a directory of repositories.
#[derive(Args, Debug, Clone)]
pub struct BulkArgs {
    /// Directory to scan for repositories.
    #[arg(value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// How many directory levels below DIR to search.
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// How many repositories to process at once.
    #[arg(short = 'j', long, value_name = "N")]
    pub parallel: Option<usize>,

    /// Only process repositories whose relative path matches this regex.
    #[arg(long, value_name = "REGEX")]
    pub include: Option<String>,

    /// Skip repositories whose relative path matches this regex.
    #[arg(long, value_name = "REGEX")]
    pub exclude: Option<String>,

    /// Also treat submodules as separate repositories.
    #[arg(long)]
    pub include_submodules: bool,

    /// Report what would happen without changing anything.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Do not report uncommitted changes on outcomes.
    #[arg(long)]
    pub ignore_dirty: bool,

    /// Output format.
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Configuration file with defaults for these flags.
    #[arg(long, value_name = "FILE", env = CONFIG_ENV_VAR)]
    pub config: Option<PathBuf>,
}

impl BulkArgs {
    pub fn load_config(&self) -> Result<FleetConfig> {
        FleetConfig::load(self.config.as_deref()).map_err(suggestions::explain)
    }

    /// Merge flags over the configuration file. Flags win.
    pub fn options(&self, config: &FleetConfig) -> BulkOptions {
        BulkOptions {
            root: self.dir.clone(),
            scan: ScanOptions {
                max_depth: self.max_depth.unwrap_or_else(|| config.max_depth()),
                include_submodules: self.include_submodules
                    || config.include_submodules.unwrap_or(false),
            },
            include: self.include.clone().or_else(|| config.include.clone()),
            exclude: self.exclude.clone().or_else(|| config.exclude.clone()),
            parallel: self.parallel.unwrap_or_else(|| config.parallel()),
            pipeline: PipelineOptions {
                dry_run: self.dry_run,
                ignore_dirty: self.ignore_dirty || config.ignore_dirty.unwrap_or(false),
            },
        }
    }
}

/// A progress bar on stderr, only when someone is watching it.
pub fn progress_bar(format: OutputFormat) -> Option<ProgressBar> {
    if format != OutputFormat::Text || !console::Term::stderr().is_term() {
        return None;
    }
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template("{spinner} [{bar:30}] {pos}/{len} {wide_msg}")
        .map(|s| s.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(120));
    Some(bar)
}

/// Run `op` over the fleet, print the report, and pick the exit code.
pub fn run(args: &BulkArgs, config: &FleetConfig, op: &dyn SyncOperation, output: &OutputConfig) -> Result<ExitCode> {
    let options = args.options(config);
    debug!("running {} with {:?}", op.name(), options);

    let bar = progress_bar(args.format);
    let report = |current: usize, total: usize, path: &Path| {
        if let Some(bar) = &bar {
            bar.set_length(total as u64);
            bar.set_position(current.saturating_sub(1) as u64);
            let name = path.file_name().unwrap_or(path.as_os_str());
            bar.set_message(name.to_string_lossy().into_owned());
        }
    };
    let progress: Option<&ProgressFn<'_>> = bar.as_ref().map(|_| &report as &ProgressFn<'_>);

    let result = bulk::run(&options, op, &SystemGit::new(), &CancelToken::new(), progress);
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }
    let result = result.map_err(suggestions::explain)?;

    print_result(args.format, output, &result)?;
    Ok(exit_code(&result))
}

pub fn print_result(format: OutputFormat, output: &OutputConfig, result: &BatchResult) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", output::render_text(output, result)),
        OutputFormat::Json => println!("{}", output::render_json(result)?),
    }
    Ok(())
}

/// 1 when any repository failed, else 0.
pub fn exit_code(result: &BatchResult) -> ExitCode {
    if result.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
