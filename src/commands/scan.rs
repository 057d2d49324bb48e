//! # Scan Command Implementation
//!
//! Lists the repositories a bulk command would process, after the
//! include/exclude patterns are applied. Read-only; no git command is run.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use serde_json::json;

use repo_fleet::bulk;
use repo_fleet::cancel::CancelToken;
use repo_fleet::filter::relative_display;
use repo_fleet::output::{emoji, OutputConfig};
use repo_fleet::suggestions;

use super::shared::{BulkArgs, OutputFormat};

/// List the repositories found under a directory
#[derive(Args, Debug)]
pub struct ScanArgs {
    #[command(flatten)]
    pub bulk: BulkArgs,
}

/// Execute the `scan` command.
pub fn execute(args: ScanArgs, output: &OutputConfig) -> Result<ExitCode> {
    let config = args.bulk.load_config()?;
    let options = args.bulk.options(&config);
    let discovery = bulk::discover(&options, &CancelToken::new()).map_err(suggestions::explain)?;

    let paths: Vec<String> = discovery
        .repositories
        .iter()
        .map(|path| relative_display(&discovery.root, path))
        .collect();

    match args.bulk.format {
        OutputFormat::Json => {
            let report = json!({
                "root": discovery.root,
                "total_discovered": discovery.discovered,
                "repositories": paths,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            for path in &paths {
                println!("{} {}", emoji(output, "📁", "-"), path);
            }
            println!(
                "\n{} of {} repositories selected under {}",
                paths.len(),
                discovery.discovered,
                discovery.root.display()
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}
