//! # Output Configuration and Rendering
//!
//! Decides whether the terminal gets colors and symbols, and renders batch
//! results as text or JSON.
//!
//! ## Respecting User Preferences
//!
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals

use std::env;

use console::style;

use crate::outcome::{BatchResult, OperationOutcome};
use crate::status::{Category, Status};

/// Output configuration for controlling colors and symbols.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and symbols should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// `always` forces colors on (overriding `NO_COLOR`), `never` forces them
    /// off, anything else detects from the environment and the terminal.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // Presence alone disables colors, even when empty.
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }
        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns `emoji_str` when colors are enabled, else `plain`.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// The leading symbol for an outcome line.
pub fn status_symbol(config: &OutputConfig, status: Status) -> &'static str {
    match status.category() {
        Category::Success => emoji(config, "✅", "[ok]"),
        Category::Skip => emoji(config, "⏭️ ", "[skip]"),
        Category::Conflict => emoji(config, "⚠️ ", "[warn]"),
        Category::Failure => emoji(config, "❌", "[fail]"),
        Category::DryRun => emoji(config, "🔍", "[plan]"),
    }
}

fn paint(config: &OutputConfig, status: Status) -> String {
    let name = status.as_str();
    if !config.use_color {
        return name.to_string();
    }
    let styled = match status.category() {
        Category::Success => style(name).green(),
        Category::Skip => style(name).dim(),
        Category::Conflict => style(name).yellow(),
        Category::Failure => style(name).red().bold(),
        Category::DryRun => style(name).cyan(),
    };
    styled.force_styling(true).to_string()
}

/// One line per repository: symbol, relative path, status, message.
pub fn render_outcome(config: &OutputConfig, outcome: &OperationOutcome) -> String {
    let mut line = format!(
        "{} {} {}",
        status_symbol(config, outcome.status),
        outcome.relative_path.display(),
        paint(config, outcome.status),
    );
    if !outcome.branch.is_empty() {
        line.push_str(&format!(" [{}]", outcome.branch));
    }
    if !outcome.message.is_empty() {
        line.push_str(&format!(": {}", outcome.message));
    }
    if let Some(error) = &outcome.error {
        if !outcome.message.contains(error.as_str()) {
            line.push_str(&format!("\n    error: {}", error));
        }
    }
    for file in &outcome.conflict_files {
        line.push_str(&format!("\n    conflict: {}", file));
    }
    for warning in &outcome.warnings {
        line.push_str(&format!("\n    warning: {}", warning));
    }
    line
}

/// The full text report: outcome lines, then the totals.
pub fn render_text(config: &OutputConfig, result: &BatchResult) -> String {
    let mut out = String::new();
    for outcome in &result.outcomes {
        out.push_str(&render_outcome(config, outcome));
        out.push('\n');
    }
    if !result.outcomes.is_empty() {
        out.push('\n');
    }
    out.push_str(&format!(
        "{} of {} repositories processed in {:.1}s: {}\n",
        result.total_processed,
        result.total_discovered,
        result.duration.as_secs_f64(),
        result.summary,
    ));
    out
}

pub fn render_json(result: &BatchResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Verdict;
    use crate::summary::Summary;
    use std::path::PathBuf;
    use std::time::Duration;

    fn outcome(status: Status, message: &str) -> OperationOutcome {
        let mut outcome = OperationOutcome::new(
            PathBuf::from("/ws/api"),
            PathBuf::from("api"),
            Verdict::new(status, message),
        );
        outcome.branch = "main".to_string();
        outcome
    }

    #[test]
    fn test_color_flags() {
        assert!(OutputConfig::from_env_and_flag("always").use_color);
        assert!(!OutputConfig::from_env_and_flag("never").use_color);
    }

    #[test]
    fn test_emoji_helper() {
        assert_eq!(emoji(&OutputConfig::with_color(), "🔍", "[plan]"), "🔍");
        assert_eq!(emoji(&OutputConfig::without_color(), "🔍", "[plan]"), "[plan]");
    }

    #[test]
    fn test_plain_outcome_line() {
        let line = render_outcome(
            &OutputConfig::without_color(),
            &outcome(Status::Pulled, "pulled 3 commits (2 files)"),
        );
        assert_eq!(line, "[ok] api pulled [main]: pulled 3 commits (2 files)");
    }

    #[test]
    fn test_conflicts_and_warnings_are_listed() {
        let mut o = outcome(Status::Conflict, "conflicts in 1 file, pull aborted");
        o.conflict_files = vec!["src/lib.rs".to_string()];
        o.warnings = vec!["stash pop: conflict".to_string()];
        let line = render_outcome(&OutputConfig::without_color(), &o);
        assert!(line.starts_with("[warn] api conflict"));
        assert!(line.contains("\n    conflict: src/lib.rs"));
        assert!(line.contains("\n    warning: stash pop: conflict"));
    }

    #[test]
    fn test_text_report_ends_with_summary() {
        let outcomes = vec![outcome(Status::UpToDate, ""), outcome(Status::Error, "boom")];
        let result = BatchResult {
            root: PathBuf::from("/ws"),
            total_discovered: 3,
            total_processed: 2,
            summary: Summary::from_outcomes(&outcomes),
            outcomes,
            duration: Duration::from_millis(1500),
        };
        let text = render_text(&OutputConfig::without_color(), &result);
        assert!(text.ends_with("2 of 3 repositories processed in 1.5s: 1 up-to-date, 1 error\n"));

        let json: serde_json::Value = serde_json::from_str(&render_json(&result).unwrap()).unwrap();
        assert_eq!(json["total_processed"], 2);
        assert_eq!(json["outcomes"][1]["status"], "error");
        assert_eq!(json["summary"]["up-to-date"], 1);
    }
}
