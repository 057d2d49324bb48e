//! # Error Suggestions
//!
//! Turns configuration-level errors into messages that say what went wrong
//! AND how to fix it. Per-repository errors are never routed through here;
//! they already appear in that repository's outcome line.

use std::path::Path;

use crate::defaults::CONFIG_ENV_VAR;
use crate::error::Error;

const STRATEGIES: &[&str] = &["merge", "rebase", "ff-only"];

/// Attach hints to a library error that aborted a whole command.
pub fn explain(err: Error) -> anyhow::Error {
    match err {
        Error::InvalidDirectory { path, message } => invalid_directory(&path, &message),
        Error::InvalidPattern {
            kind,
            pattern,
            message,
        } => invalid_pattern(kind, &pattern, &message),
        Error::InvalidStrategy { value } => unknown_strategy(&value),
        Error::ConfigParse { path, message } => config_invalid(&path, &message),
        Error::InvalidConfig { message } => anyhow::anyhow!(
            "Invalid configuration: {message}\n\n\
             hint: Check the values in your .repo-fleet.yaml"
        ),
        Error::Cancelled => anyhow::anyhow!("Interrupted before all repositories finished"),
        other => anyhow::Error::new(other),
    }
}

/// The scan root cannot be used.
pub fn invalid_directory(path: &Path, message: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Cannot scan {path}: {message}\n\n\
         hint: Pass an existing directory as the DIR argument (default: current directory)",
        path = path.display()
    )
}

/// An include/exclude pattern did not compile.
pub fn invalid_pattern(kind: &str, pattern: &str, message: &str) -> anyhow::Error {
    let hint = if message.contains("unclosed") {
        "hint: Check for unclosed brackets, parentheses, or braces"
    } else if message.contains("repetition") {
        "hint: Repetition operators (+, *, ?) must follow a pattern"
    } else {
        "hint: Patterns are regular expressions, not globs (use '.*' instead of '*')"
    };

    anyhow::anyhow!(
        "Invalid --{kind} pattern: {pattern}\n\
         error: {message}\n\n\
         {hint}\n\
         hint: Patterns match the path relative to DIR, e.g. '^services/'"
    )
}

/// A pull strategy that is not one of the supported values.
pub fn unknown_strategy(value: &str) -> anyhow::Error {
    let did_you_mean = find_similar(value, STRATEGIES)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "Unknown pull strategy: {value}{did_you_mean}\n\n\
         Valid strategies are: {valid}",
        valid = STRATEGIES.join(", ")
    )
}

/// The configuration file could not be read or parsed.
pub fn config_invalid(path: &Path, message: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Configuration file {path} is invalid: {message}\n\n\
         hint: Known keys are max_depth, parallel, include, exclude, include_submodules,\n\
         \x20     ignore_dirty, pull_strategy, protected_branches\n\
         hint: Use --config or {CONFIG_ENV_VAR} to point at a different file",
        path = path.display()
    )
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            (distance <= 2 && distance < input.len()).then_some((candidate, distance))
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Levenshtein distance, single-row variant.
fn edit_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b_chars.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let above = row[j + 1];
            let cost = usize::from(ca != *cb);
            row[j + 1] = (above + 1).min(row[j] + 1).min(diagonal + cost);
            diagonal = above;
        }
    }

    row[b_chars.len()]
}
