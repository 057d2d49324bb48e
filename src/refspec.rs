//! # Refspec Validation
//!
//! Parses push refspecs of the form `[+]source[:destination]` and enforces
//! git's ref-naming rules on each side, so a malformed refspec is reported
//! before anything is sent to a remote.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Prefix of fully-qualified branch refs.
const BRANCH_PREFIX: &str = "refs/heads/";

/// Characters git forbids anywhere in a ref name.
const FORBIDDEN_CHARS: &[char] = &['~', '^', ':', '?', '*', '[', '\\'];

/// Shell metacharacters rejected on top of git's own rules.
const SHELL_CHARS: &[char] = &[';', '&', '|', '$', '`', '<', '>', '(', ')', '"', '\''];

/// A validated push refspec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRefspec {
    pub source: String,
    /// Empty means "same as source".
    pub destination: String,
    pub force: bool,
}

impl ParsedRefspec {
    /// Parse and validate `spec`.
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = |message: &str| Error::InvalidRefspec {
            spec: spec.to_string(),
            message: message.to_string(),
        };

        if spec.is_empty() {
            return Err(invalid("refspec is empty"));
        }
        let (force, body) = match spec.strip_prefix('+') {
            Some(rest) => (true, rest),
            None => (false, spec),
        };

        let mut parts = body.split(':');
        let source = parts.next().unwrap_or_default();
        let destination = parts.next();
        if parts.next().is_some() {
            return Err(invalid("more than one ':'"));
        }
        if source.is_empty() {
            return Err(invalid("source is empty"));
        }
        if destination == Some("") {
            return Err(invalid("destination after ':' is empty"));
        }

        check_ref_name(source).map_err(|m| invalid(&format!("source {}", m)))?;
        if let Some(destination) = destination {
            check_ref_name(destination).map_err(|m| invalid(&format!("destination {}", m)))?;
        }

        Ok(Self {
            source: source.to_string(),
            destination: destination.unwrap_or_default().to_string(),
            force,
        })
    }

    /// Source branch name, without a `refs/heads/` prefix.
    pub fn source_branch(&self) -> &str {
        strip_branch_prefix(&self.source)
    }

    /// Destination branch name, defaulting to the source.
    pub fn destination_branch(&self) -> &str {
        if self.destination.is_empty() {
            self.source_branch()
        } else {
            strip_branch_prefix(&self.destination)
        }
    }
}

impl FromStr for ParsedRefspec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ParsedRefspec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.force {
            f.write_str("+")?;
        }
        f.write_str(&self.source)?;
        if !self.destination.is_empty() {
            write!(f, ":{}", self.destination)?;
        }
        Ok(())
    }
}

fn strip_branch_prefix(name: &str) -> &str {
    name.strip_prefix(BRANCH_PREFIX).unwrap_or(name)
}

/// Validate a single branch or tag name.
pub fn validate_ref_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidRefspec {
            spec: name.to_string(),
            message: "name is empty".to_string(),
        });
    }
    check_ref_name(name).map_err(|message| Error::InvalidRefspec {
        spec: name.to_string(),
        message,
    })
}

/// Apply git's ref-naming rules. Fully-qualified refs (`refs/...`) are
/// checked from the part after the prefix so `refs/heads/main` is accepted.
fn check_ref_name(name: &str) -> std::result::Result<(), String> {
    let name = name.strip_prefix("refs/").unwrap_or(name);
    if name.is_empty() {
        return Err("has nothing after 'refs/'".to_string());
    }

    if let Some(c) = name
        .chars()
        .find(|c| c.is_whitespace() || c.is_control())
    {
        return Err(format!("contains whitespace or control character {:?}", c));
    }
    if let Some(c) = name
        .chars()
        .find(|c| FORBIDDEN_CHARS.contains(c) || SHELL_CHARS.contains(c))
    {
        return Err(format!("contains forbidden character '{}'", c));
    }
    for sequence in ["..", "//", "@{"] {
        if name.contains(sequence) {
            return Err(format!("contains '{}'", sequence));
        }
    }
    if name == "@" {
        return Err("is '@'".to_string());
    }
    if let Some(c) = name.chars().next().filter(|c| matches!(c, '-' | '.' | '/')) {
        return Err(format!("starts with '{}'", c));
    }
    if name.ends_with(".lock") {
        return Err("ends with '.lock'".to_string());
    }
    if let Some(c) = name.chars().last().filter(|c| matches!(c, '.' | '/')) {
        return Err(format!("ends with '{}'", c));
    }
    if name.split('/').any(|component| component.starts_with('.')) {
        return Err("has a path component starting with '.'".to_string());
    }
    Ok(())
}
