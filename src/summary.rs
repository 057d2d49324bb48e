//! # Result Aggregation
//!
//! Folds a batch's outcomes into a status → count table.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::outcome::OperationOutcome;
use crate::status::{Category, Status};

/// Count of outcomes per status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Summary {
    counts: BTreeMap<Status, usize>,
}

impl Summary {
    pub fn from_outcomes(outcomes: &[OperationOutcome]) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            summary.record(outcome.status);
        }
        summary
    }

    pub fn record(&mut self, status: Status) {
        *self.counts.entry(status).or_insert(0) += 1;
    }

    pub fn count(&self, status: Status) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }

    /// Sum of all counts. Always equals the number of outcomes folded in.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn by_category(&self) -> BTreeMap<Category, usize> {
        let mut categories = BTreeMap::new();
        for (status, count) in &self.counts {
            *categories.entry(status.category()).or_insert(0) += count;
        }
        categories
    }

    pub fn iter(&self) -> impl Iterator<Item = (Status, usize)> + '_ {
        self.counts.iter().map(|(s, c)| (*s, *c))
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.counts.is_empty() {
            return f.write_str("no repositories");
        }
        let parts: Vec<String> = self
            .iter()
            .map(|(status, count)| format!("{} {}", count, status))
            .collect();
        f.write_str(&parts.join(", "))
    }
}
