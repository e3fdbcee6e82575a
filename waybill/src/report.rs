//! Per-item outcomes of a scenario run.
//!
//! Every document (or bundle) a scenario touches ends up as exactly one
//! [`ItemOutcome`]; nothing is dropped silently. The whole report serialises
//! to JSON for machine consumption.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::compose::PageFault;
use crate::error::{ErrorKind, WaybillError};

/// Which scenario produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// Composite only.
    OneSided,
    /// Composite, then lay out for duplex printing.
    TwoSided,
    /// Bundle ready documents.
    Merge,
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OneSided => "one-sided",
            Self::TwoSided => "two-sided",
            Self::Merge => "merge",
        })
    }
}

/// Serialisable summary of a [`WaybillError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportedError {
    /// Error classification.
    pub kind: ErrorKind,
    /// Display form of the error.
    pub message: String,
}

impl From<&WaybillError> for ReportedError {
    fn from(err: &WaybillError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// What happened to one document or bundle.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ItemOutcome {
    /// An output was produced (or planned, in a dry run).
    Written {
        /// Documents that went into the output.
        inputs: Vec<PathBuf>,
        /// The output file.
        output: PathBuf,
        /// Pages in the output.
        pages: usize,
        /// Stamp applied, if any.
        #[serde(skip_serializing_if = "Option::is_none")]
        stamp: Option<PathBuf>,
        /// Pages that were degraded or dropped.
        #[serde(skip_serializing_if = "Vec::is_empty")]
        faults: Vec<PageFault>,
        /// Nothing was written because this was a dry run.
        dry_run: bool,
    },
    /// The item failed; other items were unaffected.
    Failed {
        /// Documents involved.
        inputs: Vec<PathBuf>,
        /// Why it failed.
        error: ReportedError,
    },
    /// The item was left out on purpose.
    Skipped {
        /// Documents involved.
        inputs: Vec<PathBuf>,
        /// Why it was left out.
        reason: String,
    },
}

impl ItemOutcome {
    /// Outcome for a failed item.
    pub fn failed(inputs: Vec<PathBuf>, err: &WaybillError) -> Self {
        Self::Failed {
            inputs,
            error: err.into(),
        }
    }

    /// Outcome for a skipped item.
    pub fn skipped(inputs: Vec<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Skipped {
            inputs,
            reason: reason.into(),
        }
    }

    /// Documents this outcome concerns.
    pub fn inputs(&self) -> &[PathBuf] {
        match self {
            Self::Written { inputs, .. } | Self::Failed { inputs, .. } | Self::Skipped { inputs, .. } => {
                inputs
            }
        }
    }

    /// Whether an output was produced.
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }

    /// Whether the item failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Outcomes of one scenario run, in processing order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Scenario that ran.
    pub scenario: Scenario,
    /// One outcome per document or bundle.
    pub outcomes: Vec<ItemOutcome>,
    /// Documents still waiting in the merge pool after the run.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remaining: Vec<PathBuf>,
    /// Wall-clock time of the run.
    #[serde(skip)]
    pub elapsed: Duration,
}

impl RunReport {
    /// Empty report for `scenario`.
    pub fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            outcomes: Vec::new(),
            remaining: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Record an outcome.
    pub fn push(&mut self, outcome: ItemOutcome) {
        self.outcomes.push(outcome);
    }

    /// Number of outputs produced.
    pub fn written(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_written()).count()
    }

    /// Number of failed items.
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    /// Number of skipped items.
    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ItemOutcome::Skipped { .. }))
            .count()
    }

    /// Total degraded or dropped pages across written outputs.
    pub fn page_faults(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o {
                ItemOutcome::Written { faults, .. } => faults.len(),
                _ => 0,
            })
            .sum()
    }

    /// Report as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
