//! Per-item outcomes
//!
//! Backup and restore never stop because one site or app failed. Each item
//! gets an `ItemOutcome` and the caller reads the aggregate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What happened to a single site or app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemStatus {
    /// Copied, extracted or recorded
    Success,
    /// Left alone on purpose (a skip flag, nothing to do)
    Skipped { reason: String },
    /// Already present at the destination and not overwritten
    Collision { reason: String },
    /// Failed; processing continued with the next item
    Failed { reason: String },
}

/// Outcome for one named item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub name: String,
    #[serde(flatten)]
    pub status: ItemStatus,
}

impl ItemOutcome {
    pub fn success(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ItemStatus::Success,
        }
    }

    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ItemStatus::Skipped {
                reason: reason.into(),
            },
        }
    }

    pub fn collision(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ItemStatus::Collision {
                reason: reason.into(),
            },
        }
    }

    pub fn failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: ItemStatus::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, ItemStatus::Success)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, ItemStatus::Failed { .. })
    }

    /// Failures and collisions both deserve the caller's attention
    pub fn is_warning(&self) -> bool {
        matches!(
            self.status,
            ItemStatus::Failed { .. } | ItemStatus::Collision { .. }
        )
    }
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            ItemStatus::Success => write!(f, "{}: success", self.name),
            ItemStatus::Skipped { reason } => write!(f, "{}: skipped ({})", self.name, reason),
            ItemStatus::Collision { reason } => {
                write!(f, "{}: collision, skipped ({})", self.name, reason)
            }
            ItemStatus::Failed { reason } => write!(f, "{}: error ({})", self.name, reason),
        }
    }
}

/// Counts over a list of outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeTally {
    pub succeeded: usize,
    pub skipped: usize,
    pub collisions: usize,
    pub failed: usize,
}

impl OutcomeTally {
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a ItemOutcome>) -> Self {
        outcomes
            .into_iter()
            .fold(Self::default(), |mut tally, outcome| {
                match outcome.status {
                    ItemStatus::Success => tally.succeeded += 1,
                    ItemStatus::Skipped { .. } => tally.skipped += 1,
                    ItemStatus::Collision { .. } => tally.collisions += 1,
                    ItemStatus::Failed { .. } => tally.failed += 1,
                }
                tally
            })
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.skipped + self.collisions + self.failed
    }
}

impl fmt::Display for OutcomeTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} skipped, {} collided, {} failed",
            self.succeeded, self.skipped, self.collisions, self.failed
        )
    }
}
