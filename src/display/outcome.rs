//! Per-item outcome formatting
//!
//! Formats the itemized site/app lists printed after backup and restore.

use crate::models::{ItemOutcome, ItemStatus, OutcomeTally};

/// Format outcomes as an aligned table under `title`
pub fn format_outcomes(title: &str, outcomes: &[ItemOutcome]) -> String {
    let mut output = format!("{}\n", title);

    if outcomes.is_empty() {
        output.push_str("  (none)\n");
        return output;
    }

    let name_width = outcomes
        .iter()
        .map(|o| o.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    for outcome in outcomes {
        let (status, detail) = match &outcome.status {
            ItemStatus::Success => ("ok", ""),
            ItemStatus::Skipped { reason } => ("skipped", reason.as_str()),
            ItemStatus::Collision { reason } => ("collision", reason.as_str()),
            ItemStatus::Failed { reason } => ("FAILED", reason.as_str()),
        };
        let line = format!(
            "  {:<name_width$}  {:<9}  {}",
            outcome.name,
            status,
            detail,
            name_width = name_width,
        );
        output.push_str(line.trim_end());
        output.push('\n');
    }

    output.push_str(&format!("  {}\n", OutcomeTally::from_outcomes(outcomes)));
    output
}
