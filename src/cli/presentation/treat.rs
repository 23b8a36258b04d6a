//! Treat command presentation.

use crate::cli::presentation::shared::{format_section_heading, format_state};
use crate::treat::TreatOutcome;
use crate::workspace::TreatResult;
use owo_colors::OwoColorize;

pub fn format_treat_result_text(result: &TreatResult) -> String {
    let mut out = String::new();
    for report in &result.reports {
        out.push_str(&format!(
            "{}\n",
            format_section_heading(report.state.label())
        ));
        let outcome = match report.outcome {
            TreatOutcome::Nothing => "nothing to treat".to_string(),
            TreatOutcome::ReadOnly => format!("{} reviewed, read-only on the master copy", report.staged),
            TreatOutcome::Cancelled => format!("{} staged, cancelled", report.staged),
            TreatOutcome::Applied => format!(
                "{} staged, {} applied, {} skipped, {} failed",
                report.staged,
                report.applied.len(),
                report.skipped,
                report.failed.len()
            ),
        };
        out.push_str(&format!("  {} {}\n", format_state(report.state), outcome));
        for applied in &report.applied {
            out.push_str(&format!("  {} {} ({})\n", "✓".green(), applied.path, applied.action));
        }
        for failed in &report.failed {
            out.push_str(&format!(
                "  {} {} ({}): {}\n",
                "✗".red(),
                failed.path,
                failed.action,
                failed.error
            ));
        }
        for stale in &report.stale {
            out.push_str(&format!("  {} {}: {}\n", "⊘".yellow(), stale.path, stale.reason));
        }
        out.push('\n');
    }
    if result.reports.iter().any(|r| !r.applied.is_empty()) {
        out.push_str("Trees changed: run `treedb status` to refresh the status files.");
    }
    out.trim_end().to_string()
}
