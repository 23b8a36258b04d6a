//! Status command presentation: counts tables and verify reports.

use crate::cli::presentation::shared::format_section_heading;
use crate::types::State;
use crate::workspace::{CleanResult, StatusResult, StatusShowResult, VerifyResult};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

pub fn format_status_result_text(result: &StatusResult) -> String {
    let mut out = format!(
        "{}\n\n",
        format_section_heading(&format!("Status of {} ({})", result.repository, result.copy))
    );
    if result.database_empty {
        out.push_str(&format!("{}\n\n", "Database is empty: every file is new.".yellow()));
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["State", "Entries"]);
    for state in State::ALL {
        table.add_row(vec![state.as_str().to_string(), result.counts.get(state).to_string()]);
    }
    table.add_row(vec!["total".to_string(), result.counts.total().to_string()]);
    out.push_str(&format!("{}\n\n", table));
    out.push_str(&format!("Status files written to {}", result.status_dir.display()));
    out
}

pub fn format_status_show_text(result: &StatusShowResult) -> String {
    let mut out = format!(
        "{}\n\n",
        format_section_heading(&format!("Status files of {} ({})", result.repository, result.copy))
    );
    out.push_str(&format!("  Directory: {}\n\n", result.status_dir.display()));
    if result.counts.values().all(Option::is_none) {
        out.push_str("No status recorded. Run `treedb status` first.");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["State", "Lines"]);
    for (state, count) in &result.counts {
        let count = count
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![state.as_str().to_string(), count]);
    }
    out.push_str(&table.to_string());
    out
}

pub fn format_verify_result_text(result: &VerifyResult) -> String {
    let report = &result.report;
    let checked: usize = report.checked.values().sum();
    if report.is_ok() {
        return format!(
            "{} {} entries of {} ({}) still hold",
            "✓".green(),
            checked,
            result.repository,
            result.copy
        );
    }

    let mut out = format!(
        "{} {} of {} entries no longer hold\n\n",
        "✗".red(),
        report.problems.len(),
        checked
    );
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["State", "Path", "Problem"]);
    for problem in &report.problems {
        table.add_row(vec![
            problem.state.as_str().to_string(),
            problem.path.clone(),
            problem.reason.clone(),
        ]);
    }
    out.push_str(&table.to_string());
    out
}

pub fn format_clean_result_text(result: &CleanResult) -> String {
    format!("Removed status files in {}", result.status_dir.display())
}
