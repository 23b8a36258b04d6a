//! Repository presentation: init, update and info.

use crate::cli::presentation::shared::format_section_heading;
use crate::workspace::{InfoResult, InitResult, UpdateResult};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;

pub fn format_init_result_text(result: &InitResult) -> String {
    match result.records {
        Some(records) => format!(
            "Registered {} as master of '{}'\nDatabase {} written with {} records",
            result.workspace_root.display(),
            result.repository,
            result.database.display(),
            records
        ),
        None => format!(
            "Registered {} as copy '{}' of '{}'",
            result.workspace_root.display(),
            result.copy,
            result.repository
        ),
    }
}

pub fn format_update_result_text(result: &UpdateResult) -> String {
    let summary = &result.summary;
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Untouched", "Removed", "Updated", "Added", "Moved"]);
    table.add_row(vec![
        summary.untouched.to_string(),
        summary.removed.to_string(),
        summary.updated.to_string(),
        summary.added.to_string(),
        summary.moved.to_string(),
    ]);
    format!(
        "{}\n\n{}",
        format_section_heading(&format!("Updated database of {}", result.repository)),
        table
    )
}

pub fn format_info_result_text(result: &InfoResult) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Repository"));
    out.push_str(&format!("  Name: {}\n", result.repository));
    out.push_str(&format!("  Copy: {}\n", result.copy));
    out.push_str(&format!("  Workspace: {}\n", result.workspace_root.display()));
    let records = result
        .database_records
        .map(|n| format!("{} records", n))
        .unwrap_or_else(|| "missing".to_string());
    out.push_str(&format!("  Database: {} ({})\n\n", result.database.display(), records));

    out.push_str(&format!("{}\n\n", format_section_heading("Copies")));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Copy", "Directory"]);
    for (name, dir) in &result.copies {
        table.add_row(vec![name.clone(), dir.display().to_string()]);
    }
    out.push_str(&format!("{}\n\n", table));

    out.push_str(&format!("{}\n\n", format_section_heading("Status files")));
    out.push_str(&format!("  Directory: {}\n", result.status_dir.display()));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["State", "Lines"]);
    for (state, count) in &result.status_counts {
        let count = count
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![state.as_str().to_string(), count]);
    }
    out.push_str(&table.to_string());
    out
}
