//! Shared presentation helpers: headings, state colors, JSON output.

use crate::error::ApiError;
use crate::types::State;
use owo_colors::OwoColorize;
use serde::Serialize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// State name colored by severity.
pub fn format_state(state: State) -> String {
    match state {
        State::Ok => state.as_str().green().to_string(),
        State::Different => state.as_str().red().to_string(),
        State::MissingOnDb => state.as_str().cyan().to_string(),
        State::MissingInFs => state.as_str().yellow().to_string(),
        State::Moved => state.as_str().magenta().to_string(),
    }
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::ConfigError(format!("Failed to serialize output: {}", e)))
}
