//! Review of a staging directory before changes are applied.

use crate::error::ApiError;
use crate::treat::staging::StagingArea;
use std::process::Command;
use tracing::{debug, info};

/// What to do once the reviewer is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Apply,
    Quit,
}

/// Inspects a staging area and decides whether to go on.
///
/// The reviewer marks an entry as removed by deleting its link from
/// `staging.dir()`. With `read_only` nothing is applied whatever the
/// decision.
pub trait Review {
    fn review(&mut self, staging: &StagingArea, read_only: bool) -> Result<ReviewDecision, ApiError>;
}

impl<F> Review for F
where
    F: FnMut(&StagingArea, bool) -> Result<ReviewDecision, ApiError>,
{
    fn review(&mut self, staging: &StagingArea, read_only: bool) -> Result<ReviewDecision, ApiError> {
        self(staging, read_only)
    }
}

/// Interactive review on the terminal, optionally opening a file browser.
#[derive(Debug, Clone, Default)]
pub struct TerminalReview {
    file_browser: Option<String>,
}

impl TerminalReview {
    pub fn new(file_browser: Option<String>) -> Self {
        Self { file_browser }
    }

    fn open_browser(&self, browser: &str, staging: &StagingArea) -> Result<(), ApiError> {
        debug!(browser, dir = %staging.dir().display(), "Opening file browser");
        Command::new(browser)
            .arg(staging.dir())
            .spawn()
            .map(|_| ())
            .map_err(|e| ApiError::ReviewFailed(format!("Failed to start '{}': {}", browser, e)))
    }
}

impl Review for TerminalReview {
    fn review(&mut self, staging: &StagingArea, read_only: bool) -> Result<ReviewDecision, ApiError> {
        use dialoguer::{Confirm, Select};

        let hint = if read_only {
            "Review only, nothing will be changed."
        } else {
            "Delete the links of entries that should not be treated."
        };
        let prompt = format!(
            "{} entries staged in {}. {}",
            staging.len(),
            staging.dir().display(),
            hint
        );

        let mut items = Vec::new();
        if let Some(browser) = &self.file_browser {
            items.push(format!("Open in {}", browser));
        }
        items.push("Continue".to_string());
        items.push("Quit".to_string());

        loop {
            let selection = Select::new()
                .with_prompt(&prompt)
                .items(&items)
                .default(0)
                .interact()
                .map_err(|e| ApiError::ReviewFailed(format!("Failed to get user input: {}", e)))?;

            if selection == items.len() - 1 {
                info!("Review cancelled");
                return Ok(ReviewDecision::Quit);
            }
            match (&self.file_browser, selection) {
                (Some(browser), 0) => self.open_browser(browser, staging)?,
                _ => break,
            }
        }

        if read_only {
            return Ok(ReviewDecision::Quit);
        }

        let confirmed = Confirm::new()
            .with_prompt("Apply changes for the remaining links?")
            .interact()
            .map_err(|e| ApiError::ReviewFailed(format!("Failed to get user input: {}", e)))?;

        Ok(if confirmed {
            ReviewDecision::Apply
        } else {
            ReviewDecision::Quit
        })
    }
}
