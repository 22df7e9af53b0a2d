//! Show selection strategies
//!
//! When a name search yields several candidates, a [`ShowSelector`] decides
//! which one the client continues with.

use crate::model::ShowSummary;
use thiserror::Error;
use tracing::debug;

/// Errors a selection strategy can raise
#[derive(Debug, Error)]
pub enum SelectionError {
    /// The user declined to choose a candidate
    #[error("Show selection aborted by user")]
    Aborted,

    #[error("Failed to prompt for a show: {0}")]
    Prompt(String),
}

/// Picks exactly one show out of a non-empty list of search candidates
pub trait ShowSelector: Send + Sync {
    fn select<'a>(
        &self,
        candidates: &'a [ShowSummary],
    ) -> Result<&'a ShowSummary, SelectionError>;
}

/// Non-interactive strategy that always takes the best-ranked candidate
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstResult;

impl ShowSelector for FirstResult {
    fn select<'a>(
        &self,
        candidates: &'a [ShowSummary],
    ) -> Result<&'a ShowSummary, SelectionError> {
        debug!(candidates = candidates.len(), "Selecting first search result");
        candidates.first().ok_or(SelectionError::Aborted)
    }
}

/// Interactive strategy asking on the terminal
///
/// A single candidate is taken without asking. Pressing Escape or `q` at the
/// prompt aborts the selection.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSelector;

impl ShowSelector for ConsoleSelector {
    fn select<'a>(
        &self,
        candidates: &'a [ShowSummary],
    ) -> Result<&'a ShowSummary, SelectionError> {
        if candidates.len() <= 1 {
            return FirstResult.select(candidates);
        }

        debug!(candidates = candidates.len(), "Prompting for show selection");
        let labels: Vec<String> = candidates
            .iter()
            .map(|candidate| format!("{} (id {})", candidate, candidate.id()))
            .collect();

        let choice = dialoguer::Select::new()
            .with_prompt("Select a show")
            .items(&labels)
            .default(0)
            .interact_opt()
            .map_err(|e| SelectionError::Prompt(e.to_string()))?;

        match choice {
            Some(index) => candidates.get(index).ok_or(SelectionError::Aborted),
            None => Err(SelectionError::Aborted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::show_fields;
    use serde_json::json;

    fn candidate(id: u64, name: &str) -> ShowSummary {
        ShowSummary::from_normalized(show_fields(&json!({"id": id, "name": name}))).unwrap()
    }

    #[test]
    fn test_first_result() {
        let candidates = vec![candidate(1, "Lost"), candidate(2, "Lost Girl")];
        assert_eq!(FirstResult.select(&candidates).unwrap().id(), 1);
        assert!(matches!(
            FirstResult.select(&[]),
            Err(SelectionError::Aborted)
        ));
    }

    #[test]
    fn test_console_takes_single_candidate_without_prompt() {
        let candidates = vec![candidate(7, "Scrubs")];
        assert_eq!(ConsoleSelector.select(&candidates).unwrap().id(), 7);
    }
}
