//! Delimiter pair configuration.

use serde::{Deserialize, Serialize};

/// The start/end delimiter pair that brackets a reasoning section.
///
/// Defaults to `<think>` / `</think>`, the convention used by most
/// open-weight reasoning models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPair {
    /// Opens the reasoning section.
    pub start: String,
    /// Closes the reasoning section.
    pub end: String,
}

impl TagPair {
    /// Creates a delimiter pair.
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

impl Default for TagPair {
    fn default() -> Self {
        Self::new("<think>", "</think>")
    }
}
