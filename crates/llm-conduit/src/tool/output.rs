//! Tool output types.

/// Output returned by a tool handler.
///
/// Contains the content string that will be sent back to the model.
/// Handlers with structured data should `serde_json::to_string()` it —
/// providers expect tool results as text.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// The content to return to the model.
    pub content: String,
}

impl ToolOutput {
    /// Creates a new tool output with the given content.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

impl From<String> for ToolOutput {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ToolOutput {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
