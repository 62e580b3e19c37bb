//! Unified error type for all operations.
//!
//! Every provider maps its native errors into [`LlmError`], giving
//! callers a single type to match against regardless of which backend
//! is in use. The reasoning filter and the tool loop add their own
//! contract-violation variants to the same register.
//!
//! # Retryable vs. continuable
//!
//! Two orthogonal classifications:
//!
//! - [`is_retryable`](LlmError::is_retryable) — the request might
//!   succeed if sent again (rate limits, timeouts). Retry policy lives
//!   outside this crate; the flag only classifies.
//! - [`is_continuable`](LlmError::is_continuable) — a requested feature
//!   wasn't honored but execution can proceed without it. See
//!   [`IgnoreUnsupported`](crate::compat::IgnoreUnsupported) for a
//!   wrapper that avoids these up-front.

use serde_json::Value;

/// The unified error type returned by all provider operations.
///
/// Variants are `#[non_exhaustive]` — new error kinds may be added in
/// minor releases without breaking downstream matches (always include a
/// wildcard arm).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LlmError {
    /// An HTTP-level failure (transport error, unexpected status code).
    ///
    /// `status` is `None` when the request never received a response
    /// (e.g. DNS failure, connection reset).
    #[error("HTTP error (status={status:?}): {message}")]
    Http {
        /// The HTTP status code, if one was received.
        status: Option<http::StatusCode>,
        /// A human-readable description of the failure.
        message: String,
        /// Whether the caller should retry this request.
        retryable: bool,
    },

    /// The API key or token was rejected.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The request was malformed (missing fields, invalid parameters).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A provider-specific error that doesn't map to another variant.
    #[error("Provider error ({code}): {message}")]
    Provider {
        /// Provider-defined error code (e.g. `"overloaded"`).
        code: String,
        /// Human-readable error description.
        message: String,
        /// Whether the caller should retry this request.
        retryable: bool,
    },

    /// The response body could not be parsed.
    #[error("Response format error: {message}")]
    ResponseFormat {
        /// What went wrong during parsing.
        message: String,
        /// The raw response body, for diagnostics.
        raw: String,
    },

    /// The operation exceeded its deadline.
    #[error("Operation timed out after {elapsed_ms}ms")]
    Timeout {
        /// Milliseconds elapsed before the timeout fired.
        elapsed_ms: u64,
    },

    /// Caller misconfiguration, e.g. starting a tool loop with an empty
    /// registry.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A structured-output value failed JSON Schema validation.
    #[error("Schema validation error: {message}")]
    SchemaValidation {
        /// Concatenated validation error messages.
        message: String,
        /// The schema the value was validated against.
        schema: Value,
        /// The value that failed validation.
        actual: Value,
    },

    /// The reasoning filter observed non-whitespace content before the
    /// expected start delimiter.
    ///
    /// The provider is not following the tagging convention this filter
    /// was configured for. The offending prefix is carried for
    /// diagnostics.
    #[error("unexpected content before reasoning start tag: {prefix:?}")]
    UnexpectedPrefix {
        /// The content that preceded the start delimiter.
        prefix: String,
    },

    /// The reasoning filter was applied to a response that already
    /// contains structured reasoning blocks.
    ///
    /// Stacking the filter onto a provider that natively separates
    /// reasoning is a programming error, not a data condition.
    #[error("response already contains reasoning content; filter must not be stacked")]
    UnexpectedReasoning,

    /// Streaming counterpart of [`UnexpectedReasoning`](Self::UnexpectedReasoning):
    /// a fragment arrived already carrying a reasoning delta.
    #[error("stream already carries reasoning deltas; filter must not be stacked")]
    UnexpectedReasoningFragment,

    /// The model requested a tool that is not registered.
    #[error("unknown tool requested: {name}")]
    UnknownTool {
        /// The tool name the model asked for.
        name: String,
    },

    /// Tool calls were present but execution produced no results.
    ///
    /// A defensive invariant of the tool loop — should be unreachable,
    /// and fatal if it is not.
    #[error("tool calls were present but produced no results")]
    NoToolResult,

    /// The provider does not support a requested feature.
    ///
    /// Continuable: callers (or [`IgnoreUnsupported`](crate::compat::IgnoreUnsupported))
    /// may drop the feature and proceed.
    #[error("provider does not support {feature}")]
    Unsupported {
        /// The feature that was requested.
        feature: String,
    },
}

impl LlmError {
    /// Returns `true` if the error is transient and the request may
    /// succeed on retry.
    ///
    /// # Example
    ///
    /// ```rust
    /// use llm_conduit::LlmError;
    ///
    /// let err = LlmError::Timeout { elapsed_ms: 5000 };
    /// assert!(err.is_retryable());
    ///
    /// let err = LlmError::Auth("bad key".into());
    /// assert!(!err.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { retryable, .. } | Self::Provider { retryable, .. } => *retryable,
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if execution can proceed without the feature that
    /// triggered this error.
    pub fn is_continuable(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::ResponseFormat {
            message: err.to_string(),
            raw: String::new(),
        }
    }
}
