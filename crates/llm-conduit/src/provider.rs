//! The generation capability: the [`Provider`] trait and request types.
//!
//! Two abstractions live here:
//!
//! - **[`Provider`]** — the trait every backend implements, using native
//!   async-fn-in-traits. Implementations are plain `async fn`s.
//! - **[`DynProvider`]** — an object-safe mirror using boxed futures,
//!   with a blanket `impl<T: Provider> DynProvider for T`, so any
//!   provider can be stored as `Box<dyn DynProvider>` or
//!   `Arc<dyn DynProvider>` with no boilerplate.
//!
//! Decorators such as [`ExtractReasoning`](crate::reasoning::ExtractReasoning)
//! and [`IgnoreUnsupported`](crate::compat::IgnoreUnsupported) wrap a
//! `Provider` and implement it themselves, so they stack freely.
//!
//! All request configuration lives in [`ChatParams`]. It serializes to
//! JSON for logging and replay, except the transport-level
//! [`timeout`](ChatParams::timeout) and
//! [`extra_headers`](ChatParams::extra_headers) fields, which are
//! `#[serde(skip)]`'d.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chat::{ChatMessage, ChatResponse};
use crate::error::LlmError;
use crate::stream::ChatStream;

/// The core trait every generation backend implements.
///
/// `Provider` is **not** object-safe because async fns in traits return
/// `impl Future`. For dynamic dispatch use [`DynProvider`] — every
/// `Provider` implements it automatically.
pub trait Provider: Send + Sync {
    /// Sends a chat request and returns the complete response.
    fn generate(
        &self,
        params: &ChatParams,
    ) -> impl Future<Output = Result<ChatResponse, LlmError>> + Send;

    /// Sends a chat request and returns a stream of incremental events.
    ///
    /// The returned [`ChatStream`] is lazy, finite, and non-restartable.
    /// Collect it with [`collect_stream`](crate::stream::collect_stream)
    /// or fold it through a
    /// [`ResponseAccumulator`](crate::stream::ResponseAccumulator).
    fn stream(
        &self,
        params: &ChatParams,
    ) -> impl Future<Output = Result<ChatStream, LlmError>> + Send;

    /// Returns static metadata describing this provider instance.
    fn metadata(&self) -> ProviderMetadata;
}

/// Object-safe counterpart of [`Provider`] for dynamic dispatch.
///
/// You rarely implement this directly — the blanket
/// `impl<T: Provider> DynProvider for T` does it for you.
pub trait DynProvider: Send + Sync {
    /// Boxed-future version of [`Provider::generate`].
    fn generate_boxed<'a>(
        &'a self,
        params: &'a ChatParams,
    ) -> Pin<Box<dyn Future<Output = Result<ChatResponse, LlmError>> + Send + 'a>>;

    /// Boxed-future version of [`Provider::stream`].
    fn stream_boxed<'a>(
        &'a self,
        params: &'a ChatParams,
    ) -> Pin<Box<dyn Future<Output = Result<ChatStream, LlmError>> + Send + 'a>>;

    /// Returns static metadata describing this provider instance.
    fn metadata(&self) -> ProviderMetadata;
}

impl<T: Provider> DynProvider for T {
    fn generate_boxed<'a>(
        &'a self,
        params: &'a ChatParams,
    ) -> Pin<Box<dyn Future<Output = Result<ChatResponse, LlmError>> + Send + 'a>> {
        Box::pin(self.generate(params))
    }

    fn stream_boxed<'a>(
        &'a self,
        params: &'a ChatParams,
    ) -> Pin<Box<dyn Future<Output = Result<ChatStream, LlmError>> + Send + 'a>> {
        Box::pin(self.stream(params))
    }

    fn metadata(&self) -> ProviderMetadata {
        Provider::metadata(self)
    }
}

/// Describes a provider instance: its name, model, and capabilities.
///
/// The `name` field is a [`Cow<'static, str>`] so built-in providers can
/// use a static string while dynamically constructed ones use owned
/// strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMetadata {
    /// Human-readable provider name (e.g. `"anthropic"`, `"ollama"`).
    pub name: Cow<'static, str>,
    /// The model identifier.
    pub model: String,
    /// Maximum context window size in tokens.
    pub context_window: u64,
    /// Feature flags indicating what this provider supports.
    pub capabilities: HashSet<Capability>,
}

/// A feature that a provider may or may not support.
///
/// Inspected by [`IgnoreUnsupported`](crate::compat::IgnoreUnsupported)
/// to decide which request features to strip before forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Capability {
    /// Function/tool calling.
    Tools,
    /// Extended chain-of-thought reasoning, natively separated by the
    /// provider.
    Reasoning,
}

/// Parameters for a chat request.
///
/// Most fields are optional — at minimum you need
/// [`messages`](Self::messages). Use struct-update syntax:
///
/// ```rust
/// use llm_conduit::{ChatMessage, ChatParams};
///
/// let params = ChatParams {
///     messages: vec![ChatMessage::user("Hello")],
///     max_tokens: Some(256),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChatParams {
    /// The conversation history.
    pub messages: Vec<ChatMessage>,
    /// Tool definitions the model may invoke.
    pub tools: Option<Vec<ToolDefinition>>,
    /// Controls whether and how the model uses tools.
    pub tool_choice: Option<ToolChoice>,
    /// Sampling temperature (0.0 = deterministic, higher = more random).
    pub temperature: Option<f32>,
    /// Upper bound on generated tokens.
    pub max_tokens: Option<u32>,
    /// System prompt (used by providers that accept it separately from
    /// the message list).
    pub system: Option<String>,
    /// Token budget for chain-of-thought reasoning, if the provider
    /// supports [`Capability::Reasoning`].
    pub reasoning_budget: Option<u32>,
    /// Per-request timeout. Skipped during serialization.
    #[serde(skip)]
    pub timeout: Option<Duration>,
    /// Extra HTTP headers to send with this request. Skipped during
    /// serialization.
    #[serde(skip)]
    pub extra_headers: Option<http::HeaderMap>,
    /// Arbitrary key-value pairs forwarded to the provider.
    pub metadata: HashMap<String, Value>,
}

/// Controls whether the model should use tools and, if so, which ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ToolChoice {
    /// The model decides whether to call a tool.
    Auto,
    /// The model must not call any tools.
    None,
    /// The model must call at least one tool.
    ///
    /// The tool loop downgrades this to [`Auto`](Self::Auto) after the
    /// first round — see
    /// [`tool_loop`](crate::tool::tool_loop).
    Required,
    /// The model must call this specific tool.
    Specific(String),
}

/// A tool the model can invoke during generation.
///
/// Providers translate this into their native tool format. The
/// executable side lives in a
/// [`ToolHandler`](crate::tool::ToolHandler).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool's name, matched against
    /// [`ToolCall::name`](crate::chat::ToolCall::name).
    pub name: String,
    /// Human-readable description shown to the model so it knows when
    /// to use this tool.
    pub description: String,
    /// JSON Schema describing the tool's expected input.
    pub parameters: JsonSchema,
}

/// A JSON Schema document used for tool parameters.
///
/// Wraps a [`serde_json::Value`] and provides validation via the
/// [`jsonschema`] crate. The inner value is private — use
/// [`as_value`](Self::as_value) for read access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSchema(Value);

impl JsonSchema {
    /// Creates a schema from a raw JSON value.
    pub fn new(schema: Value) -> Self {
        Self(schema)
    }

    /// Returns a reference to the underlying JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Derives a JSON Schema from a Rust type that implements
    /// [`schemars::JsonSchema`].
    ///
    /// Returns an error if the generated schema cannot be serialized to
    /// `serde_json::Value` (should not happen in practice).
    ///
    /// Requires the `schema` feature (enabled by default).
    #[cfg(feature = "schema")]
    pub fn from_type<T: schemars::JsonSchema>() -> Result<Self, serde_json::Error> {
        let schema = schemars::schema_for!(T);
        let value = serde_json::to_value(schema)?;
        Ok(Self(value))
    }

    /// Validates `value` against this schema.
    ///
    /// Returns `Ok(())` if validation passes, or
    /// [`LlmError::SchemaValidation`] with details on failure. Returns
    /// [`LlmError::InvalidRequest`] if the schema itself is malformed.
    ///
    /// Requires the `schema` feature (enabled by default).
    #[cfg(feature = "schema")]
    pub fn validate(&self, value: &Value) -> Result<(), LlmError> {
        let validator = jsonschema::validator_for(&self.0)
            .map_err(|e| LlmError::InvalidRequest(format!("invalid JSON schema: {e}")))?;
        let errors: Vec<String> = validator.iter_errors(value).map(|e| e.to_string()).collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(LlmError::SchemaValidation {
                message: errors.join("; "),
                schema: self.0.clone(),
                actual: value.clone(),
            })
        }
    }
}
