//! Capability tolerance for heterogeneous providers.
//!
//! Not every backend supports every request feature. A provider that
//! receives a feature it can't honor fails with
//! [`LlmError::Unsupported`] — a *continuable* error: the request could
//! have succeeded without the feature.
//!
//! [`IgnoreUnsupported`] is the opt-in wrapper for callers who prefer
//! degraded execution over failure: it consults the wrapped provider's
//! [`capabilities`](crate::provider::ProviderMetadata::capabilities)
//! and strips unsupported request features before forwarding, so the
//! continuable error never arises. Callers who want the strict behavior
//! simply don't wrap.

use std::borrow::Cow;

use crate::chat::ChatResponse;
use crate::error::LlmError;
use crate::provider::{Capability, ChatParams, Provider, ProviderMetadata};
use crate::stream::ChatStream;

/// Wraps a provider, silently dropping request features it does not
/// advertise support for.
///
/// Stripped per missing capability:
///
/// | Missing capability | Dropped fields |
/// |---|---|
/// | [`Capability::Tools`] | `tools`, `tool_choice` |
/// | [`Capability::Reasoning`] | `reasoning_budget` |
///
/// Stacks with other decorators; place it outermost so it sees the
/// final request.
#[derive(Debug)]
pub struct IgnoreUnsupported<P> {
    inner: P,
}

impl<P> IgnoreUnsupported<P> {
    /// Wraps `inner`.
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Unwraps, returning the inner provider.
    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: Provider> IgnoreUnsupported<P> {
    /// Returns the params with unsupported features removed, borrowing
    /// when nothing needs to change.
    fn adjust<'a>(&self, params: &'a ChatParams) -> Cow<'a, ChatParams> {
        let capabilities = self.inner.metadata().capabilities;

        let strip_tools =
            params.tools.is_some() && !capabilities.contains(&Capability::Tools);
        let strip_reasoning =
            params.reasoning_budget.is_some() && !capabilities.contains(&Capability::Reasoning);

        if !strip_tools && !strip_reasoning {
            return Cow::Borrowed(params);
        }

        let mut adjusted = params.clone();
        if strip_tools {
            tracing::debug!("dropping tool definitions: provider lacks tool support");
            adjusted.tools = None;
            adjusted.tool_choice = None;
        }
        if strip_reasoning {
            tracing::debug!("dropping reasoning budget: provider lacks reasoning support");
            adjusted.reasoning_budget = None;
        }
        Cow::Owned(adjusted)
    }
}

impl<P: Provider> Provider for IgnoreUnsupported<P> {
    async fn generate(&self, params: &ChatParams) -> Result<ChatResponse, LlmError> {
        self.inner.generate(&self.adjust(params)).await
    }

    async fn stream(&self, params: &ChatParams) -> Result<ChatStream, LlmError> {
        self.inner.stream(&self.adjust(params)).await
    }

    fn metadata(&self) -> ProviderMetadata {
        self.inner.metadata()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatMessage;
    use crate::mock::MockProvider;
    use crate::provider::{JsonSchema, ToolChoice, ToolDefinition};
    use crate::test_helpers::sample_response;
    use std::collections::HashSet;

    fn mock_with_capabilities(capabilities: HashSet<Capability>) -> MockProvider {
        MockProvider::new(ProviderMetadata {
            name: "limited".into(),
            model: "basic-model".into(),
            context_window: 8192,
            capabilities,
        })
    }

    fn params_with_everything() -> ChatParams {
        ChatParams {
            messages: vec![ChatMessage::user("hi")],
            tools: Some(vec![ToolDefinition {
                name: "search".into(),
                description: "Search".into(),
                parameters: JsonSchema::new(serde_json::json!({"type": "object"})),
            }]),
            tool_choice: Some(ToolChoice::Auto),
            reasoning_budget: Some(2048),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_strips_unsupported_features() {
        let provider = IgnoreUnsupported::new(mock_with_capabilities(HashSet::new()));
        provider.inner().queue_response(sample_response("ok"));

        provider
            .generate(&params_with_everything())
            .await
            .unwrap();

        let recorded = provider.inner().recorded_calls();
        assert_eq!(recorded[0].tools, None);
        assert_eq!(recorded[0].tool_choice, None);
        assert_eq!(recorded[0].reasoning_budget, None);
        // The rest survives untouched.
        assert_eq!(recorded[0].messages.len(), 1);
    }

    #[tokio::test]
    async fn test_keeps_supported_features() {
        let provider = IgnoreUnsupported::new(mock_with_capabilities(HashSet::from([
            Capability::Tools,
            Capability::Reasoning,
        ])));
        provider.inner().queue_response(sample_response("ok"));

        let params = params_with_everything();
        provider.generate(&params).await.unwrap();

        let recorded = provider.inner().recorded_calls();
        assert_eq!(recorded[0], params);
    }

    #[tokio::test]
    async fn test_partial_capabilities() {
        let provider =
            IgnoreUnsupported::new(mock_with_capabilities(HashSet::from([Capability::Tools])));
        provider.inner().queue_response(sample_response("ok"));

        provider
            .generate(&params_with_everything())
            .await
            .unwrap();

        let recorded = provider.inner().recorded_calls();
        assert!(recorded[0].tools.is_some());
        assert_eq!(recorded[0].reasoning_budget, None);
    }

    #[test]
    fn test_metadata_passthrough_and_accessors() {
        let provider = IgnoreUnsupported::new(mock_with_capabilities(HashSet::new()));
        assert_eq!(Provider::metadata(&provider).name, "limited");
        let _inner: MockProvider = provider.into_inner();
    }
}
