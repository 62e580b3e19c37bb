//! Reasoning-tag extraction.
//!
//! Some models emit their chain of thought inline, wrapped in a
//! delimiter pair like `<think>…</think>`, instead of using a
//! structured reasoning channel. This module reclassifies those spans:
//! everything between the delimiters becomes
//! [`Reasoning`](crate::chat::ContentBlock::Reasoning) content,
//! everything after becomes ordinary text, and the delimiters
//! themselves disappear.
//!
//! Two paths cover both provider modes:
//!
//! - [`TagStreamFilter`] — a per-fragment state machine for streamed
//!   responses. Delimiters may arrive split across arbitrarily many
//!   fragments; the filter holds back just enough pending text to
//!   resolve a partial delimiter and never reorders output.
//! - [`split_response`] — the whole-string variant for non-streaming
//!   responses.
//!
//! Both paths produce identical `{reasoning, text}` splits for the same
//! concatenated input.
//!
//! [`ExtractReasoning`] packages the two as a [`Provider`](crate::provider::Provider)
//! decorator:
//!
//! ```rust,no_run
//! use llm_conduit::reasoning::{ExtractReasoning, TagPair};
//!
//! # fn example(ollama: impl llm_conduit::Provider) {
//! // Default <think>…</think> delimiters:
//! let provider = ExtractReasoning::new(ollama);
//!
//! // Or a custom pair:
//! let provider = ExtractReasoning::with_tags(
//!     provider.into_inner(),
//!     TagPair::new("<reasoning>", "</reasoning>"),
//! );
//! # }
//! ```
//!
//! # Contract
//!
//! The wrapped provider must *not* already separate reasoning: a
//! response containing `Reasoning` blocks (or a stream carrying
//! `ReasoningDelta`s) fails with
//! [`UnexpectedReasoning`](crate::LlmError::UnexpectedReasoning) /
//! [`UnexpectedReasoningFragment`](crate::LlmError::UnexpectedReasoningFragment)
//! — stacking the filter twice is a programming error.
//!
//! Non-whitespace content before the start delimiter fails with
//! [`UnexpectedPrefix`](crate::LlmError::UnexpectedPrefix). A missing
//! start delimiter is fine (JSON-only replies, models that skip
//! reasoning); a missing *end* delimiter is also fine — the reply was
//! truncated mid-reasoning, the partial reasoning is kept, and the
//! truncation is visible through the stop reason instead.

mod filter;
mod split;
mod tags;
mod wrap;

pub use filter::TagStreamFilter;
pub use split::{split_response, split_text};
pub use tags::TagPair;
pub use wrap::ExtractReasoning;
