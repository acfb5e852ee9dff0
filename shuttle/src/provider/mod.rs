//! Provider abstraction: a uniform generate/stream/structured interface
//! over heterogeneous LLM backends.
//!
//! A [`Provider`] turns a prompt or message list (plus [`ProviderOptions`])
//! into text, a [`ProviderResponse`], a schema-conforming JSON value, or a
//! [`TokenStream`]. Concrete wire protocols live outside the core; the
//! in-tree implementation is [`MockProvider`], which the agent-loop tests
//! script turn by turn.
//!
//! Only `generate_message` is required. `generate` wraps the prompt in a
//! user message; `generate_with_schema` runs the structured-output pipeline
//! (enhance → generate → extract → validate, with one repair retry); the
//! stream variants deliver the full response as a short token stream.

pub mod error;
pub mod metadata;
pub mod mock;
pub mod options;
pub mod registry;
pub mod retry;
pub mod stream;
pub mod template;

pub use error::ProviderError;
pub use metadata::{Capability, ModelMetadata, ProviderMetadata};
pub use mock::{MockProvider, MockReply};
pub use options::ProviderOptions;
pub use registry::{BestModelQuery, ProviderRegistry, RegistryConfig, RegistryError};
pub use retry::{retry_provider_call, RetryPolicy};
pub use stream::{Token, TokenStream};
pub use template::ProviderTemplate;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::Message;
use crate::run_context::RunContext;
use crate::schema::Schema;
use crate::structured;

/// Token usage for one model call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A full model response: the assistant message plus usage when the
/// backend reports it.
#[derive(Clone, Debug)]
pub struct ProviderResponse {
    pub message: Message,
    pub usage: Option<Usage>,
}

impl ProviderResponse {
    /// A plain-text assistant response with no usage.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            message: Message::assistant(content),
            usage: None,
        }
    }
}

/// A language-model backend.
///
/// All operations observe the context's cancellation token and must
/// abandon in-flight work promptly, returning
/// [`ProviderError::Cancelled`].
#[async_trait]
pub trait Provider: Send + Sync {
    /// One completion over an explicit message list.
    async fn generate_message(
        &self,
        ctx: &RunContext,
        messages: &[Message],
        options: &ProviderOptions,
    ) -> Result<ProviderResponse, ProviderError>;

    /// One completion over a bare prompt (wrapped as a user message).
    async fn generate(
        &self,
        ctx: &RunContext,
        prompt: &str,
        options: &ProviderOptions,
    ) -> Result<String, ProviderError> {
        let response = self
            .generate_message(ctx, &[Message::user(prompt)], options)
            .await?;
        Ok(response.message.content_text())
    }

    /// A completion constrained to parse as JSON conforming to `schema`.
    ///
    /// The default pipeline enhances the prompt with the schema, extracts
    /// the first valid JSON value from the reply, and validates it. An
    /// unparseable or non-conforming reply gets exactly one repair retry
    /// before surfacing [`ProviderError::InvalidResponse`].
    async fn generate_with_schema(
        &self,
        ctx: &RunContext,
        prompt: &str,
        schema: &Schema,
        options: &ProviderOptions,
    ) -> Result<Value, ProviderError> {
        let enhanced = structured::enhance_prompt(prompt, schema);
        let first = self.generate(ctx, &enhanced, options).await?;
        match structured::parse_structured(&first, schema) {
            Ok(value) => Ok(value),
            Err(reason) => {
                let repair = structured::repair_prompt(&enhanced, &first, &reason);
                let second = self.generate(ctx, &repair, options).await?;
                structured::parse_structured(&second, schema)
                    .map_err(ProviderError::InvalidResponse)
            }
        }
    }

    /// Streaming completion over a bare prompt.
    ///
    /// The default implementation generates the full response and delivers
    /// it as one content token followed by the finishing token.
    async fn stream(
        &self,
        ctx: &RunContext,
        prompt: &str,
        options: &ProviderOptions,
    ) -> Result<TokenStream, ProviderError> {
        let text = self.generate(ctx, prompt, options).await?;
        Ok(TokenStream::from_text(text))
    }

    /// Streaming completion over a message list; same defaulting as
    /// [`Provider::stream`].
    async fn stream_message(
        &self,
        ctx: &RunContext,
        messages: &[Message],
        options: &ProviderOptions,
    ) -> Result<TokenStream, ProviderError> {
        let response = self.generate_message(ctx, messages, options).await?;
        Ok(TokenStream::from_text(response.message.content_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider(String);

    #[async_trait]
    impl Provider for FixedProvider {
        async fn generate_message(
            &self,
            _ctx: &RunContext,
            _messages: &[Message],
            _options: &ProviderOptions,
        ) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse::text(self.0.clone()))
        }
    }

    /// **Scenario**: The default generate wraps the prompt and returns the reply text.
    #[tokio::test]
    async fn default_generate_delegates() {
        let p = FixedProvider("four".into());
        let out = p
            .generate(&RunContext::new(), "2+2?", &ProviderOptions::new())
            .await
            .unwrap();
        assert_eq!(out, "four");
    }

    /// **Scenario**: The default stream delivers content then a finishing token.
    #[tokio::test]
    async fn default_stream_two_tokens() {
        let p = FixedProvider("hello".into());
        let mut stream = p
            .stream(&RunContext::new(), "hi", &ProviderOptions::new())
            .await
            .unwrap();
        let first = stream.next().await.unwrap();
        assert_eq!(first.text, "hello");
        assert!(!first.finished);
        let last = stream.next().await.unwrap();
        assert!(last.finished);
        assert!(stream.next().await.is_none());
    }

    /// **Scenario**: generate_with_schema extracts fenced JSON and validates it.
    #[tokio::test]
    async fn generate_with_schema_extracts() {
        let p = FixedProvider("Here you go: ```json\n{\"name\":\"Alice\",\"age\":30}\n```".into());
        let schema = Schema::object()
            .property("name", Schema::string())
            .property("age", Schema::integer().minimum(0.0))
            .required(["name", "age"]);
        let value = p
            .generate_with_schema(&RunContext::new(), "Alice is 30", &schema, &ProviderOptions::new())
            .await
            .unwrap();
        assert_eq!(value, serde_json::json!({"name": "Alice", "age": 30}));
    }

    /// **Scenario**: A reply that never parses surfaces InvalidResponse after one repair retry.
    #[tokio::test]
    async fn generate_with_schema_surfaces_invalid() {
        let p = FixedProvider("no json here".into());
        let schema = Schema::object().property("x", Schema::string()).required(["x"]);
        let err = p
            .generate_with_schema(&RunContext::new(), "x?", &schema, &ProviderOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }
}
