//! Scripted provider for tests and examples.
//!
//! A [`MockProvider`] replays a queue of [`MockReply`]s, one per
//! `generate_message` call, and records every request so tests can assert
//! on the exact message lists the agent loop produced.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{Provider, ProviderError, ProviderOptions, ProviderResponse, Usage};
use crate::message::{ContentPart, Message, ToolCall};
use crate::run_context::RunContext;

/// One scripted turn.
#[derive(Clone, Debug)]
pub enum MockReply {
    /// Plain assistant text.
    Text(String),
    /// Assistant text plus tool calls (text may be empty).
    ToolCalls { text: String, calls: Vec<ToolCall> },
    /// A provider failure for this turn.
    Error(ProviderError),
}

/// Provider that replays scripted turns.
///
/// When the script runs out it answers with the fallback text (empty by
/// default), so over-long loops fail visibly in assertions rather than
/// panicking inside the provider.
#[derive(Debug, Default)]
pub struct MockProvider {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<Vec<Message>>>,
    fallback: String,
    usage: Option<Usage>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a plain-text turn.
    pub fn reply_text(self, text: impl Into<String>) -> Self {
        self.push(MockReply::Text(text.into()))
    }

    /// Queues a turn that requests tool calls.
    pub fn reply_tool_calls(self, calls: Vec<ToolCall>) -> Self {
        self.push(MockReply::ToolCalls {
            text: String::new(),
            calls,
        })
    }

    /// Queues an arbitrary scripted turn.
    pub fn reply(self, reply: MockReply) -> Self {
        self.push(reply)
    }

    /// Text answered once the script is exhausted.
    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = text.into();
        self
    }

    /// Usage attached to every successful response.
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    fn push(self, reply: MockReply) -> Self {
        self.replies.lock().unwrap_or_else(|e| e.into_inner()).push_back(reply);
        self
    }

    /// Message lists received so far, in call order.
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of generate calls made.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn generate_message(
        &self,
        ctx: &RunContext,
        messages: &[Message],
        _options: &ProviderOptions,
    ) -> Result<ProviderResponse, ProviderError> {
        if ctx.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).push(messages.to_vec());

        let reply = self.replies.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
        let message = match reply {
            Some(MockReply::Text(text)) => Message::assistant(text),
            Some(MockReply::ToolCalls { text, calls }) => {
                let mut message = if text.is_empty() {
                    Message {
                        role: crate::message::Role::Assistant,
                        parts: Vec::new(),
                    }
                } else {
                    Message::assistant(text)
                };
                for call in calls {
                    message.parts.push(ContentPart::ToolCall(call));
                }
                message
            }
            Some(MockReply::Error(err)) => return Err(err),
            None => Message::assistant(self.fallback.clone()),
        };

        Ok(ProviderResponse {
            message,
            usage: self.usage,
        })
    }
}
