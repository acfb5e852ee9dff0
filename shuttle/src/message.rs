//! Message types for agent conversations.
//!
//! A [`Message`] is a role plus an ordered list of [`ContentPart`]s: plain
//! text, an artifact reference for images, a tool call requested by the
//! model, or a tool result fed back to it. The agent loop reads tool calls
//! from assistant messages and appends tool results as `Role::Tool`
//! messages, ordered by the index at which the model emitted each call.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who produced a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt; typically first in the list.
    System,
    /// End-user input.
    User,
    /// Model reply (text and/or tool calls).
    Assistant,
    /// Tool result fed back into the conversation.
    Tool,
}

/// A tool invocation requested by the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call id assigned by the model (or synthesized); echoed in the result.
    pub id: String,
    /// Tool name to invoke.
    pub name: String,
    /// JSON arguments for the tool.
    pub arguments: Value,
    /// Position at which the model emitted this call within one reply.
    /// Results are re-ordered into the message list by this index.
    pub index: usize,
}

/// The outcome of one tool call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Id of the call this result answers.
    pub call_id: String,
    /// Tool name, repeated for readability in transcripts.
    pub name: String,
    /// Result payload (or an error message when `is_error`).
    pub content: Value,
    /// Whether the tool failed; the model sees the error and may retry.
    #[serde(default)]
    pub is_error: bool,
}

/// One piece of message content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    /// Reference to an image stored as a state artifact.
    ImageRef { artifact_id: String },
    ToolCall(ToolCall),
    ToolResult(ToolResult),
}

/// A single message in the conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<ContentPart>,
}

impl Message {
    /// Creates a message with one text part.
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![ContentPart::Text {
                text: content.into(),
            }],
        }
    }

    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    /// Creates a tool message carrying one result.
    pub fn tool_result(result: ToolResult) -> Self {
        Self {
            role: Role::Tool,
            parts: vec![ContentPart::ToolResult(result)],
        }
    }

    /// Appends a part, returning the message for chaining.
    pub fn with_part(mut self, part: ContentPart) -> Self {
        self.parts.push(part);
        self
    }

    /// Concatenated text content of this message (tool calls and
    /// references contribute nothing).
    pub fn content_text(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            if let ContentPart::Text { text } = part {
                out.push_str(text);
            }
        }
        out
    }

    /// Tool calls carried by this message, in part order.
    pub fn tool_calls(&self) -> Vec<&ToolCall> {
        self.parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::ToolCall(tc) => Some(tc),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// **Scenario**: Role constructors produce the expected role with one text part.
    #[test]
    fn constructors_set_role_and_text() {
        let m = Message::user("hello");
        assert_eq!(m.role, Role::User);
        assert_eq!(m.content_text(), "hello");
        assert!(m.tool_calls().is_empty());
    }

    /// **Scenario**: tool_calls returns calls in part order; content_text skips them.
    #[test]
    fn tool_calls_in_part_order() {
        let m = Message::assistant("let me check")
            .with_part(ContentPart::ToolCall(ToolCall {
                id: "c1".into(),
                name: "a".into(),
                arguments: json!({"x": 1}),
                index: 0,
            }))
            .with_part(ContentPart::ToolCall(ToolCall {
                id: "c2".into(),
                name: "b".into(),
                arguments: json!({}),
                index: 1,
            }));
        let calls = m.tool_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].name, "a");
        assert_eq!(calls[1].index, 1);
        assert_eq!(m.content_text(), "let me check");
    }

    /// **Scenario**: Messages round-trip through serde with tagged parts.
    #[test]
    fn message_serde_roundtrip() {
        let m = Message::tool_result(ToolResult {
            call_id: "c1".into(),
            name: "echo".into(),
            content: json!({"echoed": "hi"}),
            is_error: false,
        });
        let s = serde_json::to_string(&m).expect("serialize");
        assert!(s.contains("\"kind\":\"tool_result\""));
        let back: Message = serde_json::from_str(&s).expect("deserialize");
        assert_eq!(m, back);
    }
}
