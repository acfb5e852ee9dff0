//! Tools: typed capabilities the model can invoke.
//!
//! A [`Tool`] pairs a [`ToolDescriptor`] (name, schemas, categorization,
//! advisory flags, per-field error guidance) with an async `execute`.
//! Tools register in a [`ToolRegistry`]; the agent loop invokes them
//! through the [`ToolDispatcher`], which validates input against the
//! parameter schema before execution, emits `tool.call`/`tool.result`
//! events, and converts panics into internal tool errors so the loop
//! never crashes.

pub mod context;
pub mod dispatch;
pub mod fn_tool;
pub mod registry;

pub use context::ToolContext;
pub use dispatch::ToolDispatcher;
pub use fn_tool::FnTool;
pub use registry::ToolRegistry;

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::schema::Schema;

/// Failure from looking up, validating, or executing a tool.
#[derive(Debug, Error, Clone)]
pub enum ToolError {
    #[error("tool not found: {0}")]
    NotFound(String),

    /// Input rejected before execution. `hint` carries the tool's
    /// per-field guidance when the failing field declares one.
    #[error("invalid input{}: {message}", field.as_deref().map(|f| format!(" for {f:?}")).unwrap_or_default())]
    Validation {
        field: Option<String>,
        message: String,
        hint: Option<String>,
    },

    /// The tool ran and failed; surfaced to the model as an error result.
    #[error("tool execution failed: {0}")]
    Execution(String),

    /// The tool panicked; the dispatcher recovered.
    #[error("internal tool error: {0}")]
    Internal(String),

    /// The run was cancelled mid-call.
    #[error("tool call cancelled")]
    Cancelled,

    /// A second, different tool was registered under an existing name.
    #[error("tool name already registered: {0}")]
    Conflict(String),
}

/// Everything the model and the dispatcher need to know about a tool.
#[derive(Clone, Debug)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameter_schema: Schema,
    pub output_schema: Option<Schema>,
    /// Coarse grouping for registry queries (e.g. `"math"`, `"web"`).
    pub category: String,
    pub tags: Vec<String>,
    pub version: String,
    /// Example invocations, for prompt surfaces.
    pub examples: Vec<Value>,
    /// Usage constraints, stated for the model.
    pub constraints: Vec<String>,
    /// Per-field hints attached to validation failures.
    pub error_guidance: HashMap<String, String>,
    /// Advisory: same input always gives the same output.
    pub deterministic: bool,
    /// Advisory: the tool changes external state.
    pub destructive: bool,
    /// Advisory: a human should confirm before execution.
    pub needs_confirmation: bool,
    /// Inputs are redacted from emitted events.
    pub sensitive: bool,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, parameter_schema: Schema) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            parameter_schema,
            output_schema: None,
            category: String::new(),
            tags: Vec::new(),
            version: "0.1.0".to_string(),
            examples: Vec::new(),
            constraints: Vec::new(),
            error_guidance: HashMap::new(),
            deterministic: false,
            destructive: false,
            needs_confirmation: false,
            sensitive: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_output_schema(mut self, schema: Schema) -> Self {
        self.output_schema = Some(schema);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_example(mut self, example: Value) -> Self {
        self.examples.push(example);
        self
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraints.push(constraint.into());
        self
    }

    /// Attaches a hint surfaced when validation fails on `field`.
    pub fn with_error_guidance(
        mut self,
        field: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        self.error_guidance.insert(field.into(), hint.into());
        self
    }

    pub fn deterministic(mut self) -> Self {
        self.deterministic = true;
        self
    }

    pub fn destructive(mut self) -> Self {
        self.destructive = true;
        self
    }

    pub fn needs_confirmation(mut self) -> Self {
        self.needs_confirmation = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

/// A single capability callable by the model.
///
/// Tools are long-lived and must not assume anything about the run they
/// are called from beyond what [`ToolContext`] carries.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name, as the model addresses it.
    fn name(&self) -> &str;

    /// Full descriptor; `descriptor().name` must equal `name()`.
    fn descriptor(&self) -> ToolDescriptor;

    /// Executes with already-validated input.
    async fn execute(&self, ctx: &ToolContext, input: Value) -> Result<Value, ToolError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Descriptor builder accumulates metadata and flags.
    #[test]
    fn descriptor_builder() {
        let d = ToolDescriptor::new("echo", Schema::object())
            .with_description("Echoes input")
            .with_category("test")
            .with_tags(["debug", "simple"])
            .with_error_guidance("msg", "msg must be a string")
            .deterministic()
            .sensitive();
        assert_eq!(d.name, "echo");
        assert_eq!(d.category, "test");
        assert_eq!(d.tags, vec!["debug", "simple"]);
        assert_eq!(d.error_guidance["msg"], "msg must be a string");
        assert!(d.deterministic);
        assert!(d.sensitive);
        assert!(!d.destructive);
    }

    /// **Scenario**: Validation error Display names the field when known.
    #[test]
    fn validation_error_display() {
        let err = ToolError::Validation {
            field: Some("age".into()),
            message: "below minimum".into(),
            hint: None,
        };
        let s = err.to_string();
        assert!(s.contains("age"), "{s}");
        assert!(s.contains("below minimum"), "{s}");
    }
}
