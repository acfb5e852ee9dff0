//! Tool dispatch: validate, execute, observe.
//!
//! The dispatcher is the only path from the agent loop into tool code. It
//! validates input against the tool's parameter schema before execution,
//! emits `tool.call` and `tool.result` events, and recovers panics into
//! [`ToolError::Internal`] so a misbehaving tool cannot take down the loop.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::context::ToolContext;
use super::registry::ToolRegistry;
use super::ToolError;
use crate::event::{types, Event};

/// Truncates a string for logging, appending "..." when longer.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "tool panicked".to_string()
    }
}

/// Dispatches tool calls against a registry.
#[derive(Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Looks up, validates, and executes one tool call.
    ///
    /// Validation failures return [`ToolError::Validation`] carrying the
    /// tool's per-field guidance and never reach the tool's own code.
    /// Cancellation discards the in-flight result.
    pub async fn execute(
        &self,
        ctx: &ToolContext,
        name: &str,
        params: Value,
    ) -> Result<Value, ToolError> {
        if ctx.is_cancelled() {
            return Err(ToolError::Cancelled);
        }
        let tool = self
            .registry
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        let descriptor = tool.descriptor();

        if let Err(err) = descriptor.parameter_schema.validate(&params) {
            let field = err.field().map(str::to_string);
            let hint = field
                .as_deref()
                .and_then(|f| descriptor.error_guidance.get(f).cloned());
            return Err(ToolError::Validation {
                field,
                message: err.to_string(),
                hint,
            });
        }

        let shown_input = if descriptor.sensitive {
            json!("[redacted]")
        } else {
            params.clone()
        };
        self.emit(
            ctx,
            Event::new(types::TOOL_CALL, json!({"tool": name, "input": shown_input})),
        );
        debug!(tool = %name, input = %truncate_for_log(&params.to_string(), 200), "dispatching tool");

        let started = std::time::Instant::now();
        let result = tokio::select! {
            _ = ctx.cancellation.cancelled() => Err(ToolError::Cancelled),
            caught = AssertUnwindSafe(tool.execute(ctx, params)).catch_unwind() => {
                match caught {
                    Ok(result) => result,
                    Err(payload) => {
                        let message = panic_message(payload);
                        warn!(tool = %name, panic = %message, "tool panicked, recovered");
                        Err(ToolError::Internal(message))
                    }
                }
            }
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(output) => {
                debug!(
                    tool = %name,
                    duration_ms,
                    result_preview = %truncate_for_log(&output.to_string(), 200),
                    "tool returned"
                );
                self.emit(
                    ctx,
                    Event::new(
                        types::TOOL_RESULT,
                        json!({"tool": name, "duration_ms": duration_ms, "result": output}),
                    ),
                );
            }
            Err(err) => {
                warn!(tool = %name, duration_ms, error = %err, "tool call failed");
                self.emit(
                    ctx,
                    Event::new(
                        types::TOOL_RESULT,
                        json!({"tool": name, "duration_ms": duration_ms}),
                    )
                    .with_error(err.to_string()),
                );
            }
        }
        result
    }

    fn emit(&self, ctx: &ToolContext, event: Event) {
        let event = event
            .with_agent(ctx.agent.id.clone(), ctx.agent.name.clone())
            .with_metadata("run_id", Value::String(ctx.run_id.clone()));
        ctx.emitter.emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventEmitter, NoopEmitter};
    use crate::schema::Schema;
    use crate::state::State;
    use crate::tool::fn_tool::FnTool;
    use crate::tool::ToolDescriptor;
    use std::sync::Mutex;

    struct Capture(Mutex<Vec<Event>>);

    impl EventEmitter for Capture {
        fn emit(&self, event: Event) {
            self.0.lock().unwrap().push(event);
        }
    }

    fn echo_registry() -> Arc<ToolRegistry> {
        let registry = ToolRegistry::new();
        let schema = Schema::object()
            .property("msg", Schema::string())
            .required(["msg"]);
        registry
            .register(Arc::new(FnTool::new(
                ToolDescriptor::new("echo", schema)
                    .with_error_guidance("msg", "provide msg as a string"),
                |_ctx, input| async move { Ok(json!({"echoed": input["msg"]})) },
            )))
            .unwrap();
        registry
            .register(Arc::new(FnTool::new(
                ToolDescriptor::new("panics", Schema::object()),
                |_ctx, _input| async move { panic!("deliberate") },
            )))
            .unwrap();
        Arc::new(registry)
    }

    fn ctx_with(emitter: Arc<dyn EventEmitter>) -> ToolContext {
        let mut ctx = ToolContext::detached(&State::new());
        ctx.emitter = emitter;
        ctx
    }

    /// **Scenario**: A valid call executes and emits tool.call then tool.result.
    #[tokio::test]
    async fn valid_call_executes_and_emits() {
        let capture = Arc::new(Capture(Mutex::new(Vec::new())));
        let dispatcher = ToolDispatcher::new(echo_registry());
        let out = dispatcher
            .execute(&ctx_with(capture.clone()), "echo", json!({"msg": "hi"}))
            .await
            .unwrap();
        assert_eq!(out, json!({"echoed": "hi"}));

        let events = capture.0.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, types::TOOL_CALL);
        assert_eq!(events[0].data["input"]["msg"], "hi");
        assert_eq!(events[1].event_type, types::TOOL_RESULT);
        assert_eq!(events[1].data["result"]["echoed"], "hi");
    }

    /// **Scenario**: Invalid input never reaches the tool and carries the field hint.
    #[tokio::test]
    async fn validation_failure_with_hint() {
        let dispatcher = ToolDispatcher::new(echo_registry());
        let err = dispatcher
            .execute(
                &ctx_with(Arc::new(NoopEmitter)),
                "echo",
                json!({"msg": 42}),
            )
            .await
            .unwrap_err();
        match err {
            ToolError::Validation { field, hint, .. } => {
                assert_eq!(field.as_deref(), Some("msg"));
                assert_eq!(hint.as_deref(), Some("provide msg as a string"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    /// **Scenario**: A panicking tool surfaces Internal and the loop survives.
    #[tokio::test]
    async fn panic_recovered_as_internal() {
        let capture = Arc::new(Capture(Mutex::new(Vec::new())));
        let dispatcher = ToolDispatcher::new(echo_registry());
        let err = dispatcher
            .execute(&ctx_with(capture.clone()), "panics", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Internal(_)));
        let events = capture.0.lock().unwrap();
        assert!(events.last().unwrap().is_error());
    }

    /// **Scenario**: An unknown tool returns NotFound without emitting events.
    #[tokio::test]
    async fn unknown_tool() {
        let capture = Arc::new(Capture(Mutex::new(Vec::new())));
        let dispatcher = ToolDispatcher::new(echo_registry());
        let err = dispatcher
            .execute(&ctx_with(capture.clone()), "missing", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(name) if name == "missing"));
        assert!(capture.0.lock().unwrap().is_empty());
    }
}
