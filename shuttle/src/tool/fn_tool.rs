//! Closure adapter: build a [`Tool`] from an async function.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::context::ToolContext;
use super::{Tool, ToolDescriptor, ToolError};

type ExecuteFn = Arc<
    dyn Fn(ToolContext, Value) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send>>
        + Send
        + Sync,
>;

/// A tool backed by a closure.
///
/// ```
/// use shuttle::tool::{FnTool, ToolDescriptor};
/// use shuttle::schema::Schema;
/// use serde_json::json;
///
/// let schema = Schema::object()
///     .property("msg", Schema::string())
///     .required(["msg"]);
/// let echo = FnTool::new(
///     ToolDescriptor::new("echo", schema).with_description("Echoes the message back"),
///     |_ctx, input| async move { Ok(json!({"echoed": input["msg"]})) },
/// );
/// ```
#[derive(Clone)]
pub struct FnTool {
    descriptor: ToolDescriptor,
    execute: ExecuteFn,
}

impl FnTool {
    pub fn new<F, Fut>(descriptor: ToolDescriptor, f: F) -> Self
    where
        F: Fn(ToolContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        Self {
            descriptor,
            execute: Arc::new(move |ctx, input| Box::pin(f(ctx, input))),
        }
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn descriptor(&self) -> ToolDescriptor {
        self.descriptor.clone()
    }

    async fn execute(&self, ctx: &ToolContext, input: Value) -> Result<Value, ToolError> {
        (self.execute)(ctx.clone(), input).await
    }
}

impl std::fmt::Debug for FnTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.descriptor.name)
            .finish()
    }
}
