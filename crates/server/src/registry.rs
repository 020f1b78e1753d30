//! Tool registry: registration order, lookup and call dispatch.

use crate::error::{MeshError, Result};
use crate::tool::ToolHandler;
use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn ToolHandler>>,
    /// name -> index into `tools`
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Config`] if the name is empty or already registered.
    pub fn register(&mut self, handler: impl ToolHandler + 'static) -> Result<()> {
        self.register_arc(Arc::new(handler))
    }

    /// Register an already shared tool.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Config`] if the name is empty or already registered.
    pub fn register_arc(&mut self, handler: Arc<dyn ToolHandler>) -> Result<()> {
        let name = handler.name();
        if name.is_empty() {
            return Err(MeshError::Config("tool name must not be empty".to_string()));
        }
        if self.index.contains_key(&name) {
            return Err(MeshError::Config(format!("duplicate tool name '{name}'")));
        }
        tracing::debug!(tool = %name, "registered tool");
        self.index.insert(name, self.tools.len());
        self.tools.push(handler);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Tool definitions in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<Tool> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Execute a tool call.
    ///
    /// `arguments` may be `null` (treated as `{}`) or an object.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool is unknown, the arguments are invalid, the handler fails,
    /// or the call exceeds `timeout`.
    pub async fn call(
        &self,
        name: &str,
        arguments: Value,
        timeout: Option<Duration>,
    ) -> Result<CallToolResult> {
        let handler = self
            .index
            .get(name)
            .map(|&i| Arc::clone(&self.tools[i]))
            .ok_or_else(|| MeshError::ToolNotFound(name.to_string()))?;

        let args = match arguments {
            Value::Object(map) => map,
            Value::Null => JsonObject::new(),
            other => {
                return Err(MeshError::InvalidArguments {
                    tool: name.to_string(),
                    message: format!("arguments must be a JSON object, got {}", json_kind(&other)),
                });
            }
        };

        let fut = handler.call(args);
        let value = if let Some(t) = timeout.filter(|t| *t > Duration::from_millis(0)) {
            match tokio::time::timeout(t, fut).await {
                Ok(r) => r?,
                Err(_) => {
                    return Err(MeshError::Runtime(format!(
                        "Tool call timed out after {}ms",
                        t.as_millis()
                    )));
                }
            }
        } else {
            fut.await?
        };

        Ok(success_result(value))
    }
}

/// Wrap tool output as a `CallToolResult`.
///
/// Object outputs go to `structured_content`; `content[0]` always carries the JSON text since
/// some MCP clients only render `content`.
#[must_use]
pub fn success_result(value: Value) -> CallToolResult {
    let text = serde_json::to_string(&value).unwrap_or_else(|_| value.to_string());
    let structured = value.is_object().then_some(value);
    CallToolResult {
        content: vec![Content::text(text)],
        structured_content: structured,
        is_error: Some(false),
        meta: None,
    }
}

/// Tool execution failure reported inside a result (MCP `isError`).
#[must_use]
pub fn error_result(message: impl Into<String>) -> CallToolResult {
    CallToolResult {
        content: vec![Content::text(message.into())],
        structured_content: None,
        is_error: Some(true),
        meta: None,
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
