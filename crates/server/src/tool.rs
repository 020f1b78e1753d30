//! Tool definitions.
//!
//! A tool is anything implementing [`ToolHandler`]. Most tools are plain functions wrapped with
//! [`tool`], which derives the MCP input/output schemas from the argument and return types.

use crate::error::{MeshError, Result};
use async_trait::async_trait;
use rmcp::model::{JsonObject, Tool, ToolAnnotations};
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// MCP definition advertised by `tools/list`.
    fn definition(&self) -> Tool;

    /// Run the tool. `arguments` is the raw `tools/call` arguments object.
    async fn call(&self, arguments: JsonObject) -> Result<Value>;

    fn name(&self) -> String {
        self.definition().name.to_string()
    }
}

/// A tool backed by a synchronous function `Fn(I) -> O`.
///
/// The function runs on tokio's blocking pool, so a slow body does not stall the runtime and
/// still honours the registry call timeout.
pub struct FnTool<I, O, F> {
    name: String,
    description: String,
    annotations: Option<ToolAnnotations>,
    func: Arc<F>,
    _types: PhantomData<fn(I) -> O>,
}

/// Wrap a function as a tool.
///
/// `I` is deserialized from the call arguments; `O` is returned as structured content.
pub fn tool<I, O, F>(name: impl Into<String>, description: impl Into<String>, func: F) -> FnTool<I, O, F>
where
    I: DeserializeOwned + JsonSchema + Send + 'static,
    O: Serialize + JsonSchema + Send + 'static,
    F: Fn(I) -> O + Send + Sync + 'static,
{
    FnTool {
        name: name.into(),
        description: description.into(),
        annotations: None,
        func: Arc::new(func),
        _types: PhantomData,
    }
}

impl<I, O, F> FnTool<I, O, F> {
    /// Mark the tool as a pure function of its input (read-only, idempotent, closed-world).
    #[must_use]
    pub fn pure(mut self) -> Self {
        self.annotations = Some(pure_annotations());
        self
    }

    #[must_use]
    pub fn annotations(mut self, annotations: ToolAnnotations) -> Self {
        self.annotations = Some(annotations);
        self
    }
}

#[async_trait]
impl<I, O, F> ToolHandler for FnTool<I, O, F>
where
    I: DeserializeOwned + JsonSchema + Send + 'static,
    O: Serialize + JsonSchema + Send + 'static,
    F: Fn(I) -> O + Send + Sync + 'static,
{
    fn definition(&self) -> Tool {
        let mut tool = Tool::new(
            self.name.clone(),
            self.description.clone(),
            Arc::new(schema_object::<I>()),
        );
        tool.output_schema = Some(Arc::new(schema_object::<O>()));
        tool.annotations.clone_from(&self.annotations);
        tool
    }

    async fn call(&self, arguments: JsonObject) -> Result<Value> {
        let input: I = serde_json::from_value(Value::Object(arguments)).map_err(|e| {
            MeshError::InvalidArguments {
                tool: self.name.clone(),
                message: e.to_string(),
            }
        })?;
        let func = Arc::clone(&self.func);
        let output = tokio::task::spawn_blocking(move || func(input))
            .await
            .map_err(|e| MeshError::Runtime(format!("tool '{}' panicked: {e}", self.name)))?;
        serde_json::to_value(output).map_err(|e| {
            MeshError::Runtime(format!("tool '{}' returned unserializable output: {e}", self.name))
        })
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

#[must_use]
pub fn pure_annotations() -> ToolAnnotations {
    ToolAnnotations {
        title: None,
        read_only_hint: Some(true),
        destructive_hint: Some(false),
        idempotent_hint: Some(true),
        open_world_hint: Some(false),
    }
}

/// JSON Schema for `T` as an MCP schema object (no `$schema` key).
#[must_use]
pub fn schema_object<T: JsonSchema>() -> JsonObject {
    let schema = schemars::schema_for!(T);
    let mut obj = match serde_json::to_value(schema) {
        Ok(Value::Object(map)) => map,
        _ => JsonObject::new(),
    };
    obj.remove("$schema");
    obj.entry("type").or_insert_with(|| Value::String("object".to_string()));
    obj
}
