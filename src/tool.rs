//! Tool definition and builder API
//!
//! Tools are named remote-invocable functions with a JSON Schema describing
//! their input. Typed handlers deserialize arguments with serde and derive the
//! schema with schemars:
//!
//! ```rust
//! use tower_func::{ToolBuilder, CallToolResult};
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize, JsonSchema)]
//! struct AddInput { a: i64, b: i64 }
//!
//! let tool = ToolBuilder::new("add_numbers")
//!     .description("Add two numbers together")
//!     .handler(|input: AddInput| async move {
//!         Ok(CallToolResult::text(format!("{}", input.a + input.b)))
//!     })
//!     .build()
//!     .unwrap();
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use schemars::{JsonSchema, Schema, SchemaGenerator};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::protocol::{CallToolResult, ToolDefinition};

/// A boxed future for tool handlers
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Argument type for tools that take none.
///
/// Deriving the schema from `()` would advertise `"type": "null"`, which
/// clients routinely refuse. `NoParams` advertises an empty object schema
/// and swallows whatever arguments arrive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoParams;

impl<'de> serde::Deserialize<'de> for NoParams {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        <serde::de::IgnoredAny as serde::Deserialize>::deserialize(deserializer)?;
        Ok(NoParams)
    }
}

impl JsonSchema for NoParams {
    fn schema_name() -> Cow<'static, str> {
        Cow::Borrowed("NoParams")
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        schemars::json_schema!({
            "type": "object"
        })
    }
}

/// Check that a tool name is something clients can address: between 1 and
/// 128 characters, drawn from alphanumerics plus `_`, `-`, and `.`.
pub fn validate_tool_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 128 {
        return Err(Error::tool(format!(
            "Tool name must be 1-128 characters, got {}",
            name.len()
        )));
    }

    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.');
    if !name.chars().all(allowed) {
        return Err(Error::tool(format!(
            "Tool name '{}' may only contain alphanumerics, '_', '-', and '.'",
            name
        )));
    }
    Ok(())
}

/// Tool handler trait - the core abstraction for tool execution
pub trait ToolHandler: Send + Sync {
    /// Execute the tool with the given arguments
    fn call(&self, args: Value) -> BoxFuture<'_, Result<CallToolResult>>;

    /// Get the tool's input schema
    fn input_schema(&self) -> Value;
}

/// Typed handler backed by an async closure.
///
/// Deserializes the raw arguments into `I` before invoking the closure.
struct FnHandler<F, I> {
    f: F,
    schema: Value,
    _marker: std::marker::PhantomData<fn() -> I>,
}

impl<F, Fut, I> ToolHandler for FnHandler<F, I>
where
    F: Fn(I) -> Fut + Send + Sync,
    Fut: Future<Output = Result<CallToolResult>> + Send + 'static,
    I: DeserializeOwned + Send,
{
    fn call(&self, args: Value) -> BoxFuture<'_, Result<CallToolResult>> {
        let input: std::result::Result<I, _> = serde_json::from_value(args);
        match input {
            Ok(input) => Box::pin((self.f)(input)),
            Err(e) => Box::pin(async move {
                Err(Error::JsonRpc(crate::error::JsonRpcError::invalid_params(
                    format!("Invalid tool arguments: {}", e),
                )))
            }),
        }
    }

    fn input_schema(&self) -> Value {
        self.schema.clone()
    }
}

/// A complete tool definition.
///
/// Handler errors never escape as protocol failures: [`Tool::call`] converts
/// them into `CallToolResult` values with `is_error: true`.
#[derive(Clone)]
pub struct Tool {
    /// Tool name (must be 1-128 chars, alphanumeric/underscore/hyphen/dot only)
    pub name: String,
    /// Description of what the tool does
    pub description: Option<String>,
    handler: Arc<dyn ToolHandler>,
    input_schema: Value,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl Tool {
    /// Create a new tool builder
    pub fn builder(name: impl Into<String>) -> ToolBuilder {
        ToolBuilder::new(name)
    }

    /// Get the tool name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the tool definition for `tools/list`
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.clone(),
        }
    }

    /// Call the tool.
    ///
    /// Returns `CallToolResult` directly (not `Result<CallToolResult>`): any
    /// handler error becomes `CallToolResult::error()` with `is_error: true`.
    pub async fn call(&self, args: Value) -> CallToolResult {
        match self.handler.call(args).await {
            Ok(result) => result,
            Err(e) => CallToolResult::error(e.to_string()),
        }
    }
}

/// Builder for creating tools
pub struct ToolBuilder {
    name: String,
    description: Option<String>,
    handler: Option<Arc<dyn ToolHandler>>,
}

impl ToolBuilder {
    /// Create a new tool builder with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            handler: None,
        }
    }

    /// Set the tool description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set a typed async handler.
    ///
    /// The input type drives both deserialization and the advertised JSON
    /// Schema.
    pub fn handler<F, Fut, I>(mut self, f: F) -> Self
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<CallToolResult>> + Send + 'static,
        I: DeserializeOwned + JsonSchema + Send + 'static,
    {
        let schema =
            serde_json::to_value(schemars::schema_for!(I)).unwrap_or(Value::Object(Default::default()));
        self.handler = Some(Arc::new(FnHandler {
            f,
            schema,
            _marker: std::marker::PhantomData,
        }));
        self
    }

    /// Build the tool, validating its name and handler
    pub fn build(self) -> Result<Tool> {
        validate_tool_name(&self.name)?;
        let handler = self
            .handler
            .ok_or_else(|| Error::tool(format!("Tool '{}' has no handler", self.name)))?;
        let input_schema = handler.input_schema();
        Ok(Tool {
            name: self.name,
            description: self.description,
            handler,
            input_schema,
        })
    }
}
