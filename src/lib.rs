//! # tower-func
//!
//! A Tower-native runtime for serving functions over HTTP, with a built-in
//! MCP (Model Context Protocol) tool endpoint.
//!
//! A function is anything implementing [`Function`]: one required `handle`
//! method plus optional lifecycle hooks (`start`, `stop`) and health probes
//! (`alive`, `ready`). The [`Host`] serves it with health routes at
//! `/health/liveness` and `/health/readiness`, converts handler errors into
//! 500 responses, and runs the lifecycle hooks around the listener.
//!
//! ```rust,no_run
//! use axum::body::Body;
//! use axum::http::{Request, Response};
//! use tower_func::{Function, BoxError};
//!
//! struct Hello;
//!
//! #[async_trait::async_trait]
//! impl Function for Hello {
//!     async fn handle(&self, _req: Request<Body>) -> Result<Response<Body>, BoxError> {
//!         Ok(Response::new(Body::from("OK")))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), BoxError> {
//!     tower_func::serve(Hello).await
//! }
//! ```
//!
//! ## MCP functions
//!
//! [`McpFunction`] wraps an [`McpRouter`] of tools, resources, and prompts
//! and serves it statelessly at `/mcp`:
//!
//! ```rust,no_run
//! use tower_func::{CallToolResult, McpFunction, McpRouter, ToolBuilder};
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize, JsonSchema)]
//! struct HelloInput { name: String }
//!
//! # fn main() -> Result<(), tower_func::Error> {
//! let hello = ToolBuilder::new("hello_tool")
//!     .description("Say hello to someone")
//!     .handler(|input: HelloInput| async move {
//!         Ok(CallToolResult::text(format!("Hey there {}!", input.name)))
//!     })
//!     .build()?;
//!
//! let router = McpRouter::new()
//!     .server_info("echo-server", "1.0.0")
//!     .tool(hello);
//!
//! let function = McpFunction::new(router);
//! # Ok(())
//! # }
//! ```
//!
//! Functions that need async setup before their first request register it
//! with [`McpFunction::warmup`]; the work runs exactly once and every request
//! waits for it with a bounded timeout.

pub mod bootstrap;
pub mod client;
pub mod error;
pub mod function;
pub mod host;
pub mod jsonrpc;
pub mod mcp;
pub mod prompt;
pub mod protocol;
pub mod rag;
pub mod resource;
pub mod router;
pub mod session;
pub mod tool;

pub use bootstrap::StartupGate;
pub use client::{ClientTransport, HttpClientTransport, McpClient};
pub use error::{BoxError, Error, ErrorCode, JsonRpcError, Result};
pub use function::{Config, Function, Probe, DEFAULT_LISTEN_ADDRESS};
pub use host::{Host, serve};
pub use jsonrpc::{JsonRpcLayer, JsonRpcService};
pub use mcp::McpFunction;
pub use prompt::{Prompt, PromptBuilder, PromptHandler, user_message};
pub use protocol::{
    CallToolResult, Content, GetPromptResult, Implementation, InitializeResult, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, ReadResourceResult, RequestId, LATEST_PROTOCOL_VERSION,
};
pub use resource::{
    Resource, ResourceBuilder, ResourceHandler, ResourceTemplate, ResourceTemplateBuilder,
    text_result,
};
pub use router::McpRouter;
pub use session::SessionState;
pub use tool::{NoParams, Tool, ToolBuilder, ToolHandler};
