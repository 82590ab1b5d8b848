//! MCP server as a hosted function
//!
//! `McpFunction` mounts an [`McpRouter`] under a path prefix (default `/mcp`)
//! and implements [`Function`], so it plugs straight into [`Host`]. It runs in
//! stateless HTTP mode: every request is a self-contained POST, answered from
//! shared state.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};

use crate::bootstrap::StartupGate;
use crate::error::{BoxError, Error, JsonRpcError, Result};
use crate::function::{Config, Function, Probe};
use crate::jsonrpc::JsonRpcService;
use crate::protocol::{
    JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, JsonRpcResponseMessage,
    McpNotification,
};
use crate::router::McpRouter;

/// Default path prefix where the MCP endpoint is mounted
pub const DEFAULT_MOUNT_PATH: &str = "/mcp";

/// How long requests wait for deferred warmup before giving up
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(5);

type WarmupFn =
    dyn Fn() -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send>>
        + Send
        + Sync;

/// A function serving an MCP router over stateless HTTP.
///
/// Requests to the mount path are handled as JSON-RPC; anything else gets a
/// plain `200 OK`, so the function stays probe-friendly at its root.
pub struct McpFunction {
    router: McpRouter,
    service: JsonRpcService<McpRouter>,
    mount_path: String,
    gate: StartupGate,
    warmup: Option<Arc<WarmupFn>>,
    startup_timeout: Duration,
}

impl McpFunction {
    /// Create a function serving the given router at [`DEFAULT_MOUNT_PATH`]
    pub fn new(router: McpRouter) -> Self {
        Self {
            service: JsonRpcService::new(router.clone()),
            router,
            mount_path: DEFAULT_MOUNT_PATH.to_string(),
            gate: StartupGate::new(),
            warmup: None,
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
        }
    }

    /// Change the mount path
    pub fn mount_path(mut self, path: impl Into<String>) -> Self {
        self.mount_path = path.into();
        self
    }

    /// Register deferred warmup work.
    ///
    /// The closure runs once, triggered by the first MCP request; every
    /// request waits for it to finish (bounded by the startup timeout) before
    /// being dispatched. Warmup failure turns requests into 500s but never
    /// crashes the server.
    pub fn warmup<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        self.warmup = Some(Arc::new(move || Box::pin(f())));
        self
    }

    /// Change how long requests wait for warmup
    pub fn startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    async fn ensure_started(&self) -> Result<()> {
        match &self.warmup {
            Some(warmup) => {
                let init = warmup();
                self.gate.wait_started(init, self.startup_timeout).await
            }
            None => Ok(()),
        }
    }

    async fn handle_mcp(&self, req: Request<Body>) -> Result<Response<Body>> {
        let body = axum::body::to_bytes(req.into_body(), usize::MAX)
            .await
            .map_err(|e| Error::transport(format!("Failed to read request body: {}", e)))?;

        // Notifications carry no id and expect no response body
        if let Ok(notification) = serde_json::from_slice::<JsonRpcNotification>(&body) {
            if serde_json::from_slice::<JsonRpcRequest>(&body).is_err() {
                let parsed = McpNotification::from_jsonrpc(&notification)?;
                self.router.handle_notification(parsed);
                return empty_response(StatusCode::ACCEPTED);
            }
        }

        // Single request or batch
        let response = match serde_json::from_slice::<JsonRpcMessage>(&body) {
            Ok(message) => self.service.call_message(message).await,
            Err(e) => JsonRpcResponseMessage::Single(JsonRpcResponse::error(
                None,
                JsonRpcError::parse_error(format!("Invalid JSON-RPC request: {}", e)),
            )),
        };

        json_response(&response)
    }
}

fn empty_response(status: StatusCode) -> Result<Response<Body>> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    Ok(response)
}

fn json_response<T: serde::Serialize>(response: &T) -> Result<Response<Body>> {
    let body = serde_json::to_vec(response)?;
    let mut http = Response::new(Body::from(body));
    http.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    Ok(http)
}

#[async_trait]
impl Function for McpFunction {
    async fn handle(&self, req: Request<Body>) -> std::result::Result<Response<Body>, BoxError> {
        if req.uri().path().starts_with(&self.mount_path) {
            self.ensure_started().await?;
            return Ok(self.handle_mcp(req).await?);
        }

        Ok(Response::new(Body::from("OK")))
    }

    async fn start(&self, _config: Config) -> std::result::Result<(), BoxError> {
        tracing::info!(mount_path = %self.mount_path, "MCP function starting");
        Ok(())
    }

    async fn stop(&self) -> std::result::Result<(), BoxError> {
        tracing::info!("MCP function stopping");
        Ok(())
    }

    async fn ready(&self) -> Probe {
        // Warmup is lazy: the function is ready to accept the request that
        // will trigger it.
        Probe::ok("Ready")
    }
}
