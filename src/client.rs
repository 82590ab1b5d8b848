//! MCP client over HTTP
//!
//! A thin client for exercising MCP functions: initialize, list and call
//! tools, read resources, get prompts. Pluggable transport so tests can swap
//! HTTP out.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::protocol::*;

/// Transport abstraction for sending JSON-RPC to a server
#[async_trait]
pub trait ClientTransport: Send + Sync {
    /// Send a request and wait for its response
    async fn request(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse>;

    /// Send a notification (no response expected)
    async fn notify(&self, notification: JsonRpcNotification) -> Result<()>;
}

/// HTTP transport posting JSON-RPC to a single endpoint
pub struct HttpClientTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpClientTransport {
    /// Create a transport for the given endpoint, e.g. `http://127.0.0.1:8080/mcp`
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ClientTransport for HttpClientTransport {
    async fn request(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<JsonRpcResponse>().await?)
    }

    async fn notify(&self, notification: JsonRpcNotification) -> Result<()> {
        self.client
            .post(&self.endpoint)
            .json(&notification)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// MCP client
pub struct McpClient<T: ClientTransport> {
    transport: T,
    client_info: Implementation,
    next_id: AtomicI64,
    initialized: std::sync::atomic::AtomicBool,
}

impl McpClient<HttpClientTransport> {
    /// Create an HTTP client for the given MCP endpoint
    pub fn http(endpoint: impl Into<String>) -> Self {
        Self::with_transport(HttpClientTransport::new(endpoint))
    }
}

impl<T: ClientTransport> McpClient<T> {
    /// Create a client over a custom transport
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            client_info: Implementation {
                name: "tower-func-client".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            next_id: AtomicI64::new(1),
            initialized: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Set the client name and version sent during initialization
    pub fn client_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.client_info = Implementation {
            name: name.into(),
            version: version.into(),
        };
        self
    }

    fn next_id(&self) -> RequestId {
        RequestId::Number(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    async fn request<R: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<R> {
        let mut request = JsonRpcRequest::new(self.next_id(), method);
        if let Some(params) = params {
            request = request.with_params(params);
        }

        let value = self.transport.request(request).await?.into_result()?;
        Ok(serde_json::from_value(value)?)
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(Error::Internal(
                "Client not initialized. Call initialize() first.".to_string(),
            ))
        }
    }

    /// Perform the initialization handshake.
    ///
    /// Sends `initialize` followed by the `notifications/initialized`
    /// acknowledgement.
    pub async fn initialize(&self) -> Result<InitializeResult> {
        let params = InitializeParams {
            protocol_version: LATEST_PROTOCOL_VERSION.to_string(),
            capabilities: ClientCapabilities::default(),
            client_info: self.client_info.clone(),
        };

        let result: InitializeResult = self
            .request("initialize", Some(serde_json::to_value(&params)?))
            .await?;

        self.transport
            .notify(JsonRpcNotification::new(notifications::INITIALIZED))
            .await?;

        self.initialized.store(true, Ordering::Release);
        tracing::debug!(
            server = %result.server_info.name,
            version = %result.protocol_version,
            "Initialized MCP session"
        );
        Ok(result)
    }

    /// List available tools
    pub async fn list_tools(&self) -> Result<ListToolsResult> {
        self.ensure_initialized()?;
        self.request("tools/list", None).await
    }

    /// Call a tool by name
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult> {
        self.ensure_initialized()?;
        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };
        self.request("tools/call", Some(serde_json::to_value(&params)?))
            .await
    }

    /// List available resources
    pub async fn list_resources(&self) -> Result<ListResourcesResult> {
        self.ensure_initialized()?;
        self.request("resources/list", None).await
    }

    /// Read a resource by URI
    pub async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult> {
        self.ensure_initialized()?;
        let params = ReadResourceParams {
            uri: uri.to_string(),
        };
        self.request("resources/read", Some(serde_json::to_value(&params)?))
            .await
    }

    /// List available prompts
    pub async fn list_prompts(&self) -> Result<ListPromptsResult> {
        self.ensure_initialized()?;
        self.request("prompts/list", None).await
    }

    /// Get a prompt by name
    pub async fn get_prompt(
        &self,
        name: &str,
        arguments: HashMap<String, String>,
    ) -> Result<GetPromptResult> {
        self.ensure_initialized()?;
        let params = GetPromptParams {
            name: name.to_string(),
            arguments,
        };
        self.request("prompts/get", Some(serde_json::to_value(&params)?))
            .await
    }

    /// Send a ping
    pub async fn ping(&self) -> Result<()> {
        let _: EmptyResult = self.request("ping", None).await?;
        Ok(())
    }
}
