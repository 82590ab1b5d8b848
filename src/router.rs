//! MCP Router - routes requests to tools, resources, and prompts
//!
//! The router implements Tower's `Service` trait, making it composable with
//! standard tower middleware.

use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tower_service::Service;

use crate::error::{Error, JsonRpcError, Result};
use crate::prompt::Prompt;
use crate::protocol::*;
use crate::resource::{Resource, ResourceTemplate};
use crate::session::SessionState;
use crate::tool::Tool;

/// MCP Router that dispatches requests to registered handlers
///
/// Cloning is cheap: clones share registered handlers and session state, which
/// is what stateless HTTP serving needs - every request sees the same session
/// phase.
///
/// # Example
///
/// ```rust
/// use tower_func::{McpRouter, ToolBuilder, CallToolResult};
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, JsonSchema)]
/// struct Input { name: String }
///
/// let hello = ToolBuilder::new("hello_tool")
///     .description("Say hello to someone")
///     .handler(|i: Input| async move {
///         Ok(CallToolResult::text(format!("Hey there {}!", i.name)))
///     })
///     .build()
///     .unwrap();
///
/// let router = McpRouter::new()
///     .server_info("echo-server", "1.0.0")
///     .tool(hello);
/// ```
#[derive(Clone)]
pub struct McpRouter {
    inner: Arc<RouterInner>,
    session: SessionState,
}

impl std::fmt::Debug for McpRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpRouter")
            .field("server_name", &self.inner.server_name)
            .field("server_version", &self.inner.server_version)
            .field("tools_count", &self.inner.tools.len())
            .field("resources_count", &self.inner.resources.len())
            .field("prompts_count", &self.inner.prompts.len())
            .field("session", &self.session)
            .finish()
    }
}

#[derive(Clone)]
struct RouterInner {
    server_name: String,
    server_version: String,
    instructions: Option<String>,
    tools: HashMap<String, Arc<Tool>>,
    resources: HashMap<String, Arc<Resource>>,
    /// Resource templates tried in registration order after static lookup fails
    resource_templates: Vec<Arc<ResourceTemplate>>,
    prompts: HashMap<String, Arc<Prompt>>,
}

impl Default for McpRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl McpRouter {
    /// Create a new MCP router
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RouterInner {
                server_name: "tower-func".to_string(),
                server_version: env!("CARGO_PKG_VERSION").to_string(),
                instructions: None,
                tools: HashMap::new(),
                resources: HashMap::new(),
                resource_templates: Vec::new(),
                prompts: HashMap::new(),
            }),
            session: SessionState::new(),
        }
    }

    /// Set server info
    pub fn server_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        let inner = Arc::make_mut(&mut self.inner);
        inner.server_name = name.into();
        inner.server_version = version.into();
        self
    }

    /// Set instructions for LLMs describing how to use this server
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.inner).instructions = Some(instructions.into());
        self
    }

    /// Register a tool
    pub fn tool(mut self, tool: Tool) -> Self {
        Arc::make_mut(&mut self.inner)
            .tools
            .insert(tool.name.clone(), Arc::new(tool));
        self
    }

    /// Register multiple tools at once
    pub fn tools(self, tools: impl IntoIterator<Item = Tool>) -> Self {
        tools
            .into_iter()
            .fold(self, |router, tool| router.tool(tool))
    }

    /// Register a resource
    pub fn resource(mut self, resource: Resource) -> Self {
        Arc::make_mut(&mut self.inner)
            .resources
            .insert(resource.uri.clone(), Arc::new(resource));
        self
    }

    /// Register a resource template
    pub fn resource_template(mut self, template: ResourceTemplate) -> Self {
        Arc::make_mut(&mut self.inner)
            .resource_templates
            .push(Arc::new(template));
        self
    }

    /// Register a prompt
    pub fn prompt(mut self, prompt: Prompt) -> Self {
        Arc::make_mut(&mut self.inner)
            .prompts
            .insert(prompt.name.clone(), Arc::new(prompt));
        self
    }

    /// Get access to the session state
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Handle an MCP notification
    pub fn handle_notification(&self, notification: McpNotification) {
        match notification {
            McpNotification::Initialized => {
                // Stateless mode: the session was already unlocked when the
                // initialize response went out, so this is just an ack.
                tracing::debug!("Client acknowledged initialization");
            }
            McpNotification::Unknown { method, .. } => {
                tracing::debug!(method = %method, "Ignoring unknown notification");
            }
        }
    }

    /// Get server capabilities based on registered handlers
    fn capabilities(&self) -> ServerCapabilities {
        let has_resources =
            !self.inner.resources.is_empty() || !self.inner.resource_templates.is_empty();

        ServerCapabilities {
            tools: if self.inner.tools.is_empty() {
                None
            } else {
                Some(ToolsCapability::default())
            },
            resources: if has_resources {
                Some(ResourcesCapability::default())
            } else {
                None
            },
            prompts: if self.inner.prompts.is_empty() {
                None
            } else {
                Some(PromptsCapability::default())
            },
        }
    }

    /// Handle an MCP request
    async fn handle(&self, request: McpRequest) -> Result<McpResponse> {
        // Enforce session state - reject requests before initialization
        let method = request.method_name();
        if !self.session.allows(method) {
            tracing::warn!(
                method = %method,
                "Request rejected: session not initialized"
            );
            return Err(Error::JsonRpc(JsonRpcError::invalid_request(format!(
                "Session not initialized. Only 'initialize' and 'ping' are allowed before initialization. Got: {}",
                method
            ))));
        }

        match request {
            McpRequest::Initialize(params) => {
                tracing::info!(
                    client = %params.client_info.name,
                    version = %params.client_info.version,
                    "Client initializing"
                );

                // Version negotiation: echo a supported requested version,
                // otherwise answer with our latest.
                let protocol_version = if SUPPORTED_PROTOCOL_VERSIONS
                    .contains(&params.protocol_version.as_str())
                {
                    params.protocol_version
                } else {
                    LATEST_PROTOCOL_VERSION.to_string()
                };

                self.session.unlock();

                Ok(McpResponse::Initialize(InitializeResult {
                    protocol_version,
                    capabilities: self.capabilities(),
                    server_info: Implementation {
                        name: self.inner.server_name.clone(),
                        version: self.inner.server_version.clone(),
                    },
                    instructions: self.inner.instructions.clone(),
                }))
            }

            McpRequest::ListTools(_params) => {
                let tools: Vec<ToolDefinition> =
                    self.inner.tools.values().map(|t| t.definition()).collect();

                Ok(McpResponse::ListTools(ListToolsResult {
                    tools,
                    next_cursor: None,
                }))
            }

            McpRequest::CallTool(params) => {
                let tool =
                    self.inner.tools.get(&params.name).ok_or_else(|| {
                        Error::JsonRpc(JsonRpcError::method_not_found(&params.name))
                    })?;

                tracing::debug!(tool = %params.name, "Calling tool");
                let result = tool.call(params.arguments).await;

                Ok(McpResponse::CallTool(result))
            }

            McpRequest::ListResources(_params) => {
                let resources: Vec<ResourceDefinition> = self
                    .inner
                    .resources
                    .values()
                    .map(|r| r.definition())
                    .collect();

                Ok(McpResponse::ListResources(ListResourcesResult {
                    resources,
                    next_cursor: None,
                }))
            }

            McpRequest::ReadResource(params) => {
                // Static resources take precedence over templates
                if let Some(resource) = self.inner.resources.get(&params.uri) {
                    tracing::debug!(uri = %params.uri, "Reading static resource");
                    let result = resource.read().await?;
                    return Ok(McpResponse::ReadResource(result));
                }

                for template in &self.inner.resource_templates {
                    if let Some(variables) = template.match_uri(&params.uri) {
                        tracing::debug!(
                            uri = %params.uri,
                            template = %template.uri_template,
                            "Reading resource via template"
                        );
                        let result = template.read(&params.uri, variables).await?;
                        return Ok(McpResponse::ReadResource(result));
                    }
                }

                Err(Error::JsonRpc(JsonRpcError::resource_not_found(
                    &params.uri,
                )))
            }

            McpRequest::ListPrompts(_params) => {
                let prompts: Vec<PromptDefinition> = self
                    .inner
                    .prompts
                    .values()
                    .map(|p| p.definition())
                    .collect();

                Ok(McpResponse::ListPrompts(ListPromptsResult {
                    prompts,
                    next_cursor: None,
                }))
            }

            McpRequest::GetPrompt(params) => {
                let prompt = self.inner.prompts.get(&params.name).ok_or_else(|| {
                    Error::JsonRpc(JsonRpcError::method_not_found(&format!(
                        "Prompt not found: {}",
                        params.name
                    )))
                })?;

                tracing::debug!(name = %params.name, "Getting prompt");
                let result = prompt.get(params.arguments).await?;

                Ok(McpResponse::GetPrompt(result))
            }

            McpRequest::Ping => Ok(McpResponse::Pong(EmptyResult {})),

            McpRequest::Unknown { method, .. } => {
                Err(Error::JsonRpc(JsonRpcError::method_not_found(&method)))
            }
        }
    }
}

/// Request type for the router service
#[derive(Debug, Clone)]
pub struct RouterRequest {
    /// JSON-RPC request id, echoed in the response
    pub id: RequestId,
    /// The parsed MCP request
    pub inner: McpRequest,
}

/// Response type for the router service
#[derive(Debug)]
pub struct RouterResponse {
    /// JSON-RPC request id this response answers
    pub id: RequestId,
    /// The MCP response or error
    pub result: Result<McpResponse>,
}

impl RouterResponse {
    /// Convert into a JSON-RPC response
    pub fn into_jsonrpc(self) -> JsonRpcResponse {
        match self.result {
            Ok(response) => match response.to_value() {
                Ok(value) => JsonRpcResponse::result(self.id, value),
                Err(e) => JsonRpcResponse::error(
                    Some(self.id),
                    JsonRpcError::internal_error(e.to_string()),
                ),
            },
            Err(Error::JsonRpc(e)) => JsonRpcResponse::error(Some(self.id), e),
            Err(e) => {
                JsonRpcResponse::error(Some(self.id), JsonRpcError::internal_error(e.to_string()))
            }
        }
    }
}

impl Service<RouterRequest> for McpRouter {
    type Response = RouterResponse;
    type Error = Infallible;
    type Future =
        Pin<Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: RouterRequest) -> Self::Future {
        let router = self.clone();
        Box::pin(async move {
            let result = router.handle(req.inner).await;
            Ok(RouterResponse { id: req.id, result })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{PromptBuilder, user_message};
    use crate::resource::{ResourceBuilder, ResourceTemplateBuilder, text_result};
    use crate::tool::ToolBuilder;
    use schemars::JsonSchema;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct HelloInput {
        name: String,
    }

    fn echo_router() -> McpRouter {
        let hello = ToolBuilder::new("hello_tool")
            .description("Say hello to someone")
            .handler(|input: HelloInput| async move {
                Ok(CallToolResult::text(format!("Hey there {}!", input.name)))
            })
            .build()
            .unwrap();

        let echo = ResourceTemplateBuilder::new("echo://{message}")
            .name("Echo")
            .description("Echo the message as a resource")
            .handler(|uri, vars| async move {
                let message = vars.get("message").cloned().unwrap_or_default();
                Ok(text_result(uri, format!("Echo: {}", message)))
            });

        let greeting = PromptBuilder::new("greeting_prompt")
            .description("Generate a greeting prompt")
            .optional_arg("name", "Name to greet")
            .handler(|args| async move {
                let name = args.get("name").map(String::as_str).unwrap_or("World");
                Ok(user_message(format!(
                    "Please write a friendly greeting for {}",
                    name
                )))
            });

        McpRouter::new()
            .server_info("echo-server", "1.0.0")
            .tool(hello)
            .resource_template(echo)
            .prompt(greeting)
    }

    fn initialize_params() -> McpRequest {
        McpRequest::Initialize(InitializeParams {
            protocol_version: LATEST_PROTOCOL_VERSION.to_string(),
            capabilities: ClientCapabilities::default(),
            client_info: Implementation {
                name: "test-client".to_string(),
                version: "1.0".to_string(),
            },
        })
    }

    async fn initialized_router() -> McpRouter {
        let router = echo_router();
        router.handle(initialize_params()).await.unwrap();
        router.handle_notification(McpNotification::Initialized);
        router
    }

    #[tokio::test]
    async fn test_requests_rejected_before_initialize() {
        let router = echo_router();
        let err = router
            .handle(McpRequest::ListTools(ListToolsParams::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::JsonRpc(_)));

        // Ping is always allowed
        assert!(router.handle(McpRequest::Ping).await.is_ok());
    }

    #[tokio::test]
    async fn test_initialize_advertises_capabilities() {
        let router = echo_router();
        let response = router.handle(initialize_params()).await.unwrap();
        match response {
            McpResponse::Initialize(r) => {
                assert_eq!(r.server_info.name, "echo-server");
                assert!(r.capabilities.tools.is_some());
                assert!(r.capabilities.resources.is_some());
                assert!(r.capabilities.prompts.is_some());
            }
            other => panic!("expected Initialize, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_and_call_tool() {
        let router = initialized_router().await;

        let response = router
            .handle(McpRequest::ListTools(ListToolsParams::default()))
            .await
            .unwrap();
        match response {
            McpResponse::ListTools(r) => assert_eq!(r.tools.len(), 1),
            other => panic!("expected ListTools, got {:?}", other),
        }

        let response = router
            .handle(McpRequest::CallTool(CallToolParams {
                name: "hello_tool".to_string(),
                arguments: serde_json::json!({"name": "MCP Client"}),
            }))
            .await
            .unwrap();
        match response {
            McpResponse::CallTool(r) => {
                assert_eq!(r.text_content(), Some("Hey there MCP Client!"));
            }
            other => panic!("expected CallTool, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_is_jsonrpc_error() {
        let router = initialized_router().await;
        let err = router
            .handle(McpRequest::CallTool(CallToolParams {
                name: "no_such_tool".to_string(),
                arguments: serde_json::json!({}),
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::JsonRpc(_)));
    }

    #[tokio::test]
    async fn test_read_template_resource() {
        let router = initialized_router().await;
        let response = router
            .handle(McpRequest::ReadResource(ReadResourceParams {
                uri: "echo://hello".to_string(),
            }))
            .await
            .unwrap();
        match response {
            McpResponse::ReadResource(r) => {
                assert_eq!(r.contents[0].text.as_deref(), Some("Echo: hello"));
            }
            other => panic!("expected ReadResource, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_static_resource_precedes_template() {
        let pinned = ResourceBuilder::new("echo://fixed").name("Fixed").text("static wins");
        let router = echo_router().resource(pinned);
        router.handle(initialize_params()).await.unwrap();

        let response = router
            .handle(McpRequest::ReadResource(ReadResourceParams {
                uri: "echo://fixed".to_string(),
            }))
            .await
            .unwrap();
        match response {
            McpResponse::ReadResource(r) => {
                assert_eq!(r.contents[0].text.as_deref(), Some("static wins"));
            }
            other => panic!("expected ReadResource, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_prompt() {
        let router = initialized_router().await;
        let mut args = HashMap::new();
        args.insert("name".to_string(), "Johnny".to_string());

        let response = router
            .handle(McpRequest::GetPrompt(GetPromptParams {
                name: "greeting_prompt".to_string(),
                arguments: args,
            }))
            .await
            .unwrap();
        match response {
            McpResponse::GetPrompt(r) => {
                assert_eq!(r.messages.len(), 1);
            }
            other => panic!("expected GetPrompt, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_router_service_impl() {
        use tower::ServiceExt;

        let router = initialized_router().await;
        let response = router
            .clone()
            .oneshot(RouterRequest {
                id: RequestId::Number(9),
                inner: McpRequest::Ping,
            })
            .await
            .unwrap();

        assert_eq!(response.id, RequestId::Number(9));
        assert!(response.result.is_ok());
    }
}
