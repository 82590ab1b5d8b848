//! JSON-RPC 2.0 service layer
//!
//! Wraps an [`McpRouter`](crate::McpRouter) (or any compatible tower service)
//! with JSON-RPC request validation, dispatch, and batch handling.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tower::Layer;
use tower_service::Service;

use crate::error::JsonRpcError;
use crate::protocol::{
    JsonRpcMessage, JsonRpcRequest, JsonRpcResponse, JsonRpcResponseMessage, McpRequest,
};
use crate::router::{RouterRequest, RouterResponse};

/// Tower layer that adds JSON-RPC handling to an MCP service
#[derive(Debug, Clone, Default)]
pub struct JsonRpcLayer;

impl JsonRpcLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for JsonRpcLayer {
    type Service = JsonRpcService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        JsonRpcService::new(inner)
    }
}

/// Service wrapper translating JSON-RPC requests into MCP requests
#[derive(Debug, Clone)]
pub struct JsonRpcService<S> {
    inner: S,
}

impl<S> JsonRpcService<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S> JsonRpcService<S>
where
    S: Service<RouterRequest, Response = RouterResponse, Error = std::convert::Infallible>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    /// Handle a single JSON-RPC request
    pub async fn call_single(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        if let Err(e) = request.validate() {
            return JsonRpcResponse::error(Some(request.id), e);
        }

        let mcp_request = match McpRequest::from_jsonrpc(&request) {
            Ok(r) => r,
            Err(e) => {
                return JsonRpcResponse::error(
                    Some(request.id),
                    JsonRpcError::invalid_params(e.to_string()),
                );
            }
        };

        let mut inner = self.inner.clone();
        match inner
            .call(RouterRequest {
                id: request.id,
                inner: mcp_request,
            })
            .await
        {
            Ok(response) => response.into_jsonrpc(),
            // Error = Infallible
            Err(never) => match never {},
        }
    }

    /// Handle a batch of JSON-RPC requests concurrently.
    ///
    /// An empty batch is a protocol violation per JSON-RPC 2.0.
    pub async fn call_batch(&self, requests: Vec<JsonRpcRequest>) -> Vec<JsonRpcResponse> {
        if requests.is_empty() {
            return vec![JsonRpcResponse::error(
                None,
                JsonRpcError::invalid_request("Batch must not be empty"),
            )];
        }

        futures::future::join_all(requests.into_iter().map(|req| self.call_single(req))).await
    }

    /// Handle a JSON-RPC message, single or batch
    pub async fn call_message(&self, message: JsonRpcMessage) -> JsonRpcResponseMessage {
        match message {
            JsonRpcMessage::Single(request) => {
                JsonRpcResponseMessage::Single(self.call_single(request).await)
            }
            JsonRpcMessage::Batch(requests) => {
                JsonRpcResponseMessage::Batch(self.call_batch(requests).await)
            }
        }
    }
}

impl<S> Service<JsonRpcRequest> for JsonRpcService<S>
where
    S: Service<RouterRequest, Response = RouterResponse, Error = std::convert::Infallible>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send,
{
    type Response = JsonRpcResponse;
    type Error = std::convert::Infallible;
    type Future =
        Pin<Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: JsonRpcRequest) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.call_single(request).await) })
    }
}

impl<S> Service<JsonRpcMessage> for JsonRpcService<S>
where
    S: Service<RouterRequest, Response = RouterResponse, Error = std::convert::Infallible>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send,
{
    type Response = JsonRpcResponseMessage;
    type Error = std::convert::Infallible;
    type Future =
        Pin<Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, message: JsonRpcMessage) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.call_message(message).await) })
    }
}
