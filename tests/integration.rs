//! End-to-end tests driving a hosted MCP function through the HTTP router

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use http_body_util::BodyExt;
use schemars::JsonSchema;
use serde::Deserialize;
use tower::ServiceExt;
use tower_func::{
    BoxError, CallToolResult, Function, Host, McpFunction, McpRouter, Probe, PromptBuilder,
    ResourceTemplateBuilder, ToolBuilder, text_result, user_message, LATEST_PROTOCOL_VERSION,
};

#[derive(Debug, Deserialize, JsonSchema)]
struct HelloInput {
    name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct AddInput {
    a: f64,
    b: f64,
}

fn echo_router() -> McpRouter {
    let hello = ToolBuilder::new("hello_tool")
        .description("Say hello to someone")
        .handler(|input: HelloInput| async move {
            Ok(CallToolResult::text(format!("Hey there {}!", input.name)))
        })
        .build()
        .unwrap();

    let add = ToolBuilder::new("add_numbers")
        .description("Add two numbers together")
        .handler(|input: AddInput| async move {
            Ok(CallToolResult::text(format!("{}", input.a + input.b)))
        })
        .build()
        .unwrap();

    let echo = ResourceTemplateBuilder::new("echo://{message}")
        .name("Echo")
        .handler(|uri, vars| async move {
            let message = vars.get("message").cloned().unwrap_or_default();
            Ok(text_result(uri, format!("Echo: {}", message)))
        });

    let greeting = PromptBuilder::new("greeting_prompt")
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
        .tool(add)
        .resource_template(echo)
        .prompt(greeting)
}

fn mcp_request(body: serde_json::Value) -> Request<Body> {
    Request::post("/mcp")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(
    router: &axum::Router,
    body: serde_json::Value,
) -> (StatusCode, Option<serde_json::Value>) {
    let response = router.clone().oneshot(mcp_request(body)).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(&bytes).unwrap())
    };
    (status, value)
}

async fn initialize(router: &axum::Router) {
    let (status, body) = send(
        router,
        serde_json::json!({
            "jsonrpc": "2.0", "id": 1, "method": "initialize",
            "params": {
                "protocolVersion": LATEST_PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {"name": "it", "version": "0"}
            }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["result"]["serverInfo"]["name"], "echo-server");

    let (status, _) = send(
        router,
        serde_json::json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
}

#[tokio::test]
async fn full_mcp_flow_over_http() {
    let router = Host::new(McpFunction::new(echo_router())).into_router();
    initialize(&router).await;

    // tools/list
    let (_, body) = send(
        &router,
        serde_json::json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
    )
    .await;
    let tools = body.unwrap()["result"]["tools"].clone();
    assert_eq!(tools.as_array().unwrap().len(), 2);

    // tools/call
    let (_, body) = send(
        &router,
        serde_json::json!({
            "jsonrpc": "2.0", "id": 3, "method": "tools/call",
            "params": {"name": "hello_tool", "arguments": {"name": "MCP Client"}}
        }),
    )
    .await;
    assert_eq!(
        body.unwrap()["result"]["content"][0]["text"],
        "Hey there MCP Client!"
    );

    // resources/read via template
    let (_, body) = send(
        &router,
        serde_json::json!({
            "jsonrpc": "2.0", "id": 4, "method": "resources/read",
            "params": {"uri": "echo://hi"}
        }),
    )
    .await;
    assert_eq!(body.unwrap()["result"]["contents"][0]["text"], "Echo: hi");

    // prompts/get
    let (_, body) = send(
        &router,
        serde_json::json!({
            "jsonrpc": "2.0", "id": 5, "method": "prompts/get",
            "params": {"name": "greeting_prompt", "arguments": {"name": "Johnny"}}
        }),
    )
    .await;
    let text = body.unwrap()["result"]["messages"][0]["content"]["text"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(text.contains("Johnny"));
}

#[tokio::test]
async fn batch_requests_over_http_answer_each_entry() {
    let router = Host::new(McpFunction::new(echo_router())).into_router();
    initialize(&router).await;

    let (status, body) = send(
        &router,
        serde_json::json!([
            {"jsonrpc": "2.0", "id": 10, "method": "ping"},
            {"jsonrpc": "2.0", "id": 11, "method": "tools/list"}
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let body = body.unwrap();
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["id"], 10);
    assert_eq!(entries[1]["id"], 11);
    assert_eq!(
        entries[1]["result"]["tools"].as_array().unwrap().len(),
        2
    );
}

#[tokio::test]
async fn requests_before_initialize_are_rejected() {
    let router = Host::new(McpFunction::new(echo_router())).into_router();

    let (status, body) = send(
        &router,
        serde_json::json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
    )
    .await;
    // The transport succeeds; the rejection is a JSON-RPC error
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["error"]["code"], -32600);
}

#[tokio::test]
async fn tool_failures_are_results_not_transport_errors() {
    let failing = ToolBuilder::new("fail")
        .handler(|_input: tower_func::NoParams| async move {
            Err::<CallToolResult, _>(tower_func::Error::tool("backend unavailable"))
        })
        .build()
        .unwrap();
    let router = Host::new(McpFunction::new(
        McpRouter::new().server_info("t", "0").tool(failing),
    ))
    .into_router();
    initialize_named(&router).await;

    let (status, body) = send(
        &router,
        serde_json::json!({
            "jsonrpc": "2.0", "id": 2, "method": "tools/call",
            "params": {"name": "fail", "arguments": {}}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let result = body.unwrap()["result"].clone();
    assert_eq!(result["isError"], true);
}

async fn initialize_named(router: &axum::Router) {
    let (status, _) = send(
        router,
        serde_json::json!({
            "jsonrpc": "2.0", "id": 1, "method": "initialize",
            "params": {
                "protocolVersion": LATEST_PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {"name": "it", "version": "0"}
            }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    send(
        router,
        serde_json::json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
    )
    .await;
}

#[tokio::test]
async fn health_probes_bypass_the_function_handler() {
    struct Exploding;

    #[async_trait::async_trait]
    impl Function for Exploding {
        async fn handle(&self, _req: Request<Body>) -> Result<Response<Body>, BoxError> {
            Err("handler must not run for probes".into())
        }
    }

    let router = Host::new(Exploding).into_router();
    for path in ["/health/liveness", "/health/readiness"] {
        let response = router
            .clone()
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn custom_probes_control_status_codes() {
    struct HalfReady;

    #[async_trait::async_trait]
    impl Function for HalfReady {
        async fn handle(&self, _req: Request<Body>) -> Result<Response<Body>, BoxError> {
            Ok(Response::new(Body::from("OK")))
        }

        async fn alive(&self) -> Probe {
            Probe::ok("I am ALIVE")
        }

        async fn ready(&self) -> Probe {
            Probe::fail("still warming caches")
        }
    }

    let router = Host::new(HalfReady).into_router();

    let response = router
        .clone()
        .oneshot(
            Request::get("/health/liveness")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"I am ALIVE");

    let response = router
        .oneshot(
            Request::get("/health/readiness")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn warmup_runs_once_and_gates_requests() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);

    let function = McpFunction::new(echo_router())
        .startup_timeout(Duration::from_secs(2))
        .warmup(move || {
            let counter = Arc::clone(&counter);
            async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
    let router = Host::new(function).into_router();

    initialize(&router).await;
    for id in 0..4 {
        let (status, _) = send(
            &router,
            serde_json::json!({"jsonrpc": "2.0", "id": id, "method": "ping"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn warmup_failure_becomes_500_not_a_crash() {
    let function = McpFunction::new(echo_router())
        .warmup(|| async { Err(tower_func::Error::Startup("no backend".to_string())) });
    let router = Host::new(function).into_router();

    let response = router
        .clone()
        .oneshot(mcp_request(
            serde_json::json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // The server keeps serving: probes still answer
    let response = router
        .oneshot(
            Request::get("/health/liveness")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn non_mcp_paths_answer_ok() {
    let router = Host::new(McpFunction::new(echo_router())).into_router();
    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn malformed_body_is_parse_error() {
    let router = Host::new(McpFunction::new(echo_router())).into_router();
    let response = router
        .oneshot(
            Request::post("/mcp")
                .body(Body::from("this is not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], -32700);
}
