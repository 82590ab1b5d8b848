//! MCP server with a greeting tool, an adder, an echo resource, and a prompt.
//!
//! Run with: cargo run --example echo_server
//!
//! Then exercise it with the client demo: cargo run --example client

use schemars::JsonSchema;
use serde::Deserialize;
use tower_func::{
    BoxError, CallToolResult, McpFunction, McpRouter, PromptBuilder, ResourceTemplateBuilder,
    ToolBuilder, text_result, user_message,
};

#[derive(Debug, Deserialize, JsonSchema)]
struct HelloInput {
    /// Name of the person to greet
    name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct AddInput {
    a: f64,
    b: f64,
}

fn build_router() -> Result<McpRouter, tower_func::Error> {
    let hello = ToolBuilder::new("hello_tool")
        .description("Say hello to someone")
        .handler(|input: HelloInput| async move {
            Ok(CallToolResult::text(format!("Hey there {}!", input.name)))
        })
        .build()?;

    let add = ToolBuilder::new("add_numbers")
        .description("Add two numbers together")
        .handler(|input: AddInput| async move {
            Ok(CallToolResult::text(format!("{}", input.a + input.b)))
        })
        .build()?;

    let echo = ResourceTemplateBuilder::new("echo://{message}")
        .name("Echo")
        .description("Echo the message back as a resource")
        .handler(|uri, vars| async move {
            let message = vars.get("message").cloned().unwrap_or_default();
            Ok(text_result(uri, format!("Echo: {}", message)))
        });

    let greeting = PromptBuilder::new("greeting_prompt")
        .description("Generate a greeting prompt")
        .optional_arg("name", "Name of the person to greet")
        .handler(|args| async move {
            let name = args.get("name").map(String::as_str).unwrap_or("World");
            Ok(user_message(format!(
                "Please write a friendly greeting for {}",
                name
            )))
        });

    Ok(McpRouter::new()
        .server_info("echo-server", env!("CARGO_PKG_VERSION"))
        .instructions("A demo server with greeting and arithmetic tools")
        .tool(hello)
        .tool(add)
        .resource_template(echo)
        .prompt(greeting))
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let function = McpFunction::new(build_router()?);
    tower_func::serve(function).await
}
