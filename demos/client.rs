//! Client that walks through the echo server's surface.
//!
//! Start the server first: cargo run --example echo_server
//! Then: cargo run --example client

use std::collections::HashMap;

use tower_func::{BoxError, McpClient};

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let client = McpClient::http("http://127.0.0.1:8080/mcp").client_info("demo-client", "1.0.0");

    let init = client.initialize().await?;
    println!(
        "Connected to {} {} (protocol {})",
        init.server_info.name, init.server_info.version, init.protocol_version
    );

    let tools = client.list_tools().await?;
    println!("\nTools:");
    for tool in &tools.tools {
        println!("  {} - {}", tool.name, tool.description.as_deref().unwrap_or(""));
    }

    let result = client
        .call_tool("hello_tool", serde_json::json!({"name": "MCP Client"}))
        .await?;
    println!("\nhello_tool: {}", result.text_content().unwrap_or(""));

    let result = client
        .call_tool("add_numbers", serde_json::json!({"a": 20.0, "b": 22.0}))
        .await?;
    println!("add_numbers: {}", result.text_content().unwrap_or(""));

    let resource = client.read_resource("echo://hello-world").await?;
    println!(
        "echo resource: {}",
        resource.contents[0].text.as_deref().unwrap_or("")
    );

    let mut args = HashMap::new();
    args.insert("name".to_string(), "Johnny".to_string());
    let prompt = client.get_prompt("greeting_prompt", args).await?;
    println!("greeting_prompt: {} message(s)", prompt.messages.len());

    Ok(())
}
