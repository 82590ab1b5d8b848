//! Retrieval-augmented MCP server backed by a local Ollama instance.
//!
//! Requires an Ollama server (default http://127.0.0.1:11434, override with
//! OLLAMA_URL). On warmup it makes sure the embedding and generation models
//! are present, pulling them if needed.
//!
//! Run with: cargo run --example rag_server

use std::time::Duration;

use tower_func::rag::{DEFAULT_EMBED_MODEL, DEFAULT_GENERATE_MODEL, OllamaClient, RagState, rag_tools};
use tower_func::{BoxError, McpFunction, McpRouter};

async fn ensure_models(ollama: &OllamaClient) -> tower_func::Result<()> {
    let available = ollama.list_models().await?;
    for wanted in [DEFAULT_EMBED_MODEL, DEFAULT_GENERATE_MODEL] {
        if !available.iter().any(|m| m.name.starts_with(wanted)) {
            tracing::info!(model = %wanted, "Pulling missing model");
            ollama.pull_model(wanted).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let state = RagState::new(OllamaClient::from_env());

    let router = McpRouter::new()
        .server_info("rag-server", env!("CARGO_PKG_VERSION"))
        .instructions("Embed documents and answer prompts with retrieved context")
        .tools(rag_tools(state.clone())?);

    let warmup_client = state.ollama.clone();
    let function = McpFunction::new(router)
        .startup_timeout(Duration::from_secs(120))
        .warmup(move || {
            let ollama = warmup_client.clone();
            async move { ensure_models(&ollama).await }
        });

    tower_func::serve(function).await
}
