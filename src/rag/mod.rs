//! Retrieval-augmented generation tools
//!
//! Wires an Ollama backend and an in-memory vector store into MCP tools:
//! list and pull models, embed remote documents, and answer prompts with the
//! nearest stored document as context.

pub mod ollama;
pub mod store;

pub use ollama::{ChatMessage, DEFAULT_OLLAMA_URL, ModelTag, OllamaClient, fetch_raw_content};
pub use store::{Document, SearchHit, VectorStore, cosine_similarity};

use schemars::JsonSchema;
use serde::Deserialize;

use crate::error::Result;
use crate::protocol::CallToolResult;
use crate::tool::{NoParams, Tool, ToolBuilder};

/// Default model used for embeddings
pub const DEFAULT_EMBED_MODEL: &str = "mxbai-embed-large";

/// Default model used for generation
pub const DEFAULT_GENERATE_MODEL: &str = "llama3.2:3b";

/// Shared state behind the retrieval tools
#[derive(Debug, Clone)]
pub struct RagState {
    pub ollama: OllamaClient,
    pub store: VectorStore,
    pub embed_model: String,
    pub generate_model: String,
}

impl Default for RagState {
    fn default() -> Self {
        Self::new(OllamaClient::default())
    }
}

impl RagState {
    pub fn new(ollama: OllamaClient) -> Self {
        Self {
            ollama,
            store: VectorStore::new(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            generate_model: DEFAULT_GENERATE_MODEL.to_string(),
        }
    }

    /// Override the embedding model
    pub fn embed_model(mut self, model: impl Into<String>) -> Self {
        self.embed_model = model.into();
        self
    }

    /// Override the generation model
    pub fn generate_model(mut self, model: impl Into<String>) -> Self {
        self.generate_model = model.into();
        self
    }

    /// Fetch each URL and embed its whole content as one document.
    /// Returns the number of documents embedded.
    async fn embed_documents(&self, urls: &[String], model: &str) -> Result<usize> {
        let mut count = 0;
        for url in urls {
            let content = fetch_raw_content(url).await?;
            let embedding = self.ollama.embed(model, &content).await?;
            self.store
                .add(Document {
                    id: url.clone(),
                    text: content,
                    embedding,
                })
                .await;
            count += 1;
        }

        tracing::info!(count, "Embedded documents");
        Ok(count)
    }

    /// Answer a prompt with the single nearest stored document as context
    async fn call_model(&self, prompt: &str, model: &str, embed_model: &str) -> Result<String> {
        if self.store.is_empty().await {
            return Err(crate::error::Error::tool(
                "No documents in the store. Embed documents before calling the model.",
            ));
        }

        let embedding = self.ollama.embed(embed_model, prompt).await?;
        let hits = self.store.query(&embedding, 1).await;
        let data = hits
            .first()
            .map(|hit| hit.text.as_str())
            .unwrap_or_default();

        let augmented = format!("Using data: {}, respond to prompt: {}", data, prompt);
        self.ollama.generate(model, &augmented).await
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct PullModelInput {
    /// Name of the model to pull, e.g. "llama3.2:3b"
    model: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct EmbedDocumentInput {
    /// URLs of the documents to fetch and embed
    data: Vec<String>,
    /// Embedding model, defaulting to the server's configured one
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct CallModelInput {
    /// Prompt to answer using the stored documents as context
    prompt: String,
    /// Generation model, defaulting to the server's configured one
    #[serde(default)]
    model: Option<String>,
    /// Embedding model used for the retrieval lookup
    #[serde(default)]
    embed_model: Option<String>,
}

/// Build the retrieval tool set backed by the given state.
///
/// Backend failures (unreachable Ollama, bad URLs) come back as error
/// results, not protocol errors.
pub fn rag_tools(state: RagState) -> Result<Vec<Tool>> {
    let list_models = {
        let state = state.clone();
        ToolBuilder::new("list_models")
            .description("List models available on the Ollama server")
            .handler(move |_input: NoParams| {
                let state = state.clone();
                async move {
                    let models = state.ollama.list_models().await?;
                    let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
                    Ok(CallToolResult::text(names.join("\n")))
                }
            })
            .build()?
    };

    let pull_model = {
        let state = state.clone();
        ToolBuilder::new("pull_model")
            .description("Pull a model onto the Ollama server")
            .handler(move |input: PullModelInput| {
                let state = state.clone();
                async move {
                    state.ollama.pull_model(&input.model).await?;
                    Ok(CallToolResult::text(format!(
                        "Success! model {} is available",
                        input.model
                    )))
                }
            })
            .build()?
    };

    let embed_document = {
        let state = state.clone();
        ToolBuilder::new("embed_document")
            .description("Fetch documents from URLs and embed them into the vector store")
            .handler(move |input: EmbedDocumentInput| {
                let state = state.clone();
                async move {
                    let model = input
                        .model
                        .unwrap_or_else(|| state.embed_model.clone());
                    let count = state.embed_documents(&input.data, &model).await?;
                    Ok(CallToolResult::text(format!(
                        "ok - Embedded {} documents",
                        count
                    )))
                }
            })
            .build()?
    };

    let call_model = {
        let state = state.clone();
        ToolBuilder::new("call_model")
            .description("Answer a prompt using the most relevant stored document as context")
            .handler(move |input: CallModelInput| {
                let state = state.clone();
                async move {
                    let model = input
                        .model
                        .unwrap_or_else(|| state.generate_model.clone());
                    let embed_model = input
                        .embed_model
                        .unwrap_or_else(|| state.embed_model.clone());
                    let answer = state
                        .call_model(&input.prompt, &model, &embed_model)
                        .await?;
                    Ok(CallToolResult::text(answer))
                }
            })
            .build()?
    };

    Ok(vec![list_models, pull_model, embed_document, call_model])
}
