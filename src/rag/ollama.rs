//! Ollama HTTP API client
//!
//! Covers the endpoints the retrieval tools need: embeddings, generation,
//! model listing, and model pulls. Errors are reported as transport errors;
//! the tool layer converts them into error results for the caller.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default Ollama server address
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Environment variable overriding the Ollama server address
pub const OLLAMA_URL_VAR: &str = "OLLAMA_URL";

/// Client for a local or remote Ollama server
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct PullRequest<'a> {
    model: &'a str,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

/// A model known to the Ollama server
#[derive(Debug, Clone, Deserialize)]
pub struct ModelTag {
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new(DEFAULT_OLLAMA_URL)
    }
}

impl OllamaClient {
    /// Create a client for the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Create a client from the environment, honoring `OLLAMA_URL`
    pub fn from_env() -> Self {
        match std::env::var(OLLAMA_URL_VAR) {
            Ok(url) => Self::new(url),
            Err(_) => Self::default(),
        }
    }

    /// Embed a single input text, returning its vector
    pub async fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>> {
        let response: EmbedResponse = self
            .client
            .post(format!("{}/api/embed", self.base_url))
            .json(&EmbedRequest { model, input })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| Error::transport("Ollama returned no embeddings"))
    }

    /// Generate a completion for the given prompt (non-streaming)
    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let response: GenerateResponse = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&GenerateRequest {
                model,
                prompt,
                stream: false,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.response)
    }

    /// Send a chat conversation and return the assistant reply (non-streaming)
    pub async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String> {
        let response: ChatResponse = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&ChatRequest {
                model,
                messages,
                stream: false,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.message.content)
    }

    /// List models available on the server
    pub async fn list_models(&self) -> Result<Vec<ModelTag>> {
        let response: TagsResponse = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.models)
    }

    /// Pull a model onto the server, waiting for completion
    pub async fn pull_model(&self, model: &str) -> Result<()> {
        self.client
            .post(format!("{}/api/pull", self.base_url))
            .json(&PullRequest {
                model,
                stream: false,
            })
            .send()
            .await?
            .error_for_status()?;

        tracing::info!(model = %model, "Model pulled");
        Ok(())
    }
}

/// Fetch raw text content from a URL.
///
/// Used by the document-embedding tool to ingest remote documents.
pub async fn fetch_raw_content(url: &str) -> Result<String> {
    let response = reqwest::get(url).await?.error_for_status()?;
    Ok(response.text().await?)
}
