//! In-memory vector store with cosine similarity search

use std::sync::Arc;

use tokio::sync::RwLock;

/// A stored document and its embedding
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A search hit with its similarity score
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: String,
    pub text: String,
    pub score: f32,
}

/// Cosine similarity between two vectors.
///
/// Returns 0.0 for mismatched dimensions or near-zero norms.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }
    dot / denom
}

/// Thread-safe in-memory vector store
#[derive(Debug, Clone, Default)]
pub struct VectorStore {
    documents: Arc<RwLock<Vec<Document>>>,
}

impl VectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document, replacing any existing document with the same id
    pub async fn add(&self, document: Document) {
        let mut documents = self.documents.write().await;
        documents.retain(|d| d.id != document.id);
        documents.push(document);
    }

    /// Number of stored documents
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// Find the `n` most similar documents to the query embedding,
    /// best match first.
    pub async fn query(&self, embedding: &[f32], n: usize) -> Vec<SearchHit> {
        let documents = self.documents.read().await;
        let mut hits: Vec<SearchHit> = documents
            .iter()
            .map(|d| SearchHit {
                id: d.id.clone(),
                text: d.text.clone(),
                score: cosine_similarity(embedding, &d.embedding),
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(n);
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn test_query_returns_nearest_first() {
        let store = VectorStore::new();
        store
            .add(Document {
                id: "a".to_string(),
                text: "about cats".to_string(),
                embedding: vec![1.0, 0.0],
            })
            .await;
        store
            .add(Document {
                id: "b".to_string(),
                text: "about dogs".to_string(),
                embedding: vec![0.0, 1.0],
            })
            .await;

        let hits = store.query(&[0.9, 0.1], 1).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
    }

    #[tokio::test]
    async fn test_add_replaces_same_id() {
        let store = VectorStore::new();
        for text in ["first", "second"] {
            store
                .add(Document {
                    id: "doc".to_string(),
                    text: text.to_string(),
                    embedding: vec![1.0],
                })
                .await;
        }

        assert_eq!(store.len().await, 1);
        let hits = store.query(&[1.0], 1).await;
        assert_eq!(hits[0].text, "second");
    }
}
