// Embeddings module
// Fixed-width chunking and the Ollama embedding client

pub mod chunking;
pub mod ollama;

pub use chunking::{ChunkingConfig, ContentChunk, chunk_document, chunk_documents};
pub use ollama::{EmbeddingResult, OllamaClient};

use crate::Result;

/// Turns text into vectors for indexing and querying
pub trait Embedder: Send + Sync {
    /// Embed texts destined for the index, preserving input order
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single search query
    fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Preferred number of texts per `embed_documents` call
    fn batch_size(&self) -> usize {
        32
    }
}
