// LanceDB vector database module
// Persists chunk embeddings and serves similarity search over them


pub mod vector_store;

use serde::{Deserialize, Serialize};

pub use vector_store::{SearchResult, VectorStore};

/// Embedding record stored in LanceDB
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Unique identifier for this embedding
    pub id: String,
    /// The vector embedding (384 dimensions for all-minilm)
    pub vector: Vec<f32>,
    /// Metadata about the chunk this embedding represents
    pub metadata: ChunkMetadata,
}

/// Metadata for a chunk stored alongside its embedding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    /// The actual text content of the chunk
    pub content: String,
    /// Path of the CSV file the chunk was loaded from
    pub source: String,
    /// Row of the source document within that file
    pub row: u32,
    /// Index of this chunk within its document
    pub chunk_index: u32,
    /// Timestamp when this embedding was created
    pub created_at: String,
}
