// Database module
// The persisted vector index lives in LanceDB

pub mod lancedb;

pub use self::lancedb::{ChunkMetadata, EmbeddingRecord, SearchResult, VectorStore};
