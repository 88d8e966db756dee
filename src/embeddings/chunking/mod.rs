#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::documents::Document;

/// Represents a chunk of a document ready for embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChunk {
    /// The chunk text
    pub content: String,
    /// Path of the file the parent document was loaded from
    pub source: String,
    /// Row of the parent document within its source file
    pub row: usize,
    /// The index of this chunk within its document
    pub chunk_index: usize,
    /// Length of the chunk in characters
    pub char_count: usize,
}

/// Configuration for fixed-width chunking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Chunk width in characters
    pub chunk_size: usize,
    /// Characters shared by adjacent chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 0,
        }
    }
}

/// Split every document into fixed-width chunks
#[inline]
pub fn chunk_documents(documents: &[Document], config: &ChunkingConfig) -> Vec<ContentChunk> {
    let chunks: Vec<ContentChunk> = documents
        .iter()
        .flat_map(|document| chunk_document(document, config))
        .collect();

    debug!(
        "Chunked {} documents into {} chunks (avg {} chars)",
        documents.len(),
        chunks.len(),
        chunks.iter().map(|c| c.char_count).sum::<usize>() / chunks.len().max(1)
    );

    chunks
}

/// Split a single document into fixed-width chunks
#[inline]
pub fn chunk_document(document: &Document, config: &ChunkingConfig) -> Vec<ContentChunk> {
    split_fixed_width(&document.content, config)
        .into_iter()
        .enumerate()
        .map(|(chunk_index, content)| ContentChunk {
            char_count: content.chars().count(),
            content,
            source: document.source.clone(),
            row: document.row,
            chunk_index,
        })
        .collect()
}

/// Slice `text` into windows of `chunk_size` characters, advancing by
/// `chunk_size - chunk_overlap`. Whitespace-only windows are dropped.
#[inline]
pub fn split_fixed_width(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let size = config.chunk_size.max(1);
    let step = size.saturating_sub(config.chunk_overlap).max(1);

    let mut splits = Vec::with_capacity(chars.len() / step + 1);
    let mut start = 0;

    while start < chars.len() {
        let end = (start + size).min(chars.len());
        let window = &chars[start..end];

        if window.iter().any(|c| !c.is_whitespace()) {
            splits.push(window.iter().collect());
        }

        if end == chars.len() {
            break;
        }
        start += step;
    }

    splits
}
