// Recommendation chain
// retrieve -> format context -> fill prompt -> chat model -> raw text

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::database::VectorStore;
use crate::embeddings::Embedder;
use crate::llm::{ChatModel, PromptTemplate, anime_prompt};
use crate::{RecommenderError, Result};

/// Upper bound on documents placed into the prompt context
pub const MAX_CONTEXT_DOCS: usize = 8;

/// Number of chunks fetched per query
pub const DEFAULT_TOP_K: usize = 4;

/// A chunk returned by retrieval, most relevant first
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedDocument {
    pub page_content: String,
    pub source: String,
    pub row: u32,
    pub score: f32,
}

/// Fetches the documents relevant to a query
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedDocument>>;
}

/// Similarity search over the persisted index
pub struct VectorStoreRetriever {
    store: VectorStore,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl VectorStoreRetriever {
    #[inline]
    pub fn new(store: VectorStore, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store,
            embedder,
            top_k: DEFAULT_TOP_K,
        }
    }

    #[inline]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    #[inline]
    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

#[async_trait]
impl Retriever for VectorStoreRetriever {
    #[inline]
    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedDocument>> {
        let query_vector = self.embedder.embed_query(query)?;
        let results = self.store.search_similar(&query_vector, self.top_k).await?;

        debug!("Retrieved {} chunks for query", results.len());

        Ok(results
            .into_iter()
            .map(|result| RetrievedDocument {
                page_content: result.chunk_metadata.content,
                source: result.chunk_metadata.source,
                row: result.chunk_metadata.row,
                score: result.similarity_score,
            })
            .collect())
    }
}

/// Join the page contents of at most `max_docs` documents with a blank line
#[inline]
pub fn format_docs(docs: &[RetrievedDocument], max_docs: usize) -> String {
    docs.iter()
        .take(max_docs)
        .map(|doc| doc.page_content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub struct AnimeRecommender {
    retriever: Arc<dyn Retriever>,
    llm: Arc<dyn ChatModel>,
    prompt: PromptTemplate,
    max_context_docs: usize,
}

impl AnimeRecommender {
    #[inline]
    pub fn new(retriever: Arc<dyn Retriever>, llm: Arc<dyn ChatModel>) -> Self {
        Self {
            retriever,
            llm,
            prompt: anime_prompt(),
            max_context_docs: MAX_CONTEXT_DOCS,
        }
    }

    #[inline]
    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    #[inline]
    pub fn with_max_context_docs(mut self, max_context_docs: usize) -> Self {
        self.max_context_docs = max_context_docs.max(1);
        self
    }

    /// Answer `query` with the model's raw text. Fails with
    /// [`RecommenderError::EmptyRetrieval`] when the index returns nothing.
    #[inline]
    pub async fn get_recommendation(&self, query: &str) -> Result<String> {
        let docs = self.retriever.retrieve(query).await?;
        if docs.is_empty() {
            warn!("No documents retrieved for query '{}'", query);
            return Err(RecommenderError::EmptyRetrieval(query.to_string()));
        }

        let context = format_docs(&docs, self.max_context_docs);
        let prompt = self.prompt.format_context_question(&context, query)?;

        debug!(
            "Prompt built from {} of {} retrieved documents",
            docs.len().min(self.max_context_docs),
            docs.len()
        );

        let response = self.llm.complete(&prompt)?;
        if response.trim().is_empty() {
            return Err(RecommenderError::Llm(format!(
                "{} returned an empty completion",
                self.llm.model_name()
            )));
        }

        info!("Generated recommendation ({} chars)", response.len());
        Ok(response)
    }
}
