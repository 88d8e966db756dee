
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::data::{AnimeDataLoader, load_documents};
use crate::database::lancedb::vector_store::MIN_ROWS_FOR_VECTOR_INDEX;
use crate::database::{ChunkMetadata, EmbeddingRecord, VectorStore};
use crate::embeddings::{ChunkingConfig, ContentChunk, Embedder, OllamaClient, chunk_documents};
use crate::{RecommenderError, Result};

/// Counts from a completed build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildStats {
    pub documents: usize,
    pub chunks: usize,
    pub embeddings: usize,
}

/// Turns the processed CSV into a persisted vector index
pub struct VectorStoreBuilder {
    csv_path: PathBuf,
    index_dir: PathBuf,
    chunking: ChunkingConfig,
    embedder: Arc<dyn Embedder>,
}

impl VectorStoreBuilder {
    #[inline]
    pub fn new(
        csv_path: impl Into<PathBuf>,
        index_dir: impl Into<PathBuf>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            csv_path: csv_path.into(),
            index_dir: index_dir.into(),
            chunking: ChunkingConfig::default(),
            embedder,
        }
    }

    #[inline]
    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Self {
        self.chunking = chunking;
        self
    }

    #[inline]
    pub fn index_dir(&self) -> &Path {
        &self.index_dir
    }

    /// Load, chunk, embed and persist. Any index already at `index_dir` is replaced.
    #[inline]
    pub async fn build_and_save(&self) -> Result<BuildStats> {
        let documents = load_documents(&self.csv_path)?;
        if documents.is_empty() {
            return Err(RecommenderError::Data(format!(
                "No documents found in {}",
                self.csv_path.display()
            )));
        }

        let chunks = chunk_documents(&documents, &self.chunking);
        info!(
            "Split {} documents into {} chunks (size {}, overlap {})",
            documents.len(),
            chunks.len(),
            self.chunking.chunk_size,
            self.chunking.chunk_overlap
        );

        let mut store = VectorStore::create(&self.index_dir).await?;
        let bar = embedding_progress(chunks.len() as u64);
        let mut embeddings = 0;

        for batch in chunks.chunks(self.embedder.batch_size().max(1)) {
            let records = self.embed_batch(batch)?;
            embeddings += records.len();
            store.store_embeddings_batch(records).await?;
            bar.inc(batch.len() as u64);
        }
        bar.finish_and_clear();

        let stored = store.count_embeddings().await?;
        if stored >= MIN_ROWS_FOR_VECTOR_INDEX {
            if let Err(e) = store.create_vector_index().await {
                warn!("Falling back to brute-force search: {}", e);
            }
        } else {
            debug!("Skipping vector index for {} rows", stored);
        }

        info!(
            "Vector store saved to {} ({} embeddings)",
            self.index_dir.display(),
            embeddings
        );

        Ok(BuildStats {
            documents: documents.len(),
            chunks: chunks.len(),
            embeddings,
        })
    }

    fn embed_batch(&self, batch: &[ContentChunk]) -> Result<Vec<EmbeddingRecord>> {
        let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embedder.embed_documents(&texts)?;

        if vectors.len() != batch.len() {
            return Err(RecommenderError::Embedding(format!(
                "Expected {} embeddings, received {}",
                batch.len(),
                vectors.len()
            )));
        }

        let created_at = Utc::now().to_rfc3339();
        Ok(batch
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| EmbeddingRecord {
                id: Uuid::new_v4().to_string(),
                vector,
                metadata: ChunkMetadata {
                    content: chunk.content.clone(),
                    source: chunk.source.clone(),
                    row: chunk.row as u32,
                    chunk_index: chunk.chunk_index as u32,
                    created_at: created_at.clone(),
                },
            })
            .collect())
    }
}

fn embedding_progress(len: u64) -> ProgressBar {
    if !console::user_attended_stderr() {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{pos}/{len}] Embedding chunks {wide_bar}") {
        bar.set_style(style);
    }
    bar
}

/// Process the raw CSV and build the vector index from it.
/// `input` and `output` override the configured raw CSV and index directory.
#[inline]
pub async fn run_build(
    config: &Config,
    input: Option<&Path>,
    output: Option<&Path>,
) -> Result<BuildStats> {
    let result = async {
        let processed_csv = process_data(config, input)?;
        let embedder = connect_embedder(config)?;
        build_index(config, processed_csv, embedder, output).await
    }
    .await;

    result.map_err(|e| {
        error!("Build failed: {}", e);
        RecommenderError::pipeline("Error during pipeline execution", e)
    })
}

/// Same as [`run_build`] with an explicit embedder and without the error wrapping
#[inline]
pub async fn build_with_embedder(
    config: &Config,
    embedder: Arc<dyn Embedder>,
    input: Option<&Path>,
    output: Option<&Path>,
) -> Result<BuildStats> {
    let processed_csv = process_data(config, input)?;
    build_index(config, processed_csv, embedder, output).await
}

fn process_data(config: &Config, input: Option<&Path>) -> Result<PathBuf> {
    let raw_csv = input.map_or_else(|| config.raw_csv_path(), Path::to_path_buf);
    let loader = AnimeDataLoader::new(raw_csv, config.processed_csv_path());
    let processed_csv = loader.load_and_process()?;

    info!("Data loaded and processed into {}", processed_csv.display());
    Ok(processed_csv)
}

fn connect_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    let client = OllamaClient::new(config)
        .and_then(|client| {
            client.health_check()?;
            Ok(client)
        })
        .map_err(|e| RecommenderError::Embedding(format!("{:#}", e)))?;

    Ok(Arc::new(client))
}

async fn build_index(
    config: &Config,
    processed_csv: PathBuf,
    embedder: Arc<dyn Embedder>,
    output: Option<&Path>,
) -> Result<BuildStats> {
    let index_dir = output.map_or_else(|| config.vector_database_path(), Path::to_path_buf);

    let stats = VectorStoreBuilder::new(processed_csv, index_dir, embedder)
        .with_chunking(config.chunking.clone())
        .build_and_save()
        .await?;

    info!(
        "Build complete: {} documents, {} chunks, {} embeddings",
        stats.documents, stats.chunks, stats.embeddings
    );
    Ok(stats)
}
