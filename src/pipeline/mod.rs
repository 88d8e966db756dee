// Pipeline module
// Wires the persisted index, embedder and chat model into a recommender

pub mod build;


use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::config::Config;
use crate::database::VectorStore;
use crate::embeddings::OllamaClient;
use crate::llm::GroqClient;
use crate::recommender::{AnimeRecommender, VectorStoreRetriever};
use crate::{RecommenderError, Result};

pub use build::{BuildStats, VectorStoreBuilder, build_with_embedder, run_build};

/// Entry point used by the CLI and the UI
pub struct AnimeRecommendationPipeline {
    recommender: AnimeRecommender,
}

impl AnimeRecommendationPipeline {
    /// Open the persisted index and connect the clients, reading the API key
    /// from the environment variable named in `[llm] api_key_env`
    #[inline]
    pub async fn new(config: &Config) -> Result<Self> {
        Self::with_key_lookup(config, |name| std::env::var(name).ok()).await
    }

    /// As [`Self::new`], resolving the API key through `lookup`
    #[inline]
    pub async fn with_key_lookup<F>(config: &Config, lookup: F) -> Result<Self>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        info!("Initializing recommendation pipeline");

        let result = Self::connect(config, lookup).await;
        match result {
            Ok(pipeline) => {
                info!("Pipeline initialized successfully");
                Ok(pipeline)
            }
            Err(e) => {
                error!("Failed to initialize pipeline: {}", e);
                Err(RecommenderError::pipeline(
                    "Error during pipeline initialisation",
                    e,
                ))
            }
        }
    }

    async fn connect<F>(config: &Config, lookup: F) -> Result<Self>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        let store = VectorStore::open(&config.vector_database_path()).await?;

        let api_key = config
            .llm
            .api_key_from(lookup)
            .map_err(|e| RecommenderError::Config(e.to_string()))?;
        let llm = GroqClient::new(&config.llm, api_key)?;

        let embedder = OllamaClient::new(config)
            .map_err(|e| RecommenderError::Embedding(format!("{:#}", e)))?;

        let retriever =
            VectorStoreRetriever::new(store, Arc::new(embedder)).with_top_k(config.retrieval.top_k);
        let recommender = AnimeRecommender::new(Arc::new(retriever), Arc::new(llm))
            .with_max_context_docs(config.retrieval.max_context_docs);

        Ok(Self { recommender })
    }

    /// Wrap an already assembled recommender
    #[inline]
    pub fn from_recommender(recommender: AnimeRecommender) -> Self {
        Self { recommender }
    }

    /// Recommend anime for a free-text preference. The model's text is returned unchanged.
    #[inline]
    pub async fn recommend(&self, query: &str) -> Result<String> {
        info!("Received a query: {}", query);

        match self.recommender.get_recommendation(query).await {
            Ok(response) => {
                info!("Recommendation generated successfully");
                Ok(response)
            }
            Err(e) => {
                error!("Failed to get recommendation: {}", e);
                Err(RecommenderError::pipeline(
                    "Error while generating recommendation",
                    e,
                ))
            }
        }
    }
}

/// Builds the pipeline on first use and hands out the same instance afterwards.
/// A failed initialisation is not cached; the next call tries again.
pub struct PipelineCache {
    config: Config,
    cell: OnceCell<AnimeRecommendationPipeline>,
}

impl PipelineCache {
    #[inline]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cell: OnceCell::new(),
        }
    }

    /// A cache that already holds `pipeline`
    #[inline]
    pub fn with_pipeline(config: Config, pipeline: AnimeRecommendationPipeline) -> Self {
        Self {
            config,
            cell: OnceCell::new_with(Some(pipeline)),
        }
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    #[inline]
    pub async fn get(&self) -> Result<&AnimeRecommendationPipeline> {
        self.cell
            .get_or_try_init(|| AnimeRecommendationPipeline::new(&self.config))
            .await
    }
}
