use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecommenderError>;

#[derive(Error, Debug)]
pub enum RecommenderError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing column(s) in CSV file: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Data error: {0}")]
    Data(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Vector index not found at {0} (run `anime-recommender build` first)")]
    IndexNotFound(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("No documents were retrieved for query '{0}'; the vector index may be empty")]
    EmptyRetrieval(String),

    #[error("{message}: {source}")]
    Pipeline {
        message: String,
        #[source]
        source: Box<RecommenderError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl RecommenderError {
    /// Wrap an error with a pipeline-stage message, keeping the original as the source
    #[inline]
    pub fn pipeline(message: impl Into<String>, source: Self) -> Self {
        Self::Pipeline {
            message: message.into(),
            source: Box::new(source),
        }
    }
}

pub mod commands;
pub mod config;
pub mod data;
pub mod database;
pub mod embeddings;
mod http;
pub mod llm;
pub mod pipeline;
pub mod recommender;
pub mod ui;
