use anyhow::{Context, Result};
use console::style;
use std::path::Path;
use tracing::info;

use crate::config::Config;
use crate::pipeline::{AnimeRecommendationPipeline, PipelineCache, run_build};
use crate::ui::{self, render_response};

/// Process the raw dataset and build the vector index
#[inline]
pub async fn build_index(
    config_dir: &Path,
    input: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;

    info!("Starting build pipeline");
    let stats = run_build(&config, input, output).await?;

    let index_dir = output.map_or_else(|| config.vector_database_path(), Path::to_path_buf);
    println!("{}", style("✓ Vector index built successfully!").green());
    println!("  Documents: {}", stats.documents);
    println!("  Chunks: {}", stats.chunks);
    println!("  Embeddings: {}", stats.embeddings);
    println!("  Index: {}", index_dir.display());

    Ok(())
}

/// Answer a single query and print the rendered result
#[inline]
pub async fn recommend_once(config_dir: &Path, query: &str) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;

    let pipeline = AnimeRecommendationPipeline::new(&config).await?;
    let response = pipeline.recommend(query).await?;

    println!("{}", render_response(&response).to_text());
    Ok(())
}

/// Start the interactive terminal page
#[inline]
pub async fn run_ui(config_dir: &Path) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;
    let cache = PipelineCache::new(config);

    ui::run(&cache).await
}
