#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Integration tests that require a local Ollama instance with the embedding model pulled
// Run with: cargo test --test integration_ollama -- --ignored

use anime_recommender::config::{Config, OllamaConfig};
use anime_recommender::embeddings::{Embedder, OllamaClient};
use std::env;
use std::time::Duration;
use tracing::{debug, info};

const TEST_MODEL: &str = "all-minilm:latest";
const DEFAULT_OLLAMA_HOST: &str = "localhost";
const DEFAULT_OLLAMA_PORT: u16 = 11434;

fn create_integration_test_client() -> OllamaClient {
    let host = env::var("OLLAMA_HOST").unwrap_or_else(|_| DEFAULT_OLLAMA_HOST.to_string());
    let port = env::var("OLLAMA_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_OLLAMA_PORT);
    let model = env::var("OLLAMA_MODEL").unwrap_or_else(|_| TEST_MODEL.to_string());

    let config = Config {
        ollama: OllamaConfig {
            host,
            port,
            model,
            batch_size: 5,
            ..OllamaConfig::default()
        },
        ..Config::default()
    };

    OllamaClient::new(&config)
        .expect("Failed to create Ollama client")
        .with_timeout(Duration::from_secs(60))
        .with_retry_attempts(3)
}

fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init()
        .ok();
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    dot / (norm_a * norm_b)
}

#[test]
#[ignore = "requires a local Ollama instance"]
fn real_ollama_health_check() {
    init_test_tracing();

    let client = create_integration_test_client();
    let result = client.health_check();

    assert!(
        result.is_ok(),
        "Health check should succeed with local Ollama: {:?}",
        result
    );
}

#[test]
#[ignore = "requires a local Ollama instance"]
fn real_ollama_list_models() {
    init_test_tracing();

    let client = create_integration_test_client();
    let models = client.list_models().expect("model listing should succeed");

    assert!(!models.is_empty(), "Should have at least one model available");
    for model in &models {
        debug!("Available model: {} (size: {:?})", model.name, model.size);
    }
}

#[test]
#[ignore = "requires a local Ollama instance"]
fn real_ollama_query_embedding_dimensions() {
    init_test_tracing();

    let client = create_integration_test_client();
    let embedding = client
        .embed_query("a quiet slice of life story about a calligrapher")
        .expect("query embedding should succeed");

    info!("Query embedding has {} dimensions", embedding.len());
    assert_eq!(embedding.len(), 384);
}

#[test]
#[ignore = "requires a local Ollama instance"]
fn real_ollama_batch_embeddings_rank_related_text_higher() {
    init_test_tracing();

    let client = create_integration_test_client();
    let texts = vec![
        "Title: Cowboy Bebop Overview: Bounty hunters chase criminals across the solar system. Genres: Action, Space".to_string(),
        "Title: Toradora Overview: Two high school students help each other with their crushes. Genres: Romance, Comedy".to_string(),
        "Title: Another Overview: A cursed classroom where students die one by one. Genres: Horror, Mystery".to_string(),
        "Title: Barakamon Overview: A calligrapher moves to a small island. Genres: Slice of Life".to_string(),
        "Title: Monster Overview: A surgeon hunts the killer he once saved. Genres: Thriller, Psychological".to_string(),
        "Title: Mushishi Overview: A wanderer studies strange life forms. Genres: Slice of Life, Mystery".to_string(),
    ];

    let embeddings = client
        .embed_documents(&texts)
        .expect("batch embedding should succeed");
    assert_eq!(embeddings.len(), texts.len());

    let query = client
        .embed_query("romantic comedy at school")
        .expect("query embedding should succeed");

    let romance = cosine(&query, &embeddings[1]);
    let horror = cosine(&query, &embeddings[2]);
    debug!("romance similarity {}, horror similarity {}", romance, horror);
    assert!(romance > horror);
}
