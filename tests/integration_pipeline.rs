#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// End-to-end build and recommendation with a deterministic embedder and a scripted model

use anime_recommender::config::Config;
use anime_recommender::data::{AnimeDataLoader, COMBINED_COLUMN};
use anime_recommender::database::VectorStore;
use anime_recommender::embeddings::Embedder;
use anime_recommender::llm::ChatModel;
use anime_recommender::pipeline::{AnimeRecommendationPipeline, build_with_embedder};
use anime_recommender::recommender::{AnimeRecommender, Retriever, VectorStoreRetriever};
use anime_recommender::ui::{RenderedResponse, render_response};
use anime_recommender::{RecommenderError, Result};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const RAW_CSV: &str = "\
MAL_ID,Name,Score,Genres,English name,Japanese name,sypnopsis
1,Cowboy Bebop,8.78,\"Action, Adventure, Comedy, Drama, Sci-Fi, Space\",Cowboy Bebop,カウボーイビバップ,\"In the year 2071, humanity has colonized several of the planets and moons of the solar system.\"
5114,Fullmetal Alchemist: Brotherhood,9.19,\"Action, Military, Adventure, Comedy, Drama, Magic, Fantasy, Shounen\",Fullmetal Alchemist:Brotherhood,鋼の錬金術師,\"Two brothers search for a Philosopher's Stone after an attempt to revive their deceased mother goes awry.\"
2167,Clannad,8.31,\"Comedy, Drama, Romance, School, Slice of Life, Supernatural\",Clannad,クラナド,\"Tomoya Okazaki is a delinquent who finds life dull and believes he'll never amount to anything.\"
9999,Broken Entry,Unknown,Drama,Unknown,Unknown,
457,Mushishi,8.68,\"Adventure, Slice of Life, Mystery, Historical, Supernatural, Fantasy, Seinen\",Mushi-Shi,蟲師,\"Mushi are the most basic forms of life in the world.\"
";

/// Hashed character trigrams: deterministic and sensitive to exact text
struct TrigramEmbedder;

impl Embedder for TrigramEmbedder {
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_query(t)).collect()
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let chars: Vec<char> = text.to_lowercase().chars().collect();
        let mut vector = vec![0.0_f32; 64];
        for window in chars.windows(3) {
            let hash = window
                .iter()
                .fold(7_u32, |acc, c| acc.wrapping_mul(31).wrapping_add(*c as u32));
            vector[(hash % 64) as usize] += 1.0;
        }
        vector[0] += 0.01;
        Ok(vector)
    }
}

struct ScriptedModel {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl ChatModel for ScriptedModel {
    fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .expect("lock poisoned")
            .push(prompt.to_string());
        Ok(self.reply.clone())
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

fn config_with_raw_csv(dir: &Path) -> Config {
    let config = Config {
        base_dir: dir.to_path_buf(),
        ..Config::default()
    };
    fs::create_dir_all(dir.join("data")).expect("should create data dir");
    fs::write(config.raw_csv_path(), RAW_CSV).expect("should write raw csv");
    config
}

#[tokio::test]
async fn build_drops_incomplete_rows_and_writes_combined_column() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = config_with_raw_csv(temp_dir.path());

    let stats = build_with_embedder(&config, Arc::new(TrigramEmbedder), None, None)
        .await
        .expect("build should succeed");
    assert_eq!(stats.documents, 4);
    assert_eq!(stats.embeddings, stats.chunks);

    let mut reader = csv::Reader::from_path(config.processed_csv_path()).expect("should open");
    let headers = reader.headers().expect("should read headers").clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), [COMBINED_COLUMN]);

    let rows: Vec<String> = reader
        .records()
        .map(|r| r.expect("valid row")[0].to_string())
        .collect();
    assert_eq!(rows.len(), 4);
    assert!(rows[0].starts_with("Title: Cowboy Bebop Overview: In the year 2071"));
    assert!(rows[0].ends_with("Genres: Action, Adventure, Comedy, Drama, Sci-Fi, Space"));
    assert!(rows.iter().all(|r| !r.contains("Broken Entry")));
}

#[tokio::test]
async fn identical_query_retrieves_its_document_first() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = config_with_raw_csv(temp_dir.path());

    build_with_embedder(&config, Arc::new(TrigramEmbedder), None, None)
        .await
        .expect("build should succeed");

    let processed = fs::read_to_string(config.processed_csv_path()).expect("should read");
    let clannad_row = processed
        .lines()
        .find(|line| line.contains("Clannad"))
        .expect("clannad row present")
        .trim_matches('"')
        .to_string();
    let query = format!("{}: {}", COMBINED_COLUMN, clannad_row);

    let store = VectorStore::open(&config.vector_database_path())
        .await
        .expect("index should open");
    let retriever = VectorStoreRetriever::new(store, Arc::new(TrigramEmbedder));
    let docs = retriever.retrieve(&query).await.expect("should retrieve");

    assert!(!docs.is_empty());
    assert_eq!(docs[0].page_content, query);
    assert!(docs.len() <= 4);
}

#[tokio::test]
async fn pipeline_answers_from_the_built_index() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = config_with_raw_csv(temp_dir.path());

    build_with_embedder(&config, Arc::new(TrigramEmbedder), None, None)
        .await
        .expect("build should succeed");

    let store = VectorStore::open(&config.vector_database_path())
        .await
        .expect("index should open");
    let model = Arc::new(ScriptedModel {
        reply: r#"[{"title": "Clannad", "plot": "A delinquent finds family.", "why": "Drama and romance."}]"#
            .to_string(),
        prompts: Mutex::new(Vec::new()),
    });
    let retriever = VectorStoreRetriever::new(store, Arc::new(TrigramEmbedder))
        .with_top_k(config.retrieval.top_k);
    let llm = Arc::clone(&model) as Arc<dyn ChatModel>;
    let recommender = AnimeRecommender::new(Arc::new(retriever), llm);
    let pipeline = AnimeRecommendationPipeline::from_recommender(recommender);

    let response = pipeline
        .recommend("school romance drama")
        .await
        .expect("should recommend");

    let prompts = model.prompts.lock().expect("lock poisoned").clone();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("combined_info: Title:"));
    assert!(prompts[0].contains("school romance drama"));

    let RenderedResponse::Cards(cards) = render_response(&response) else {
        panic!("expected cards");
    };
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].title, "Clannad");
}

#[test]
fn missing_column_stops_processing() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let input = temp_dir.path().join("raw.csv");
    fs::write(&input, "Name,Genres\nMonster,Thriller\n").expect("should write csv");

    let loader = AnimeDataLoader::new(&input, temp_dir.path().join("out.csv"));
    let err = loader.load_and_process().expect_err("should fail");

    assert!(matches!(err, RecommenderError::MissingColumns(ref cols) if cols == &["sypnopsis"]));
    assert!(err.to_string().starts_with("Missing column(s) in CSV file"));
    assert!(!temp_dir.path().join("out.csv").exists());
}
