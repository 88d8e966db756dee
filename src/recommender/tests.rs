use super::*;
use crate::database::{ChunkMetadata, EmbeddingRecord};
use std::sync::Mutex;
use tempfile::TempDir;

struct FixedRetriever {
    docs: Vec<RetrievedDocument>,
}

#[async_trait]
impl Retriever for FixedRetriever {
    async fn retrieve(&self, _query: &str) -> Result<Vec<RetrievedDocument>> {
        Ok(self.docs.clone())
    }
}

struct RecordingModel {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl RecordingModel {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("lock poisoned").clone()
    }
}

impl ChatModel for RecordingModel {
    fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .expect("lock poisoned")
            .push(prompt.to_string());
        Ok(self.reply.clone())
    }

    fn model_name(&self) -> &str {
        "recording"
    }
}

/// One-hot vectors keyed on a keyword so similarity is predictable
struct KeywordEmbedder;

impl Embedder for KeywordEmbedder {
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_query(t)).collect()
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let text = text.to_lowercase();
        Ok(vec![
            if text.contains("mecha") { 1.0 } else { 0.0 },
            if text.contains("romance") { 1.0 } else { 0.0 },
            if text.contains("horror") { 1.0 } else { 0.0 },
            0.1,
        ])
    }
}

fn doc(content: &str) -> RetrievedDocument {
    RetrievedDocument {
        page_content: content.to_string(),
        source: "processed.csv".to_string(),
        row: 0,
        score: 1.0,
    }
}

#[test]
fn format_docs_joins_with_blank_line() {
    let docs = vec![doc("first"), doc("second")];
    assert_eq!(format_docs(&docs, MAX_CONTEXT_DOCS), "first\n\nsecond");
}

#[test]
fn format_docs_caps_document_count() {
    let docs: Vec<_> = (0..12).map(|i| doc(&format!("doc {}", i))).collect();
    let context = format_docs(&docs, MAX_CONTEXT_DOCS);

    assert_eq!(context.split("\n\n").count(), 8);
    assert!(context.contains("doc 7"));
    assert!(!context.contains("doc 8"));
}

#[test]
fn format_docs_empty() {
    assert_eq!(format_docs(&[], MAX_CONTEXT_DOCS), "");
}

#[tokio::test]
async fn recommendation_fills_prompt_and_returns_raw_text() {
    let retriever = Arc::new(FixedRetriever {
        docs: vec![
            doc("combined_info: Title: Monster Overview: A surgeon hunts a killer."),
            doc("combined_info: Title: Death Note Overview: A notebook kills."),
        ],
    });
    let model = RecordingModel::replying("1. Monster\n2. Death Note\n3. Psycho-Pass");
    let recommender = AnimeRecommender::new(retriever, Arc::clone(&model) as Arc<dyn ChatModel>);

    let answer = recommender
        .get_recommendation("dark psychological thrillers")
        .await
        .expect("should recommend");

    assert_eq!(answer, "1. Monster\n2. Death Note\n3. Psycho-Pass");

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Title: Monster"));
    assert!(prompts[0].contains("Title: Death Note"));
    assert!(prompts[0].contains("User's question:\ndark psychological thrillers"));
}

#[tokio::test]
async fn context_is_capped_at_max_docs() {
    let retriever = Arc::new(FixedRetriever {
        docs: (0..10).map(|i| doc(&format!("anime number {}", i))).collect(),
    });
    let model = RecordingModel::replying("ok");
    let recommender = AnimeRecommender::new(retriever, Arc::clone(&model) as Arc<dyn ChatModel>)
        .with_max_context_docs(3);

    recommender
        .get_recommendation("anything")
        .await
        .expect("should recommend");

    let prompt = &model.prompts()[0];
    assert!(prompt.contains("anime number 2"));
    assert!(!prompt.contains("anime number 3"));
}

#[tokio::test]
async fn empty_retrieval_fails_without_calling_model() {
    let retriever = Arc::new(FixedRetriever { docs: Vec::new() });
    let model = RecordingModel::replying("should not be used");
    let recommender = AnimeRecommender::new(retriever, Arc::clone(&model) as Arc<dyn ChatModel>);

    let err = recommender
        .get_recommendation("romance")
        .await
        .expect_err("empty index should fail");

    assert!(matches!(err, RecommenderError::EmptyRetrieval(ref q) if q == "romance"));
    assert!(model.prompts().is_empty());
}

#[tokio::test]
async fn blank_completion_is_an_error() {
    let retriever = Arc::new(FixedRetriever {
        docs: vec![doc("something")],
    });
    let recommender = AnimeRecommender::new(retriever, RecordingModel::replying("  \n"));

    let err = recommender
        .get_recommendation("action")
        .await
        .expect_err("blank completion should fail");
    assert!(matches!(err, RecommenderError::Llm(_)));
}

#[tokio::test]
async fn vector_store_retriever_returns_closest_chunks() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let embedder = Arc::new(KeywordEmbedder);
    let contents = [
        "Title: Gurren Lagann Overview: Giant mecha pierce the heavens.",
        "Title: Toradora Overview: A romance between classmates.",
        "Title: Another Overview: A horror story in a cursed class.",
    ];

    let mut store = VectorStore::create(temp_dir.path())
        .await
        .expect("should create store");
    let records = contents
        .iter()
        .enumerate()
        .map(|(row, content)| EmbeddingRecord {
            id: format!("chunk-{}", row),
            vector: embedder.embed_query(content).expect("fake embedder"),
            metadata: ChunkMetadata {
                content: content.to_string(),
                source: "processed.csv".to_string(),
                row: row as u32,
                chunk_index: 0,
                created_at: "2024-01-01T00:00:00Z".to_string(),
            },
        })
        .collect();
    store
        .store_embeddings_batch(records)
        .await
        .expect("should store");

    let retriever = VectorStoreRetriever::new(store, embedder).with_top_k(2);
    let docs = retriever
        .retrieve("something with romance")
        .await
        .expect("should retrieve");

    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].page_content, contents[1]);
    assert_eq!(docs[0].row, 1);
    assert!(docs[0].score >= docs[1].score);
}
