//! End-to-end pipeline tests with stubbed external collaborators.
//!
//! The embedder maps known questions to fixed vectors, the store is the
//! persistent local backend seeded per test, and the chat model is a
//! scripted double that records whether it was invoked.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use sisfo_qa::canonical::{KURIKULUM_ANSWER, SKRIPSI_TRIGGER};
use sisfo_qa::shaper::{LINK_PREAMBLE, SOURCE_PREFIX};
use sisfo_qa::{
    ChatModel, Chunk, EmbeddingProvider, LocalVectorStore, QaConfig, QaError, QaPipeline,
    Result, VectorStore, pipeline::GENERATION_APOLOGY,
};

const DIM: usize = 3;

/// Maps exact question strings to fixed vectors; everything else lands far
/// from the seeded chunks.
struct StubEmbedder {
    map: HashMap<String, Vec<f32>>,
}

impl StubEmbedder {
    fn new(entries: &[(&str, [f32; DIM])]) -> Self {
        let map = entries.iter().map(|(q, v)| (q.to_string(), v.to_vec())).collect();
        Self { map }
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.map.get(text).cloned().unwrap_or_else(|| vec![0.0, 0.0, 1.0]))
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// Returns a fixed reply and counts invocations.
struct ScriptedChat {
    reply: String,
    calls: AtomicUsize,
}

impl ScriptedChat {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self { reply: reply.to_string(), calls: AtomicUsize::new(0) })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

/// Always fails, like a provider timeout.
struct FailingChat;

#[async_trait]
impl ChatModel for FailingChat {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
        Err(QaError::GenerationError {
            provider: "failing".to_string(),
            message: "timeout".to_string(),
        })
    }
}

fn test_config() -> QaConfig {
    QaConfig::builder().openai_api_key("sk-test-1234").without_faq().build().unwrap()
}

fn chunk(id: &str, text: &str, source: &str, embedding: [f32; DIM]) -> Chunk {
    Chunk::with_source(id, text, source, embedding.to_vec())
}

/// Seed a local store with a main collection holding the given chunks.
async fn seeded_store(dir: &tempfile::TempDir, chunks: &[Chunk]) -> Arc<LocalVectorStore> {
    let store = LocalVectorStore::open(dir.path().join("store.json")).await.unwrap();
    store.create_collection("standalone_api", DIM).await.unwrap();
    store.upsert("standalone_api", chunks).await.unwrap();
    Arc::new(store)
}

async fn build_pipeline(
    config: QaConfig,
    store: Arc<LocalVectorStore>,
    embedder: StubEmbedder,
    chat: Arc<dyn ChatModel>,
) -> QaPipeline {
    QaPipeline::builder()
        .config(config)
        .store(store)
        .embedder(Arc::new(embedder))
        .chat_model(chat)
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn thesis_topic_question_takes_the_fast_path() {
    let question = "Bagaimana prosedur pengajuan judul atau topik skripsi?";
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(
        &dir,
        &[chunk(
            "c1",
            "Prosedur pengajuan judul skripsi dijelaskan dalam panduan akademik.",
            "docs/panduan_akademik.pdf",
            [1.0, 0.0, 0.0],
        )],
    )
    .await;
    let chat = ScriptedChat::new("should never be used");
    let pipeline = build_pipeline(
        test_config(),
        store,
        StubEmbedder::new(&[(question, [1.0, 0.0, 0.0])]),
        chat.clone(),
    )
    .await;

    assert_eq!(pipeline.main_collection(), "standalone_api");

    let result = pipeline.query(question).await.unwrap();

    assert!(result.answer.starts_with(SKRIPSI_TRIGGER));
    let items: Vec<&str> = result
        .answer
        .lines()
        .filter(|l| l.chars().next().is_some_and(|c| c.is_ascii_digit()))
        .collect();
    assert_eq!(items.len(), 4, "expected a 4-item numbered procedure");
    assert!(result.answer.contains("Sumber data: panduan_akademik"));
    assert_eq!(result.sources.len(), 1);
    assert_eq!(chat.calls(), 0, "generator must not run for canonical questions");
}

#[tokio::test]
async fn curriculum_question_lists_four_curricula_in_order() {
    let question = "Apa saja jenis kurikulum prodi sistem informasi undiksha?";
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(&dir, &[]).await;
    let chat = ScriptedChat::new("should never be used");
    let pipeline =
        build_pipeline(test_config(), store, StubEmbedder::new(&[]), chat.clone()).await;

    let result = pipeline.query(question).await.unwrap();

    assert!(result.answer.starts_with(&KURIKULUM_ANSWER[..40]));
    let expected = ["Undiksha 2024", "MBKM Undiksha 2020", "Undiksha 2019", "KKNI 2016"];
    let mut last = 0;
    for name in expected {
        let pos = result.answer.find(name).unwrap_or_else(|| panic!("missing '{name}'"));
        assert!(pos > last, "'{name}' out of order");
        last = pos;
    }
    assert_eq!(chat.calls(), 0);
}

#[tokio::test]
async fn lecturer_question_returns_bio_verbatim() {
    let question = "Siapa Edy Listartha?";
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(&dir, &[]).await;
    let chat = ScriptedChat::new("should never be used");
    let pipeline =
        build_pipeline(test_config(), store, StubEmbedder::new(&[]), chat.clone()).await;

    let result = pipeline.query(question).await.unwrap();

    assert!(result.answer.contains("I Made Edy Listartha, S.Kom., M.Kom."));
    assert!(result.answer.contains("jaringan komputer dan keamanan informasi"));
    assert_eq!(chat.calls(), 0);
}

#[tokio::test]
async fn document_question_gets_a_drive_link_section() {
    let question = "Dimana saya bisa akses dokumen kurikulum?";
    let drive_url = "https://drive.google.com/drive/folders/kurikulum-si";
    // No `source` metadata: the chunk feeds links and context but not the
    // citation footer, so the link section closes the answer.
    let mut link_chunk = chunk(
        "c1",
        &format!("Dokumen kurikulum program studi tersedia di {drive_url}"),
        "unused",
        [1.0, 0.0, 0.0],
    );
    link_chunk.metadata.clear();

    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(&dir, &[link_chunk]).await;
    let chat = ScriptedChat::new("Dokumen kurikulum dapat diakses melalui tautan resmi.");
    let pipeline = build_pipeline(
        test_config(),
        store,
        StubEmbedder::new(&[(question, [1.0, 0.0, 0.0])]),
        chat.clone(),
    )
    .await;

    let result = pipeline.query(question).await.unwrap();

    assert!(result.answer.contains(LINK_PREAMBLE));
    assert!(result.answer.trim_end().ends_with(drive_url));
    assert!(!result.answer.contains(SOURCE_PREFIX));
    // Every listed URL must come from a retrieved chunk's payload.
    assert!(result.sources.iter().any(|s| s.contains(drive_url)));
    assert_eq!(chat.calls(), 1);
}

#[tokio::test]
async fn off_domain_question_yields_disclaimer_without_sources() {
    let question = "Apa warna langit?";
    let disclaimer =
        "Maaf, saya tidak memiliki informasi mengenai hal tersebut. Saya dapat membantu \
         pertanyaan seputar kurikulum, skripsi, dan administrasi akademik.";
    let dir = tempfile::tempdir().unwrap();
    // Seeded chunk sits far from the default query vector, below the floor.
    let store =
        seeded_store(&dir, &[chunk("c1", "isi akademik", "panduan.pdf", [1.0, 0.0, 0.0])]).await;
    let chat = ScriptedChat::new(disclaimer);
    let pipeline =
        build_pipeline(test_config(), store, StubEmbedder::new(&[]), chat.clone()).await;

    let result = pipeline.query(question).await.unwrap();

    assert_eq!(result.answer, disclaimer);
    assert!(result.sources.is_empty());
    assert!(!result.answer.contains(LINK_PREAMBLE));
    assert!(!result.answer.contains(SOURCE_PREFIX));
    assert_eq!(chat.calls(), 1);
}

#[tokio::test]
async fn generator_failure_returns_fixed_apology() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(&dir, &[]).await;
    let pipeline =
        build_pipeline(test_config(), store, StubEmbedder::new(&[]), Arc::new(FailingChat)).await;

    let result = pipeline.query("Pertanyaan apa pun").await.unwrap();

    assert_eq!(result.answer, GENERATION_APOLOGY);
    assert!(result.sources.is_empty());
    assert!(!result.answer.contains("timeout"), "provider errors must not surface");
}

#[tokio::test]
async fn faq_hit_answers_without_the_generator() {
    let question = "Apa itu KRS?";
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(&dir, &[]).await;
    store.create_collection("faqs_collection", DIM).await.unwrap();
    store
        .upsert(
            "faqs_collection",
            &[chunk(
                "f1",
                "Question: Apa itu KRS?\nAnswer: KRS adalah Kartu Rencana Studi yang wajib diisi setiap semester.",
                "faq_akademik.json",
                [0.0, 1.0, 0.0],
            )],
        )
        .await
        .unwrap();

    let config = QaConfig::builder().openai_api_key("sk-test-1234").build().unwrap();
    let chat = ScriptedChat::new("should never be used");
    let pipeline = build_pipeline(
        config,
        store,
        StubEmbedder::new(&[(question, [0.0, 1.0, 0.0])]),
        chat.clone(),
    )
    .await;

    let result = pipeline.query(question).await.unwrap();

    assert!(result.answer.starts_with("KRS adalah Kartu Rencana Studi"));
    assert!(result.answer.contains("Sumber data: faq_akademik"));
    assert_eq!(chat.calls(), 0);
}

#[tokio::test]
async fn repeated_query_is_deterministic() {
    let question = "Bagaimana prosedur mengurus surat permohonan cuti akademik?";
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(
        &dir,
        &[chunk("c1", "Prosedur cuti akademik.", "panduan.pdf", [1.0, 0.0, 0.0])],
    )
    .await;
    let chat = ScriptedChat::new("unused");
    let pipeline = build_pipeline(
        test_config(),
        store,
        StubEmbedder::new(&[(question, [1.0, 0.0, 0.0])]),
        chat,
    )
    .await;

    let first = pipeline.query(question).await.unwrap();
    let second = pipeline.query(question).await.unwrap();
    assert_eq!(first, second);
    // The canonical academic-leave procedure has exactly eight steps.
    let items = first
        .answer
        .lines()
        .filter(|l| l.chars().next().is_some_and(|c| c.is_ascii_digit()))
        .count();
    assert_eq!(items, 8);
}

#[tokio::test]
async fn unusable_store_fails_closed_at_build_time() {
    let config = QaConfig::builder()
        .openai_api_key("sk-test-1234")
        .local_store_path("/nonexistent-dir-sisfo-qa/store.json")
        .without_faq()
        .build()
        .unwrap();

    let err = QaPipeline::builder().config(config).build().await.err().unwrap();
    assert!(err.to_string().contains("knowledge base unavailable"), "got: {err}");
}
