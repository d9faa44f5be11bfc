//! Question-answering pipeline orchestrator.
//!
//! [`QaPipeline`] wires the fast-path matcher, retriever, generator, and
//! shaper together. Per query it consults the matcher first; on a hit the
//! retriever still gathers citation sources but the generator is never
//! invoked. On a miss the FAQ collection (when configured) is consulted,
//! then the generative path runs: retrieve → generate → shape.
//!
//! Dependency failures degrade gracefully: a failed retrieval yields an
//! answer without sources, a failed generation yields a fixed apology.
//! Only configuration errors surface as hard failures.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::chat::ChatModel;
use crate::config::QaConfig;
use crate::document::{QueryResult, RetrievedDoc};
use crate::embedding::EmbeddingProvider;
use crate::error::{QaError, Result};
use crate::fallback::{ChromaStrategy, LocalStrategy, StoreStrategy, first_available};
use crate::fastpath::{FastPathMatcher, Path};
use crate::generator::Generator;
use crate::openai::{OpenAIChatModel, OpenAIEmbeddingProvider};
use crate::retriever::Retriever;
use crate::shaper;
use crate::vectorstore::VectorStore;

/// Fixed user-facing apology when generation fails; raw provider errors
/// never reach the user.
pub const GENERATION_APOLOGY: &str =
    "Maaf, terjadi kendala saat memproses pertanyaan Anda. Silakan coba beberapa saat lagi.";

/// The request-scoped question-answering pipeline.
///
/// One instance is shared across requests; it holds only immutable
/// configuration and cached client handles, so `&self` methods are safe
/// for concurrent use.
pub struct QaPipeline {
    matcher: FastPathMatcher,
    retriever: Retriever,
    faq_retriever: Option<Retriever>,
    generator: Generator,
    main_collection: String,
    faq_collection: Option<String>,
}

impl QaPipeline {
    /// Create a new [`QaPipelineBuilder`].
    pub fn builder() -> QaPipelineBuilder {
        QaPipelineBuilder::default()
    }

    /// The resolved name of the main collection being served.
    pub fn main_collection(&self) -> &str {
        &self.main_collection
    }

    /// Answer a question.
    ///
    /// The returned [`QueryResult`] always has a non-empty answer; its
    /// `sources` are empty only when retrieval failed or was bypassed.
    ///
    /// # Errors
    ///
    /// Never fails for dependency reasons; those degrade per the error
    /// policy above.
    pub async fn query(&self, question: &str) -> Result<QueryResult> {
        match self.matcher.classify(question) {
            Path::FastPath(canonical) => {
                info!("answering from the canonical fast path");
                let docs = self.retrieve_or_empty(question).await;
                Ok(shaper::shape_canonical(canonical, &docs))
            }
            Path::Generative => {
                if let Some(result) = self.try_faq(question).await {
                    return Ok(result);
                }
                self.generative(question).await
            }
        }
    }

    /// Retrieve from the main collection, degrading to no sources on error.
    async fn retrieve_or_empty(&self, question: &str) -> Vec<RetrievedDoc> {
        match self.retriever.retrieve(&self.main_collection, question).await {
            Ok(docs) => docs,
            Err(e) => {
                warn!(error = %e, "retrieval failed, continuing without sources");
                Vec::new()
            }
        }
    }

    /// Look the question up in the FAQ collection, if one is configured.
    ///
    /// A hit answers with the FAQ entry's `Answer:` portion; any failure or
    /// miss falls through to the generative path.
    async fn try_faq(&self, question: &str) -> Option<QueryResult> {
        let retriever = self.faq_retriever.as_ref()?;
        let collection = self.faq_collection.as_deref()?;

        let docs = match retriever.retrieve(collection, question).await {
            Ok(docs) => docs,
            Err(e) => {
                warn!(error = %e, "FAQ lookup failed, falling through");
                return None;
            }
        };

        let best = docs.first()?;
        let answer = faq_answer(&best.chunk.text)?;
        info!(score = best.score, "answering from the FAQ collection");
        Some(shaper::shape(question, answer, &docs))
    }

    /// The generative path: retrieve → generate → shape.
    async fn generative(&self, question: &str) -> Result<QueryResult> {
        let docs = self.retrieve_or_empty(question).await;
        debug!(context_chunks = docs.len(), "entering generative path");

        match self.generator.generate(question, &docs).await {
            Ok(raw) => Ok(shaper::shape(question, &raw, &docs)),
            Err(e) => {
                error!(error = %e, "generation failed, returning fixed apology");
                Ok(QueryResult { answer: GENERATION_APOLOGY.to_string(), sources: Vec::new() })
            }
        }
    }
}

/// Extract the `Answer:` portion of a FAQ payload
/// (`Question: <q>\nAnswer: <a>`).
fn faq_answer(payload: &str) -> Option<&str> {
    let (_, answer) = payload.split_once("Answer:")?;
    let answer = answer.trim();
    (!answer.is_empty()).then_some(answer)
}

/// Builder for constructing a [`QaPipeline`].
///
/// `config` is required. The store, embedder, and chat model default to
/// the configured external services (Chroma with local fallback, OpenAI)
/// and can be overridden for testing.
#[derive(Default)]
pub struct QaPipelineBuilder {
    config: Option<QaConfig>,
    store: Option<Arc<dyn VectorStore>>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    chat_model: Option<Arc<dyn ChatModel>>,
}

impl QaPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: QaConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Override the vector store (skips the fallback chain).
    pub fn store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Override the embedding provider.
    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Override the chat model.
    pub fn chat_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.chat_model = Some(model);
        self
    }

    /// Build the pipeline: initialize the store (remote first, then the
    /// local fallback), resolve collections, and compile the fast path.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::ConfigError`] for missing configuration and
    /// [`QaError::PipelineError`] when no store strategy succeeds or no
    /// collection can be resolved. These fail closed; dependency errors at
    /// query time do not.
    pub async fn build(self) -> Result<QaPipeline> {
        let config =
            self.config.ok_or_else(|| QaError::ConfigError("config is required".to_string()))?;

        let embedder: Arc<dyn EmbeddingProvider> = match self.embedder {
            Some(embedder) => embedder,
            None => Arc::new(OpenAIEmbeddingProvider::new(&config.openai_api_key)?),
        };

        let chat_model: Arc<dyn ChatModel> = match self.chat_model {
            Some(model) => model,
            None => Arc::new(OpenAIChatModel::new(&config.openai_api_key, &config.chat_model)?),
        };

        let store = match self.store {
            Some(store) => store,
            None => {
                let mut strategies: Vec<Box<dyn StoreStrategy>> = Vec::new();
                if let Some(url) = &config.chroma_url {
                    strategies
                        .push(Box::new(ChromaStrategy::new(url, config.chroma_token.clone())));
                }
                strategies.push(Box::new(LocalStrategy::new(&config.local_store_path)));
                first_available(&strategies).await?
            }
        };

        let main_collection =
            resolve_collection(store.as_ref(), &config.main_collection, embedder.dimensions())
                .await?;

        let faq_collection = match &config.faq_collection {
            Some(name) => {
                if store.has(name).await.unwrap_or(false) {
                    Some(name.clone())
                } else {
                    warn!(collection = name, "FAQ collection not found, FAQ lookup disabled");
                    None
                }
            }
            None => None,
        };

        let retriever = Retriever::new(store.clone(), embedder.clone(), config.main_params);
        let faq_retriever = faq_collection
            .is_some()
            .then(|| Retriever::new(store.clone(), embedder.clone(), config.faq_params));

        Ok(QaPipeline {
            matcher: FastPathMatcher::new()?,
            retriever,
            faq_retriever,
            generator: Generator::new(chat_model),
            main_collection,
            faq_collection,
        })
    }
}

/// Resolve the collection to serve: the configured one, created when
/// missing; if creation fails, the first available collection; otherwise
/// fail closed.
async fn resolve_collection(
    store: &dyn VectorStore,
    name: &str,
    dimensions: usize,
) -> Result<String> {
    if store.has(name).await? {
        return Ok(name.to_string());
    }

    match store.create_collection(name, dimensions).await {
        Ok(()) => Ok(name.to_string()),
        Err(e) => {
            warn!(collection = name, error = %e, "collection creation failed");
            let available = store.list_collections().await?;
            match available.into_iter().next() {
                Some(first) => {
                    warn!(collection = %first, "falling back to the first available collection");
                    Ok(first)
                }
                None => Err(QaError::PipelineError("knowledge base unavailable".to_string())),
            }
        }
    }
}
