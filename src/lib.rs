//! Retrieval-augmented question answering for the Undiksha Information
//! Systems study program.
//!
//! A user submits a natural-language question (usually Indonesian); the
//! pipeline retrieves passages from an indexed corpus and returns a
//! grounded answer with source citations and, where relevant, document
//! links.
//!
//! # Architecture
//!
//! - [`embedding`] / [`openai`] — embedding and chat-model adapters
//! - [`vectorstore`] / [`chroma`] / [`local`] — collection storage and
//!   similarity search, with a remote server and a persistent local file
//!   backend
//! - [`fallback`] — ordered store-initialization strategies
//! - [`retriever`] — Maximal Marginal Relevance retrieval
//! - [`fastpath`] / [`canonical`] — pattern-matched canonical answers
//! - [`generator`] — grounded answer generation under a strict prompt
//! - [`shaper`] — text cleaning, link attachment, and source citations
//! - [`pipeline`] — the orchestrator tying the stages together
//!
//! # Example
//!
//! ```rust,ignore
//! use sisfo_qa::{QaConfig, QaPipeline};
//!
//! let config = QaConfig::from_env()?;
//! let pipeline = QaPipeline::builder().config(config).build().await?;
//! let result = pipeline.query("Bagaimana prosedur cuti akademik?").await?;
//! println!("{}", result.answer);
//! ```

pub mod canonical;
pub mod chat;
pub mod chroma;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod fallback;
pub mod fastpath;
pub mod generator;
pub mod local;
pub mod openai;
pub mod pipeline;
pub mod retriever;
pub mod shaper;
pub mod vectorstore;

pub use chat::ChatModel;
pub use chroma::ChromaVectorStore;
pub use config::{QaConfig, QaConfigBuilder, RetrieverParams};
pub use document::{Chunk, QueryResult, RetrievedDoc};
pub use embedding::EmbeddingProvider;
pub use error::{QaError, Result};
pub use fallback::{ChromaStrategy, LocalStrategy, StoreStrategy};
pub use fastpath::{FastPathMatcher, Path};
pub use generator::Generator;
pub use local::LocalVectorStore;
pub use openai::{OpenAIChatModel, OpenAIEmbeddingProvider};
pub use pipeline::{QaPipeline, QaPipelineBuilder};
pub use retriever::Retriever;
pub use vectorstore::VectorStore;
