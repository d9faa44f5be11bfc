//! Ordered fallback strategies for initializing the vector store.
//!
//! Each strategy attempts to produce a working [`VectorStore`] handle; the
//! pipeline picks the first one that succeeds. A remote strategy counts as
//! working only after a successful round trip, so an unreachable server is
//! detected at initialization rather than on the first query.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::chroma::ChromaVectorStore;
use crate::error::{QaError, Result};
use crate::local::LocalVectorStore;
use crate::vectorstore::VectorStore;

/// A way of obtaining a vector store handle.
#[async_trait]
pub trait StoreStrategy: Send + Sync {
    /// A short name for logging.
    fn name(&self) -> &str;

    /// Attempt to initialize the store.
    async fn try_initialize(&self) -> Result<Arc<dyn VectorStore>>;
}

/// Connects to a remote Chroma server and verifies it responds.
pub struct ChromaStrategy {
    url: String,
    token: Option<String>,
}

impl ChromaStrategy {
    /// Create a strategy for the given base URL and optional bearer token.
    pub fn new(url: impl Into<String>, token: Option<String>) -> Self {
        Self { url: url.into(), token }
    }
}

#[async_trait]
impl StoreStrategy for ChromaStrategy {
    fn name(&self) -> &str {
        "chroma"
    }

    async fn try_initialize(&self) -> Result<Arc<dyn VectorStore>> {
        let store = ChromaVectorStore::new(&self.url, self.token.clone());
        // Round trip to prove the server is reachable and the token works.
        store.list_collections().await?;
        Ok(Arc::new(store))
    }
}

/// Opens the local persistent store at a configured path.
pub struct LocalStrategy {
    path: String,
}

impl LocalStrategy {
    /// Create a strategy for the given store file path.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StoreStrategy for LocalStrategy {
    fn name(&self) -> &str {
        "local"
    }

    async fn try_initialize(&self) -> Result<Arc<dyn VectorStore>> {
        let store = LocalVectorStore::open(&self.path).await?;
        Ok(Arc::new(store))
    }
}

/// Try each strategy in order and return the first store that initializes.
///
/// # Errors
///
/// Returns [`QaError::PipelineError`] with a "knowledge base unavailable"
/// message when every strategy fails.
pub async fn first_available(strategies: &[Box<dyn StoreStrategy>]) -> Result<Arc<dyn VectorStore>> {
    for strategy in strategies {
        match strategy.try_initialize().await {
            Ok(store) => {
                info!(strategy = strategy.name(), "vector store initialized");
                return Ok(store);
            }
            Err(e) => {
                warn!(strategy = strategy.name(), error = %e, "store strategy failed, trying next");
            }
        }
    }
    Err(QaError::PipelineError("knowledge base unavailable".to_string()))
}
