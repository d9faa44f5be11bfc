//! Local persistent vector store using cosine similarity.
//!
//! [`LocalVectorStore`] keeps collections in memory behind a
//! `tokio::sync::RwLock` and mirrors every mutation to a JSON file at a
//! configured path. It is the fallback when the remote store is
//! unreachable, and the store of choice in tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::document::{Chunk, RetrievedDoc};
use crate::error::{QaError, Result};
use crate::vectorstore::{VectorStore, cosine_similarity};

/// On-disk layout: collection name → chunk id → chunk.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    collections: HashMap<String, HashMap<String, Chunk>>,
}

/// A persistent vector store backed by a single JSON file.
pub struct LocalVectorStore {
    path: PathBuf,
    collections: tokio::sync::RwLock<HashMap<String, HashMap<String, Chunk>>>,
}

impl LocalVectorStore {
    /// Open the store at `path`, loading existing data if the file exists.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::VectorStoreError`] if the file exists but cannot
    /// be read or parsed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let collections = if path.exists() {
            let raw = tokio::fs::read(&path).await.map_err(|e| Self::store_err(&path, e))?;
            let file: StoreFile = serde_json::from_slice(&raw).map_err(|e| {
                QaError::VectorStoreError {
                    backend: "local".to_string(),
                    message: format!("failed to parse {}: {e}", path.display()),
                }
            })?;
            info!(path = %path.display(), collections = file.collections.len(), "loaded local store");
            file.collections
        } else {
            warn!(path = %path.display(), "local store file not found, starting empty");
            HashMap::new()
        };

        Ok(Self { path, collections: tokio::sync::RwLock::new(collections) })
    }

    fn store_err(path: &Path, e: std::io::Error) -> QaError {
        QaError::VectorStoreError {
            backend: "local".to_string(),
            message: format!("{}: {e}", path.display()),
        }
    }

    /// Write the current state back to the store file.
    async fn persist(&self, collections: &HashMap<String, HashMap<String, Chunk>>) -> Result<()> {
        let file = StoreFile { collections: collections.clone() };
        let raw = serde_json::to_vec(&file).map_err(|e| QaError::VectorStoreError {
            backend: "local".to_string(),
            message: format!("failed to serialize store: {e}"),
        })?;
        tokio::fs::write(&self.path, raw).await.map_err(|e| Self::store_err(&self.path, e))
    }
}

#[async_trait]
impl VectorStore for LocalVectorStore {
    async fn list_collections(&self) -> Result<Vec<String>> {
        let collections = self.collections.read().await;
        let mut names: Vec<String> = collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn create_collection(&self, name: &str, _dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(name) {
            debug!(collection = name, "local collection already exists, skipping creation");
            return Ok(());
        }
        collections.insert(name.to_string(), HashMap::new());
        if let Err(e) = self.persist(&collections).await {
            collections.remove(name);
            return Err(e);
        }
        debug!(collection = name, "created local collection");
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| QaError::VectorStoreError {
            backend: "local".to_string(),
            message: format!("collection '{collection}' does not exist"),
        })?;
        for chunk in chunks {
            store.insert(chunk.id.clone(), chunk.clone());
        }
        self.persist(&collections).await?;
        debug!(collection, count = chunks.len(), "upserted chunks to local store");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedDoc>> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| QaError::VectorStoreError {
            backend: "local".to_string(),
            message: format!("collection '{collection}' does not exist"),
        })?;

        let mut scored: Vec<RetrievedDoc> = store
            .values()
            .map(|chunk| {
                let score = cosine_similarity(&chunk.embedding, embedding);
                RetrievedDoc { chunk: chunk.clone(), score }
            })
            .collect();

        // Secondary key keeps equal-score results in a stable order across
        // runs; the map iteration order is not.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk.id.cmp(&b.chunk.id))
        });
        scored.truncate(top_k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn equal_scores_are_ordered_by_chunk_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalVectorStore::open(dir.path().join("store.json")).await.unwrap();
        store.create_collection("corpus", 2).await.unwrap();

        let chunks: Vec<Chunk> = ["b", "c", "a"]
            .iter()
            .map(|id| Chunk::with_source(*id, format!("text {id}"), "doc.pdf", vec![1.0, 0.0]))
            .collect();
        store.upsert("corpus", &chunks).await.unwrap();

        let results = store.search("corpus", &[1.0, 0.0], 3).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|d| d.chunk.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
