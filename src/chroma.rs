//! Remote Chroma vector store backend.
//!
//! [`ChromaVectorStore`] implements [`VectorStore`] against the Chroma
//! REST API over TLS with bearer-token authentication. Collection ids are
//! resolved from names once and cached; chunk metadata travels as Chroma
//! metadatas and is returned verbatim.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::document::{Chunk, RetrievedDoc};
use crate::error::{QaError, Result};
use crate::vectorstore::VectorStore;

/// A [`VectorStore`] backed by a remote [Chroma](https://www.trychroma.com/)
/// server.
pub struct ChromaVectorStore {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    /// Collection name → server-side collection id.
    ids: tokio::sync::RwLock<HashMap<String, String>>,
}

#[derive(Deserialize)]
struct CollectionInfo {
    id: String,
    name: String,
}

#[derive(Serialize)]
struct CreateCollectionRequest<'a> {
    name: &'a str,
    get_or_create: bool,
    metadata: CollectionMetadata,
}

/// Collections are created in cosine space; the default `l2` space would
/// make the `1 - distance` score conversion meaningless.
#[derive(Serialize)]
struct CollectionMetadata {
    #[serde(rename = "hnsw:space")]
    space: &'static str,
}

impl CollectionMetadata {
    fn cosine() -> Self {
        Self { space: "cosine" }
    }
}

#[derive(Serialize)]
struct AddRequest<'a> {
    ids: Vec<&'a str>,
    embeddings: Vec<&'a [f32]>,
    documents: Vec<&'a str>,
    metadatas: Vec<&'a HashMap<String, String>>,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query_embeddings: Vec<&'a [f32]>,
    n_results: usize,
    include: Vec<&'a str>,
}

/// Chroma returns one inner list per query embedding; we always send one.
#[derive(Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<HashMap<String, Value>>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<f32>>>,
    #[serde(default)]
    embeddings: Option<Vec<Vec<Option<Vec<f32>>>>>,
}

impl ChromaVectorStore {
    /// Create a new client for the given base URL and optional bearer token.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
            token,
            ids: tokio::sync::RwLock::new(HashMap::new()),
        }
    }

    fn map_err(e: reqwest::Error) -> QaError {
        QaError::VectorStoreError { backend: "chroma".to_string(), message: e.to_string() }
    }

    fn api_err(status: reqwest::StatusCode, body: String) -> QaError {
        QaError::VectorStoreError {
            backend: "chroma".to_string(),
            message: format!("server returned {status}: {body}"),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, format!("{}{path}", self.base_url));
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn fetch_collections(&self) -> Result<Vec<CollectionInfo>> {
        let response = self
            .request(reqwest::Method::GET, "/api/v1/collections")
            .send()
            .await
            .map_err(Self::map_err)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(backend = "chroma", %status, "failed to list collections");
            return Err(Self::api_err(status, body));
        }

        response.json().await.map_err(Self::map_err)
    }

    /// Resolve a collection name to its server-side id, caching the result.
    async fn collection_id(&self, name: &str) -> Result<String> {
        if let Some(id) = self.ids.read().await.get(name) {
            return Ok(id.clone());
        }

        let collections = self.fetch_collections().await?;
        let mut ids = self.ids.write().await;
        for info in &collections {
            ids.insert(info.name.clone(), info.id.clone());
        }
        ids.get(name).cloned().ok_or_else(|| QaError::VectorStoreError {
            backend: "chroma".to_string(),
            message: format!("collection '{name}' does not exist"),
        })
    }

    /// Flatten a Chroma metadata object to the string map chunks carry.
    ///
    /// Non-string values are rendered through their JSON form so numeric
    /// metadata written by other ingestion tools survives the round trip.
    fn flatten_metadata(raw: Option<HashMap<String, Value>>) -> HashMap<String, String> {
        raw.unwrap_or_default()
            .into_iter()
            .map(|(k, v)| {
                let rendered = match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, rendered)
            })
            .collect()
    }
}

#[async_trait]
impl VectorStore for ChromaVectorStore {
    async fn list_collections(&self) -> Result<Vec<String>> {
        let collections = self.fetch_collections().await?;
        Ok(collections.into_iter().map(|c| c.name).collect())
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let response = self
            .request(reqwest::Method::POST, "/api/v1/collections")
            .json(&CreateCollectionRequest {
                name,
                get_or_create: true,
                metadata: CollectionMetadata::cosine(),
            })
            .send()
            .await
            .map_err(Self::map_err)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(backend = "chroma", collection = name, %status, "failed to create collection");
            return Err(Self::api_err(status, body));
        }

        let info: CollectionInfo = response.json().await.map_err(Self::map_err)?;
        self.ids.write().await.insert(info.name, info.id);
        debug!(collection = name, dimensions, "created chroma collection");
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let id = self.collection_id(collection).await?;
        let request = AddRequest {
            ids: chunks.iter().map(|c| c.id.as_str()).collect(),
            embeddings: chunks.iter().map(|c| c.embedding.as_slice()).collect(),
            documents: chunks.iter().map(|c| c.text.as_str()).collect(),
            metadatas: chunks.iter().map(|c| &c.metadata).collect(),
        };

        let response = self
            .request(reqwest::Method::POST, &format!("/api/v1/collections/{id}/upsert"))
            .json(&request)
            .send()
            .await
            .map_err(Self::map_err)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(backend = "chroma", collection, %status, "upsert failed");
            return Err(Self::api_err(status, body));
        }

        debug!(collection, count = chunks.len(), "upserted chunks to chroma");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedDoc>> {
        let id = self.collection_id(collection).await?;
        let request = QueryRequest {
            query_embeddings: vec![embedding],
            n_results: top_k,
            include: vec!["documents", "metadatas", "distances", "embeddings"],
        };

        let response = self
            .request(reqwest::Method::POST, &format!("/api/v1/collections/{id}/query"))
            .json(&request)
            .send()
            .await
            .map_err(Self::map_err)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(backend = "chroma", collection, %status, "query failed");
            return Err(Self::api_err(status, body));
        }

        let parsed: QueryResponse = response.json().await.map_err(Self::map_err)?;

        let ids = parsed.ids.into_iter().next().unwrap_or_default();
        let mut documents = parsed.documents.and_then(|d| d.into_iter().next()).unwrap_or_default();
        let mut metadatas = parsed.metadatas.and_then(|m| m.into_iter().next()).unwrap_or_default();
        let mut distances = parsed.distances.and_then(|d| d.into_iter().next()).unwrap_or_default();
        let mut embeddings =
            parsed.embeddings.and_then(|e| e.into_iter().next()).unwrap_or_default();

        // Parallel lists may be shorter than ids when the server omits
        // fields; pad so indexing below stays in bounds.
        documents.resize(ids.len(), None);
        metadatas.resize(ids.len(), None);
        distances.resize(ids.len(), 0.0);
        embeddings.resize(ids.len(), None);

        let results = ids
            .into_iter()
            .zip(documents)
            .zip(metadatas)
            .zip(distances)
            .zip(embeddings)
            .map(|((((id, document), metadata), distance), embedding)| RetrievedDoc {
                chunk: Chunk {
                    id,
                    text: document.unwrap_or_default(),
                    embedding: embedding.unwrap_or_default(),
                    metadata: Self::flatten_metadata(metadata),
                },
                // Chroma reports cosine distance (collections created here
                // are pinned to cosine space; pre-existing collections must
                // use it too); the rest of the pipeline works in similarity.
                score: 1.0 - distance,
            })
            .collect();

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_creation_pins_cosine_space() {
        let request = CreateCollectionRequest {
            name: "standalone_api",
            get_or_create: true,
            metadata: CollectionMetadata::cosine(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["metadata"]["hnsw:space"], "cosine");
        assert_eq!(value["get_or_create"], true);
    }
}
