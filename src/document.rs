//! Data types for chunks, retrieval results, and the answer contract.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Metadata key identifying the originating document of a chunk.
pub const SOURCE_KEY: &str = "source";

/// A text passage with metadata — the unit of retrieval.
///
/// Chunks are produced by the (external) ingestion job; the query-time
/// pipeline only reads them. The `metadata` map always carries a
/// [`SOURCE_KEY`] entry naming the originating document when the chunk
/// came from a real corpus; chunks without it still contribute to
/// generation context but not to the citation footer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Opaque unique identifier for the chunk.
    pub id: String,
    /// The text payload.
    pub text: String,
    /// The vector embedding for this chunk's text.
    pub embedding: Vec<f32>,
    /// Key-value metadata, preserved verbatim through storage and search.
    pub metadata: HashMap<String, String>,
}

impl Chunk {
    /// Build a chunk with a `source` metadata entry, embedding attached.
    pub fn with_source(
        id: impl Into<String>,
        text: impl Into<String>,
        source: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert(SOURCE_KEY.to_string(), source.into());
        Self { id: id.into(), text: text.into(), embedding, metadata }
    }

    /// The `source` metadata value, if present.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }
}

/// A retrieved [`Chunk`] paired with its similarity score to the query.
///
/// Retrieval results are ordered by descending score and never contain
/// duplicate chunk identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDoc {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

/// The public contract at the boundary of the core.
///
/// `answer` is always non-empty. `sources` holds one cleaned chunk payload
/// per retrieved chunk that informed the answer or its citation; it is
/// empty only when retrieval failed or was bypassed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResult {
    /// The final answer text shown to the user.
    pub answer: String,
    /// Cleaned payloads of the chunks that informed the answer.
    pub sources: Vec<String>,
}
