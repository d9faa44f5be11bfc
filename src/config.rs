//! Configuration for the question-answering pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{QaError, Result};

/// Default name of the main knowledge collection.
pub const DEFAULT_MAIN_COLLECTION: &str = "standalone_api";

/// Default name of the FAQ collection.
pub const DEFAULT_FAQ_COLLECTION: &str = "faqs_collection";

/// Default chat model identifier.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4";

/// Default path of the local fallback store file.
pub const DEFAULT_LOCAL_STORE_PATH: &str = "./chroma_db.json";

/// API-key placeholders that must be rejected as if the key were absent.
const PLACEHOLDER_KEYS: &[&str] = &["your-api-key-here", "your-openai-api-key", "sk-..."];

/// Retrieval parameters for one collection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RetrieverParams {
    /// Number of results to return.
    pub k: usize,
    /// Number of nearest neighbours fetched before diversity selection.
    pub fetch_k: usize,
    /// MMR trade-off between query relevance and diversity (1.0 = pure relevance).
    pub lambda_mult: f32,
    /// Minimum query similarity for a candidate to be eligible.
    pub score_threshold: f32,
}

impl RetrieverParams {
    /// Defaults for the main collection: MMR with a light diversity term.
    pub fn main_defaults() -> Self {
        Self { k: 3, fetch_k: 8, lambda_mult: 0.8, score_threshold: 0.5 }
    }

    /// Defaults for the FAQ collection: pure similarity, single best hit.
    pub fn faq_defaults() -> Self {
        Self { k: 1, fetch_k: 1, lambda_mult: 1.0, score_threshold: 0.7 }
    }

    /// Validate parameter consistency.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::ConfigError`] if `k == 0`, `fetch_k < k`, or
    /// `lambda_mult` is outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(QaError::ConfigError("k must be greater than zero".to_string()));
        }
        if self.fetch_k < self.k {
            return Err(QaError::ConfigError(format!(
                "fetch_k ({}) must be at least k ({})",
                self.fetch_k, self.k
            )));
        }
        if !(0.0..=1.0).contains(&self.lambda_mult) {
            return Err(QaError::ConfigError(format!(
                "lambda_mult ({}) must be within [0, 1]",
                self.lambda_mult
            )));
        }
        Ok(())
    }
}

/// Configuration for the pipeline and its external collaborators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QaConfig {
    /// OpenAI API key used for both chat completion and embeddings.
    pub openai_api_key: String,
    /// Chat model identifier.
    pub chat_model: String,
    /// Base URL of the remote Chroma vector store, if configured.
    pub chroma_url: Option<String>,
    /// Bearer token for the remote vector store.
    pub chroma_token: Option<String>,
    /// Filesystem path of the local fallback store.
    pub local_store_path: String,
    /// Name of the main knowledge collection.
    pub main_collection: String,
    /// Name of the FAQ collection; `None` disables FAQ lookup.
    pub faq_collection: Option<String>,
    /// Retrieval parameters for the main collection.
    pub main_params: RetrieverParams,
    /// Retrieval parameters for the FAQ collection.
    pub faq_params: RetrieverParams,
}

impl QaConfig {
    /// Create a new builder for constructing a [`QaConfig`].
    pub fn builder() -> QaConfigBuilder {
        QaConfigBuilder::default()
    }

    /// Build a configuration from the process environment.
    ///
    /// Reads `OPENAI_API_KEY` (required), `OPENAI_MODEL`, `CHROMA_URL`,
    /// `CHROMA_TOKEN`, and `LOCAL_STORE_PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::ConfigError`] if the API key is absent or a
    /// known placeholder. Configuration errors fail closed before any
    /// external call is made.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            builder = builder.openai_api_key(key);
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            builder = builder.chat_model(model);
        }
        if let Ok(url) = std::env::var("CHROMA_URL") {
            builder = builder.chroma_url(url);
        }
        if let Ok(token) = std::env::var("CHROMA_TOKEN") {
            builder = builder.chroma_token(token);
        }
        if let Ok(path) = std::env::var("LOCAL_STORE_PATH") {
            builder = builder.local_store_path(path);
        }
        builder.build()
    }
}

/// Builder for constructing a validated [`QaConfig`].
#[derive(Debug, Clone, Default)]
pub struct QaConfigBuilder {
    openai_api_key: Option<String>,
    chat_model: Option<String>,
    chroma_url: Option<String>,
    chroma_token: Option<String>,
    local_store_path: Option<String>,
    main_collection: Option<String>,
    faq_collection: Option<Option<String>>,
    main_params: Option<RetrieverParams>,
    faq_params: Option<RetrieverParams>,
}

impl QaConfigBuilder {
    /// Set the OpenAI API key.
    pub fn openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.openai_api_key = Some(key.into());
        self
    }

    /// Set the chat model identifier.
    pub fn chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = Some(model.into());
        self
    }

    /// Set the remote vector store base URL.
    pub fn chroma_url(mut self, url: impl Into<String>) -> Self {
        self.chroma_url = Some(url.into());
        self
    }

    /// Set the remote vector store bearer token.
    pub fn chroma_token(mut self, token: impl Into<String>) -> Self {
        self.chroma_token = Some(token.into());
        self
    }

    /// Set the local fallback store path.
    pub fn local_store_path(mut self, path: impl Into<String>) -> Self {
        self.local_store_path = Some(path.into());
        self
    }

    /// Set the main collection name.
    pub fn main_collection(mut self, name: impl Into<String>) -> Self {
        self.main_collection = Some(name.into());
        self
    }

    /// Set the FAQ collection name.
    pub fn faq_collection(mut self, name: impl Into<String>) -> Self {
        self.faq_collection = Some(Some(name.into()));
        self
    }

    /// Disable FAQ lookup entirely.
    pub fn without_faq(mut self) -> Self {
        self.faq_collection = Some(None);
        self
    }

    /// Set the retrieval parameters for the main collection.
    pub fn main_params(mut self, params: RetrieverParams) -> Self {
        self.main_params = Some(params);
        self
    }

    /// Set the retrieval parameters for the FAQ collection.
    pub fn faq_params(mut self, params: RetrieverParams) -> Self {
        self.faq_params = Some(params);
        self
    }

    /// Build the [`QaConfig`], validating the API key and retrieval
    /// parameters.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::ConfigError`] if the API key is missing, empty,
    /// or one of the known placeholders, or if any [`RetrieverParams`]
    /// fail validation.
    pub fn build(self) -> Result<QaConfig> {
        let openai_api_key = self
            .openai_api_key
            .ok_or_else(|| QaError::ConfigError("OPENAI_API_KEY is not set".to_string()))?;
        if openai_api_key.trim().is_empty()
            || PLACEHOLDER_KEYS.contains(&openai_api_key.trim())
        {
            return Err(QaError::ConfigError(
                "OPENAI_API_KEY is missing or still a placeholder".to_string(),
            ));
        }

        let main_params = self.main_params.unwrap_or_else(RetrieverParams::main_defaults);
        main_params.validate()?;
        let faq_params = self.faq_params.unwrap_or_else(RetrieverParams::faq_defaults);
        faq_params.validate()?;

        Ok(QaConfig {
            openai_api_key,
            chat_model: self.chat_model.unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            chroma_url: self.chroma_url,
            chroma_token: self.chroma_token,
            local_store_path: self
                .local_store_path
                .unwrap_or_else(|| DEFAULT_LOCAL_STORE_PATH.to_string()),
            main_collection: self
                .main_collection
                .unwrap_or_else(|| DEFAULT_MAIN_COLLECTION.to_string()),
            faq_collection: self
                .faq_collection
                .unwrap_or_else(|| Some(DEFAULT_FAQ_COLLECTION.to_string())),
            main_params,
            faq_params,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_builder() -> QaConfigBuilder {
        QaConfig::builder().openai_api_key("sk-test-1234")
    }

    #[test]
    fn defaults_are_applied() {
        let config = base_builder().build().unwrap();
        assert_eq!(config.chat_model, DEFAULT_CHAT_MODEL);
        assert_eq!(config.main_collection, DEFAULT_MAIN_COLLECTION);
        assert_eq!(config.faq_collection.as_deref(), Some(DEFAULT_FAQ_COLLECTION));
        assert_eq!(config.main_params, RetrieverParams::main_defaults());
        assert_eq!(config.faq_params, RetrieverParams::faq_defaults());
    }

    #[test]
    fn missing_key_fails_closed() {
        assert!(QaConfig::builder().build().is_err());
    }

    #[test]
    fn placeholder_keys_fail_closed() {
        for placeholder in ["your-api-key-here", "your-openai-api-key", "sk-...", "  "] {
            let result = QaConfig::builder().openai_api_key(placeholder).build();
            assert!(result.is_err(), "placeholder '{placeholder}' was accepted");
        }
    }

    #[test]
    fn invalid_params_rejected() {
        let params = RetrieverParams { k: 0, ..RetrieverParams::main_defaults() };
        assert!(base_builder().main_params(params).build().is_err());

        let params = RetrieverParams { k: 5, fetch_k: 3, ..RetrieverParams::main_defaults() };
        assert!(base_builder().main_params(params).build().is_err());

        let params = RetrieverParams { lambda_mult: 1.5, ..RetrieverParams::main_defaults() };
        assert!(base_builder().main_params(params).build().is_err());
    }
}
