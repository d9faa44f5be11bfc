//! Chat model trait for grounded answer generation.

use async_trait::async_trait;

use crate::error::Result;

/// A chat-completion backend taking a system and user message and
/// returning the model's text.
///
/// Implementations must request deterministic completions (temperature 0
/// where the backend supports it) so that a repeated query against an
/// unchanged index yields an identical result.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// The model identifier, for logging.
    fn name(&self) -> &str;

    /// Produce a completion for the given system and user messages.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}
