//! Grounded answer generation from retrieved context.
//!
//! The prompt below is part of the public contract with the model, not
//! incidental string data: the shaper's invariants (numbered-list
//! preservation, no labels, no inline citations) assume the model was
//! instructed with exactly these rules. Changes here must keep the
//! property tests passing.

use std::sync::Arc;

use tracing::{debug, info};

use crate::chat::ChatModel;
use crate::document::RetrievedDoc;
use crate::error::Result;

/// System message fixing the assistant's role and scope.
pub const SYSTEM_PROMPT: &str = "Anda adalah asisten akademik Program Studi Sistem Informasi \
Undiksha. Jawab pertanyaan mahasiswa hanya berdasarkan konteks yang diberikan.";

/// User prompt template; `{context}` and `{question}` are substituted.
pub const PROMPT_TEMPLATE: &str = "\
Jawablah pertanyaan berikut hanya berdasarkan konteks di bawah ini.

Aturan yang wajib diikuti:
- Jika konteks memuat jawaban yang lengkap dan langsung atas pertanyaan, kembalikan teks tersebut apa adanya, dengan mempertahankan daftar bernomor, tanda butir, URL, pemisah baris, dan struktur paragraf.
- Daftar bernomor pada konteks harus direproduksi dengan jumlah butir, urutan, dan penomoran yang sama persis.
- Jangan mengarang fakta di luar konteks. Jika konteks tidak menjawab pertanyaan, akui hal itu dan sebutkan topik terkait yang dapat Anda bantu.
- Jangan menambahkan label seperti \"Jawaban:\" atau kata pengantar serupa di awal jawaban.
- Jangan menyisipkan kutipan sumber seperti nama berkas di dalam jawaban; kutipan sumber ditambahkan oleh sistem.

Konteks:
{context}

Pertanyaan: {question}";

/// Produces a grounded answer for a question from retrieved chunks.
pub struct Generator {
    model: Arc<dyn ChatModel>,
}

impl Generator {
    /// Create a generator over the given chat model.
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Build the context blob from retrieved chunks, in retriever order.
    pub fn build_context(docs: &[RetrievedDoc]) -> String {
        docs.iter().map(|d| d.chunk.text.as_str()).collect::<Vec<_>>().join("\n\n")
    }

    /// Generate an answer for the question from the retrieved chunks.
    ///
    /// An empty `docs` slice is allowed; the prompt instructs the model to
    /// admit a lack of information in that case.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::GenerationError`](crate::error::QaError::GenerationError)
    /// when the model call fails. Callers are expected to degrade to a
    /// fixed apology rather than surface the provider error.
    pub async fn generate(&self, question: &str, docs: &[RetrievedDoc]) -> Result<String> {
        let context = Self::build_context(docs);
        let prompt =
            PROMPT_TEMPLATE.replace("{context}", &context).replace("{question}", question);

        debug!(
            model = self.model.name(),
            context_chunks = docs.len(),
            prompt_len = prompt.len(),
            "invoking chat model"
        );

        let answer = self.model.complete(SYSTEM_PROMPT, &prompt).await?;
        info!(model = self.model.name(), answer_len = answer.len(), "generation completed");
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Chunk;

    #[test]
    fn context_preserves_retriever_order() {
        let docs = vec![
            RetrievedDoc {
                chunk: Chunk::with_source("1", "first passage", "a.pdf", vec![]),
                score: 0.9,
            },
            RetrievedDoc {
                chunk: Chunk::with_source("2", "second passage", "b.pdf", vec![]),
                score: 0.8,
            },
        ];
        assert_eq!(Generator::build_context(&docs), "first passage\n\nsecond passage");
    }

    #[test]
    fn template_has_both_placeholders() {
        assert!(PROMPT_TEMPLATE.contains("{context}"));
        assert!(PROMPT_TEMPLATE.contains("{question}"));
    }
}
