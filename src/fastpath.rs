//! Fast-path recognition of canonical questions.
//!
//! The matcher checks the user's question against a fixed, ordered list of
//! regex pattern sets and against a lecturer name map. On a hit the
//! pipeline short-circuits to the pre-authored answer; the generator is
//! never invoked for these questions.

use regex::RegexBuilder;
use tracing::debug;

use crate::canonical::{CANONICAL_ANSWERS, LECTURERS};
use crate::error::{QaError, Result};

/// Which composition path services a question.
#[derive(Debug, Clone, PartialEq)]
pub enum Path {
    /// A canonical question: answer with this literal text.
    FastPath(&'static str),
    /// Not recognized: retrieve and generate.
    Generative,
}

/// A compiled canonical question family.
struct CompiledEntry {
    patterns: Vec<regex::Regex>,
    answer: &'static str,
}

/// Recognizes canonical questions and lecturer lookups.
pub struct FastPathMatcher {
    entries: Vec<CompiledEntry>,
    lecturers: &'static [(&'static str, &'static str)],
}

impl FastPathMatcher {
    /// Compile the built-in canonical pattern sets.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::ConfigError`] if a built-in pattern fails to
    /// compile; this indicates a defect in the canonical data.
    pub fn new() -> Result<Self> {
        let mut entries = Vec::with_capacity(CANONICAL_ANSWERS.len());
        for entry in CANONICAL_ANSWERS {
            let mut patterns = Vec::with_capacity(entry.patterns.len());
            for pattern in entry.patterns {
                let compiled = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| {
                        QaError::ConfigError(format!("invalid canonical pattern '{pattern}': {e}"))
                    })?;
                patterns.push(compiled);
            }
            entries.push(CompiledEntry { patterns, answer: entry.answer });
        }
        Ok(Self { entries, lecturers: LECTURERS })
    }

    /// Classify a question: canonical fast path or generative.
    ///
    /// The question is lowercased and trimmed before matching. Pattern
    /// families are checked in declaration order and the first family with
    /// any matching pattern wins; the lecturer substring lookup runs after
    /// the pattern families.
    pub fn classify(&self, question: &str) -> Path {
        let normalized = question.trim().to_lowercase();

        for entry in &self.entries {
            if entry.patterns.iter().any(|p| p.is_match(&normalized)) {
                debug!("question matched a canonical pattern");
                return Path::FastPath(entry.answer);
            }
        }

        for (name, bio) in self.lecturers {
            if normalized.contains(name) {
                debug!(lecturer = name, "question matched a lecturer record");
                return Path::FastPath(bio);
            }
        }

        Path::Generative
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::{CUTI_ANSWER, KURIKULUM_ANSWER, SKRIPSI_ANSWER};

    fn matcher() -> FastPathMatcher {
        FastPathMatcher::new().unwrap()
    }

    #[test]
    fn recognizes_thesis_topic_question() {
        let path = matcher().classify("Bagaimana prosedur pengajuan judul atau topik skripsi?");
        assert_eq!(path, Path::FastPath(SKRIPSI_ANSWER));
    }

    #[test]
    fn recognizes_curriculum_question() {
        let path = matcher().classify("Apa saja jenis kurikulum prodi sistem informasi undiksha?");
        assert_eq!(path, Path::FastPath(KURIKULUM_ANSWER));
    }

    #[test]
    fn recognizes_academic_leave_question() {
        let path =
            matcher().classify("Bagaimana prosedur mengurus surat permohonan cuti akademik?");
        assert_eq!(path, Path::FastPath(CUTI_ANSWER));
    }

    #[test]
    fn lecturer_lookup_is_case_insensitive() {
        let path = matcher().classify("Siapa Edy Listartha?");
        match path {
            Path::FastPath(bio) => assert!(bio.contains("I Made Edy Listartha")),
            Path::Generative => panic!("lecturer question fell through to the generative path"),
        }
    }

    #[test]
    fn first_matching_family_wins() {
        // Mentions both the thesis procedure and curricula; the thesis
        // family is declared first.
        let path = matcher()
            .classify("Apa prosedur pengajuan judul skripsi menurut jenis kurikulum terbaru?");
        assert_eq!(path, Path::FastPath(SKRIPSI_ANSWER));
    }

    #[test]
    fn unknown_question_is_generative() {
        assert_eq!(matcher().classify("Apa warna langit?"), Path::Generative);
    }

    #[test]
    fn question_is_trimmed_before_matching() {
        let path = matcher().classify("   bagaimana prosedur CUTI AKADEMIK?  ");
        assert_eq!(path, Path::FastPath(CUTI_ANSWER));
    }
}
