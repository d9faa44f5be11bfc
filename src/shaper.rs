//! Output shaping: text cleaning, link attachment, and source citations.
//!
//! The shaper turns raw generated text plus the retrieved chunks into the
//! final [`QueryResult`]. It enforces the presentation invariants the
//! model's output alone does not guarantee. The cleaning steps run in a
//! fixed order (entity decoding must precede character normalization) and
//! are idempotent: cleaning an already-clean string is a no-op.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::canonical::{SKRIPSI_ANSWER, SKRIPSI_TRIGGER};
use crate::document::{QueryResult, RetrievedDoc};

/// Preamble of the appended links section.
pub const LINK_PREAMBLE: &str = "Informasi lengkap dapat diakses melalui link:";

/// Prefix of the source citation footer.
pub const SOURCE_PREFIX: &str = "Sumber data:";

/// Fallback shown when cleaning leaves nothing; the answer is never empty.
pub const EMPTY_ANSWER: &str =
    "Maaf, saya tidak menemukan jawaban untuk pertanyaan tersebut pada sumber yang tersedia.";

/// Question keywords indicating the user asks where to obtain documents.
const LINK_QUESTION_KEYWORDS: &[&str] = &[
    "dimana", "di mana", "akses", "link", "tautan", "dokumen", "file", "berkas", "panduan",
    "kurikulum",
];

/// Documentary terms the answer must reference before links are attached.
const LINK_ANSWER_TERMS: &[&str] = &[
    "dokumen", "panduan", "kurikulum", "file", "berkas", "formulir", "tautan", "link", "unduh",
    "informasi",
];

static LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(jawaban|answer)\s*:\s*").unwrap());
static SPACE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").unwrap());
static NEWLINE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static NUMBER_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*(\d+)\.[ \t]*(\S)").unwrap());
static BULLET_INDENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]+-").unwrap());
static SOFT_WRAP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]*\\\n[ \t]*").unwrap());
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"https?://[^\s<>"']+"#).unwrap());

/// Apply the eight text-cleaning steps in order.
///
/// 1. Strip a leading `Jawaban:`/`Answer:` label.
/// 2. HTML-entity decode (to a fixpoint), then canonicalize em-space,
///    bullet, en-dash, em-dash, and box-drawing horizontal characters.
/// 3. Unfold literal `\n` and `\t` escape sequences.
/// 4. Collapse space runs, trim non-list-item lines, collapse 3+ newlines
///    to exactly two.
/// 5. Ensure exactly one space after numbered-list prefixes.
/// 6. Remove stray whitespace before line-start bullets.
/// 7. Join soft-wrapped tokens broken by a backslash-newline.
/// 8. Scrub residual backslashes.
pub fn clean_text(text: &str) -> String {
    // 1. Leading label
    let text = LABEL_RE.replace(text, "");

    // 2. Entities, then character normalization. Decoding runs to a
    // fixpoint: double-escaped input ("&amp;amp;") is otherwise left one
    // decode short of stable.
    let mut text = text.into_owned();
    loop {
        let decoded = html_escape::decode_html_entities(&text).into_owned();
        if decoded == text {
            break;
        }
        text = decoded;
    }
    let text: String = text
        .chars()
        .map(|c| match c {
            '\u{2003}' => ' ',  // em space
            '\u{2022}' => '-',  // bullet
            '\u{2013}' => '-',  // en dash
            '\u{2014}' => '-',  // em dash
            '\u{2500}' => '-',  // box-drawing horizontal
            other => other,
        })
        .collect();

    // 3. Escape unfolding
    let text = text.replace("\\n", "\n").replace("\\t", "\t");

    // 4–6. Whitespace canonicalization and list-prefix normalization
    let text = normalize_layout(&text);

    // 7. Soft-wrap repair
    let text = SOFT_WRAP_RE.replace_all(&text, " ");

    // 8. Backslash scrub. Removing a backslash can leave a double space or
    // expose a list prefix steps 4–6 already passed over, so the layout
    // pass runs once more to keep cleaning idempotent.
    let text = text.replace('\\', "");
    normalize_layout(&text).trim().to_string()
}

/// Steps 4–6: whitespace canonicalization, numbered-list prefix spacing,
/// and bullet join.
fn normalize_layout(text: &str) -> String {
    let text = canonicalize_whitespace(text);
    let text = NUMBER_PREFIX_RE.replace_all(&text, "$1. $2");
    BULLET_INDENT_RE.replace_all(&text, "-").into_owned()
}

/// Collapse space runs, trim non-list-item lines, and collapse 3+ newlines
/// to exactly two.
fn canonicalize_whitespace(text: &str) -> String {
    let text = SPACE_RUN_RE.replace_all(text, " ");
    let text = text
        .split('\n')
        .map(|line| {
            let stripped = line.trim_start();
            if is_list_item(stripped) {
                // Keep list-item indentation for the dedicated steps below.
                line.trim_end()
            } else {
                line.trim()
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    NEWLINE_RUN_RE.replace_all(&text, "\n\n").into_owned()
}

/// Whether a trimmed line starts a numbered or bulleted list item.
fn is_list_item(line: &str) -> bool {
    if line.starts_with('-') || line.starts_with('\u{2022}') {
        return true;
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    digits > 0 && line[digits..].starts_with('.')
}

/// Extract all HTTP/HTTPS URLs from the retrieved chunks' payloads.
///
/// Returned deduplicated, Google Drive links first, otherwise in order of
/// appearance.
pub fn extract_links(docs: &[RetrievedDoc]) -> Vec<String> {
    let mut drive = Vec::new();
    let mut other = Vec::new();
    for doc in docs {
        for m in URL_RE.find_iter(&doc.chunk.text) {
            let url = m.as_str().trim_end_matches(['.', ',', ')']).to_string();
            let bucket = if is_drive_link(&url) { &mut drive } else { &mut other };
            if !bucket.contains(&url) {
                bucket.push(url);
            }
        }
    }
    drive.extend(other);
    drive
}

/// Whether the URL's host starts with `drive.google.com`.
fn is_drive_link(url: &str) -> bool {
    url.split("://").nth(1).is_some_and(|rest| rest.starts_with("drive.google.com"))
}

/// Whether a links section should be appended.
///
/// True iff the question explicitly asks where or how to obtain
/// documentation AND the answer itself references documentary terms.
pub fn should_add_links(question: &str, answer: &str) -> bool {
    let question = question.to_lowercase();
    let answer = answer.to_lowercase();
    LINK_QUESTION_KEYWORDS.iter().any(|kw| question.contains(kw))
        && LINK_ANSWER_TERMS.iter().any(|term| answer.contains(term))
}

/// Append the links section when warranted and not already present.
fn attach_links(question: &str, body: String, docs: &[RetrievedDoc]) -> String {
    if !should_add_links(question, &body) {
        return body;
    }
    let links: Vec<String> =
        extract_links(docs).into_iter().filter(|url| !body.contains(url.as_str())).collect();
    if links.is_empty() {
        return body;
    }
    debug!(count = links.len(), "attaching document links");
    format!("{body}\n\n{LINK_PREAMBLE}\n{}", links.join("\n"))
}

/// The `source` basenames (extension stripped) of the retrieved chunks,
/// deduplicated in order. Chunks without a `source` entry are skipped.
pub fn source_names(docs: &[RetrievedDoc]) -> Vec<String> {
    let mut names = Vec::new();
    for doc in docs {
        let Some(source) = doc.chunk.source() else { continue };
        let basename = source.rsplit(['/', '\\']).next().unwrap_or(source);
        let name = match basename.rfind('.') {
            Some(idx) if idx > 0 => &basename[..idx],
            _ => basename,
        };
        if name.is_empty() {
            continue;
        }
        let name = name.to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Append the `Sumber data:` footer after a blank line.
fn attach_footer(body: String, docs: &[RetrievedDoc]) -> String {
    let names = source_names(docs);
    if names.is_empty() {
        return body;
    }
    format!("{body}\n\n{SOURCE_PREFIX} {}", names.join(", "))
}

/// Replace a partially paraphrased thesis-topic answer with the canonical
/// text. Guards against the generator reproducing the trigger phrase
/// somewhere other than the start of the answer.
fn apply_canonical_override(body: String) -> String {
    if body.contains(SKRIPSI_TRIGGER) && !body.starts_with(SKRIPSI_TRIGGER) {
        debug!("canonical override replaced a paraphrased thesis-topic answer");
        SKRIPSI_ANSWER.to_string()
    } else {
        body
    }
}

/// Shape a canonical (fast-path) answer.
///
/// The literal text is preserved apart from whitespace normalization; only
/// the citation footer is attached. The links section is never appended to
/// a hand-authored answer.
pub fn shape_canonical(answer: &str, docs: &[RetrievedDoc]) -> QueryResult {
    let body = clean_text(answer);
    let answer = attach_footer(body, docs);
    let sources = docs.iter().map(|d| clean_text(&d.chunk.text)).collect();
    QueryResult { answer, sources }
}

/// Shape the raw answer and retrieved chunks into the final result.
///
/// Cleaning, link attachment, canonical override, and the citation footer
/// are applied in that order; `sources` receives the chunks' payloads
/// cleaned with the same eight text steps.
pub fn shape(question: &str, raw_answer: &str, docs: &[RetrievedDoc]) -> QueryResult {
    let body = clean_text(raw_answer);
    let body = if body.is_empty() { EMPTY_ANSWER.to_string() } else { body };
    let body = attach_links(question, body, docs);
    let body = apply_canonical_override(body);
    let answer = attach_footer(body, docs);

    let sources = docs.iter().map(|d| clean_text(&d.chunk.text)).collect();

    QueryResult { answer, sources }
}
