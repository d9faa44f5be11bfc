//! Property tests for the answer shaper's text-cleaning steps.

use proptest::prelude::*;
use sisfo_qa::shaper::clean_text;

/// Fragments covering the characters the cleaning steps act on: escape
/// sequences, stray backslashes, HTML entities (including double-escaped
/// ones), unicode punctuation, ragged whitespace, and list prefixes. The
/// leading-label strip is tested separately because it is positional, not
/// idempotent on arbitrary concatenations.
fn arb_fragment() -> impl Strategy<Value = String> {
    let fixed = proptest::sample::select(vec![
        " ", "   ", "\n", "\n\n\n\n", "\t", "\\n", "\\t", "\\", "\\\n", "\u{2003}", "\u{2022} ",
        "\u{2013}", "\u{2014}", "\u{2500}", "1. ", "2.", "- ", "&amp;", "&amp;amp;", "&#8212;",
        "https://example.ac.id/panduan.pdf",
    ])
    .prop_map(str::to_string);
    prop_oneof!["[a-z]{1,8}", fixed]
}

fn arb_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(arb_fragment(), 0..40).prop_map(|parts| parts.concat())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Cleaning an already-cleaned string is a no-op.
    #[test]
    fn cleaning_is_idempotent(text in arb_text()) {
        let once = clean_text(&text);
        let twice = clean_text(&once);
        prop_assert_eq!(once, twice);
    }

    /// A numbered list survives cleaning with the same count, order, and
    /// prefixes, regardless of ragged spacing around the prefixes.
    #[test]
    fn numbered_lists_are_preserved(
        items in proptest::collection::vec("[a-z]{1,10}", 1..9),
        pad in 0usize..4,
    ) {
        let raw: String = items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}{}.{}{item}\n", " ".repeat(pad), i + 1, " ".repeat(pad)))
            .collect();

        let cleaned = clean_text(&raw);
        let prefixes: Vec<String> = cleaned
            .lines()
            .filter(|l| l.chars().next().is_some_and(|c| c.is_ascii_digit()))
            .map(|l| l.split('.').next().unwrap().to_string())
            .collect();

        let expected: Vec<String> = (1..=items.len()).map(|n| n.to_string()).collect();
        prop_assert_eq!(prefixes, expected);
    }
}
