//! Span construction utilities for evidence grounding
//!
//! This module provides functions for turning detected log lines into
//! `EvidenceSpan`s and for normalizing text before matching.
//!
//! # Design Decisions
//!
//! - **Line-keyed**: Spans are keyed by 1-indexed line numbers, not byte offsets
//! - **Union semantics**: Multi-event spans keep one raw line per distinct line number
//! - **No invented text**: Raw lines are always copied verbatim from the log

use std::collections::BTreeMap;

use super::types::EvidenceSpan;

/// Build a span covering exactly one log line
///
/// Line numbers below 1 are clamped to 1 so the span invariant always holds.
pub fn single_line_span(line: usize, text: &str) -> EvidenceSpan {
    let line = line.max(1);
    EvidenceSpan {
        start_line: line,
        end_line: line,
        raw_lines: vec![text.to_string()],
    }
}

/// Build a span from a set of (line, text) pairs
///
/// Entries are ordered by line number and deduplicated by line (first text wins),
/// so a compound line that produced several events contributes one raw line.
///
/// # Returns
/// * `None` if no entries were provided
pub fn span_from_lines<'a, I>(entries: I) -> Option<EvidenceSpan>
where
    I: IntoIterator<Item = (usize, &'a str)>,
{
    let mut by_line: BTreeMap<usize, &str> = BTreeMap::new();
    for (line, text) in entries {
        by_line.entry(line.max(1)).or_insert(text);
    }

    let start_line = *by_line.keys().next()?;
    let end_line = *by_line.keys().next_back()?;

    Some(EvidenceSpan {
        start_line,
        end_line,
        raw_lines: by_line.values().map(|text| text.to_string()).collect(),
    })
}

/// Check that a list of raw lines carries at least one non-blank line
pub fn has_non_empty_evidence(raw_lines: &[String]) -> bool {
    raw_lines.iter().any(|line| !line.trim().is_empty())
}

/// Normalize whitespace: collapse runs of whitespace to single space, trim
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize free text for claim matching
///
/// Lowercases, replaces every non-alphanumeric character with a space and
/// collapses whitespace. "¡El Latias ex de B!" becomes "el latias ex de b".
pub fn normalize_claim_text(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    normalize_whitespace(&cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_span() {
        let span = single_line_span(7, "A tomó una carta de Premio.");
        assert_eq!(span.start_line, 7);
        assert_eq!(span.end_line, 7);
        assert_eq!(span.raw_lines, vec!["A tomó una carta de Premio.".to_string()]);
    }

    #[test]
    fn test_single_line_span_clamps_zero() {
        let span = single_line_span(0, "x");
        assert_eq!(span.start_line, 1);
    }

    #[test]
    fn test_span_from_lines_orders_and_dedupes() {
        let span = span_from_lines(vec![(9, "ko"), (4, "gust"), (9, "prize"), (6, "attack")])
            .unwrap();
        assert_eq!(span.start_line, 4);
        assert_eq!(span.end_line, 9);
        assert_eq!(span.raw_lines, vec!["gust", "attack", "ko"]);
    }

    #[test]
    fn test_span_from_lines_empty() {
        assert!(span_from_lines(Vec::<(usize, &str)>::new()).is_none());
    }

    #[test]
    fn test_has_non_empty_evidence() {
        assert!(!has_non_empty_evidence(&[]));
        assert!(!has_non_empty_evidence(&["  ".to_string()]));
        assert!(has_non_empty_evidence(&["".to_string(), "x".to_string()]));
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a   b\tc "), "a b c");
    }

    #[test]
    fn test_normalize_claim_text() {
        assert_eq!(
            normalize_claim_text("¡El Latias ex de SpicyTaco30 quedó Fuera de Combate!"),
            "el latias ex de spicytaco30 quedó fuera de combate"
        );
        assert_eq!(normalize_claim_text("Kami-Yan"), "kami yan");
    }
}
