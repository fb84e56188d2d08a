//! Evidence span data type
//!
//! `EvidenceSpan` is the serialized anchor embedded in every claim of the report.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A contiguous range of battle-log lines backing a claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceSpan {
    /// First line (1-indexed)
    pub start_line: usize,
    /// Last line (1-indexed, >= start_line)
    pub end_line: usize,
    /// Original text of the lines, ordered by line number
    pub raw_lines: Vec<String>,
}

/// Span construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvidenceError {
    #[error("Evidence lines are 1-indexed, got start_line {0}")]
    ZeroLine(usize),

    #[error("Evidence span ends before it starts: {start_line} > {end_line}")]
    Inverted { start_line: usize, end_line: usize },

    #[error("Evidence span {start_line}-{end_line} has no raw lines")]
    Empty { start_line: usize, end_line: usize },
}

impl EvidenceSpan {
    /// Create a validated span
    pub fn new(
        start_line: usize,
        end_line: usize,
        raw_lines: Vec<String>,
    ) -> Result<Self, EvidenceError> {
        if start_line == 0 {
            return Err(EvidenceError::ZeroLine(start_line));
        }
        if end_line < start_line {
            return Err(EvidenceError::Inverted {
                start_line,
                end_line,
            });
        }
        if raw_lines.is_empty() {
            return Err(EvidenceError::Empty {
                start_line,
                end_line,
            });
        }

        Ok(Self {
            start_line,
            end_line,
            raw_lines,
        })
    }

    /// Whether at least one raw line carries non-whitespace text
    pub fn is_substantive(&self) -> bool {
        self.raw_lines.iter().any(|line| !line.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_span() {
        let span = EvidenceSpan::new(3, 5, vec!["a".into(), "b".into()]).unwrap();
        assert_eq!((span.start_line, span.end_line), (3, 5));
        assert!(span.is_substantive());
    }

    #[test]
    fn test_inverted_span_rejected() {
        let err = EvidenceSpan::new(5, 3, vec!["a".into()]).unwrap_err();
        assert_eq!(
            err,
            EvidenceError::Inverted {
                start_line: 5,
                end_line: 3
            }
        );
    }

    #[test]
    fn test_empty_span_rejected() {
        assert!(matches!(
            EvidenceSpan::new(1, 1, vec![]),
            Err(EvidenceError::Empty { .. })
        ));
        assert!(matches!(
            EvidenceSpan::new(0, 1, vec!["x".into()]),
            Err(EvidenceError::ZeroLine(0))
        ));
    }

    #[test]
    fn test_whitespace_only_is_not_substantive() {
        let span = EvidenceSpan::new(1, 1, vec!["   ".into()]).unwrap();
        assert!(!span.is_substantive());
    }

    #[test]
    fn test_span_serialization() {
        let span = EvidenceSpan::new(2, 2, vec!["Kami-Yan robó una carta.".into()]).unwrap();
        let json = serde_json::to_string(&span).unwrap();
        assert!(json.contains("\"start_line\":2"));
        let parsed: EvidenceSpan = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, span);
    }
}
