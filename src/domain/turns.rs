//! Turn windows of a battle log.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One contiguous block between turn headers (or from a header to end-of-log)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSpan {
    /// 1-based, sequential by header order
    pub turn_number: usize,

    /// Line of the turn header (1-indexed)
    pub start_line: usize,

    /// Last line before the next header, or the last line of the log
    pub end_line: usize,

    /// Inferred acting player; `None` when no body line names one
    pub actor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnSpanError {
    #[error("Turn numbers start at 1")]
    ZeroTurn,

    #[error("Turn {turn_number} ends before it starts: {start_line} > {end_line}")]
    Inverted {
        turn_number: usize,
        start_line: usize,
        end_line: usize,
    },
}

impl TurnSpan {
    /// Create a validated turn span
    pub fn new(
        turn_number: usize,
        start_line: usize,
        end_line: usize,
        actor: Option<String>,
    ) -> Result<Self, TurnSpanError> {
        if turn_number == 0 {
            return Err(TurnSpanError::ZeroTurn);
        }
        if end_line < start_line {
            return Err(TurnSpanError::Inverted {
                turn_number,
                start_line,
                end_line,
            });
        }
        Ok(Self {
            turn_number,
            start_line,
            end_line,
            actor,
        })
    }

    /// Whether a 1-indexed line falls inside the span
    pub fn contains(&self, line: usize) -> bool {
        (self.start_line..=self.end_line).contains(&line)
    }
}

/// Deterministic digest of one turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSummary {
    pub turn_number: usize,
    pub actor: Option<String>,
    pub bullets: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_span_validation() {
        assert!(TurnSpan::new(1, 2, 2, None).is_ok());
        assert_eq!(TurnSpan::new(0, 2, 4, None), Err(TurnSpanError::ZeroTurn));
        assert!(matches!(
            TurnSpan::new(2, 9, 4, None),
            Err(TurnSpanError::Inverted { .. })
        ));
    }

    #[test]
    fn test_contains() {
        let span = TurnSpan::new(1, 5, 8, Some("A".into())).unwrap();
        assert!(span.contains(5));
        assert!(span.contains(8));
        assert!(!span.contains(9));
    }
}
