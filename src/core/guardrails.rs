//! Guardrails for evidence-backed report claims.
//!
//! Every candidate claim ends up in one of three places:
//! - dropped, when it carries no non-blank evidence line
//! - rerouted to unknowns (once per distinct note), when its confidence is
//!   below the floor
//! - kept
//!
//! Surviving lists are then backfilled toward their minimums with
//! placeholder claims built from raw events and truncated to their maximums.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::{
    Claim, KeyEvent, KeyEventIndex, Mistake, TurningPoint, MIN_CONFIDENCE, MISTAKES_MAX_ITEMS,
    MISTAKES_MIN_ITEMS, TURNING_POINTS_MAX_ITEMS, TURNING_POINTS_MIN_ITEMS,
};
use crate::evidence::{has_non_empty_evidence, single_line_span};

use super::language::Templates;

/// Guardrail limits for report claims
///
/// Only the confidence floor is tunable. List bounds are the report
/// cardinality constants that `PostGameReport::validate` enforces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailLimits {
    /// Confidence floor below which claims are rerouted (default: 0.55)
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

fn default_min_confidence() -> f64 {
    MIN_CONFIDENCE
}

impl Default for GuardrailLimits {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
        }
    }
}

/// Why a claim did not survive the guardrails
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GuardrailViolation {
    #[error("Claim '{label}' has no non-blank evidence line")]
    MissingEvidence { label: String },

    #[error("Claim '{label}' confidence {confidence} is below {floor}")]
    LowConfidence {
        label: String,
        confidence: f64,
        floor: f64,
    },
}

/// Claims that survived, plus the updated unknowns
#[derive(Debug, Clone, Default)]
pub struct GuardedClaims {
    pub turning_points: Vec<TurningPoint>,
    pub mistakes: Vec<Mistake>,
    pub unknowns: Vec<String>,
}

impl GuardrailLimits {
    /// Effective floor; never below the report-level minimum
    pub fn floor(&self) -> f64 {
        self.min_confidence.max(MIN_CONFIDENCE)
    }

    /// Check a single claim
    pub fn check<C: Claim>(&self, claim: &C) -> Result<(), GuardrailViolation> {
        if !has_non_empty_evidence(&claim.evidence().raw_lines) {
            return Err(GuardrailViolation::MissingEvidence {
                label: claim.label().to_string(),
            });
        }
        if claim.confidence() < self.floor() {
            return Err(GuardrailViolation::LowConfidence {
                label: claim.label().to_string(),
                confidence: claim.confidence(),
                floor: self.floor(),
            });
        }
        Ok(())
    }

    /// Filter, reroute, backfill and truncate candidate claims
    pub fn apply(
        &self,
        turning_points: Vec<TurningPoint>,
        mistakes: Vec<Mistake>,
        unknowns: Vec<String>,
        index: &KeyEventIndex,
        templates: &Templates,
    ) -> GuardedClaims {
        let mut unknowns = UnknownNotes::from(unknowns);

        let mut kept_points = Vec::new();
        for point in turning_points {
            match self.check(&point) {
                Ok(()) => kept_points.push(point),
                Err(GuardrailViolation::LowConfidence { label, .. }) => {
                    unknowns.push(templates.low_conf_turning_point(&label));
                }
                Err(violation) => debug!(%violation, "Dropping turning point"),
            }
        }

        let mut kept_mistakes = Vec::new();
        for mistake in mistakes {
            match self.check(&mistake) {
                Ok(()) => kept_mistakes.push(mistake),
                Err(GuardrailViolation::LowConfidence { label, .. }) => {
                    unknowns.push(templates.low_conf_mistake(&label));
                }
                Err(violation) => debug!(%violation, "Dropping mistake"),
            }
        }

        let fallback: Vec<&KeyEvent> = index
            .events
            .iter()
            .filter(|e| !e.text.trim().is_empty())
            .collect();
        if !fallback.is_empty() {
            let mut cycle = fallback.iter().cycle();
            while kept_points.len() < TURNING_POINTS_MIN_ITEMS {
                let Some(event) = cycle.next() else { break };
                let seq = kept_points.len() + 1;
                kept_points.push(placeholder_turning_point(event, seq, templates));
            }

            let mut cycle = fallback.iter().cycle();
            while kept_mistakes.len() < MISTAKES_MIN_ITEMS {
                let Some(event) = cycle.next() else { break };
                kept_mistakes.push(placeholder_mistake(event, templates));
            }
        }

        kept_points.truncate(TURNING_POINTS_MAX_ITEMS);
        kept_mistakes.truncate(MISTAKES_MAX_ITEMS);

        GuardedClaims {
            turning_points: kept_points,
            mistakes: kept_mistakes,
            unknowns: unknowns.into_vec(),
        }
    }
}

fn placeholder_turning_point(event: &KeyEvent, seq: usize, templates: &Templates) -> TurningPoint {
    TurningPoint {
        title: templates.placeholder_tp_title(seq),
        impact: templates.placeholder_tp_impact.to_string(),
        confidence: MIN_CONFIDENCE,
        depends_on_hidden_info: true,
        evidence: single_line_span(event.line, &event.text),
    }
}

fn placeholder_mistake(event: &KeyEvent, templates: &Templates) -> Mistake {
    Mistake {
        description: templates.placeholder_mistake_description.to_string(),
        why_it_matters: templates.placeholder_mistake_why.to_string(),
        better_line: templates.placeholder_mistake_better_line.to_string(),
        confidence: MIN_CONFIDENCE,
        depends_on_hidden_info: true,
        evidence: single_line_span(event.line, &event.text),
    }
}

/// Ordered unknown notes, each kept once
#[derive(Debug, Clone, Default)]
pub struct UnknownNotes {
    notes: Vec<String>,
}

impl UnknownNotes {
    pub fn push(&mut self, note: impl Into<String>) {
        let note = note.into();
        if !self.notes.contains(&note) {
            self.notes.push(note);
        }
    }

    pub fn into_vec(self) -> Vec<String> {
        self.notes
    }
}

impl From<Vec<String>> for UnknownNotes {
    fn from(notes: Vec<String>) -> Self {
        let mut deduped = Self::default();
        for note in notes {
            deduped.push(note);
        }
        deduped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::language::ENGLISH;
    use crate::domain::EventType;
    use crate::evidence::EvidenceSpan;

    fn point(title: &str, confidence: f64, raw: &str) -> TurningPoint {
        TurningPoint {
            title: title.to_string(),
            impact: "i".to_string(),
            confidence,
            depends_on_hidden_info: false,
            evidence: EvidenceSpan {
                start_line: 1,
                end_line: 1,
                raw_lines: vec![raw.to_string()],
            },
        }
    }

    fn index() -> KeyEventIndex {
        KeyEventIndex {
            events: vec![
                KeyEvent::new(EventType::Attack, 2, "A infligió 10 puntos de daño usando Golpe."),
                KeyEvent::new(EventType::Ko, 3, "¡El Pikachu de B quedó Fuera de Combate!"),
            ],
        }
    }

    #[test]
    fn test_default_limits() {
        let limits = GuardrailLimits::default();
        assert_eq!(limits.min_confidence, 0.55);
        assert_eq!(limits.floor(), MIN_CONFIDENCE);
    }

    #[test]
    fn test_yaml_limits_only_tune_the_floor() {
        let limits: GuardrailLimits = serde_yaml::from_str("min_confidence: 0.2").unwrap();
        assert_eq!(limits.floor(), MIN_CONFIDENCE);

        let many: Vec<TurningPoint> = (0..6).map(|i| point(&format!("p{i}"), 0.9, "line")).collect();
        let guarded = limits.apply(many, Vec::new(), Vec::new(), &index(), &ENGLISH);
        assert_eq!(guarded.turning_points.len(), TURNING_POINTS_MAX_ITEMS);
        assert_eq!(guarded.mistakes.len(), MISTAKES_MIN_ITEMS);
    }

    #[test]
    fn test_check_classifies_claims() {
        let limits = GuardrailLimits::default();
        assert!(limits.check(&point("ok", 0.7, "line")).is_ok());
        assert!(matches!(
            limits.check(&point("blank", 0.9, "   ")),
            Err(GuardrailViolation::MissingEvidence { .. })
        ));
        assert!(matches!(
            limits.check(&point("weak", 0.4, "line")),
            Err(GuardrailViolation::LowConfidence { .. })
        ));
    }

    #[test]
    fn test_low_confidence_rerouted_once_and_backfilled() {
        let limits = GuardrailLimits::default();
        let guarded = limits.apply(
            vec![point("weak", 0.4, "line"), point("weak", 0.3, "line")],
            Vec::new(),
            vec!["note".to_string(), "note".to_string()],
            &index(),
            &ENGLISH,
        );
        assert_eq!(
            guarded.unknowns,
            vec!["note", "Low-confidence turning point omitted: weak"]
        );
        assert_eq!(guarded.turning_points.len(), 2);
        assert_eq!(guarded.turning_points[0].title, "Evidence-backed tempo signal 1");
        assert_eq!(guarded.turning_points[1].evidence.start_line, 3);
        assert_eq!(guarded.mistakes.len(), 3);
        assert_eq!(guarded.mistakes[2].evidence.start_line, 2);
    }

    #[test]
    fn test_no_events_leaves_lists_short() {
        let limits = GuardrailLimits::default();
        let guarded = limits.apply(
            Vec::new(),
            Vec::new(),
            Vec::new(),
            &KeyEventIndex::default(),
            &ENGLISH,
        );
        assert!(guarded.turning_points.is_empty());
        assert!(guarded.mistakes.is_empty());
    }
}
