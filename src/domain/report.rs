//! Post-game report contracts.
//!
//! Cardinality bounds and the confidence floor are hard invariants: the
//! assembler calls [`PostGameReport::validate`] before returning a report and
//! treats any breach as a construction error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::agentic::AgenticTelemetry;
use super::bundles::PlayBundle;
use super::facts::MatchFacts;
use crate::evidence::EvidenceSpan;

/// Claims below this confidence never reach the report
pub const MIN_CONFIDENCE: f64 = 0.55;

pub const SUMMARY_MIN_ITEMS: usize = 5;
pub const SUMMARY_MAX_ITEMS: usize = 8;
pub const TURNING_POINTS_MIN_ITEMS: usize = 2;
pub const TURNING_POINTS_MAX_ITEMS: usize = 4;
pub const MISTAKES_MIN_ITEMS: usize = 3;
pub const MISTAKES_MAX_ITEMS: usize = 6;
pub const NEXT_ACTIONS_MIN_ITEMS: usize = 3;
pub const NEXT_ACTIONS_MAX_ITEMS: usize = 5;

/// A moment that shifted the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurningPoint {
    pub title: String,
    pub impact: String,
    pub confidence: f64,
    pub depends_on_hidden_info: bool,
    pub evidence: EvidenceSpan,
}

/// A decision worth reviewing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mistake {
    pub description: String,
    pub why_it_matters: String,
    pub better_line: String,
    pub confidence: f64,
    pub depends_on_hidden_info: bool,
    pub evidence: EvidenceSpan,
}

/// Common view over evidence-backed claims
pub trait Claim {
    /// Short human label (title or description)
    fn label(&self) -> &str;
    fn confidence(&self) -> f64;
    fn evidence(&self) -> &EvidenceSpan;
}

impl Claim for TurningPoint {
    fn label(&self) -> &str {
        &self.title
    }
    fn confidence(&self) -> f64 {
        self.confidence
    }
    fn evidence(&self) -> &EvidenceSpan {
        &self.evidence
    }
}

impl Claim for Mistake {
    fn label(&self) -> &str {
        &self.description
    }
    fn confidence(&self) -> f64 {
        self.confidence
    }
    fn evidence(&self) -> &EvidenceSpan {
        &self.evidence
    }
}

/// The terminal report artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostGameReport {
    pub summary: Vec<String>,
    pub turning_points: Vec<TurningPoint>,
    pub mistakes: Vec<Mistake>,
    #[serde(default)]
    pub unknowns: Vec<String>,
    pub next_actions: Vec<String>,
    #[serde(default)]
    pub match_facts: MatchFacts,
    #[serde(default)]
    pub play_bundles: Vec<PlayBundle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agentic_telemetry: Option<AgenticTelemetry>,
}

/// Report construction errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReportError {
    #[error("Field '{field}' has {actual} items, expected {min}..={max}")]
    Cardinality {
        field: &'static str,
        actual: usize,
        min: usize,
        max: usize,
    },

    #[error("{field}[{index}] has no evidence lines")]
    MissingEvidence { field: &'static str, index: usize },

    #[error("{field}[{index}] confidence {confidence} is below the report floor or above 1.0")]
    Confidence {
        field: &'static str,
        index: usize,
        confidence: f64,
    },

    #[error("Log contains no detectable events; report minimums cannot be met")]
    NoEvents,
}

fn check_bounds(
    field: &'static str,
    actual: usize,
    min: usize,
    max: usize,
) -> Result<(), ReportError> {
    if actual < min || actual > max {
        return Err(ReportError::Cardinality {
            field,
            actual,
            min,
            max,
        });
    }
    Ok(())
}

fn check_claims<C: Claim>(field: &'static str, claims: &[C]) -> Result<(), ReportError> {
    for (index, claim) in claims.iter().enumerate() {
        if !claim.evidence().is_substantive() {
            return Err(ReportError::MissingEvidence { field, index });
        }
        let confidence = claim.confidence();
        if !(MIN_CONFIDENCE..=1.0).contains(&confidence) {
            return Err(ReportError::Confidence {
                field,
                index,
                confidence,
            });
        }
    }
    Ok(())
}

impl PostGameReport {
    /// Check every hard invariant of the report
    pub fn validate(&self) -> Result<(), ReportError> {
        check_bounds(
            "summary",
            self.summary.len(),
            SUMMARY_MIN_ITEMS,
            SUMMARY_MAX_ITEMS,
        )?;
        check_bounds(
            "turning_points",
            self.turning_points.len(),
            TURNING_POINTS_MIN_ITEMS,
            TURNING_POINTS_MAX_ITEMS,
        )?;
        check_bounds(
            "mistakes",
            self.mistakes.len(),
            MISTAKES_MIN_ITEMS,
            MISTAKES_MAX_ITEMS,
        )?;
        check_bounds(
            "next_actions",
            self.next_actions.len(),
            NEXT_ACTIONS_MIN_ITEMS,
            NEXT_ACTIONS_MAX_ITEMS,
        )?;
        check_claims("turning_points", &self.turning_points)?;
        check_claims("mistakes", &self.mistakes)?;
        Ok(())
    }
}
