//! Domain types for pokecoach.
//!
//! This module contains the value objects produced by one pipeline pass:
//! - Events: Detected key events and their index
//! - Turns: Turn windows and per-turn digests
//! - Facts: Match statistics and derived facts
//! - Bundles: Causal play units
//! - Report: The final report contract and its invariants
//! - Agentic: Coach/auditor exchange types

pub mod agentic;
pub mod bundles;
pub mod events;
pub mod facts;
pub mod report;
pub mod turns;

// Re-export commonly used types
pub use agentic::{
    AgenticTelemetry, AuditResult, AuditStatus, CoachAuditorEvent, CoachAuditorEventName,
    CoachAuditorMetadata, DraftReport, PatchAction, PatchOp, Severity, Stage, Violation,
};
pub use bundles::{PlayBundle, PlayBundleEvent};
pub use events::{EventType, KeyEvent, KeyEventIndex};
pub use facts::{MatchFacts, MatchStats, UNKNOWN_ACTOR};
pub use report::{
    Claim, Mistake, PostGameReport, ReportError, TurningPoint, MIN_CONFIDENCE,
    MISTAKES_MAX_ITEMS, MISTAKES_MIN_ITEMS, NEXT_ACTIONS_MAX_ITEMS, NEXT_ACTIONS_MIN_ITEMS,
    SUMMARY_MAX_ITEMS, SUMMARY_MIN_ITEMS, TURNING_POINTS_MAX_ITEMS, TURNING_POINTS_MIN_ITEMS,
};
pub use turns::{TurnSpan, TurnSpanError, TurnSummary};
