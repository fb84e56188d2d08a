//! pokecoach - Evidence-backed post-game coaching reports
//!
//! Turns a Pokemon TCG Live battle log into a structured report whose
//! every claim is tied to the log lines that support it.
//!
//! # Architecture
//!
//! The pipeline is deterministic end to end:
//! - Lines are segmented into turns and matched against event detectors
//! - Match facts and play bundles are derived from those events
//! - Scored turning points and mistakes pass through evidence guardrails
//! - Optional LLM guidance only rewrites summary and next actions, and
//!   every KO claim it makes is checked against the log
//!
//! # Modules
//!
//! - `evidence`: Evidence spans and text normalization
//! - `domain`: Data structures (KeyEvent, TurnSpan, PostGameReport)
//! - `parser`: Lexicon, event detectors, turn indexing, facts, bundles
//! - `core`: Scoring, guardrails, integrity, report assembly, KPIs
//! - `adapters`: External guidance providers (OpenRouter)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # JSON report to stdout
//! pokecoach report battle.txt
//!
//! # Markdown report without LLM guidance
//! pokecoach report battle.txt --format md --deterministic-only --output report.md
//!
//! # Release quality gate
//! pokecoach kpis --logs-dir tests/fixtures
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod evidence;
pub mod parser;

// Re-export main types at crate root for convenience
pub use core::{Analysis, Coach, ReportLanguage};
pub use domain::{
    EventType, KeyEvent, KeyEventIndex, MatchFacts, PlayBundle, PostGameReport, ReportError,
    TurnSpan,
};
pub use evidence::{EvidenceError, EvidenceSpan};
