//! Evidence anchoring for report claims
//!
//! Every turning point, mistake and play bundle in a report points back at the
//! battle-log lines it was derived from. This module owns the span type and the
//! helpers used to build spans from detected events.
//!
//! # Design Principles
//!
//! - **Honest unknowns**: A claim without source lines is never emitted as fact.
//! - **Immutable spans**: Spans are validated once at construction and never mutated.
//! - **Line numbers are 1-indexed** to match editors and the rendered report.

pub mod spans;
pub mod types;

pub use spans::{
    has_non_empty_evidence, normalize_claim_text, normalize_whitespace, single_line_span,
    span_from_lines,
};
pub use types::{EvidenceError, EvidenceSpan};
