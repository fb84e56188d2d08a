//! Core report logic.
//!
//! This module contains:
//! - Scoring: Turning point and mistake candidates
//! - Guardrails: Evidence/confidence filtering and backfill
//! - Integrity: KO-claim verification for summary bullets
//! - Language: Report language detection and templates
//! - Assembler: The report pipeline
//! - CoachAuditor: One-iteration review protocol
//! - Kpis: Release quality gate

pub mod assembler;
pub mod coach_auditor;
pub mod guardrails;
pub mod integrity;
pub mod kpis;
pub mod language;
pub mod scoring;

// Re-export commonly used types
pub use assembler::{Analysis, Coach};
pub use coach_auditor::{
    apply_patch_plan, evaluate_quality_minimum, run_one_iteration, CoachAuditorRun,
    DeterministicAuditor,
};
pub use guardrails::{GuardedClaims, GuardrailLimits, GuardrailViolation};
pub use integrity::{apply_summary_claim_integrity, ClaimVerdict, IntegrityOutcome};
pub use kpis::{evaluate_release_kpis, GoldenMinimums, ReleaseKpiResult, DEFAULT_LOG_PATTERN};
pub use language::{detect_language, ReportLanguage};
pub use scoring::{build_mistakes, build_turning_points};
