//! Exchange types for the coach/auditor review protocol.
//!
//! These are transient: created and consumed within one orchestration
//! iteration. Only the resulting [`AgenticTelemetry`] can end up in a report.

use serde::{Deserialize, Serialize};

/// A coach draft: the free-text parts of a report plus candidate picks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftReport {
    pub summary: Vec<String>,
    pub next_actions: Vec<String>,
    /// Titles of the turning-point candidates the coach kept
    pub turning_points_picks: Vec<String>,
    /// Descriptions of the mistake candidates the coach kept
    pub mistakes_picks: Vec<String>,
    #[serde(default)]
    pub unknowns: Vec<String>,
}

/// Severity of an audit finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Major,
    Minor,
}

/// One audit finding against a draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Stable machine code, e.g. `EVIDENCE_MISSING`
    pub code: String,
    pub severity: Severity,
    /// Draft field path, e.g. `summary[0]`
    pub field: String,
    pub message: String,
    pub suggested_fix: String,
}

/// Patch operation requested by the auditor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchOp {
    /// Replace the target item with the replacement source
    Replace,
    /// Remove the target item
    Remove,
    /// Append the replacement source to the target list
    Append,
}

/// One instruction in the auditor's patch plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchAction {
    /// Draft field path, e.g. `summary[2]` or `next_actions`
    pub target: String,
    pub action: PatchOp,
    /// Literal replacement text or a candidate reference
    #[serde(default)]
    pub replacement_source: Option<String>,
    /// Violation code that motivated the patch
    pub reason: String,
}

/// Auditor verdict for one draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditResult {
    /// The auditor's own verdict; the orchestrator recomputes it from violations
    pub quality_minimum_pass: bool,
    pub violations: Vec<Violation>,
    pub patch_plan: Vec<PatchAction>,
    pub audit_summary: String,
}

/// Protocol event names, in the order they can occur
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoachAuditorEventName {
    CoachRunStarted,
    CoachRunCompleted,
    AuditRunCompleted,
    AuditFailedQualityMinimum,
    RewriteStarted,
    RewriteCompleted,
    ReportReturned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Coach,
    Audit,
    Orchestrator,
}

/// One entry of the protocol's linear event log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachAuditorEvent {
    pub event_name: CoachAuditorEventName,
    pub stage: Stage,
    pub violations_count: usize,
    pub quality_minimum_pass: Option<bool>,
    pub rewrite_used: Option<bool>,
}

impl CoachAuditorEvent {
    pub fn new(event_name: CoachAuditorEventName, stage: Stage) -> Self {
        Self {
            event_name,
            stage,
            violations_count: 0,
            quality_minimum_pass: None,
            rewrite_used: None,
        }
    }

    pub fn with_violations(mut self, violations_count: usize) -> Self {
        self.violations_count = violations_count;
        self
    }

    pub fn with_quality(mut self, pass: bool) -> Self {
        self.quality_minimum_pass = Some(pass);
        self
    }

    pub fn with_rewrite(mut self, rewrite_used: bool) -> Self {
        self.rewrite_used = Some(rewrite_used);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Pass,
    Fail,
}

/// Outcome metadata of one protocol run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachAuditorMetadata {
    pub audit_status: AuditStatus,
    pub violations_count: usize,
    pub rewrite_used: bool,
    pub events_count: usize,
    pub audit_pass_first_try: bool,
}

/// Telemetry embedded in the report when the protocol was enabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgenticTelemetry {
    pub metadata: CoachAuditorMetadata,
    pub events: Vec<CoachAuditorEvent>,
}
