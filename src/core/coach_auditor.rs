//! One-iteration coach/auditor review protocol.
//!
//! The coach drafts, the auditor reviews, and at most one rewrite follows a
//! failed review. Every step is recorded in a linear event log that is also
//! forwarded to an optional callback.

use tracing::{debug, info, warn};

use crate::domain::{
    AgenticTelemetry, AuditResult, AuditStatus, CoachAuditorEvent, CoachAuditorEventName,
    CoachAuditorMetadata, DraftReport, PatchAction, PatchOp, PostGameReport, Severity, Stage,
    Violation, NEXT_ACTIONS_MAX_ITEMS, NEXT_ACTIONS_MIN_ITEMS, SUMMARY_MAX_ITEMS,
    SUMMARY_MIN_ITEMS,
};
use crate::parser::Lexicon;

use super::integrity::{extract_ko_claim, verify_ko_claim, ClaimVerdict};

/// Pass unless there is a critical violation or two major ones
pub fn evaluate_quality_minimum(violations: &[Violation]) -> bool {
    let critical = violations
        .iter()
        .filter(|v| v.severity == Severity::Critical)
        .count();
    let major = violations
        .iter()
        .filter(|v| v.severity == Severity::Major)
        .count();
    critical == 0 && major < 2
}

/// Result of one protocol run
#[derive(Debug, Clone)]
pub struct CoachAuditorRun {
    pub draft_report: DraftReport,
    pub metadata: CoachAuditorMetadata,
    pub events: Vec<CoachAuditorEvent>,
}

impl CoachAuditorRun {
    pub fn telemetry(&self) -> AgenticTelemetry {
        AgenticTelemetry {
            metadata: self.metadata.clone(),
            events: self.events.clone(),
        }
    }
}

struct EventLog<'a> {
    events: Vec<CoachAuditorEvent>,
    callback: Option<&'a mut dyn FnMut(&CoachAuditorEvent)>,
}

impl EventLog<'_> {
    fn emit(&mut self, event: CoachAuditorEvent) {
        debug!(event = ?event.event_name, stage = ?event.stage, "Coach/auditor event");
        if let Some(callback) = self.callback.as_mut() {
            callback(&event);
        }
        self.events.push(event);
    }
}

/// Draft, audit, rewrite at most once, re-audit
///
/// The auditor's own `quality_minimum_pass` is ignored; the verdict is
/// recomputed from its violations.
pub fn run_one_iteration<D, A, R>(
    draft_generator: D,
    mut auditor: A,
    rewrite_generator: R,
    event_callback: Option<&mut dyn FnMut(&CoachAuditorEvent)>,
) -> CoachAuditorRun
where
    D: FnOnce() -> DraftReport,
    A: FnMut(&DraftReport) -> AuditResult,
    R: FnOnce(&DraftReport, &[Violation], &[PatchAction]) -> DraftReport,
{
    use CoachAuditorEventName::*;

    let mut log = EventLog {
        events: Vec::new(),
        callback: event_callback,
    };

    log.emit(CoachAuditorEvent::new(CoachRunStarted, Stage::Coach));
    let initial_draft = draft_generator();
    log.emit(CoachAuditorEvent::new(CoachRunCompleted, Stage::Coach).with_rewrite(false));

    let first_audit = auditor(&initial_draft);
    let first_pass = evaluate_quality_minimum(&first_audit.violations);
    log.emit(
        CoachAuditorEvent::new(AuditRunCompleted, Stage::Audit)
            .with_violations(first_audit.violations.len())
            .with_quality(first_pass)
            .with_rewrite(false),
    );

    if first_pass {
        log.emit(CoachAuditorEvent::new(ReportReturned, Stage::Orchestrator).with_rewrite(false));
        info!(violations = first_audit.violations.len(), "Audit passed on first try");
        let metadata = CoachAuditorMetadata {
            audit_status: AuditStatus::Pass,
            violations_count: first_audit.violations.len(),
            rewrite_used: false,
            events_count: log.events.len(),
            audit_pass_first_try: true,
        };
        return CoachAuditorRun {
            draft_report: initial_draft,
            metadata,
            events: log.events,
        };
    }

    warn!(
        violations = first_audit.violations.len(),
        "Audit failed quality minimum, rewriting once"
    );
    log.emit(
        CoachAuditorEvent::new(AuditFailedQualityMinimum, Stage::Orchestrator)
            .with_violations(first_audit.violations.len())
            .with_quality(false)
            .with_rewrite(false),
    );
    log.emit(CoachAuditorEvent::new(RewriteStarted, Stage::Coach).with_rewrite(true));
    let rewritten = rewrite_generator(
        &initial_draft,
        &first_audit.violations,
        &first_audit.patch_plan,
    );
    log.emit(CoachAuditorEvent::new(RewriteCompleted, Stage::Coach).with_rewrite(true));

    let second_audit = auditor(&rewritten);
    let second_pass = evaluate_quality_minimum(&second_audit.violations);
    log.emit(
        CoachAuditorEvent::new(AuditRunCompleted, Stage::Audit)
            .with_violations(second_audit.violations.len())
            .with_quality(second_pass)
            .with_rewrite(true),
    );
    log.emit(
        CoachAuditorEvent::new(ReportReturned, Stage::Orchestrator)
            .with_violations(second_audit.violations.len())
            .with_quality(second_pass)
            .with_rewrite(true),
    );
    info!(pass = second_pass, "Rewrite audited");

    let metadata = CoachAuditorMetadata {
        audit_status: if second_pass {
            AuditStatus::Pass
        } else {
            AuditStatus::Fail
        },
        violations_count: second_audit.violations.len(),
        rewrite_used: true,
        events_count: log.events.len(),
        audit_pass_first_try: false,
    };
    CoachAuditorRun {
        draft_report: rewritten,
        metadata,
        events: log.events,
    }
}

/// Coach draft view of an assembled report
pub fn draft_from_report(report: &PostGameReport) -> DraftReport {
    DraftReport {
        summary: report.summary.clone(),
        next_actions: report.next_actions.clone(),
        turning_points_picks: report.turning_points.iter().map(|t| t.title.clone()).collect(),
        mistakes_picks: report.mistakes.iter().map(|m| m.description.clone()).collect(),
        unknowns: report.unknowns.clone(),
    }
}

/// Auditor that checks drafts against the log and the candidate lists
pub struct DeterministicAuditor<'a> {
    lexicon: &'a Lexicon,
    lines: Vec<&'a str>,
    window: usize,
    turning_point_candidates: Vec<String>,
    mistake_candidates: Vec<String>,
    fallback_summary: Vec<String>,
    fallback_next_actions: Vec<String>,
}

fn violation(code: &str, severity: Severity, field: String, message: String, fix: &str) -> Violation {
    Violation {
        code: code.to_string(),
        severity,
        field,
        message,
        suggested_fix: fix.to_string(),
    }
}

fn patch(target: String, action: PatchOp, source: Option<String>, reason: &str) -> PatchAction {
    PatchAction {
        target,
        action,
        replacement_source: source,
        reason: reason.to_string(),
    }
}

impl<'a> DeterministicAuditor<'a> {
    pub fn new(
        lexicon: &'a Lexicon,
        log_text: &'a str,
        window: usize,
        report: &PostGameReport,
        fallback_summary: Vec<String>,
        fallback_next_actions: Vec<String>,
    ) -> Self {
        Self {
            lexicon,
            lines: log_text.lines().collect(),
            window,
            turning_point_candidates: report.turning_points.iter().map(|t| t.title.clone()).collect(),
            mistake_candidates: report.mistakes.iter().map(|m| m.description.clone()).collect(),
            fallback_summary,
            fallback_next_actions,
        }
    }

    fn unused_fallback<'f>(pool: &'f [String], used: &[String]) -> impl Iterator<Item = &'f String> + 'f {
        let used = used.to_vec();
        pool.iter().filter(move |item| !used.contains(item))
    }

    fn audit_cardinality(
        &self,
        field: &str,
        items: &[String],
        bounds: (usize, usize),
        pool: &[String],
        violations: &mut Vec<Violation>,
        plan: &mut Vec<PatchAction>,
    ) {
        let (min, max) = bounds;
        let code = format!("{}_CARDINALITY", field.to_uppercase());
        if items.len() < min {
            violations.push(violation(
                &code,
                Severity::Major,
                field.to_string(),
                format!("{field} has {} items, expected at least {min}", items.len()),
                "Append deterministic fallback bullets.",
            ));
            for fill in Self::unused_fallback(pool, items).take(min - items.len()) {
                plan.push(patch(field.to_string(), PatchOp::Append, Some(fill.clone()), &code));
            }
        } else if items.len() > max {
            violations.push(violation(
                &code,
                Severity::Major,
                field.to_string(),
                format!("{field} has {} items, expected at most {max}", items.len()),
                "Remove trailing bullets.",
            ));
            for idx in max..items.len() {
                plan.push(patch(format!("{field}[{idx}]"), PatchOp::Remove, None, &code));
            }
        }
    }

    fn audit_picks(
        field: &str,
        picks: &[String],
        candidates: &[String],
        code: &str,
        violations: &mut Vec<Violation>,
        plan: &mut Vec<PatchAction>,
    ) {
        for (idx, pick) in picks.iter().enumerate() {
            if candidates.contains(pick) {
                continue;
            }
            violations.push(violation(
                code,
                Severity::Critical,
                format!("{field}[{idx}]"),
                format!("'{pick}' is not a deterministic candidate"),
                "Pick only from the candidate list.",
            ));
            plan.push(patch(format!("{field}[{idx}]"), PatchOp::Remove, None, code));
        }
    }

    /// Review one draft
    pub fn audit(&self, draft: &DraftReport) -> AuditResult {
        let mut violations = Vec::new();
        let mut plan = Vec::new();

        self.audit_cardinality(
            "summary",
            &draft.summary,
            (SUMMARY_MIN_ITEMS, SUMMARY_MAX_ITEMS),
            &self.fallback_summary,
            &mut violations,
            &mut plan,
        );
        self.audit_cardinality(
            "next_actions",
            &draft.next_actions,
            (NEXT_ACTIONS_MIN_ITEMS, NEXT_ACTIONS_MAX_ITEMS),
            &self.fallback_next_actions,
            &mut violations,
            &mut plan,
        );

        Self::audit_picks(
            "turning_points_picks",
            &draft.turning_points_picks,
            &self.turning_point_candidates,
            "TURNING_POINT_DRIFT",
            &mut violations,
            &mut plan,
        );
        Self::audit_picks(
            "mistakes_picks",
            &draft.mistakes_picks,
            &self.mistake_candidates,
            "MISTAKE_DRIFT",
            &mut violations,
            &mut plan,
        );

        let mut replacements = Self::unused_fallback(&self.fallback_summary, &draft.summary);
        for (idx, bullet) in draft.summary.iter().enumerate() {
            let Some((actor, target)) = extract_ko_claim(self.lexicon, bullet) else {
                continue;
            };
            let verdict = verify_ko_claim(self.lexicon, &actor, &target, &self.lines, self.window);
            if verdict == ClaimVerdict::Verified {
                continue;
            }
            violations.push(violation(
                "EVIDENCE_MISSING",
                Severity::Critical,
                format!("summary[{idx}]"),
                format!("KO claim '{bullet}' is not supported by the log"),
                "Replace with a deterministic summary bullet.",
            ));
            let target = format!("summary[{idx}]");
            match replacements.next() {
                Some(source) => plan.push(patch(target, PatchOp::Replace, Some(source.clone()), "EVIDENCE_MISSING")),
                None => plan.push(patch(target, PatchOp::Remove, None, "EVIDENCE_MISSING")),
            }
        }

        let pass = evaluate_quality_minimum(&violations);
        AuditResult {
            quality_minimum_pass: pass,
            audit_summary: if violations.is_empty() {
                "Pass.".to_string()
            } else {
                format!("{} violation(s) found.", violations.len())
            },
            violations,
            patch_plan: plan,
        }
    }
}

/// Split a field path like `summary[2]` into its name and index
pub fn parse_target(target: &str) -> (&str, Option<usize>) {
    match target.split_once('[') {
        Some((field, rest)) => (field, rest.trim_end_matches(']').parse().ok()),
        None => (target, None),
    }
}

fn list_mut<'d>(draft: &'d mut DraftReport, field: &str) -> Option<&'d mut Vec<String>> {
    match field {
        "summary" => Some(&mut draft.summary),
        "next_actions" => Some(&mut draft.next_actions),
        "turning_points_picks" => Some(&mut draft.turning_points_picks),
        "mistakes_picks" => Some(&mut draft.mistakes_picks),
        "unknowns" => Some(&mut draft.unknowns),
        _ => None,
    }
}

/// Apply a patch plan to a draft
///
/// Replacements and appends apply in plan order. Removals are applied last,
/// highest index first, so earlier indices stay valid.
pub fn apply_patch_plan(draft: &DraftReport, plan: &[PatchAction]) -> DraftReport {
    let mut patched = draft.clone();
    let mut removals: Vec<(String, usize)> = Vec::new();

    for action in plan {
        let (field, index) = parse_target(&action.target);
        let Some(list) = list_mut(&mut patched, field) else {
            debug!(target = %action.target, "Ignoring patch for unknown field");
            continue;
        };
        match (action.action, index, action.replacement_source.as_ref()) {
            (PatchOp::Replace, Some(idx), Some(source)) if idx < list.len() => {
                list[idx] = source.clone();
            }
            (PatchOp::Append, _, Some(source)) => list.push(source.clone()),
            (PatchOp::Remove, Some(idx), _) => removals.push((field.to_string(), idx)),
            _ => debug!(target = %action.target, "Patch not applicable"),
        }
    }

    removals.sort_by(|a, b| b.1.cmp(&a.1));
    removals.dedup();
    for (field, idx) in removals {
        if let Some(list) = list_mut(&mut patched, &field) {
            if idx < list.len() {
                list.remove(idx);
            }
        }
    }
    patched
}
