//! Release quality gate over a directory of battle logs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{Claim, EventType};
use crate::evidence::has_non_empty_evidence;
use crate::parser::{find_key_events, index_turns};

use super::assembler::Coach;

pub const DEFAULT_LOG_PATTERN: &str = "battle_logs_ptcgl_spanish*.txt";

/// Minimum counts a fixture log must keep producing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldenMinimums {
    pub min_turns: usize,
    pub min_attacks: usize,
    pub min_kos: usize,
    pub has_concede: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KpiChecks {
    pub hallucination_rate: bool,
    pub evidence_coverage: bool,
    pub golden_stability: bool,
}

impl KpiChecks {
    pub fn all_pass(&self) -> bool {
        self.hallucination_rate && self.evidence_coverage && self.golden_stability
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseKpiResult {
    pub hallucination_rate: f64,
    pub evidence_coverage: f64,
    pub golden_stability: f64,
    pub actionable_claims: usize,
    pub logs_evaluated: usize,
    pub failed_reports: usize,
    pub checks: KpiChecks,
}

/// Log files in a directory matching a glob pattern, sorted
pub fn matching_logs(logs_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full = logs_dir.join(pattern);
    let full = full.to_string_lossy();
    let mut paths: Vec<PathBuf> = glob::glob(&full)
        .with_context(|| format!("Invalid log pattern: {}", full))?
        .filter_map(|entry| entry.ok())
        .collect();
    paths.sort();
    Ok(paths)
}

/// Whether one log meets its golden minimums
pub fn meets_minimums(coach: &Coach, log_text: &str, minimums: &GoldenMinimums) -> bool {
    let lex = coach.lexicon();
    let events = find_key_events(lex, log_text);
    index_turns(lex, log_text).len() >= minimums.min_turns
        && events.count(EventType::Attack) >= minimums.min_attacks
        && events.count(EventType::Ko) >= minimums.min_kos
        && events.has(EventType::Concede) == minimums.has_concede
}

fn golden_stability(coach: &Coach, logs_dir: &Path, expected_path: &Path) -> Result<f64> {
    let content = std::fs::read_to_string(expected_path)
        .with_context(|| format!("Failed to read expected minimums: {}", expected_path.display()))?;
    let expected: BTreeMap<String, GoldenMinimums> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse expected minimums: {}", expected_path.display()))?;

    if expected.is_empty() {
        return Ok(1.0);
    }

    let mut passed = 0usize;
    for (log_name, minimums) in &expected {
        let path = logs_dir.join(log_name);
        let log_text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read golden log: {}", path.display()))?;
        if meets_minimums(coach, &log_text, minimums) {
            passed += 1;
        } else {
            warn!(log = %log_name, "Golden minimums not met");
        }
    }
    Ok(passed as f64 / expected.len() as f64)
}

/// Evaluate hallucination rate, evidence coverage and golden stability
pub fn evaluate_release_kpis(
    coach: &Coach,
    logs_dir: &Path,
    expected_path: &Path,
    pattern: &str,
) -> Result<ReleaseKpiResult> {
    let logs = matching_logs(logs_dir, pattern)?;

    let mut total_claims = 0usize;
    let mut evidence_claims = 0usize;
    let mut failed_reports = 0usize;
    for path in &logs {
        let log_text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read log: {}", path.display()))?;
        let report = match coach.generate_deterministic_report(&log_text) {
            Ok(report) => report,
            Err(e) => {
                warn!(log = %path.display(), error = %e, "Report generation failed");
                failed_reports += 1;
                continue;
            }
        };
        let evidence = report
            .turning_points
            .iter()
            .map(|t| t.evidence())
            .chain(report.mistakes.iter().map(|m| m.evidence()));
        for span in evidence {
            total_claims += 1;
            if has_non_empty_evidence(&span.raw_lines) {
                evidence_claims += 1;
            }
        }
    }

    let hallucinations = total_claims - evidence_claims;
    let (hallucination_rate, evidence_coverage) = if total_claims == 0 {
        (0.0, 1.0)
    } else {
        (
            hallucinations as f64 / total_claims as f64,
            evidence_claims as f64 / total_claims as f64,
        )
    };
    let golden_stability = golden_stability(coach, logs_dir, expected_path)?;

    let checks = KpiChecks {
        hallucination_rate: hallucination_rate == 0.0 && failed_reports == 0,
        evidence_coverage: evidence_coverage == 1.0,
        golden_stability: golden_stability == 1.0,
    };
    info!(
        logs = logs.len(),
        claims = total_claims,
        pass = checks.all_pass(),
        "Release KPIs evaluated"
    );

    Ok(ReleaseKpiResult {
        hallucination_rate,
        evidence_coverage,
        golden_stability,
        actionable_claims: total_claims,
        logs_evaluated: logs.len(),
        failed_reports,
        checks,
    })
}
