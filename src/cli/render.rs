//! Report rendering for the CLI.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use clap::ValueEnum;

use crate::core::language::MarkdownLabels;
use crate::core::ReportLanguage;
use crate::domain::PostGameReport;
use crate::evidence::EvidenceSpan;

/// Output format for `pokecoach report`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,

    /// Markdown document
    Md,
}

/// Render a report in the requested format, always newline-terminated
pub fn render(
    report: &PostGameReport,
    format: OutputFormat,
    language: ReportLanguage,
) -> Result<String> {
    match format {
        OutputFormat::Json => render_json(report),
        OutputFormat::Md => Ok(render_markdown(report, language)),
    }
}

pub fn render_json(report: &PostGameReport) -> Result<String> {
    let mut json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    json.push('\n');
    Ok(json)
}

fn or_dash(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => "-",
    }
}

fn yes_no(labels: &MarkdownLabels, flag: bool) -> &'static str {
    if flag {
        labels.yes
    } else {
        labels.no
    }
}

fn push_bullets(out: &mut String, items: &[String]) {
    for item in items {
        let _ = writeln!(out, "- {}", item);
    }
}

fn push_evidence(out: &mut String, labels: &MarkdownLabels, evidence: &EvidenceSpan) {
    let _ = writeln!(
        out,
        "- {} ({}-{}):",
        labels.evidence, evidence.start_line, evidence.end_line
    );
    for raw in &evidence.raw_lines {
        let _ = writeln!(out, "  - {}", raw);
    }
}

/// Render a report as a Markdown document
///
/// Section headings are fixed; field labels follow the report language.
pub fn render_markdown(report: &PostGameReport, language: ReportLanguage) -> String {
    let labels = &language.templates().markdown;
    let facts = &report.match_facts;
    let mut out = String::new();

    out.push_str("# Post-Game Report\n\n");
    out.push_str("## Match Facts\n\n");
    let _ = writeln!(out, "| {} | {} |\n| --- | --- |", labels.fact, labels.value);
    let _ = writeln!(out, "| {} | {} |", labels.winner, or_dash(facts.winner.as_deref()));
    let _ = writeln!(
        out,
        "| {} | {} |",
        labels.went_first,
        or_dash(facts.went_first_player.as_deref())
    );
    let _ = writeln!(out, "| {} | {} |", labels.turns, facts.turns_count);
    let _ = writeln!(
        out,
        "| {} | {} |",
        labels.concede_detected,
        yes_no(labels, facts.concede)
    );

    out.push_str("\n### Scoreboard\n\n");
    let _ = writeln!(
        out,
        "| {} | {} | {} |\n| --- | ---: | ---: |",
        labels.player, labels.observable_prizes, labels.kos
    );
    let players = facts.scoreboard_players();
    if players.is_empty() {
        out.push_str("| - | 0 | 0 |\n");
    }
    for player in players {
        let prizes = facts
            .observable_prizes_taken_by_player
            .get(&player)
            .copied()
            .unwrap_or(0);
        let kos = facts.kos_by_player.get(&player).copied().unwrap_or(0);
        let _ = writeln!(out, "| {} | {} | {} |", player, prizes, kos);
    }

    out.push_str("\n## Summary\n\n");
    push_bullets(&mut out, &report.summary);

    out.push_str("\n## Turning Points\n\n");
    for (idx, tp) in report.turning_points.iter().enumerate() {
        let _ = writeln!(out, "### {}. {}", idx + 1, tp.title);
        let _ = writeln!(out, "- {}: {}", labels.impact, tp.impact);
        let _ = writeln!(out, "- {}: {:.2}", labels.confidence, tp.confidence);
        let _ = writeln!(out, "- {}: {}", labels.hidden_info, tp.depends_on_hidden_info);
        push_evidence(&mut out, labels, &tp.evidence);
        out.push('\n');
    }

    out.push_str("## Mistakes\n\n");
    for (idx, ms) in report.mistakes.iter().enumerate() {
        let _ = writeln!(out, "### {}. {}", idx + 1, ms.description);
        let _ = writeln!(out, "- {}: {}", labels.why_it_matters, ms.why_it_matters);
        let _ = writeln!(out, "- {}: {}", labels.better_line, ms.better_line);
        let _ = writeln!(out, "- {}: {:.2}", labels.confidence, ms.confidence);
        let _ = writeln!(out, "- {}: {}", labels.hidden_info, ms.depends_on_hidden_info);
        push_evidence(&mut out, labels, &ms.evidence);
        out.push('\n');
    }

    out.push_str("## Unknowns\n\n");
    push_bullets(&mut out, &report.unknowns);

    out.push_str("\n## Next Actions\n\n");
    push_bullets(&mut out, &report.next_actions);

    let mut rendered = out.trim_end().to_string();
    rendered.push('\n');
    rendered
}
