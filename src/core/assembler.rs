//! Report assembly.
//!
//! Coordinates the deterministic extraction stages, the optional guidance
//! call, claim verification, language gating and the optional coach/auditor
//! review into one validated [`PostGameReport`].

use anyhow::Result;
use tracing::{debug, info, instrument, warn};

use crate::adapters::{Guidance, GuidanceProvider, OpenRouterProvider};
use crate::config::CoachConfig;
use crate::domain::{
    EventType, KeyEventIndex, MatchFacts, MatchStats, Mistake, PlayBundle, PostGameReport,
    ReportError, TurnSpan, TurningPoint, NEXT_ACTIONS_MAX_ITEMS, NEXT_ACTIONS_MIN_ITEMS,
    SUMMARY_MAX_ITEMS, SUMMARY_MIN_ITEMS,
};
use crate::parser::{
    compute_basic_stats, extract_match_facts, extract_play_bundles, find_key_events, index_turns,
    lexicon, Lexicon, DEFAULT_KO_LOOKBACK,
};

use super::coach_auditor::{apply_patch_plan, draft_from_report, run_one_iteration, DeterministicAuditor};
use super::guardrails::{GuardrailLimits, UnknownNotes};
use super::integrity::apply_summary_claim_integrity;
use super::language::{detect_language, gate_bullets, ReportLanguage, Templates};
use super::scoring::{build_mistakes, build_turning_points};

/// Everything the deterministic stages derive from one log
#[derive(Debug, Clone)]
pub struct Analysis {
    pub language: ReportLanguage,
    pub turns: Vec<TurnSpan>,
    pub events: KeyEventIndex,
    pub stats: MatchStats,
    pub facts: MatchFacts,
    pub bundles: Vec<PlayBundle>,
    pub summary: Vec<String>,
    pub unknowns: Vec<String>,
    pub turning_points: Vec<TurningPoint>,
    pub mistakes: Vec<Mistake>,
    pub next_actions: Vec<String>,
}

/// Main report assembler
pub struct Coach {
    lexicon: &'static Lexicon,
    ko_lookback: usize,
    guardrails: GuardrailLimits,
    guidance: Option<Box<dyn GuidanceProvider>>,
    agentic_telemetry: bool,
}

impl Coach {
    /// Deterministic coach with default settings
    pub fn new(lexicon: &'static Lexicon) -> Self {
        Self {
            lexicon,
            ko_lookback: DEFAULT_KO_LOOKBACK,
            guardrails: GuardrailLimits::default(),
            guidance: None,
            agentic_telemetry: false,
        }
    }

    /// Coach wired from resolved configuration
    ///
    /// A live guidance provider is attached only when the LLM settings allow it.
    pub fn from_config(config: &CoachConfig) -> Result<Self> {
        let mut coach = Self::new(lexicon()?)
            .with_ko_lookback(config.ko_lookback_window)
            .with_guardrails(config.guardrails.clone());
        if let Some(provider) = OpenRouterProvider::from_settings(&config.llm) {
            info!(model = %config.llm.model, "Live guidance enabled");
            coach = coach.with_guidance(Box::new(provider));
        }
        Ok(coach)
    }

    pub fn with_ko_lookback(mut self, window: usize) -> Self {
        self.ko_lookback = crate::parser::clamp_lookback(window);
        self
    }

    pub fn with_guardrails(mut self, guardrails: GuardrailLimits) -> Self {
        self.guardrails = guardrails;
        self
    }

    pub fn with_guidance(mut self, provider: Box<dyn GuidanceProvider>) -> Self {
        self.guidance = Some(provider);
        self
    }

    pub fn with_agentic_telemetry(mut self, enabled: bool) -> Self {
        self.agentic_telemetry = enabled;
        self
    }

    pub fn lexicon(&self) -> &'static Lexicon {
        self.lexicon
    }

    pub fn ko_lookback(&self) -> usize {
        self.ko_lookback
    }

    /// Run every deterministic stage
    ///
    /// # Errors
    /// `ReportError::NoEvents` when the log has no detectable event, since
    /// the claim minimums could never be met.
    pub fn analyze(&self, log_text: &str) -> Result<Analysis, ReportError> {
        let lex = self.lexicon;
        let events = find_key_events(lex, log_text);
        if events.is_empty() {
            return Err(ReportError::NoEvents);
        }

        let language = detect_language(lex, log_text);
        let templates = language.templates();
        let turns = index_turns(lex, log_text);
        let stats = compute_basic_stats(lex, log_text);
        let facts = extract_match_facts(lex, log_text, self.ko_lookback);
        let bundles = extract_play_bundles(lex, log_text);
        debug!(
            events = events.events.len(),
            turns = turns.len(),
            bundles = bundles.len(),
            ?language,
            "Deterministic extraction done"
        );

        let summary = deterministic_summary(templates, &stats, &facts, &events);
        let unknowns = seed_unknowns(templates, &turns, &facts);

        let guarded = self.guardrails.apply(
            build_turning_points(lex, &events, &bundles, templates),
            build_mistakes(&events, templates),
            unknowns,
            &events,
            templates,
        );

        Ok(Analysis {
            language,
            turns,
            events,
            stats,
            facts,
            bundles,
            summary,
            unknowns: guarded.unknowns,
            turning_points: guarded.turning_points,
            mistakes: guarded.mistakes,
            next_actions: owned(templates.default_next_actions),
        })
    }

    /// Generate the report, consulting the guidance provider if one is attached
    #[instrument(skip(self, log_text), fields(bytes = log_text.len()))]
    pub async fn generate_report(&self, log_text: &str) -> Result<PostGameReport, ReportError> {
        let analysis = self.analyze(log_text)?;

        let guidance = match &self.guidance {
            Some(provider) => {
                let guidance = provider
                    .generate(log_text, &analysis.summary, &analysis.next_actions)
                    .await;
                if guidance.is_none() {
                    warn!(provider = provider.name(), "No guidance, keeping deterministic text");
                }
                guidance
            }
            None => None,
        };

        self.finalize(analysis, guidance, log_text)
    }

    /// Generate the report without any guidance call
    pub fn generate_deterministic_report(&self, log_text: &str) -> Result<PostGameReport, ReportError> {
        let analysis = self.analyze(log_text)?;
        self.finalize(analysis, None, log_text)
    }

    fn finalize(
        &self,
        analysis: Analysis,
        guidance: Option<Guidance>,
        log_text: &str,
    ) -> Result<PostGameReport, ReportError> {
        let templates = analysis.language.templates();
        let mut summary = analysis.summary.clone();
        let mut next_actions = analysis.next_actions.clone();

        if let Some(guidance) = guidance {
            if guidance.is_within_bounds() {
                summary = gate_bullets(guidance.summary, analysis.language);
                next_actions = gate_bullets(guidance.next_actions, analysis.language);
                backfill(&mut next_actions, &analysis.next_actions, NEXT_ACTIONS_MIN_ITEMS);
                next_actions.truncate(NEXT_ACTIONS_MAX_ITEMS);
            } else {
                warn!("Discarding out-of-bounds guidance");
            }
        }

        let mut fallback = analysis.summary.clone();
        fallback.extend(owned(templates.fallback_summary));
        let checked = apply_summary_claim_integrity(
            self.lexicon,
            summary,
            analysis.unknowns.clone(),
            &fallback,
            log_text,
            templates,
            self.ko_lookback,
        );

        let mut report = PostGameReport {
            summary: checked.summary,
            turning_points: analysis.turning_points,
            mistakes: analysis.mistakes,
            unknowns: checked.unknowns,
            next_actions,
            match_facts: analysis.facts,
            play_bundles: analysis.bundles,
            agentic_telemetry: None,
        };
        report.validate()?;

        if self.agentic_telemetry {
            self.review(&mut report, &fallback, templates, log_text);
            report.validate()?;
        }

        info!(
            summary = report.summary.len(),
            turning_points = report.turning_points.len(),
            mistakes = report.mistakes.len(),
            "Report assembled"
        );
        Ok(report)
    }

    /// Run the coach/auditor protocol over an assembled report
    fn review(
        &self,
        report: &mut PostGameReport,
        fallback_summary: &[String],
        templates: &Templates,
        log_text: &str,
    ) {
        let auditor = DeterministicAuditor::new(
            self.lexicon,
            log_text,
            self.ko_lookback,
            report,
            fallback_summary.to_vec(),
            owned(templates.default_next_actions),
        );
        let mut log_event = |event: &crate::domain::CoachAuditorEvent| {
            info!(event = ?event.event_name, violations = event.violations_count, "Review event");
        };
        let run = run_one_iteration(
            || draft_from_report(report),
            |draft| auditor.audit(draft),
            |draft, _violations, plan| apply_patch_plan(draft, plan),
            Some(&mut log_event),
        );

        let draft = &run.draft_report;
        if (SUMMARY_MIN_ITEMS..=SUMMARY_MAX_ITEMS).contains(&draft.summary.len()) {
            report.summary = draft.summary.clone();
        }
        if (NEXT_ACTIONS_MIN_ITEMS..=NEXT_ACTIONS_MAX_ITEMS).contains(&draft.next_actions.len()) {
            report.next_actions = draft.next_actions.clone();
        }
        let kept_points: Vec<TurningPoint> = report
            .turning_points
            .iter()
            .filter(|t| draft.turning_points_picks.contains(&t.title))
            .cloned()
            .collect();
        if kept_points.len() >= crate::domain::TURNING_POINTS_MIN_ITEMS {
            report.turning_points = kept_points;
        }
        let kept_mistakes: Vec<Mistake> = report
            .mistakes
            .iter()
            .filter(|m| draft.mistakes_picks.contains(&m.description))
            .cloned()
            .collect();
        if kept_mistakes.len() >= crate::domain::MISTAKES_MIN_ITEMS {
            report.mistakes = kept_mistakes;
        }
        let mut unknowns = UnknownNotes::from(report.unknowns.clone());
        for note in &draft.unknowns {
            unknowns.push(note.clone());
        }
        report.unknowns = unknowns.into_vec();
        report.agentic_telemetry = Some(run.telemetry());
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn backfill(items: &mut Vec<String>, pool: &[String], min: usize) {
    for candidate in pool {
        if items.len() >= min {
            break;
        }
        if !items.contains(candidate) {
            items.push(candidate.clone());
        }
    }
}

/// Deterministic summary bullets in the report language
pub fn deterministic_summary(
    templates: &Templates,
    stats: &MatchStats,
    facts: &MatchFacts,
    events: &KeyEventIndex,
) -> Vec<String> {
    let mut summary = Vec::new();
    if let Some(first) = &facts.went_first_player {
        summary.push(format!("{first}{}", templates.went_first_suffix));
    }
    if !stats.mulligans_by_player.is_empty() {
        let parts: Vec<String> = stats
            .mulligans_by_player
            .iter()
            .map(|(player, count)| format!("{player} {count}"))
            .collect();
        summary.push(format!("{}{}.", templates.mulligans_prefix, parts.join(", ")));
    }
    summary.push(templates.count_line(templates.attacks_observed, events.count(EventType::Attack)));
    summary.push(templates.count_line(templates.kos_observed, events.count(EventType::Ko)));
    summary.push(templates.count_line(templates.prizes_observed, events.count(EventType::PrizeTaken)));
    if let Some(winner) = &facts.winner {
        summary.push(format!("{winner}{}", templates.winner_suffix));
    }
    summary.push(templates.momentum.to_string());
    summary.push(templates.hidden_info.to_string());
    summary.truncate(SUMMARY_MAX_ITEMS);
    summary
}

/// Default hidden-information notes plus inference caveats
pub fn seed_unknowns(templates: &Templates, turns: &[TurnSpan], facts: &MatchFacts) -> Vec<String> {
    let mut unknowns = owned(templates.default_unknowns);
    if turns.iter().any(|turn| turn.actor.is_none()) {
        unknowns.push(templates.inferred_turn_actors.to_string());
    }
    let unattributed = facts.unknown_kos();
    if unattributed > 0 {
        unknowns.push(templates.count_line(templates.unattributed_kos, unattributed as usize));
    }
    unknowns
}
