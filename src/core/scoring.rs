//! Turning point and mistake candidates.
//!
//! Turning points are scored from play bundles and raw events, ordered by an
//! explicit comparator and trimmed to the report bounds. Mistakes are
//! templated from raw events.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::domain::{
    EventType, KeyEvent, KeyEventIndex, Mistake, PlayBundle, TurningPoint, MISTAKES_MAX_ITEMS,
    MISTAKES_MIN_ITEMS, TURNING_POINTS_MAX_ITEMS, TURNING_POINTS_MIN_ITEMS,
};
use crate::evidence::{single_line_span, span_from_lines};
use crate::parser::{ko_mentions, prize_count, Lexicon};

use super::language::Templates;

pub const KO_BUNDLE_SCORE: u32 = 100;
pub const PRIZE_SWING_BONUS: u32 = 35;
pub const EX_TARGET_BONUS: u32 = 20;
pub const CONCEDE_SCORE: u32 = 130;
pub const RAW_KO_SCORE: u32 = 100;
pub const RAW_PRIZE_SCORE: u32 = 30;
pub const RAW_ATTACK_SCORE: u32 = 10;

pub const EVENT_CONFIDENCE: f64 = 0.75;
pub const ATTACK_CONFIDENCE: f64 = 0.62;
pub const FALLBACK_CONFIDENCE: f64 = 0.55;
pub const MISTAKE_CONFIDENCE: f64 = 0.64;

/// High-value marker token in a KO target name
const EX_TOKEN: &str = "ex";

/// A scored turning point awaiting ranking
#[derive(Debug, Clone)]
pub struct ScoredTurningPoint {
    pub score: u32,
    pub is_concede: bool,
    pub point: TurningPoint,
}

impl ScoredTurningPoint {
    fn line(&self) -> usize {
        self.point.evidence.start_line
    }
}

/// Total order: higher score first, then earlier line, then title
pub fn rank_order(a: &ScoredTurningPoint, b: &ScoredTurningPoint) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| a.line().cmp(&b.line()))
        .then_with(|| a.point.title.cmp(&b.point.title))
}

/// Actor's prizes minus everyone else's prizes within one bundle
pub fn prize_swing(lexicon: &Lexicon, bundle: &PlayBundle) -> i64 {
    bundle
        .prize_events
        .iter()
        .flat_map(|event| lexicon.prize.captures_iter(&event.text))
        .map(|caps| {
            let count = i64::from(crate::parser::lexicon::parse_count(&caps["count"]));
            let taker = caps.name("player").map(|m| m.as_str());
            match (taker, bundle.actor.as_deref()) {
                (Some(taker), Some(actor)) if taker != actor => -count,
                _ => count,
            }
        })
        .sum()
}

fn has_ex_token(target: &str) -> bool {
    target
        .split_whitespace()
        .any(|token| token.eq_ignore_ascii_case(EX_TOKEN))
}

/// Score one KO-bearing bundle
pub fn score_bundle(
    lexicon: &Lexicon,
    bundle: &PlayBundle,
    templates: &Templates,
) -> Option<ScoredTurningPoint> {
    if !bundle.has_ko() {
        return None;
    }
    let targets: Vec<String> = bundle
        .ko_events
        .iter()
        .flat_map(|event| ko_mentions(lexicon, &event.text))
        .filter_map(|mention| mention.target)
        .collect();

    let swing = prize_swing(lexicon, bundle);
    let mut score = KO_BUNDLE_SCORE;
    if swing >= 2 {
        score += PRIZE_SWING_BONUS;
    }
    if targets.iter().any(|t| has_ex_token(t)) {
        score += EX_TARGET_BONUS;
    }

    let evidence = span_from_lines(bundle.events().map(|e| (e.line, e.text.as_str())))?;
    Some(ScoredTurningPoint {
        score,
        is_concede: false,
        point: TurningPoint {
            title: templates.ko_swing_title(targets.first().map(String::as_str)),
            impact: templates.bundle_impact(swing),
            confidence: EVENT_CONFIDENCE,
            depends_on_hidden_info: false,
            evidence,
        },
    })
}

fn score_raw_event(
    lexicon: &Lexicon,
    event: &KeyEvent,
    templates: &Templates,
) -> Option<ScoredTurningPoint> {
    let (score, confidence) = match event.event_type {
        EventType::Ko => (RAW_KO_SCORE, EVENT_CONFIDENCE),
        EventType::PrizeTaken => {
            let bonus = if prize_count(lexicon, &event.text) >= 2 {
                PRIZE_SWING_BONUS
            } else {
                0
            };
            (RAW_PRIZE_SCORE + bonus, EVENT_CONFIDENCE)
        }
        EventType::Attack => (RAW_ATTACK_SCORE, ATTACK_CONFIDENCE),
        _ => return None,
    };
    Some(ScoredTurningPoint {
        score,
        is_concede: false,
        point: TurningPoint {
            title: templates.raw_event_title(event.event_type).to_string(),
            impact: templates.event_impact.to_string(),
            confidence,
            depends_on_hidden_info: event.event_type == EventType::Attack,
            evidence: single_line_span(event.line, &event.text),
        },
    })
}

fn concede_candidate(event: &KeyEvent, templates: &Templates) -> ScoredTurningPoint {
    ScoredTurningPoint {
        score: CONCEDE_SCORE,
        is_concede: true,
        point: TurningPoint {
            title: templates.concede_title.to_string(),
            impact: templates.concede_impact.to_string(),
            confidence: EVENT_CONFIDENCE,
            depends_on_hidden_info: false,
            evidence: single_line_span(event.line, &event.text),
        },
    }
}

fn fallback_turning_point(event: &KeyEvent, templates: &Templates) -> TurningPoint {
    TurningPoint {
        title: templates.fallback_tp_title.to_string(),
        impact: templates.fallback_tp_impact.to_string(),
        confidence: FALLBACK_CONFIDENCE,
        depends_on_hidden_info: true,
        evidence: single_line_span(event.line, &event.text),
    }
}

/// Every turning point candidate, sorted by [`rank_order`]
pub fn score_candidates(
    lexicon: &Lexicon,
    index: &KeyEventIndex,
    bundles: &[PlayBundle],
    templates: &Templates,
) -> Vec<ScoredTurningPoint> {
    let mut candidates: Vec<ScoredTurningPoint> = Vec::new();
    let mut covered: BTreeSet<usize> = BTreeSet::new();

    for bundle in bundles {
        if let Some(candidate) = score_bundle(lexicon, bundle, templates) {
            covered.extend(bundle.event_lines());
            candidates.push(candidate);
        }
    }
    for event in index.of_type(EventType::Concede) {
        candidates.push(concede_candidate(event, templates));
    }
    for event in &index.events {
        if covered.contains(&event.line) {
            continue;
        }
        if let Some(candidate) = score_raw_event(lexicon, event, templates) {
            candidates.push(candidate);
        }
    }

    candidates.sort_by(rank_order);
    candidates
}

/// Ranked, deduplicated, bounded turning points
///
/// Candidates sharing an evidence start line collapse to the best ranked
/// one. A concession always survives, taking the last slot when the list is
/// full. Short lists are backfilled from the earliest event.
pub fn build_turning_points(
    lexicon: &Lexicon,
    index: &KeyEventIndex,
    bundles: &[PlayBundle],
    templates: &Templates,
) -> Vec<TurningPoint> {
    let mut seen_lines: BTreeSet<usize> = BTreeSet::new();
    let ranked: Vec<ScoredTurningPoint> = score_candidates(lexicon, index, bundles, templates)
        .into_iter()
        .filter(|candidate| seen_lines.insert(candidate.line()))
        .collect();

    let mut selected: Vec<ScoredTurningPoint> =
        ranked.iter().take(TURNING_POINTS_MAX_ITEMS).cloned().collect();
    if !selected.iter().any(|c| c.is_concede) {
        if let Some(concede) = ranked.iter().find(|c| c.is_concede) {
            if selected.len() >= TURNING_POINTS_MAX_ITEMS {
                selected.pop();
            }
            selected.push(concede.clone());
        }
    }

    let mut points: Vec<TurningPoint> = selected.into_iter().map(|c| c.point).collect();
    if let Some(earliest) = index.events.first() {
        while points.len() < TURNING_POINTS_MIN_ITEMS {
            points.push(fallback_turning_point(earliest, templates));
        }
    }
    points.truncate(TURNING_POINTS_MAX_ITEMS);
    points
}

/// Templated mistakes from attack, KO and supporter events
pub fn build_mistakes(index: &KeyEventIndex, templates: &Templates) -> Vec<Mistake> {
    let mut mistakes: Vec<Mistake> = index
        .events
        .iter()
        .filter(|e| {
            matches!(
                e.event_type,
                EventType::Attack | EventType::Ko | EventType::Supporter
            )
        })
        .take(MISTAKES_MAX_ITEMS)
        .map(|event| Mistake {
            description: templates.mistake_description(event.event_type),
            why_it_matters: templates.mistake_why.to_string(),
            better_line: templates.mistake_better_line.to_string(),
            confidence: MISTAKE_CONFIDENCE,
            depends_on_hidden_info: event.event_type != EventType::Ko,
            evidence: single_line_span(event.line, &event.text),
        })
        .collect();

    if let Some(earliest) = index.events.first() {
        while mistakes.len() < MISTAKES_MIN_ITEMS {
            mistakes.push(Mistake {
                description: templates.fallback_mistake_description.to_string(),
                why_it_matters: templates.fallback_mistake_why.to_string(),
                better_line: templates.fallback_mistake_better_line.to_string(),
                confidence: FALLBACK_CONFIDENCE,
                depends_on_hidden_info: true,
                evidence: single_line_span(earliest.line, &earliest.text),
            });
        }
    }
    mistakes.truncate(MISTAKES_MAX_ITEMS);
    mistakes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::language::ENGLISH;
    use crate::parser::{extract_play_bundles, find_key_events, lexicon};

    const TWO_KOS: &str = "Turno de [playerName]\nA infligió 30 puntos de daño usando Golpe a Pikachu de B.\n¡El Pikachu de B quedó Fuera de Combate!\nA tomó una carta de Premio.\nTurno de [playerName]\nB infligió 280 puntos de daño usando Corte a Latias ex de A.\n¡El Latias ex de A quedó Fuera de Combate!\nB tomó 2 cartas de Premio.";

    #[test]
    fn test_ex_two_prize_ko_outranks_plain_ko() {
        let lex = lexicon().unwrap();
        let index = find_key_events(lex, TWO_KOS);
        let bundles = extract_play_bundles(lex, TWO_KOS);
        let candidates = score_candidates(lex, &index, &bundles, &ENGLISH);
        assert_eq!(candidates[0].score, 155);
        assert_eq!(candidates[0].point.title, "KO swing on Latias ex");
        assert_eq!(candidates[1].score, 100);
        assert_eq!(candidates[1].point.title, "KO swing on Pikachu");

        let points = build_turning_points(lex, &index, &bundles, &ENGLISH);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].evidence.start_line, 6);
    }

    #[test]
    fn test_rank_order_ties_break_on_line_then_title() {
        let make = |score, line, title: &str| ScoredTurningPoint {
            score,
            is_concede: false,
            point: TurningPoint {
                title: title.to_string(),
                impact: String::new(),
                confidence: 0.75,
                depends_on_hidden_info: false,
                evidence: single_line_span(line, "x"),
            },
        };
        let mut items = vec![make(10, 5, "b"), make(10, 5, "a"), make(10, 2, "z"), make(30, 9, "p")];
        items.sort_by(rank_order);
        let order: Vec<_> = items.iter().map(|c| c.point.title.as_str()).collect();
        assert_eq!(order, vec!["p", "z", "a", "b"]);
    }

    #[test]
    fn test_concession_survives_full_list() {
        let lex = lexicon().unwrap();
        let mut log = String::new();
        for _ in 0..5 {
            log.push_str("Turno de [playerName]\nA infligió 280 puntos de daño usando Corte a Latias ex de B.\n¡El Latias ex de B quedó Fuera de Combate!\nA tomó 2 cartas de Premio.\n");
        }
        log.push_str("El rival se rindió. A ganó.\n");
        let index = find_key_events(lex, &log);
        let bundles = extract_play_bundles(lex, &log);
        let points = build_turning_points(lex, &index, &bundles, &ENGLISH);
        assert_eq!(points.len(), TURNING_POINTS_MAX_ITEMS);
        assert!(points.iter().any(|p| p.title == "Concede closes endgame"));
    }

    #[test]
    fn test_single_event_backfills_to_minimum() {
        let lex = lexicon().unwrap();
        let log = "A infligió 10 puntos de daño usando Golpe.";
        let index = find_key_events(lex, log);
        let points = build_turning_points(lex, &index, &[], &ENGLISH);
        assert_eq!(points.len(), TURNING_POINTS_MIN_ITEMS);
        assert_eq!(points[1].title, "Early tempo signal");

        let mistakes = build_mistakes(&index, &ENGLISH);
        assert_eq!(mistakes.len(), MISTAKES_MIN_ITEMS);
        assert_eq!(mistakes[0].description, "Review decision around attack event.");
        assert!(mistakes[0].depends_on_hidden_info);
    }
}
