//! Play bundle extraction.
//!
//! Inside each turn window an attack opens an action slot. The slot claims
//! the KO and prize events on its own line and on the following lines up to
//! the next attack. KO/prize lines seen before the first attack are
//! unscoped; they attach to the primary slot. The nearest forced-switch play
//! before the primary action becomes the bundle's gust event.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::domain::{EventType, KeyEvent, KeyEventIndex, PlayBundle, PlayBundleEvent, TurnSpan};
use crate::evidence::{single_line_span, EvidenceSpan};

use super::detectors::find_key_events;
use super::lexicon::Lexicon;
use super::stats::{ko_mentions, prize_count};
use super::turns::index_turns;

/// Ranking key for competing action slots (greater is stronger)
///
/// KOs first, then total prizes, then prize events; ties go to the earlier line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BundleRank {
    pub kos: usize,
    pub prizes: u32,
    pub prize_events: usize,
    pub line: Reverse<usize>,
}

#[derive(Debug, Default)]
struct Slot<'e> {
    action: Option<&'e KeyEvent>,
    kos: Vec<&'e KeyEvent>,
    prizes: Vec<&'e KeyEvent>,
}

impl<'e> Slot<'e> {
    fn rank(&self, lexicon: &Lexicon) -> BundleRank {
        BundleRank {
            kos: self
                .kos
                .iter()
                .map(|e| ko_mentions(lexicon, &e.text).len())
                .sum(),
            prizes: self.prizes.iter().map(|e| prize_count(lexicon, &e.text)).sum(),
            prize_events: self.prizes.len(),
            line: Reverse(self.action.map(|e| e.line).unwrap_or(0)),
        }
    }

    fn is_empty(&self) -> bool {
        self.action.is_none() && self.kos.is_empty() && self.prizes.is_empty()
    }
}

fn bundle_event(event: &KeyEvent) -> PlayBundleEvent {
    PlayBundleEvent {
        line: event.line,
        text: event.text.clone(),
        evidence: single_line_span(event.line, &event.text),
    }
}

fn build_bundle(
    lexicon: &Lexicon,
    turn: &TurnSpan,
    gust: Option<&KeyEvent>,
    slot: &Slot<'_>,
) -> PlayBundle {
    let mut raw: BTreeMap<usize, &str> = BTreeMap::new();
    for event in gust
        .into_iter()
        .chain(slot.action)
        .chain(slot.kos.iter().copied())
        .chain(slot.prizes.iter().copied())
    {
        raw.entry(event.line).or_insert(event.text.as_str());
    }

    let actor = slot
        .action
        .or(gust)
        .and_then(|event| lexicon.line_actor(&event.text))
        .map(str::to_string)
        .or_else(|| turn.actor.clone());

    PlayBundle {
        turn_number: turn.turn_number,
        actor,
        window: EvidenceSpan {
            start_line: turn.start_line,
            end_line: turn.end_line,
            raw_lines: raw.values().map(|text| text.to_string()).collect(),
        },
        gust_event: gust.map(bundle_event),
        action_event: slot.action.map(bundle_event),
        ko_events: slot.kos.iter().map(|e| bundle_event(e)).collect(),
        prize_events: slot.prizes.iter().map(|e| bundle_event(e)).collect(),
    }
}

/// Bundles for one turn window, in line order of their actions
fn bundles_for_turn(lexicon: &Lexicon, turn: &TurnSpan, index: &KeyEventIndex) -> Vec<PlayBundle> {
    let events: Vec<&KeyEvent> = index
        .events
        .iter()
        .filter(|e| turn.contains(e.line))
        .collect();

    let gusts: Vec<&KeyEvent> = events
        .iter()
        .copied()
        .filter(|e| e.event_type == EventType::Supporter && lexicon.is_gust(&e.text))
        .collect();

    let mut unscoped = Slot::default();
    let mut slots: Vec<Slot<'_>> = Vec::new();
    for event in events {
        match event.event_type {
            EventType::Attack => slots.push(Slot {
                action: Some(event),
                ..Slot::default()
            }),
            EventType::Ko | EventType::PrizeTaken => {
                let slot = slots.last_mut().unwrap_or(&mut unscoped);
                if event.event_type == EventType::Ko {
                    slot.kos.push(event);
                } else {
                    slot.prizes.push(event);
                }
            }
            _ => {}
        }
    }

    if slots.is_empty() {
        if unscoped.is_empty() {
            // A lone forced-switch play still forms a bundle
            return gusts
                .last()
                .copied()
                .map(|gust| vec![build_bundle(lexicon, turn, Some(gust), &unscoped)])
                .unwrap_or_default();
        }
        let first = unscoped
            .kos
            .iter()
            .chain(unscoped.prizes.iter())
            .map(|e| e.line)
            .min()
            .unwrap_or(turn.start_line);
        let gust = gusts.iter().copied().filter(|g| g.line < first).last();
        return vec![build_bundle(lexicon, turn, gust, &unscoped)];
    }

    let primary_idx = slots
        .iter()
        .enumerate()
        .max_by_key(|(_, slot)| slot.rank(lexicon))
        .map(|(idx, _)| idx)
        .unwrap_or(0);

    let mut bundles = Vec::new();
    for (idx, slot) in slots.iter_mut().enumerate() {
        if idx == primary_idx {
            slot.kos.extend(unscoped.kos.iter().copied());
            slot.prizes.extend(unscoped.prizes.iter().copied());
            slot.kos.sort_by_key(|e| e.line);
            slot.prizes.sort_by_key(|e| e.line);
            let action_line = slot.action.map(|e| e.line).unwrap_or(usize::MAX);
            let gust = gusts.iter().copied().filter(|g| g.line < action_line).last();
            bundles.push(build_bundle(lexicon, turn, gust, slot));
        } else if !slot.kos.is_empty() {
            bundles.push(build_bundle(lexicon, turn, None, slot));
        }
    }
    bundles
}

/// Group each turn's gust, primary attack and resulting KOs/prizes
pub fn extract_play_bundles(lexicon: &Lexicon, log_text: &str) -> Vec<PlayBundle> {
    let index = find_key_events(lexicon, log_text);
    index_turns(lexicon, log_text)
        .iter()
        .flat_map(|turn| bundles_for_turn(lexicon, turn, &index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexicon::lexicon;

    #[test]
    fn test_rank_orders_kos_before_prizes_and_earlier_line_wins_ties() {
        let strong = BundleRank { kos: 1, prizes: 0, prize_events: 0, line: Reverse(9) };
        let weak = BundleRank { kos: 0, prizes: 2, prize_events: 1, line: Reverse(3) };
        assert!(strong > weak);

        let early = BundleRank { kos: 1, prizes: 1, prize_events: 1, line: Reverse(3) };
        let late = BundleRank { kos: 1, prizes: 1, prize_events: 1, line: Reverse(7) };
        assert!(early > late);
    }

    #[test]
    fn test_gust_attaches_to_primary_attack() {
        let log = "Turno de [playerName]\nA jugó Órdenes de Jefes.\nA infligió 30 puntos de daño usando Golpe.\nA infligió 280 puntos de daño usando Corte a Latias ex de B.\n¡El Latias ex de B quedó Fuera de Combate!\nA tomó 2 cartas de Premio.";
        let bundles = extract_play_bundles(lexicon().unwrap(), log);
        assert_eq!(bundles.len(), 1);
        let bundle = &bundles[0];
        assert_eq!(bundle.action_event.as_ref().map(|e| e.line), Some(4));
        assert_eq!(bundle.gust_event.as_ref().map(|e| e.line), Some(2));
        assert_eq!(bundle.ko_events.len(), 1);
        assert_eq!(bundle.prize_events.len(), 1);
        assert_eq!(bundle.actor.as_deref(), Some("A"));
        assert_eq!((bundle.window.start_line, bundle.window.end_line), (1, 6));
        assert_eq!(bundle.window.raw_lines.len(), 4);
    }

    #[test]
    fn test_window_without_attack_uses_unscoped_events() {
        let log = "Turno de [playerName]\nA jugó Órdenes de Jefes.\n¡El Pikachu de B quedó Fuera de Combate!\nA tomó una carta de Premio.";
        let bundles = extract_play_bundles(lexicon().unwrap(), log);
        assert_eq!(bundles.len(), 1);
        assert!(bundles[0].action_event.is_none());
        assert_eq!(bundles[0].gust_event.as_ref().map(|e| e.line), Some(2));
    }

    #[test]
    fn test_turn_without_events_produces_no_bundle() {
        let log = "Turno de [playerName]\nA robó una carta.\nA jugó Determinación de Lillie.";
        assert!(extract_play_bundles(lexicon().unwrap(), log).is_empty());
    }

    #[test]
    fn test_lone_gust_forms_bundle() {
        let log = "Turno de [playerName]\nA robó una carta.\nA jugó Órdenes de Jefes.";
        let bundles = extract_play_bundles(lexicon().unwrap(), log);
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].gust_event.as_ref().map(|e| e.line), Some(3));
        assert!(!bundles[0].has_ko());
        assert_eq!(bundles[0].window.raw_lines, vec!["A jugó Órdenes de Jefes.".to_string()]);
    }
}
