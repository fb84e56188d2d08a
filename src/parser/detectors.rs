//! Event detector registry.
//!
//! Every detector is a plain function over one log line. The registry is a
//! flat ordered slice, so a compound line yields its events in registry order:
//! attack, KO, prize, concede, stadium, supporter.

use crate::domain::{EventType, KeyEvent, KeyEventIndex};
use crate::evidence::normalize_whitespace;

use super::lexicon::Lexicon;

/// `(lexicon, normalized_text, line, raw_text) -> events`
pub type EventDetector = fn(&Lexicon, &str, usize, &str) -> Vec<KeyEvent>;

/// Detectors in emission order
pub const EVENT_DETECTORS: &[EventDetector] = &[
    detect_attack,
    detect_ko,
    detect_prize_taken,
    detect_concede,
    detect_stadium,
    detect_supporter,
];

fn single(hit: bool, event_type: EventType, line: usize, raw: &str) -> Vec<KeyEvent> {
    if hit {
        vec![KeyEvent::new(event_type, line, raw)]
    } else {
        Vec::new()
    }
}

pub fn detect_attack(lexicon: &Lexicon, text: &str, line: usize, raw: &str) -> Vec<KeyEvent> {
    single(lexicon.attack.is_match(text), EventType::Attack, line, raw)
}

/// One KO event per line, however many Pokémon were knocked out on it
pub fn detect_ko(lexicon: &Lexicon, text: &str, line: usize, raw: &str) -> Vec<KeyEvent> {
    single(lexicon.ko.is_match(text), EventType::Ko, line, raw)
}

pub fn detect_prize_taken(lexicon: &Lexicon, text: &str, line: usize, raw: &str) -> Vec<KeyEvent> {
    single(lexicon.prize.is_match(text), EventType::PrizeTaken, line, raw)
}

pub fn detect_concede(lexicon: &Lexicon, text: &str, line: usize, raw: &str) -> Vec<KeyEvent> {
    single(lexicon.concede.is_match(text), EventType::Concede, line, raw)
}

pub fn detect_stadium(lexicon: &Lexicon, text: &str, line: usize, raw: &str) -> Vec<KeyEvent> {
    let named_play = lexicon.play_verb.is_match(text)
        && lexicon.stadiums.iter().any(|name| text.contains(name));
    single(
        lexicon.stadium_in_play.is_match(text) || named_play,
        EventType::Stadium,
        line,
        raw,
    )
}

pub fn detect_supporter(lexicon: &Lexicon, text: &str, line: usize, raw: &str) -> Vec<KeyEvent> {
    let hit = lexicon.play_verb.is_match(text)
        && lexicon.supporters.iter().any(|name| text.contains(name));
    single(hit, EventType::Supporter, line, raw)
}

/// Run every detector over every line of the log
///
/// Blank lines are skipped. Events carry the raw (untrimmed) line text and
/// 1-indexed line numbers; detectors see whitespace-normalized text.
pub fn find_key_events(lexicon: &Lexicon, log_text: &str) -> KeyEventIndex {
    let mut events = Vec::new();
    for (idx, raw) in log_text.lines().enumerate() {
        let text = normalize_whitespace(raw);
        if text.is_empty() {
            continue;
        }
        for detector in EVENT_DETECTORS {
            events.extend(detector(lexicon, &text, idx + 1, raw));
        }
    }
    KeyEventIndex { events }
}
