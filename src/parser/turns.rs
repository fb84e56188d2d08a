//! Turn segmentation and per-turn digests.

use crate::domain::{EventType, TurnSpan, TurnSummary};
use crate::evidence::normalize_whitespace;

use super::detectors::find_key_events;
use super::lexicon::Lexicon;

/// Split a log into turn windows
///
/// Each header opens a span that ends on the line before the next header, or
/// on the last line of the log. A log without headers has no turns.
pub fn index_turns(lexicon: &Lexicon, log_text: &str) -> Vec<TurnSpan> {
    let lines: Vec<&str> = log_text.lines().collect();
    let headers: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| lexicon.is_turn_header(line))
        .map(|(idx, _)| idx)
        .collect();

    let mut spans = Vec::with_capacity(headers.len());
    for (pos, &header_idx) in headers.iter().enumerate() {
        let end_idx = headers
            .get(pos + 1)
            .map(|next| next - 1)
            .unwrap_or(lines.len() - 1);
        let actor = infer_actor(lexicon, &lines[header_idx + 1..=end_idx]);
        // header_idx <= end_idx always holds, so construction cannot fail
        if let Ok(span) = TurnSpan::new(pos + 1, header_idx + 1, end_idx + 1, actor) {
            spans.push(span);
        }
    }
    spans
}

/// Actor of a block: leading token of its first line that names one
fn infer_actor(lexicon: &Lexicon, body: &[&str]) -> Option<String> {
    body.iter()
        .find_map(|line| lexicon.line_actor(line))
        .map(str::to_string)
}

/// Deterministic bullets for one turn
///
/// One bullet per detected key event inside the window, in line order,
/// followed by a closing count line. Turns with no key events get a single
/// "no key events" bullet.
pub fn extract_turn_summary(lexicon: &Lexicon, turn: &TurnSpan, log_text: &str) -> TurnSummary {
    let index = find_key_events(lexicon, log_text);
    let in_turn: Vec<_> = index
        .events
        .iter()
        .filter(|event| turn.contains(event.line))
        .collect();

    let mut bullets: Vec<String> = Vec::new();
    let mut last_line = 0;
    for event in &in_turn {
        if event.line == last_line {
            continue;
        }
        last_line = event.line;
        let kinds: Vec<&str> = in_turn
            .iter()
            .filter(|e| e.line == event.line)
            .map(|e| e.event_type.as_str())
            .collect();
        bullets.push(format!(
            "L{} [{}] {}",
            event.line,
            kinds.join("+"),
            normalize_whitespace(&event.text)
        ));
    }

    if in_turn.is_empty() {
        bullets.push("No key events detected in this turn.".to_string());
    } else {
        let count = |t: EventType| in_turn.iter().filter(|e| e.event_type == t).count();
        bullets.push(format!(
            "{} attack(s), {} knockout line(s), {} prize line(s).",
            count(EventType::Attack),
            count(EventType::Ko),
            count(EventType::PrizeTaken)
        ));
    }

    TurnSummary {
        turn_number: turn.turn_number,
        actor: turn.actor.clone(),
        bullets,
    }
}
