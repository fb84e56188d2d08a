//! Key event types detected in battle logs.
//!
//! A key event is a single archetypal action reported on one log line.
//! Compound sentences can yield several events on the same line.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Archetypes of actions the detector registry recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// Damage inflicted using an attack
    Attack,

    /// A Pokémon was Knocked Out
    Ko,

    /// A player took one or more prize cards
    PrizeTaken,

    /// The opponent conceded
    Concede,

    /// A Stadium card entered play
    Stadium,

    /// A known Supporter card was played
    Supporter,
}

impl EventType {
    /// Wire name used in JSON and templated text
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Attack => "ATTACK",
            EventType::Ko => "KO",
            EventType::PrizeTaken => "PRIZE_TAKEN",
            EventType::Concede => "CONCEDE",
            EventType::Stadium => "STADIUM",
            EventType::Supporter => "SUPPORTER",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single detected event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Archetype of the event
    pub event_type: EventType,

    /// 1-indexed log line
    pub line: usize,

    /// Raw text of the line
    pub text: String,
}

impl KeyEvent {
    /// Create a new event
    pub fn new(event_type: EventType, line: usize, text: impl Into<String>) -> Self {
        Self {
            event_type,
            line,
            text: text.into(),
        }
    }
}

/// All events of a log in line order (registry order within a line)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEventIndex {
    pub events: Vec<KeyEvent>,
}

impl KeyEventIndex {
    /// Count events of one type
    pub fn count(&self, event_type: EventType) -> usize {
        self.events
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }

    /// Whether any event of the type was detected
    pub fn has(&self, event_type: EventType) -> bool {
        self.events.iter().any(|e| e.event_type == event_type)
    }

    /// Iterate events of one type
    pub fn of_type(&self, event_type: EventType) -> impl Iterator<Item = &KeyEvent> {
        self.events
            .iter()
            .filter(move |e| e.event_type == event_type)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_wire_names() {
        let json = serde_json::to_string(&EventType::PrizeTaken).unwrap();
        assert_eq!(json, "\"PRIZE_TAKEN\"");
        let parsed: EventType = serde_json::from_str("\"KO\"").unwrap();
        assert_eq!(parsed, EventType::Ko);
        assert_eq!(EventType::Attack.to_string(), "ATTACK");
    }

    #[test]
    fn test_index_counts() {
        let index = KeyEventIndex {
            events: vec![
                KeyEvent::new(EventType::Attack, 3, "a"),
                KeyEvent::new(EventType::Ko, 3, "a"),
                KeyEvent::new(EventType::Ko, 9, "b"),
            ],
        };
        assert_eq!(index.count(EventType::Ko), 2);
        assert!(index.has(EventType::Attack));
        assert!(!index.has(EventType::Concede));
        assert_eq!(index.of_type(EventType::Ko).count(), 2);
    }
}
