//! Play bundles: causal units of play within a turn.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::evidence::EvidenceSpan;

/// A single-line event lifted into bundle context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayBundleEvent {
    pub line: usize,
    pub text: String,
    pub evidence: EvidenceSpan,
}

/// A gust play, a primary action and the knockouts/prizes it caused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayBundle {
    pub turn_number: usize,

    /// Acting player (action line actor, falling back to the turn actor)
    pub actor: Option<String>,

    /// Turn boundaries; raw lines are the union of the constituent event texts
    pub window: EvidenceSpan,

    pub gust_event: Option<PlayBundleEvent>,
    pub action_event: Option<PlayBundleEvent>,
    pub ko_events: Vec<PlayBundleEvent>,
    pub prize_events: Vec<PlayBundleEvent>,
}

impl PlayBundle {
    /// All constituent events, in no particular order
    pub fn events(&self) -> impl Iterator<Item = &PlayBundleEvent> {
        self.gust_event
            .iter()
            .chain(self.action_event.iter())
            .chain(self.ko_events.iter())
            .chain(self.prize_events.iter())
    }

    /// Distinct log lines referenced by the bundle
    pub fn event_lines(&self) -> BTreeSet<usize> {
        self.events().map(|e| e.line).collect()
    }

    pub fn has_ko(&self) -> bool {
        !self.ko_events.is_empty()
    }

    /// Earliest referenced line, if any
    pub fn first_line(&self) -> Option<usize> {
        self.event_lines().into_iter().next()
    }
}
