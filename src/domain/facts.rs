//! Aggregate match statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Reserved `kos_by_player` key for knockouts with no attributable cause
pub const UNKNOWN_ACTOR: &str = "unknown";

/// Basic per-player counters read straight off dedicated log lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStats {
    pub went_first_player: Option<String>,
    pub mulligans_by_player: BTreeMap<String, u32>,
    pub observable_prizes_taken_by_player: BTreeMap<String, u32>,
}

/// Derived match facts embedded in the report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchFacts {
    pub winner: Option<String>,
    pub went_first_player: Option<String>,
    pub turns_count: usize,
    pub observable_prizes_taken_by_player: BTreeMap<String, u32>,
    /// Causally attributed knockouts; unattributable ones land under `UNKNOWN_ACTOR`
    pub kos_by_player: BTreeMap<String, u32>,
    pub concede: bool,
}

impl MatchFacts {
    /// Knockouts that could not be attributed to a player
    pub fn unknown_kos(&self) -> u32 {
        self.kos_by_player.get(UNKNOWN_ACTOR).copied().unwrap_or(0)
    }

    /// Keys appearing in either scoreboard column, sorted (includes the unknown bucket)
    pub fn scoreboard_players(&self) -> Vec<String> {
        let mut players: Vec<String> = self
            .observable_prizes_taken_by_player
            .keys()
            .chain(self.kos_by_player.keys())
            .cloned()
            .collect();
        players.sort();
        players.dedup();
        players
    }
}
