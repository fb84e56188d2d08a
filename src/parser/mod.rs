//! Deterministic log parsing: lexicon, event detection, turns, facts, bundles.

pub mod bundles;
pub mod detectors;
pub mod lexicon;
pub mod stats;
pub mod turns;

pub use bundles::{extract_play_bundles, BundleRank};
pub use detectors::{find_key_events, EventDetector, EVENT_DETECTORS};
pub use lexicon::{lexicon, Lexicon};
pub use stats::{
    attribute_ko, clamp_lookback, compute_basic_stats, extract_match_facts, known_players,
    ko_mentions, prize_count, KoMention, DEFAULT_KO_LOOKBACK, MAX_KO_LOOKBACK, MIN_KO_LOOKBACK,
};
pub use turns::{extract_turn_summary, index_turns};
