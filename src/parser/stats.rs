//! Match statistics and causal knockout attribution.

use std::collections::BTreeMap;

use tracing::debug;

use crate::domain::{MatchFacts, MatchStats, UNKNOWN_ACTOR};

use super::lexicon::{parse_count, Lexicon};
use super::turns::index_turns;

/// Default number of lines scanned backward from a KO line
pub const DEFAULT_KO_LOOKBACK: usize = 12;
pub const MIN_KO_LOOKBACK: usize = 8;
pub const MAX_KO_LOOKBACK: usize = 15;

/// Clamp a configured lookback window to the supported range
pub fn clamp_lookback(window: usize) -> usize {
    window.clamp(MIN_KO_LOOKBACK, MAX_KO_LOOKBACK)
}

/// Phrases marking a line that mentions someone else's mulligan
const MULLIGAN_BONUS_MARKERS: &[&str] = &["porque", "al menos"];

/// One "<subject> quedó Fuera de Combate" mention
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KoMention {
    /// Knocked-out Pokémon, without article or owner
    pub target: Option<String>,

    /// Owning player when the subject ends in "de <player>"
    pub owner: Option<String>,
}

/// Every KO mention on one line, in order of appearance
///
/// A line that carries the KO phrase but no readable subject yields a single
/// mention with no target.
pub fn ko_mentions(lexicon: &Lexicon, text: &str) -> Vec<KoMention> {
    if !lexicon.ko.is_match(text) {
        return Vec::new();
    }
    let mentions: Vec<KoMention> = lexicon
        .ko_subject
        .captures_iter(text)
        .filter_map(|caps| caps.name("subject"))
        .map(|subject| split_subject(subject.as_str()))
        .collect();
    if mentions.is_empty() {
        vec![KoMention {
            target: None,
            owner: None,
        }]
    } else {
        mentions
    }
}

fn split_subject(subject: &str) -> KoMention {
    let subject = subject.trim();
    let subject = ["El ", "La ", "Los ", "Las ", "el ", "la "]
        .iter()
        .find_map(|article| subject.strip_prefix(article))
        .unwrap_or(subject)
        .trim();

    let (target, owner) = match subject.rsplit_once(" de ") {
        Some((name, owner))
            if !name.trim().is_empty()
                && !owner.is_empty()
                && owner
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') =>
        {
            (name.trim(), Some(owner.to_string()))
        }
        _ => (subject, None),
    };

    KoMention {
        target: (!target.is_empty()).then(|| target.to_string()),
        owner,
    }
}

/// Players in order of first appearance
///
/// Opening-hand lines are authoritative; without them the inferred turn
/// actors are used.
pub fn known_players(lexicon: &Lexicon, log_text: &str) -> Vec<String> {
    let mut players: Vec<String> = Vec::new();
    for line in log_text.lines() {
        if let Some(caps) = lexicon.opening_hand.captures(line.trim()) {
            let name = caps["player"].to_string();
            if !players.contains(&name) {
                players.push(name);
            }
        }
    }
    if players.is_empty() {
        for turn in index_turns(lexicon, log_text) {
            if let Some(actor) = turn.actor {
                if !players.contains(&actor) {
                    players.push(actor);
                }
            }
        }
    }
    players
}

fn went_first(lexicon: &Lexicon, log_text: &str, players: &[String]) -> Option<String> {
    for line in log_text.lines() {
        let Some(caps) = lexicon.turn_order.captures(line.trim()) else {
            continue;
        };
        let chooser = caps["player"].to_string();
        if caps["order"].eq_ignore_ascii_case("primer") {
            return Some(chooser);
        }
        if players.len() == 2 && players.contains(&chooser) {
            return players.iter().find(|p| **p != chooser).cloned();
        }
    }
    None
}

/// Total prize cards taken on one line
pub fn prize_count(lexicon: &Lexicon, text: &str) -> u32 {
    lexicon
        .prize
        .captures_iter(text)
        .map(|caps| parse_count(&caps["count"]))
        .sum()
}

fn prizes_by_player(lexicon: &Lexicon, log_text: &str) -> BTreeMap<String, u32> {
    let mut prizes: BTreeMap<String, u32> = BTreeMap::new();
    for line in log_text.lines() {
        for caps in lexicon.prize.captures_iter(line) {
            let Some(player) = caps.name("player").map(|m| m.as_str()) else {
                continue;
            };
            if lexicon.actor_stoplist.contains(&player) {
                continue;
            }
            *prizes.entry(player.to_string()).or_default() += parse_count(&caps["count"]);
        }
    }
    prizes
}

fn mulligans_by_player(lexicon: &Lexicon, log_text: &str) -> BTreeMap<String, u32> {
    let mut mulligans: BTreeMap<String, u32> = BTreeMap::new();
    for line in log_text.lines() {
        let line = line.trim();
        if MULLIGAN_BONUS_MARKERS.iter().any(|m| line.contains(m)) {
            continue;
        }
        if let Some(caps) = lexicon.mulligan.captures(line) {
            let count = caps.name("count").map(|m| parse_count(m.as_str())).unwrap_or(1);
            *mulligans.entry(caps["player"].to_string()).or_default() += count;
        }
    }
    mulligans
}

/// Counters read straight off dedicated lines, no causal inference
pub fn compute_basic_stats(lexicon: &Lexicon, log_text: &str) -> MatchStats {
    let players = known_players(lexicon, log_text);
    MatchStats {
        went_first_player: went_first(lexicon, log_text, &players),
        mulligans_by_player: mulligans_by_player(lexicon, log_text),
        observable_prizes_taken_by_player: prizes_by_player(lexicon, log_text),
    }
}

/// Causal actor of a line, if it is a known player
fn causal_actor<'t>(lexicon: &Lexicon, text: &'t str, players: &[String]) -> Option<&'t str> {
    if !lexicon.is_causal(text) {
        return None;
    }
    lexicon
        .leading_token(text)
        .filter(|token| players.iter().any(|p| p == token))
}

/// Scan backward from a KO line for the player who caused it
///
/// The KO line itself is checked first, then up to `window` earlier lines.
/// The scan stops at a turn header. A causal line whose actor owns the
/// knocked-out Pokémon is skipped.
pub fn attribute_ko(
    lexicon: &Lexicon,
    lines: &[&str],
    ko_idx: usize,
    mention: &KoMention,
    players: &[String],
    window: usize,
) -> Option<String> {
    for offset in 0..=window {
        let Some(idx) = ko_idx.checked_sub(offset) else {
            break;
        };
        let text = lines[idx];
        if offset > 0 && lexicon.is_turn_header(text) {
            break;
        }
        if let Some(actor) = causal_actor(lexicon, text, players) {
            if mention.owner.as_deref() == Some(actor) {
                continue;
            }
            return Some(actor.to_string());
        }
    }
    None
}

fn winner(lexicon: &Lexicon, log_text: &str) -> (bool, Option<String>) {
    let mut concede = false;
    let mut winner = None;
    for line in log_text.lines() {
        let line = line.trim();
        let is_concede = lexicon.concede.is_match(line);
        concede |= is_concede;
        if let Some(caps) = lexicon.winner.captures(line) {
            let standalone = caps.get(0).map(|m| m.start() == 0).unwrap_or(false);
            if is_concede || standalone {
                winner = Some(caps["player"].to_string());
            }
        }
    }
    (concede, winner)
}

/// Derive match facts with causal KO attribution
pub fn extract_match_facts(lexicon: &Lexicon, log_text: &str, ko_lookback: usize) -> MatchFacts {
    let window = clamp_lookback(ko_lookback);
    let players = known_players(lexicon, log_text);
    let lines: Vec<&str> = log_text.lines().collect();

    let mut kos_by_player: BTreeMap<String, u32> = BTreeMap::new();
    for (idx, line) in lines.iter().enumerate() {
        for mention in ko_mentions(lexicon, line) {
            let actor = attribute_ko(lexicon, &lines, idx, &mention, &players, window);
            if actor.is_none() {
                debug!(line = idx + 1, "KO without causal actor in window");
            }
            let key = actor.unwrap_or_else(|| UNKNOWN_ACTOR.to_string());
            *kos_by_player.entry(key).or_default() += 1;
        }
    }

    let (concede, winner) = winner(lexicon, log_text);
    MatchFacts {
        winner,
        went_first_player: went_first(lexicon, log_text, &players),
        turns_count: index_turns(lexicon, log_text).len(),
        observable_prizes_taken_by_player: prizes_by_player(lexicon, log_text),
        kos_by_player,
        concede,
    }
}
