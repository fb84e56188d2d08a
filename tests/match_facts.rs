//! Tests for match facts extraction and causal KO attribution

use std::collections::BTreeMap;

use pokecoach::parser::{compute_basic_stats, extract_match_facts, index_turns, lexicon, Lexicon};

const MATCH_1: &str = include_str!("fixtures/battle_logs_ptcgl_spanish_match_1.txt");
const MATCH_2: &str = include_str!("fixtures/battle_logs_ptcgl_spanish_match_2.txt");

fn lex() -> &'static Lexicon {
    lexicon().unwrap()
}

/// Opening hands, one header, a causal attack, `gap` filler lines, then a KO
fn log_with_gap(gap: usize) -> String {
    let mut lines = vec![
        "A robó 7 cartas de la mano inicial.".to_string(),
        "B robó 7 cartas de la mano inicial.".to_string(),
        "Turno de [playerName]".to_string(),
        "A infligió 60 puntos de daño usando Golpe a Pikachu de B.".to_string(),
    ];
    for i in 0..gap {
        lines.push(format!("- Efecto pendiente {}.", i + 1));
    }
    lines.push("¡El Pikachu de B quedó Fuera de Combate!".to_string());
    lines.join("\n")
}

#[test]
fn test_prizes_counted_per_player() {
    let log = "A robó 7 cartas de la mano inicial.\n\
               B robó 7 cartas de la mano inicial.\n\
               A tomó una carta de Premio.\n\
               A tomó 2 cartas de Premio.\n\
               B tomó 3 cartas de Premio.\n";

    let facts = extract_match_facts(lex(), log, 12);

    let expected: BTreeMap<String, u32> =
        [("A".to_string(), 3), ("B".to_string(), 3)].into_iter().collect();
    assert_eq!(facts.observable_prizes_taken_by_player, expected);
}

#[test]
fn test_fixture_winner_concede_and_turns() {
    let facts = extract_match_facts(lex(), MATCH_1, 12);

    assert!(facts.concede);
    assert_eq!(facts.winner.as_deref(), Some("Kami-Yan"));
    assert_eq!(facts.went_first_player.as_deref(), Some("Kami-Yan"));
    assert_eq!(facts.turns_count, index_turns(lex(), MATCH_1).len());
    assert_eq!(facts.turns_count, 5);
}

#[test]
fn test_fixture_kos_attributed_to_attackers() {
    let facts = extract_match_facts(lex(), MATCH_1, 12);

    assert_eq!(facts.kos_by_player.get("Kami-Yan"), Some(&1));
    assert_eq!(facts.kos_by_player.get("SpicyTaco30"), Some(&1));
    assert_eq!(facts.unknown_kos(), 0);
    assert!(facts
        .kos_by_player
        .keys()
        .all(|k| ["Kami-Yan", "SpicyTaco30", "unknown"].contains(&k.as_str())));
}

#[test]
fn test_ko_across_turn_header_is_unknown() {
    let facts = extract_match_facts(lex(), MATCH_2, 12);

    assert_eq!(facts.unknown_kos(), 1);
    assert!(!facts.kos_by_player.contains_key("Alpha"));
    assert!(!facts.concede);
    assert_eq!(facts.winner.as_deref(), Some("Alpha"));
}

#[test]
fn test_ko_beyond_default_window_is_unknown() {
    let facts = extract_match_facts(lex(), &log_with_gap(13), 12);

    assert_eq!(facts.unknown_kos(), 1);
    assert!(!facts.kos_by_player.contains_key("A"));
}

#[test]
fn test_ko_within_default_window_is_attributed() {
    let facts = extract_match_facts(lex(), &log_with_gap(10), 12);

    assert_eq!(facts.kos_by_player.get("A"), Some(&1));
    assert_eq!(facts.unknown_kos(), 0);
}

#[test]
fn test_window_eight_misses_cause_at_offset_nine() {
    // 8 filler lines put the attack at offset 9 from the KO line
    let log = log_with_gap(8);

    let narrow = extract_match_facts(lex(), &log, 8);
    assert_eq!(narrow.unknown_kos(), 1);

    let default = extract_match_facts(lex(), &log, 12);
    assert_eq!(default.kos_by_player.get("A"), Some(&1));
}

#[test]
fn test_lookback_is_clamped() {
    // A window of 3 is raised to 8, which still reaches offset 5
    let facts = extract_match_facts(lex(), &log_with_gap(4), 3);
    assert_eq!(facts.kos_by_player.get("A"), Some(&1));
}

#[test]
fn test_basic_stats_from_fixture() {
    let stats = compute_basic_stats(lex(), MATCH_1);

    assert_eq!(stats.went_first_player.as_deref(), Some("Kami-Yan"));
    assert_eq!(stats.mulligans_by_player.get("SpicyTaco30"), Some(&1));
    assert!(!stats.mulligans_by_player.contains_key("Kami-Yan"));
    assert_eq!(stats.observable_prizes_taken_by_player.get("Kami-Yan"), Some(&2));
    assert_eq!(stats.observable_prizes_taken_by_player.get("SpicyTaco30"), Some(&2));
}

#[test]
fn test_went_first_inferred_from_second_choice() {
    let stats = compute_basic_stats(lex(), MATCH_2);
    assert_eq!(stats.went_first_player.as_deref(), Some("Alpha"));
}
