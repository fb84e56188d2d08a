//! Tests for KO claim verification against fixture logs

use pokecoach::core::integrity::{extract_ko_claim, verify_ko_claim};
use pokecoach::core::language::SPANISH;
use pokecoach::core::{apply_summary_claim_integrity, ClaimVerdict};
use pokecoach::parser::{extract_match_facts, lexicon};

const MATCH_1: &str = include_str!("fixtures/battle_logs_ptcgl_spanish_match_1.txt");
const MATCH_2: &str = include_str!("fixtures/battle_logs_ptcgl_spanish_match_2.txt");

fn verdict(log: &str, bullet: &str, window: usize) -> ClaimVerdict {
    let lex = lexicon().unwrap();
    let (actor, target) = extract_ko_claim(lex, bullet).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    verify_ko_claim(lex, &actor, &target, &lines, window)
}

#[test]
fn test_claims_against_first_fixture() {
    assert_eq!(verdict(MATCH_1, "Kami-Yan KO Drakloak", 12), ClaimVerdict::Verified);
    assert_eq!(verdict(MATCH_1, "SpicyTaco30 KO Charizard ex.", 12), ClaimVerdict::Verified);
    assert_eq!(verdict(MATCH_1, "SpicyTaco30 KO Drakloak", 12), ClaimVerdict::TargetOnly);
    assert_eq!(verdict(MATCH_1, "Kami-Yan KO Dragapult ex", 12), ClaimVerdict::MissingTarget);
}

#[test]
fn test_claim_does_not_cross_turn_header() {
    // Alpha's attack sits in the previous turn
    assert_eq!(verdict(MATCH_2, "Alpha KO Rattata", 12), ClaimVerdict::TargetOnly);
}

#[test]
fn test_self_ko_claim_agrees_with_match_facts() {
    let log = "A robó 7 cartas de la mano inicial.\nB robó 7 cartas de la mano inicial.\nTurno de B\nB usó Explosión.\n¡El Voltorb de B quedó Fuera de Combate!";
    let facts = extract_match_facts(lexicon().unwrap(), log, 12);
    assert_eq!(facts.kos_by_player.get("unknown"), Some(&1));
    assert!(!facts.kos_by_player.contains_key("B"));

    // The owner cannot be credited in the summary either
    assert_eq!(verdict(log, "B KO Voltorb", 12), ClaimVerdict::TargetOnly);
}

#[test]
fn test_target_match_is_whole_word() {
    // "Char" only occurs inside "Charizard"
    assert_eq!(verdict(MATCH_1, "SpicyTaco30 KO Char", 12), ClaimVerdict::MissingTarget);
}

#[test]
fn test_integrity_round_trip_on_fixture() {
    let lex = lexicon().unwrap();
    let summary: Vec<String> = [
        "Kami-Yan KO Drakloak",
        "SpicyTaco30 KO Drakloak",
        "Kami-Yan KO Dragapult ex",
        "Kami-Yan KO Drakloak",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    let fallback: Vec<String> = SPANISH.fallback_summary.iter().map(|s| s.to_string()).collect();

    let outcome = apply_summary_claim_integrity(
        lex,
        summary,
        Vec::new(),
        &fallback,
        MATCH_1,
        &SPANISH,
        12,
    );

    assert_eq!(
        outcome.summary,
        vec![
            "Kami-Yan KO Drakloak".to_string(),
            "Fuera de Combate observado: Drakloak quedó Fuera de Combate.".to_string(),
            fallback[0].clone(),
            fallback[1].clone(),
            fallback[2].clone(),
        ]
    );
    assert_eq!(
        outcome.unknowns,
        vec!["Afirmación de KO no verificable omitida del resumen: Kami-Yan KO Dragapult ex"]
    );
}
