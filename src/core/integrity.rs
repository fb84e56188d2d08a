//! Verification of "<actor> KO <target>" summary bullets against the log.

use tracing::debug;

use crate::domain::{SUMMARY_MAX_ITEMS, SUMMARY_MIN_ITEMS};
use crate::evidence::normalize_claim_text;
use crate::parser::{ko_mentions, Lexicon};

use super::guardrails::UnknownNotes;
use super::language::Templates;

/// Outcome of checking one KO claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimVerdict {
    /// A KO line mentions the target and a causal line mentions the actor
    Verified,
    /// The knockout happened but the actor cannot be tied to it
    TargetOnly,
    /// No KO line mentions the target
    MissingTarget,
}

/// Split a bullet shaped like "<actor> KO <target>"
pub fn extract_ko_claim(lexicon: &Lexicon, bullet: &str) -> Option<(String, String)> {
    let caps = lexicon.ko_claim.captures(bullet.trim())?;
    let actor = caps.name("actor")?.as_str().trim();
    let target = caps.name("target")?.as_str().trim();
    if actor.is_empty() || target.is_empty() {
        return None;
    }
    Some((actor.to_string(), target.to_string()))
}

/// Whole-word containment over normalized text
fn contains_phrase(haystack: &str, needle: &str) -> bool {
    format!(" {haystack} ").contains(&format!(" {needle} "))
}

/// Whole-word prefix test over normalized text
fn starts_with_phrase(haystack: &str, needle: &str) -> bool {
    haystack == needle || haystack.starts_with(&format!("{needle} "))
}

/// Check one claim against the log lines
///
/// The causal scan covers the KO line itself and up to `window` earlier
/// lines, stopping at a turn header. A causal line only counts when the
/// claimed actor is the one acting on it, not merely named on it. A causal
/// line led by the owner of the knocked-out Pokémon is skipped, matching
/// match-fact attribution.
pub fn verify_ko_claim(
    lexicon: &Lexicon,
    actor: &str,
    target: &str,
    lines: &[&str],
    window: usize,
) -> ClaimVerdict {
    let actor_norm = normalize_claim_text(actor);
    let target_norm = normalize_claim_text(target);
    if actor_norm.is_empty() || target_norm.is_empty() {
        return ClaimVerdict::MissingTarget;
    }

    let ko_lines: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| lexicon.ko.is_match(line))
        .filter(|(_, line)| contains_phrase(&normalize_claim_text(line), &target_norm))
        .map(|(idx, _)| idx)
        .collect();
    if ko_lines.is_empty() {
        return ClaimVerdict::MissingTarget;
    }

    let has_causal_actor = |ko_idx: usize| {
        let owners: Vec<String> = ko_mentions(lexicon, lines[ko_idx])
            .into_iter()
            .filter(|mention| {
                mention
                    .target
                    .as_deref()
                    .map(|t| contains_phrase(&normalize_claim_text(t), &target_norm))
                    .unwrap_or(false)
            })
            .filter_map(|mention| mention.owner)
            .map(|owner| normalize_claim_text(&owner))
            .collect();

        for offset in 0..=window {
            let Some(idx) = ko_idx.checked_sub(offset) else {
                return false;
            };
            let text = lines[idx].trim();
            if offset > 0 && lexicon.is_turn_header(text) {
                return false;
            }
            if !lexicon.claim_causal.is_match(text) {
                continue;
            }
            let owns_target = lexicon
                .leading_token(text)
                .map(|token| owners.contains(&normalize_claim_text(token)))
                .unwrap_or(false);
            if owns_target {
                continue;
            }
            if starts_with_phrase(&normalize_claim_text(text), &actor_norm) {
                return true;
            }
        }
        false
    };

    if ko_lines.into_iter().any(has_causal_actor) {
        ClaimVerdict::Verified
    } else {
        ClaimVerdict::TargetOnly
    }
}

/// Summary and unknowns after claim verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityOutcome {
    pub summary: Vec<String>,
    pub unknowns: Vec<String>,
}

/// Keep, rewrite or drop KO claims, then dedupe and rebound the summary
pub fn apply_summary_claim_integrity(
    lexicon: &Lexicon,
    summary: Vec<String>,
    unknowns: Vec<String>,
    fallback_summary: &[String],
    log_text: &str,
    templates: &Templates,
    window: usize,
) -> IntegrityOutcome {
    let lines: Vec<&str> = log_text.lines().collect();
    let mut notes = UnknownNotes::from(unknowns);
    let mut checked: Vec<String> = Vec::new();

    for bullet in summary {
        let Some((actor, target)) = extract_ko_claim(lexicon, &bullet) else {
            checked.push(bullet);
            continue;
        };
        match verify_ko_claim(lexicon, &actor, &target, &lines, window) {
            ClaimVerdict::Verified => checked.push(bullet),
            ClaimVerdict::TargetOnly => {
                debug!(%bullet, "KO claim rewritten to target-only observation");
                checked.push(templates.observed_knockout(&target));
            }
            ClaimVerdict::MissingTarget => {
                debug!(%bullet, "KO claim dropped");
                notes.push(templates.unverifiable_ko_claim(&bullet));
            }
        }
    }

    let mut deduped: Vec<String> = Vec::new();
    for bullet in checked {
        if !deduped.contains(&bullet) {
            deduped.push(bullet);
        }
    }
    for fallback in fallback_summary {
        if deduped.len() >= SUMMARY_MIN_ITEMS {
            break;
        }
        if !deduped.contains(fallback) {
            deduped.push(fallback.clone());
        }
    }
    deduped.truncate(SUMMARY_MAX_ITEMS);

    IntegrityOutcome {
        summary: deduped,
        unknowns: notes.into_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::language::{ENGLISH, SPANISH};
    use crate::parser::lexicon;

    const LOG: &str = "Turno de [playerName]\nA infligió 120 puntos de daño usando Golpe a Pikachu de B.\n¡El Pikachu de B quedó Fuera de Combate!\nTurno de [playerName]\n¡El Snorlax de A quedó Fuera de Combate!";

    fn fallback() -> Vec<String> {
        ENGLISH.fallback_summary.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extract_ko_claim() {
        let lex = lexicon().unwrap();
        assert_eq!(
            extract_ko_claim(lex, "A KO Pikachu."),
            Some(("A".to_string(), "Pikachu".to_string()))
        );
        assert_eq!(extract_ko_claim(lex, "A knocked out Pikachu."), None);
    }

    #[test]
    fn test_verdicts() {
        let lex = lexicon().unwrap();
        let lines: Vec<&str> = LOG.lines().collect();
        assert_eq!(verify_ko_claim(lex, "A", "Pikachu", &lines, 12), ClaimVerdict::Verified);
        assert_eq!(verify_ko_claim(lex, "B", "Snorlax", &lines, 12), ClaimVerdict::TargetOnly);
        assert_eq!(verify_ko_claim(lex, "A", "Mewtwo", &lines, 12), ClaimVerdict::MissingTarget);
    }

    #[test]
    fn test_owner_named_on_causal_line_is_not_the_actor() {
        let lex = lexicon().unwrap();
        let lines: Vec<&str> = LOG.lines().collect();
        assert_eq!(verify_ko_claim(lex, "B", "Pikachu", &lines, 12), ClaimVerdict::TargetOnly);
    }

    #[test]
    fn test_self_ko_does_not_verify_owner() {
        let lex = lexicon().unwrap();
        let log = "Turno de [playerName]\nB usó Explosión.\n¡El Voltorb de B quedó Fuera de Combate!";
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(verify_ko_claim(lex, "B", "Voltorb", &lines, 12), ClaimVerdict::TargetOnly);
    }

    #[test]
    fn test_integrity_rewrites_drops_and_backfills() {
        let lex = lexicon().unwrap();
        let outcome = apply_summary_claim_integrity(
            lex,
            vec![
                "A KO Pikachu".to_string(),
                "B KO Snorlax".to_string(),
                "A KO Mewtwo".to_string(),
                "A KO Pikachu".to_string(),
            ],
            Vec::new(),
            &fallback(),
            LOG,
            &ENGLISH,
            12,
        );
        assert_eq!(outcome.summary[0], "A KO Pikachu");
        assert_eq!(outcome.summary[1], "Observed knockout: Snorlax was knocked out.");
        assert_eq!(outcome.summary.len(), SUMMARY_MIN_ITEMS);
        assert_eq!(
            outcome.unknowns,
            vec!["Unverifiable KO summary claim omitted: A KO Mewtwo"]
        );
    }

    #[test]
    fn test_spanish_rewrite() {
        let lex = lexicon().unwrap();
        let outcome = apply_summary_claim_integrity(
            lex,
            vec!["B KO Snorlax".to_string()],
            Vec::new(),
            &[],
            LOG,
            &SPANISH,
            12,
        );
        assert_eq!(
            outcome.summary,
            vec!["Fuera de Combate observado: Snorlax quedó Fuera de Combate."]
        );
    }
}
