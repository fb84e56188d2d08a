//! Phrase tables and compiled patterns for the Spanish PTCGL log dialect.
//!
//! The lexicon is immutable. It is built once per process (see [`lexicon`])
//! and passed by reference into every detector and extractor.

use std::sync::OnceLock;

use anyhow::Result;
use regex::Regex;

/// Global cached lexicon (stores Result to handle init errors)
static LEXICON: OnceLock<Result<Lexicon, String>> = OnceLock::new();

/// Supporter cards recognized by the SUPPORTER detector
pub const SUPPORTER_KEYWORDS: &[&str] = &[
    "Determinación de Lillie",
    "Órdenes de Jefes",
    "Ordenes de Jefes",
    "Liza",
    "Mirtilo",
    "Plan del Profesor Turo",
    "e-Nigma",
];

/// Supporters whose effect forces the opponent's active Pokémon to switch
pub const GUST_KEYWORDS: &[&str] = &["Órdenes de Jefes", "Ordenes de Jefes"];

/// Stadium cards recognized from a plain "jugó <name>" line
pub const STADIUM_NAMES: &[&str] = &[
    "Pueblo Altamía",
    "Torre de Vigilancia del Equipo Rocket",
    "Torre de Interferencia",
    "Jaula de Combate",
];

/// Leading tokens that never name a player
pub const ACTOR_STOPLIST: &[&str] = &[
    "-", "Turno", "Preparación", "El", "La", "Los", "Las", "Un", "Una", "Se", "Carta", "Cartas",
    "Daño", "Resumen", "Fin", "Ambos", "Jugador", "Rival",
];

/// Verbs that mark a line as something a player did
pub const ACTION_VERBS: &[&str] = &[
    "robó", "jugó", "usó", "infligió", "unió", "evolucionó", "retiró", "tomó", "terminó",
    "puso", "descartó", "barajó", "movió", "buscó", "añadió", "colocó", "decidió", "hizo",
    "activó", "cambió", "devolvió", "reveló", "recuperó", "mezcló",
];

/// Phrases whose presence marks a line as written in the Spanish dialect
pub const SPANISH_MARKERS: &[&str] = &[
    "Turno de",
    "robó",
    "jugó",
    "infligió",
    "quedó Fuera de Combate",
    "tomó",
    "se rindió",
    "mano inicial",
    "carta de Premio",
    "cartas de Premio",
];

/// Compiled patterns plus phrase tables
#[derive(Debug)]
pub struct Lexicon {
    pub turn_header: Regex,
    pub actor_prefix: Regex,
    pub attack: Regex,
    pub ko: Regex,
    pub ko_subject: Regex,
    pub prize: Regex,
    pub concede: Regex,
    pub winner: Regex,
    pub stadium_in_play: Regex,
    pub play_verb: Regex,
    pub opening_hand: Regex,
    pub turn_order: Regex,
    pub mulligan: Regex,
    pub causal: Regex,
    pub claim_causal: Regex,
    pub ko_claim: Regex,
    pub supporters: &'static [&'static str],
    pub gust_cards: &'static [&'static str],
    pub stadiums: &'static [&'static str],
    pub actor_stoplist: &'static [&'static str],
    pub action_verbs: &'static [&'static str],
    pub spanish_markers: &'static [&'static str],
}

const PLAYER: &str = r"[A-Za-z0-9_\-]+";

impl Lexicon {
    /// Compile the Spanish PTCGL lexicon
    pub fn spanish() -> Result<Self, regex::Error> {
        Ok(Self {
            turn_header: Regex::new(&format!(r"^Turno de (?:\[playerName\]|{PLAYER})\s*$"))?,
            actor_prefix: Regex::new(&format!(r"^({PLAYER})\s"))?,
            attack: Regex::new(r"(?i)\binfligió\b.*\busando\b")?,
            ko: Regex::new(r"(?i)quedó\s+Fuera\s+de\s+Combate")?,
            ko_subject: Regex::new(r"(?i)(?:¡\s*)?(?P<subject>[^.!¡?]+?)\s+quedó\s+Fuera\s+de\s+Combate")?,
            prize: Regex::new(&format!(
                r"(?i)(?:(?P<player>{PLAYER})\s+)?\btomó\s+(?P<count>una|\d+)\s+cartas?\s+de\s+Premio"
            ))?,
            concede: Regex::new(r"(?i)\bse\s+rindió\b")?,
            winner: Regex::new(&format!(
                r"(?i)(?P<player>{PLAYER})\s+ganó(?:\s+la\s+partida)?\s*[.!]?\s*$"
            ))?,
            stadium_in_play: Regex::new(r"(?i)puso\s+en\s+juego\s+la\s+carta\s+de\s+Estadio")?,
            play_verb: Regex::new(r"\bjugó\b")?,
            opening_hand: Regex::new(&format!(
                r"^(?P<player>{PLAYER})\s+robó\s+7\s+cartas\s+de\s+la\s+mano\s+inicial"
            ))?,
            turn_order: Regex::new(&format!(
                r"(?i)^(?P<player>{PLAYER})\s+decidió\s+(?:empezar|ir|jugar)\s+(?:en\s+)?(?P<order>primer|segundo)"
            ))?,
            mulligan: Regex::new(&format!(
                r"(?i)^(?P<player>{PLAYER})\s+.*?\b(?:(?P<count>\d+)\s+)?mulligans?\b"
            ))?,
            causal: Regex::new(r"(?i)\b(?:infligió|usó)\b")?,
            claim_causal: Regex::new(r"(?i)\b(?:usó|infligió|jugó)\b")?,
            ko_claim: Regex::new(r"(?i)^\s*(?P<actor>.+?)\s+\bKO\b\s+(?P<target>.+?)\s*[.!?]?\s*$")?,
            supporters: SUPPORTER_KEYWORDS,
            gust_cards: GUST_KEYWORDS,
            stadiums: STADIUM_NAMES,
            actor_stoplist: ACTOR_STOPLIST,
            action_verbs: ACTION_VERBS,
            spanish_markers: SPANISH_MARKERS,
        })
    }

    /// Whether a line is a turn header
    pub fn is_turn_header(&self, line: &str) -> bool {
        self.turn_header.is_match(line.trim())
    }

    /// Whether a line plays the forced-switch supporter
    pub fn is_gust(&self, text: &str) -> bool {
        self.play_verb.is_match(text) && self.gust_cards.iter().any(|card| text.contains(card))
    }

    /// Whether a line can cause a knockout (damage, "usó", or a gust play)
    pub fn is_causal(&self, text: &str) -> bool {
        self.causal.is_match(text) || self.is_gust(text)
    }

    /// Leading player-like token of a line, if any
    pub fn leading_token<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.actor_prefix
            .captures(text.trim_start())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Leading token of a line when it plausibly names the acting player
    ///
    /// The token must not be on the stoplist and the line must contain an
    /// action verb.
    pub fn line_actor<'t>(&self, text: &'t str) -> Option<&'t str> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.starts_with('-') || trimmed.starts_with('•') {
            return None;
        }
        let token = self.leading_token(trimmed)?;
        if self.actor_stoplist.contains(&token) {
            return None;
        }
        let has_verb = trimmed
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| self.action_verbs.contains(&word));
        has_verb.then_some(token)
    }
}

/// Get the shared lexicon (compiled once, then cached)
pub fn lexicon() -> Result<&'static Lexicon> {
    let result = LEXICON.get_or_init(|| Lexicon::spanish().map_err(|e| e.to_string()));

    match result {
        Ok(lexicon) => Ok(lexicon),
        Err(e) => anyhow::bail!("Failed to compile log lexicon: {}", e),
    }
}

/// Parse a Spanish prize/mulligan count ("una"/"un" or digits)
pub fn parse_count(raw: &str) -> u32 {
    match raw.to_lowercase().as_str() {
        "una" | "un" | "uno" => 1,
        other => other.parse().unwrap_or(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex() -> &'static Lexicon {
        lexicon().unwrap()
    }

    #[test]
    fn test_turn_header_matches_placeholder_and_name() {
        assert!(lex().is_turn_header("Turno de [playerName]"));
        assert!(lex().is_turn_header("  Turno de Kami-Yan  "));
        assert!(!lex().is_turn_header("Turno de [playerName] extra text"));
        assert!(!lex().is_turn_header("Kami-Yan terminó su turno."));
    }

    #[test]
    fn test_line_actor_requires_verb_and_non_stoplisted_token() {
        assert_eq!(lex().line_actor("Kami-Yan robó una carta."), Some("Kami-Yan"));
        assert_eq!(lex().line_actor("El Pikachu de A quedó dormido."), None);
        assert_eq!(lex().line_actor("- Kami-Yan robó una carta."), None);
        assert_eq!(lex().line_actor("Kami-Yan sonríe."), None);
    }

    #[test]
    fn test_gust_and_causal() {
        assert!(lex().is_gust("A jugó Órdenes de Jefes."));
        assert!(!lex().is_gust("Órdenes de Jefes fue descartada."));
        assert!(lex().is_causal("A usó Comodín Nocturno."));
        assert!(lex().is_causal("A infligió 30 puntos de daño usando Golpe."));
        assert!(!lex().is_causal("A robó una carta."));
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("una"), 1);
        assert_eq!(parse_count("Una"), 1);
        assert_eq!(parse_count("3"), 3);
    }

    #[test]
    fn test_ko_subject_capture() {
        let text = "A infligió 180 puntos de daño usando X contra B. ¡El Latias ex de B quedó Fuera de Combate!";
        let caps = lex().ko_subject.captures(text).unwrap();
        assert_eq!(caps["subject"].trim(), "El Latias ex de B");
    }
}
