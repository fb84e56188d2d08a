//! Output language selection and template tables.
//!
//! Logs are always in the Spanish dialect, but the report language is chosen
//! from the log itself: two or more lines carrying a Spanish marker phrase
//! switch every deterministic template to Spanish. Guidance bullets that
//! carry the other language's template markers are gated out.

use serde::{Deserialize, Serialize};

use crate::domain::EventType;
use crate::parser::Lexicon;

/// Marker-bearing lines required to classify a log as Spanish
pub const SPANISH_LINE_THRESHOLD: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportLanguage {
    English,
    Spanish,
}

impl ReportLanguage {
    pub fn templates(&self) -> &'static Templates {
        match self {
            ReportLanguage::English => &ENGLISH,
            ReportLanguage::Spanish => &SPANISH,
        }
    }

    pub fn other(&self) -> ReportLanguage {
        match self {
            ReportLanguage::English => ReportLanguage::Spanish,
            ReportLanguage::Spanish => ReportLanguage::English,
        }
    }
}

/// Classify the report language by counting marker-bearing lines
pub fn detect_language(lexicon: &Lexicon, log_text: &str) -> ReportLanguage {
    let hits = log_text
        .lines()
        .filter(|line| lexicon.spanish_markers.iter().any(|m| line.contains(m)))
        .take(SPANISH_LINE_THRESHOLD)
        .count();
    if hits >= SPANISH_LINE_THRESHOLD {
        ReportLanguage::Spanish
    } else {
        ReportLanguage::English
    }
}

/// Every deterministic phrase the report can emit, for one language
#[derive(Debug)]
pub struct Templates {
    pub ko_swing_prefix: &'static str,
    pub unknown_target: &'static str,
    pub concede_title: &'static str,
    pub concede_impact: &'static str,
    pub bundle_impact_prefix: &'static str,
    pub event_impact: &'static str,
    pub attack_title: &'static str,
    pub ko_title: &'static str,
    pub prize_title: &'static str,
    pub fallback_tp_title: &'static str,
    pub fallback_tp_impact: &'static str,
    pub placeholder_tp_title: &'static str,
    pub placeholder_tp_impact: &'static str,

    pub mistake_description_prefix: &'static str,
    pub mistake_attack: &'static str,
    pub mistake_ko: &'static str,
    pub mistake_supporter: &'static str,
    pub mistake_why: &'static str,
    pub mistake_better_line: &'static str,
    pub fallback_mistake_description: &'static str,
    pub fallback_mistake_why: &'static str,
    pub fallback_mistake_better_line: &'static str,
    pub placeholder_mistake_description: &'static str,
    pub placeholder_mistake_why: &'static str,
    pub placeholder_mistake_better_line: &'static str,

    pub went_first_suffix: &'static str,
    pub mulligans_prefix: &'static str,
    pub attacks_observed: (&'static str, &'static str),
    pub kos_observed: (&'static str, &'static str),
    pub prizes_observed: (&'static str, &'static str),
    pub momentum: &'static str,
    pub hidden_info: &'static str,
    pub winner_suffix: &'static str,
    pub fallback_summary: &'static [&'static str],

    pub default_unknowns: &'static [&'static str],
    pub inferred_turn_actors: &'static str,
    pub unattributed_kos: (&'static str, &'static str),
    pub low_conf_turning_point: &'static str,
    pub low_conf_mistake: &'static str,
    pub observed_knockout: (&'static str, &'static str),
    pub unverifiable_ko_claim: &'static str,

    pub default_next_actions: &'static [&'static str],

    /// Field labels for the Markdown rendering
    pub markdown: MarkdownLabels,

    /// Phrases unique to this language's templates
    pub markers: &'static [&'static str],
}

/// Per-item labels of the Markdown report
///
/// Section headings stay fixed so rendered reports share one outline.
#[derive(Debug)]
pub struct MarkdownLabels {
    pub fact: &'static str,
    pub value: &'static str,
    pub winner: &'static str,
    pub went_first: &'static str,
    pub turns: &'static str,
    pub concede_detected: &'static str,
    pub yes: &'static str,
    pub no: &'static str,
    pub player: &'static str,
    pub observable_prizes: &'static str,
    pub kos: &'static str,
    pub impact: &'static str,
    pub why_it_matters: &'static str,
    pub better_line: &'static str,
    pub confidence: &'static str,
    pub hidden_info: &'static str,
    pub evidence: &'static str,
}

pub static ENGLISH: Templates = Templates {
    ko_swing_prefix: "KO swing on ",
    unknown_target: "Unknown target",
    concede_title: "Concede closes endgame",
    concede_impact: "The opponent conceded, closing the game.",
    bundle_impact_prefix: "Knockout sequence moved the prize race by ",
    event_impact: "This event changed tempo or prize pressure.",
    attack_title: "Attack pressure swing",
    ko_title: "Knockout swing",
    prize_title: "Prize race swing",
    fallback_tp_title: "Early tempo signal",
    fallback_tp_impact: "Early sequence likely shaped the game flow.",
    placeholder_tp_title: "Evidence-backed tempo signal ",
    placeholder_tp_impact: "Observed event may have influenced tempo; verify board context.",

    mistake_description_prefix: "Review decision around ",
    mistake_attack: "attack event.",
    mistake_ko: "knockout event.",
    mistake_supporter: "supporter event.",
    mistake_why: "This sequence affected board pressure and prize race.",
    mistake_better_line: "Re-evaluate sequencing before committing major actions.",
    fallback_mistake_description: "Review early setup sequencing.",
    fallback_mistake_why: "Early sequencing influences later tempo windows.",
    fallback_mistake_better_line: "Run pre-attack sequencing checklist.",
    placeholder_mistake_description: "Review sequencing around observed event.",
    placeholder_mistake_why: "Observed sequence may have narrowed available lines.",
    placeholder_mistake_better_line: "Replay this turn and compare at least one alternative sequence.",

    went_first_suffix: " took the first turn.",
    mulligans_prefix: "Mulligans: ",
    attacks_observed: ("Observed ", " attack events in the log."),
    kos_observed: ("Observed ", " knockout events."),
    prizes_observed: ("Observed ", " prize-taking events."),
    momentum: "Momentum swings were driven by attack-to-KO sequences.",
    hidden_info: "Unknown hidden information may change optimal lines.",
    winner_suffix: " won the game.",
    fallback_summary: &[
        "Opening turns established initial board state.",
        "Mid-game exchanges influenced tempo.",
        "Endgame lines depended on available resources.",
    ],

    default_unknowns: &[
        "Opponent hand information is incomplete.",
        "Prize card mapping is partially hidden unless revealed in the log.",
    ],
    inferred_turn_actors: "Some turn actors were inferred due to placeholder turn headers.",
    unattributed_kos: ("", " knockout(s) could not be attributed to a player."),
    low_conf_turning_point: "Low-confidence turning point omitted: ",
    low_conf_mistake: "Low-confidence mistake omitted: ",
    observed_knockout: ("Observed knockout: ", " was knocked out."),
    unverifiable_ko_claim: "Unverifiable KO summary claim omitted: ",

    default_next_actions: &[
        "Practice prize mapping before each high-impact attack.",
        "Review supporter sequencing on turns with tempo swings.",
        "Rehearse a pre-commit checklist for attack and retreat decisions.",
    ],

    markdown: MarkdownLabels {
        fact: "Fact",
        value: "Value",
        winner: "Winner",
        went_first: "Went first",
        turns: "Turns",
        concede_detected: "Concede detected",
        yes: "Yes",
        no: "No",
        player: "Player",
        observable_prizes: "Observable Prizes",
        kos: "KOs",
        impact: "Impact",
        why_it_matters: "Why it matters",
        better_line: "Better line",
        confidence: "Confidence",
        hidden_info: "Depends on hidden info",
        evidence: "Evidence",
    },

    markers: &[
        "KO swing on",
        "Unknown target",
        "Concede closes endgame",
        "Review decision around",
        "tempo signal",
        "Observed ",
        "took the first turn",
        "prize-taking events",
        "Momentum swings",
        "hidden information",
        "was knocked out",
        "Practice prize mapping",
        "Review supporter sequencing",
        "Rehearse a pre-commit",
        "Review early setup",
        "Review sequencing",
        "Opening turns established",
        "Mid-game exchanges",
        "Endgame lines depended",
    ],
};

pub static SPANISH: Templates = Templates {
    ko_swing_prefix: "Giro de KO sobre ",
    unknown_target: "Objetivo desconocido",
    concede_title: "La rendición cierra la partida",
    concede_impact: "El rival se rindió y la partida terminó.",
    bundle_impact_prefix: "La secuencia de Fuera de Combate movió la carrera de Premios en ",
    event_impact: "Este evento cambió el ritmo o la presión de Premios.",
    attack_title: "Giro de presión por ataque",
    ko_title: "Giro por Fuera de Combate",
    prize_title: "Giro en la carrera de Premios",
    fallback_tp_title: "Señal temprana de ritmo",
    fallback_tp_impact: "La secuencia inicial probablemente definió el flujo de la partida.",
    placeholder_tp_title: "Señal de ritmo respaldada por evidencia ",
    placeholder_tp_impact: "El evento observado pudo influir en el ritmo; verifica el contexto del tablero.",

    mistake_description_prefix: "Revisa la decisión en torno al ",
    mistake_attack: "evento de ataque.",
    mistake_ko: "evento de Fuera de Combate.",
    mistake_supporter: "evento de Partidario.",
    mistake_why: "Esta secuencia afectó la presión en la mesa y la carrera de Premios.",
    mistake_better_line: "Reevalúa la secuencia antes de comprometer acciones importantes.",
    fallback_mistake_description: "Revisa la secuencia de preparación inicial.",
    fallback_mistake_why: "La secuencia inicial condiciona las ventanas de ritmo posteriores.",
    fallback_mistake_better_line: "Repasa una lista de control antes de atacar.",
    placeholder_mistake_description: "Revisa la secuencia en torno al evento observado.",
    placeholder_mistake_why: "La secuencia observada pudo reducir las líneas disponibles.",
    placeholder_mistake_better_line: "Repite este turno y compara al menos una secuencia alternativa.",

    went_first_suffix: " jugó el primer turno.",
    mulligans_prefix: "Mulligans: ",
    attacks_observed: ("Se observaron ", " eventos de ataque en el registro."),
    kos_observed: ("Se observaron ", " eventos de Fuera de Combate."),
    prizes_observed: ("Se observaron ", " eventos de toma de Premios."),
    momentum: "Los cambios de ritmo vinieron de secuencias de ataque y Fuera de Combate.",
    hidden_info: "La información oculta desconocida puede cambiar las líneas óptimas.",
    winner_suffix: " ganó la partida.",
    fallback_summary: &[
        "Los primeros turnos establecieron el estado inicial de la mesa.",
        "Los intercambios de mitad de partida influyeron en el ritmo.",
        "Las líneas finales dependieron de los recursos disponibles.",
    ],

    default_unknowns: &[
        "La información de la mano del rival es incompleta.",
        "El reparto de cartas de Premio queda parcialmente oculto salvo que el registro lo revele.",
    ],
    inferred_turn_actors: "Algunos jugadores de turno se infirieron por encabezados de turno genéricos.",
    unattributed_kos: ("", " Fuera de Combate no se pudieron atribuir a un jugador."),
    low_conf_turning_point: "Punto de inflexión de baja confianza omitido: ",
    low_conf_mistake: "Error de baja confianza omitido: ",
    observed_knockout: ("Fuera de Combate observado: ", " quedó Fuera de Combate."),
    unverifiable_ko_claim: "Afirmación de KO no verificable omitida del resumen: ",

    default_next_actions: &[
        "Practica el reparto de Premios antes de cada ataque de alto impacto.",
        "Revisa el orden de Partidarios en los turnos con cambios de ritmo.",
        "Ensaya una lista de control antes de atacar o retirar.",
    ],

    markdown: MarkdownLabels {
        fact: "Dato",
        value: "Valor",
        winner: "Ganador",
        went_first: "Empezó primero",
        turns: "Turnos",
        concede_detected: "Rendición detectada",
        yes: "Sí",
        no: "No",
        player: "Jugador",
        observable_prizes: "Premios observables",
        kos: "KOs",
        impact: "Impacto",
        why_it_matters: "Por qué importa",
        better_line: "Mejor línea",
        confidence: "Confianza",
        hidden_info: "Depende de información oculta",
        evidence: "Evidencia",
    },

    markers: &[
        "Giro de KO sobre",
        "Objetivo desconocido",
        "La rendición cierra",
        "Revisa la decisión",
        "Señal temprana",
        "respaldada por evidencia",
        "Se observaron",
        "Fuera de Combate observado",
        "carrera de Premios",
        "jugó el primer turno",
        "Practica el reparto",
        "lista de control",
        "Los primeros turnos",
        "información oculta",
    ],
};

impl Templates {
    pub fn ko_swing_title(&self, target: Option<&str>) -> String {
        match target {
            Some(target) => format!("{}{}", self.ko_swing_prefix, target),
            None => self.unknown_target.to_string(),
        }
    }

    pub fn bundle_impact(&self, swing: i64) -> String {
        format!("{}{:+}.", self.bundle_impact_prefix, swing)
    }

    pub fn raw_event_title(&self, event_type: EventType) -> &'static str {
        match event_type {
            EventType::Ko => self.ko_title,
            EventType::PrizeTaken => self.prize_title,
            _ => self.attack_title,
        }
    }

    pub fn placeholder_tp_title(&self, seq: usize) -> String {
        format!("{}{}", self.placeholder_tp_title, seq)
    }

    pub fn mistake_description(&self, event_type: EventType) -> String {
        let tail = match event_type {
            EventType::Ko => self.mistake_ko,
            EventType::Supporter => self.mistake_supporter,
            _ => self.mistake_attack,
        };
        format!("{}{}", self.mistake_description_prefix, tail)
    }

    pub fn count_line(&self, parts: (&str, &str), count: usize) -> String {
        format!("{}{}{}", parts.0, count, parts.1)
    }

    pub fn low_conf_turning_point(&self, title: &str) -> String {
        format!("{}{}", self.low_conf_turning_point, title)
    }

    pub fn low_conf_mistake(&self, description: &str) -> String {
        format!("{}{}", self.low_conf_mistake, description)
    }

    pub fn observed_knockout(&self, target: &str) -> String {
        format!("{}{}{}", self.observed_knockout.0, target, self.observed_knockout.1)
    }

    pub fn unverifiable_ko_claim(&self, bullet: &str) -> String {
        format!("{}{}", self.unverifiable_ko_claim, bullet)
    }

    /// Whether a text carries one of this language's template markers
    pub fn is_marked(&self, text: &str) -> bool {
        self.markers.iter().any(|marker| text.contains(marker))
    }
}

/// Drop bullets carrying the other language's template markers
pub fn gate_bullets(bullets: Vec<String>, language: ReportLanguage) -> Vec<String> {
    let foreign = language.other().templates();
    bullets
        .into_iter()
        .filter(|bullet| !foreign.is_marked(bullet))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexicon;

    #[test]
    fn test_detect_language_threshold() {
        let lex = lexicon().unwrap();
        assert_eq!(detect_language(lex, "A robó una carta."), ReportLanguage::English);
        assert_eq!(
            detect_language(lex, "A robó una carta.\nB jugó Liza."),
            ReportLanguage::Spanish
        );
    }

    #[test]
    fn test_templates_do_not_cross_mark() {
        let phrases = |t: &Templates| {
            let mut all: Vec<String> = vec![
                t.ko_swing_title(Some("Latias ex")),
                t.ko_swing_title(None),
                t.concede_title.to_string(),
                t.event_impact.to_string(),
                t.fallback_tp_title.to_string(),
                t.placeholder_tp_title(1),
                t.mistake_description(EventType::Ko),
                t.mistake_why.to_string(),
                t.momentum.to_string(),
                t.hidden_info.to_string(),
            ];
            all.extend(t.fallback_summary.iter().map(|s| s.to_string()));
            all.extend(t.default_next_actions.iter().map(|s| s.to_string()));
            all
        };
        for phrase in phrases(&SPANISH) {
            assert!(!ENGLISH.is_marked(&phrase), "{phrase}");
        }
        for phrase in phrases(&ENGLISH) {
            assert!(!SPANISH.is_marked(&phrase), "{phrase}");
        }
    }

    #[test]
    fn test_gate_bullets_drops_foreign_templates() {
        let bullets = vec![
            "Observed 3 attack events in the log.".to_string(),
            "A presionó con ataques tempranos.".to_string(),
        ];
        let gated = gate_bullets(bullets, ReportLanguage::Spanish);
        assert_eq!(gated, vec!["A presionó con ataques tempranos."]);
    }
}
