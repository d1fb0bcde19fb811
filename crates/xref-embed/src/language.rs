//! # Language Heuristics
//!
//! Audit material arrives in French and English. The language guess only
//! selects which abbreviation table is expanded before encoding; the
//! encoder itself is multilingual and is never switched.

use serde::{Deserialize, Serialize};

/// Source language of a requirement text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    French,
    English,
}

impl Language {
    /// ISO 639-1 code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::French => "fr",
            Self::English => "en",
        }
    }

    fn abbreviations(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::French => FRENCH_ABBREVIATIONS,
            Self::English => ENGLISH_ABBREVIATIONS,
        }
    }
}

const FRENCH_KEYWORDS: [&str; 15] = [
    "sécurité",
    "conformité",
    "exigence",
    "politique",
    "procédure",
    "risque",
    "contrôle",
    "audit",
    "réglementation",
    "protection",
    "données",
    "information",
    "système",
    "mesure",
    "gestion",
];

const ENGLISH_KEYWORDS: [&str; 15] = [
    "security",
    "compliance",
    "requirement",
    "policy",
    "procedure",
    "risk",
    "control",
    "audit",
    "regulation",
    "protection",
    "data",
    "information",
    "system",
    "measure",
    "management",
];

const FRENCH_ABBREVIATIONS: &[(&str, &str)] = &[
    ("ssi", "système de sécurité de l'information"),
    ("rgpd", "règlement général sur la protection des données"),
    ("cnil", "commission nationale de l'informatique et des libertés"),
    ("anssi", "agence nationale de la sécurité des systèmes d'information"),
    ("dpo", "délégué à la protection des données"),
    ("rssi", "responsable de la sécurité des systèmes d'information"),
];

const ENGLISH_ABBREVIATIONS: &[(&str, &str)] = &[
    ("isms", "information security management system"),
    ("gdpr", "general data protection regulation"),
    ("soc", "security operations center"),
    ("iam", "identity and access management"),
    ("pki", "public key infrastructure"),
    ("siem", "security information and event management"),
    ("mfa", "multi-factor authentication"),
    ("rbac", "role-based access control"),
    ("ciso", "chief information security officer"),
];

/// Guess the language of `text`.
///
/// Counts how many of the French and English compliance keywords occur in
/// the lowercased text. French wins only on a strictly greater count, so
/// ties and keyword-free text resolve to English.
pub fn detect_language(text: &str) -> Language {
    let lower = text.to_lowercase();
    let score = |keywords: &[&str]| keywords.iter().filter(|k| lower.contains(*k)).count();
    if score(&FRENCH_KEYWORDS) > score(&ENGLISH_KEYWORDS) {
        Language::French
    } else {
        Language::English
    }
}

/// Replace whole-word abbreviations of `language` with their expansion.
///
/// Matching is case-insensitive on word boundaries (runs of alphanumeric
/// characters). Everything else in the text is preserved byte for byte.
pub fn expand_abbreviations(text: &str, language: Language) -> String {
    let table = language.abbreviations();
    let mut out = String::with_capacity(text.len());
    let mut word_start: Option<usize> = None;

    let flush = |out: &mut String, word: &str| {
        let lower = word.to_lowercase();
        match table.iter().find(|(abbr, _)| *abbr == lower) {
            Some((_, expansion)) => out.push_str(expansion),
            None => out.push_str(word),
        }
    };

    for (idx, ch) in text.char_indices() {
        if ch.is_alphanumeric() {
            if word_start.is_none() {
                word_start = Some(idx);
            }
        } else {
            if let Some(start) = word_start.take() {
                flush(&mut out, &text[start..idx]);
            }
            out.push(ch);
        }
    }
    if let Some(start) = word_start {
        flush(&mut out, &text[start..]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn french_detected_on_strict_majority() {
        let text = "La politique de sécurité et la gestion des risques sont conformes.";
        assert_eq!(detect_language(text), Language::French);
    }

    #[test]
    fn ties_resolve_to_english() {
        // "audit", "protection", "information" appear in both tables.
        assert_eq!(detect_language("audit protection information"), Language::English);
        assert_eq!(detect_language(""), Language::English);
    }

    #[test]
    fn english_detected() {
        let text = "The security policy shall define access control procedures.";
        assert_eq!(detect_language(text), Language::English);
    }

    #[test]
    fn expands_whole_words_case_insensitively() {
        let out = expand_abbreviations("Le RGPD impose un DPO.", Language::French);
        assert_eq!(
            out,
            "Le règlement général sur la protection des données impose un \
             délégué à la protection des données."
        );
    }

    #[test]
    fn does_not_expand_inside_words() {
        let out = expand_abbreviations("Associated socket", Language::English);
        assert_eq!(out, "Associated socket");
        let out = expand_abbreviations("SOC-2 and soc", Language::English);
        assert_eq!(
            out,
            "security operations center-2 and security operations center"
        );
    }

    #[test]
    fn tables_are_language_specific() {
        assert_eq!(expand_abbreviations("GDPR", Language::French), "GDPR");
        assert_eq!(expand_abbreviations("RGPD", Language::English), "RGPD");
    }

    #[test]
    fn non_ascii_boundaries_preserved() {
        let out = expand_abbreviations("Rôle du RSSI : pilotage", Language::French);
        assert_eq!(
            out,
            "Rôle du responsable de la sécurité des systèmes d'information : pilotage"
        );
    }
}
