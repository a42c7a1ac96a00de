//! Survey column names and the translation from raw rows to [`Record`]s.
//!
//! The spreadsheet export uses the Portuguese question text as column
//! names. Those strings only exist in this module; everything downstream
//! works with typed fields.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dates;
use crate::models::{Record, Role};

pub const TIMESTAMP: &str = "Carimbo de data/hora";
pub const EMAIL: &str = "Endereço de e-mail";
pub const NAME: &str = "Nome completo";
pub const PHONE: &str = "Telefone com DDD";
pub const ROLE: &str = "Você é?";
pub const PROGRAM: &str = "Qual o programa que está participando?";
pub const MEETINGS_HELD: &str = "Quantos encontros já foram realizados?";
pub const MEETING_NUMBER: &str = "1.2 Qual encontro foi realizado?";
pub const DURATION: &str = "1.3 Quantos minutos durou o encontro?";
pub const RATING: &str = "1.4 De 0 a 10 qual a nota que você dá para o encontro?";
pub const EXPERIENCE: &str = "1.5 Como foi a sua experiência no último encontro?";
pub const ENGAGEMENT: &str =
    "1.6 De 0 a 10 qual a nota que você dá para o engajamento da sua dupla?";
pub const SUGGESTION: &str = "1.7 Você tem alguma dúvida, comentário ou sugestão?";
pub const COMMENTS: &str = "Comentários Joule";
pub const EXISTING_FEEDBACK: &str = "Feedback AI";
pub const VALIDATION: &str = "Validação";

/// Fields every uploaded object must carry.
pub const REQUIRED_FIELDS: [&str; 5] = [TIMESTAMP, EMAIL, NAME, ROLE, PROGRAM];

const CANONICAL: [&str; 16] = [
    TIMESTAMP,
    EMAIL,
    NAME,
    PHONE,
    ROLE,
    PROGRAM,
    MEETINGS_HELD,
    MEETING_NUMBER,
    DURATION,
    RATING,
    EXPERIENCE,
    ENGAGEMENT,
    SUGGESTION,
    COMMENTS,
    EXISTING_FEEDBACK,
    VALIDATION,
];

const ALIASES: &[(&str, &str)] = &[
    ("timestamp", TIMESTAMP),
    ("email", EMAIL),
    ("e-mail", EMAIL),
    ("full name", NAME),
    ("name", NAME),
    ("phone", PHONE),
    ("role", ROLE),
    ("papel", ROLE),
    ("programa", PROGRAM),
    ("program", PROGRAM),
    ("validation", VALIDATION),
];

static LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("leading number pattern"));

/// Maps a raw header to its canonical spelling, matching on the trimmed,
/// lower-cased key.
pub fn canonical_header(key: &str) -> Option<&'static str> {
    let lookup = key.trim().to_lowercase();
    CANONICAL
        .iter()
        .copied()
        .find(|canonical| canonical.to_lowercase() == lookup)
        .or_else(|| {
            ALIASES
                .iter()
                .find(|(alias, _)| *alias == lookup)
                .map(|(_, canonical)| *canonical)
        })
}

/// Renames known headers to their canonical form. Unknown keys pass
/// through untouched.
pub fn normalize_keys<V>(row: impl IntoIterator<Item = (String, V)>) -> BTreeMap<String, V> {
    row.into_iter()
        .map(|(key, value)| match canonical_header(&key) {
            Some(canonical) => (canonical.to_string(), value),
            None => (key, value),
        })
        .collect()
}

/// Required fields absent from a normalized row.
pub fn missing_required<V>(row: &BTreeMap<String, V>) -> Vec<&'static str> {
    REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| !row.contains_key(*field))
        .collect()
}

/// Builds a typed record from a normalized row of cell text.
pub fn record_from_row(row: &BTreeMap<String, String>) -> Record {
    let text = |field: &str| row.get(field).map(|v| v.trim().to_string()).unwrap_or_default();
    let number = |field: &str| row.get(field).and_then(|v| parse_number(v));

    let extra = row
        .iter()
        .filter(|(key, _)| !CANONICAL.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Record {
        submitted_at: row.get(TIMESTAMP).and_then(|v| dates::try_parse_date(v)),
        email: text(EMAIL),
        name: text(NAME),
        phone: text(PHONE),
        role: Role::parse(&text(ROLE)),
        program: text(PROGRAM),
        has_met: row.get(MEETINGS_HELD).is_some_and(|v| is_completion_answer(v)),
        meeting_number: row.get(MEETING_NUMBER).and_then(|v| parse_meeting_number(v)),
        duration_minutes: number(DURATION),
        rating: number(RATING),
        experience: text(EXPERIENCE),
        engagement: number(ENGAGEMENT),
        suggestion: text(SUGGESTION),
        comments: text(COMMENTS),
        existing_feedback: text(EXISTING_FEEDBACK),
        validated: row.get(VALIDATION).is_some_and(|v| is_truthy(v)),
        extra,
    }
}

/// Numeric cell text; accepts a decimal comma.
pub fn parse_number(raw: &str) -> Option<f64> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    value.replace(',', ".").parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_meeting_number(raw: &str) -> Option<u32> {
    if let Some(number) = parse_number(raw) {
        return (number >= 0.0).then(|| number as u32);
    }
    LEADING_NUMBER
        .find(raw)
        .and_then(|m| m.as_str().parse().ok())
}

/// "Já realizei um ou mais encontro" and yes-like answers.
pub fn is_completion_answer(raw: &str) -> bool {
    let value = raw.trim().to_lowercase();
    value.starts_with("já realizei") || value.starts_with("ja realizei") || is_truthy(&value)
}

pub fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "true" | "verdadeiro" | "sim" | "yes" | "1"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        normalize_keys(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    #[test]
    fn maps_aliases_and_case_variants() {
        assert_eq!(canonical_header("  EMAIL "), Some(EMAIL));
        assert_eq!(canonical_header("você é?"), Some(ROLE));
        assert_eq!(canonical_header("Programa"), Some(PROGRAM));
        assert_eq!(canonical_header("validação"), Some(VALIDATION));
        assert_eq!(canonical_header("Favourite colour"), None);
    }

    #[test]
    fn unknown_keys_pass_through() {
        let normalized = row(&[("Name", "Avery"), ("Shirt size", "M")]);
        assert_eq!(normalized.get(NAME).map(String::as_str), Some("Avery"));
        assert_eq!(normalized.get("Shirt size").map(String::as_str), Some("M"));
    }

    #[test]
    fn builds_typed_record() {
        let record = record_from_row(&row(&[
            ("timestamp", "02/07/2025 17:49:52"),
            ("email", "avery@example.com"),
            ("name", "Avery Lee"),
            ("role", "Mentorado(a)"),
            ("program", "Instituto - Acelerando Carreiras (Turma 11)"),
            (MEETINGS_HELD, "Já realizei um ou mais encontro"),
            (MEETING_NUMBER, "3"),
            (DURATION, "45"),
            (RATING, "9,5"),
            (ENGAGEMENT, ""),
            (VALIDATION, "VERDADEIRO"),
            ("Shirt size", "M"),
        ]));

        assert!(record.submitted_at.is_some());
        assert_eq!(record.role, Role::Mentee);
        assert!(record.has_met);
        assert_eq!(record.meeting_number, Some(3));
        assert_eq!(record.duration_minutes, Some(45.0));
        assert_eq!(record.rating, Some(9.5));
        assert_eq!(record.engagement, None);
        assert!(record.validated);
        assert_eq!(record.extra.get("Shirt size").map(String::as_str), Some("M"));
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let record = record_from_row(&row(&[("email", "x@example.com")]));
        assert!(record.submitted_at.is_none());
        assert_eq!(record.name, "");
        assert!(!record.has_met);
        assert!(!record.validated);
        assert_eq!(record.rating_value(), 0.0);
    }

    #[test]
    fn reports_missing_required_fields() {
        let normalized = row(&[("email", "x@example.com"), ("name", "X")]);
        assert_eq!(missing_required(&normalized), vec![TIMESTAMP, ROLE, PROGRAM]);
    }

    #[test]
    fn meeting_number_reads_leading_digits() {
        assert_eq!(parse_meeting_number("2º encontro"), Some(2));
        assert_eq!(parse_meeting_number("nenhum"), None);
    }
}
