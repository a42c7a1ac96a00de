use crate::models::{Record, Sentiment};

const POSITIVE_KEYWORDS: &[&str] = &[
    "excelente",
    "ótimo",
    "bom",
    "bacana",
    "incrível",
    "esclarecedor",
    "produtivo",
    "positivo",
    "maravilhoso",
];

const NEGATIVE_KEYWORDS: &[&str] = &[
    "ruim",
    "problema",
    "dificuldade",
    "esperava mais",
    "poderia",
    "falta",
    "desmarcado",
];

/// Scores decide first; the experience text is only read for middling scores.
pub fn classify(record: &Record) -> Sentiment {
    let rating = record.rating_value();
    let engagement = record.engagement_value();

    if rating >= 8.0 && engagement >= 8.0 {
        return Sentiment::Positive;
    }
    if rating <= 5.0 || engagement <= 5.0 {
        return Sentiment::Negative;
    }

    let text = record.experience.to_lowercase();
    if POSITIVE_KEYWORDS.iter().any(|keyword| text.contains(keyword)) {
        Sentiment::Positive
    } else if NEGATIVE_KEYWORDS.iter().any(|keyword| text.contains(keyword)) {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::testutil::sample_record;

    fn scored(rating: Option<f64>, engagement: Option<f64>, experience: &str) -> Record {
        let mut record = sample_record("a@example.com", Role::Mentee, "2024-03-01");
        record.rating = rating;
        record.engagement = engagement;
        record.experience = experience.to_string();
        record
    }

    #[test]
    fn high_scores_are_positive() {
        assert_eq!(classify(&scored(Some(8.0), Some(9.0), "ruim")), Sentiment::Positive);
    }

    #[test]
    fn any_low_score_is_negative() {
        assert_eq!(classify(&scored(Some(9.0), Some(5.0), "Excelente")), Sentiment::Negative);
        assert_eq!(classify(&scored(None, Some(9.0), "")), Sentiment::Negative);
    }

    #[test]
    fn middle_scores_fall_back_to_keywords() {
        assert_eq!(
            classify(&scored(Some(7.0), Some(7.0), "Foi ÓTIMO conversar")),
            Sentiment::Positive
        );
        assert_eq!(
            classify(&scored(Some(7.0), Some(6.0), "Encontro desmarcado duas vezes")),
            Sentiment::Negative
        );
        assert_eq!(
            classify(&scored(Some(6.0), Some(7.0), "Conversamos sobre carreira")),
            Sentiment::Neutral
        );
    }

    #[test]
    fn positive_keywords_win_over_negative() {
        assert_eq!(
            classify(&scored(Some(7.0), Some(7.0), "Bom, mas poderia ser mais longo")),
            Sentiment::Positive
        );
    }
}
