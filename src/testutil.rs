use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{Record, Role};

/// A completed meeting on `day` (YYYY-MM-DD) at 10:00 with neutral scores.
pub fn sample_record(email: &str, role: Role, day: &str) -> Record {
    let submitted_at = NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(10, 0, 0));

    Record {
        submitted_at,
        email: email.to_string(),
        name: email.split('@').next().unwrap_or_default().to_string(),
        phone: String::new(),
        role,
        program: "Instituto Embraer - Acelerando Carreiras (Turma 11)".to_string(),
        has_met: true,
        meeting_number: Some(1),
        duration_minutes: Some(60.0),
        rating: Some(7.0),
        experience: String::new(),
        engagement: Some(7.0),
        suggestion: String::new(),
        comments: String::new(),
        existing_feedback: String::new(),
        validated: false,
        extra: BTreeMap::new(),
    }
}
