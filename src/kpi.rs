use std::collections::HashSet;

use crate::models::{Kpis, Record, Role};

/// Reduces a record snapshot to the dashboard KPIs.
///
/// A meeting counts as completed when the respondent answered that at least
/// one meeting took place. Ratings, engagement and durations only enter
/// their averages when strictly positive; zero means "not reported".
pub fn calculate_kpis(records: &[Record]) -> Kpis {
    let mut participants = HashSet::new();
    let mut mentors = HashSet::new();
    let mut mentees = HashSet::new();
    let mut kpis = Kpis {
        total_records: records.len(),
        ..Kpis::default()
    };

    for record in records {
        participants.insert(record.email.as_str());
        match record.role {
            Role::Mentor => {
                kpis.mentor_records += 1;
                mentors.insert(record.email.as_str());
            }
            Role::Mentee => {
                kpis.mentee_records += 1;
                mentees.insert(record.email.as_str());
            }
            Role::Other(_) => {}
        }
        if record.has_met {
            kpis.completed_meetings += 1;
        }
        if record.validated {
            kpis.validated += 1;
        }
    }

    kpis.unique_participants = participants.len();
    kpis.unique_mentors = mentors.len();
    kpis.unique_mentees = mentees.len();
    kpis.average_rating = round_to(positive_mean(records.iter().map(Record::rating_value)), 1);
    kpis.average_engagement =
        round_to(positive_mean(records.iter().map(Record::engagement_value)), 1);
    kpis.average_duration = round_to(positive_mean(records.iter().map(Record::duration_value)), 0);
    kpis
}

/// Mean of the strictly positive values, or 0 when there are none.
pub fn positive_mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .filter(|value| *value > 0.0)
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
