use crate::kpi::{positive_mean, round_to};
use crate::models::{ParticipantSummary, Record};

/// One summary per email, in the order participants first appear.
pub fn participant_summaries(records: &[Record]) -> Vec<ParticipantSummary> {
    let mut order: Vec<&str> = Vec::new();
    for record in records {
        if !order.contains(&record.email.as_str()) {
            order.push(record.email.as_str());
        }
    }

    order
        .into_iter()
        .filter_map(|email| {
            let own: Vec<&Record> = records.iter().filter(|r| r.email == email).collect();
            summarize(email, &own)
        })
        .collect()
}

/// A participant's records that carry an experience narrative.
pub fn records_for<'a>(records: &'a [Record], email: &str) -> Vec<&'a Record> {
    let email = email.trim().to_lowercase();
    records
        .iter()
        .filter(|r| r.email.to_lowercase() == email && !r.experience.trim().is_empty())
        .collect()
}

fn summarize(email: &str, own: &[&Record]) -> Option<ParticipantSummary> {
    let first = own.first()?;
    let latest_meeting = own.iter().filter_map(|r| r.meeting_number).max();

    Some(ParticipantSummary {
        email: email.to_string(),
        name: first.name.clone(),
        role: first.role.clone(),
        program: first.program.clone(),
        record_count: own.len(),
        latest_meeting,
        average_rating: reported_mean(own.iter().map(|r| r.rating_value())),
        average_engagement: reported_mean(own.iter().map(|r| r.engagement_value())),
        validated: own.iter().any(|r| r.validated),
    })
}

fn reported_mean(values: impl Iterator<Item = f64> + Clone) -> Option<f64> {
    values
        .clone()
        .any(|value| value > 0.0)
        .then(|| round_to(positive_mean(values), 1))
}
