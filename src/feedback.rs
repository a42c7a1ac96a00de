use std::cmp::Ordering;

use crate::models::{FeedbackItem, Record, Sentiment};
use crate::sentiment::classify;

/// Completed meetings, newest first, each tagged with its sentiment.
/// Records with an unparsed timestamp sort last.
pub fn recent_feedback(records: &[Record], limit: Option<usize>) -> Vec<FeedbackItem> {
    let mut completed: Vec<&Record> = records.iter().filter(|record| record.has_met).collect();
    completed.sort_by(|a, b| newest_first(a, b));

    completed
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(|record| FeedbackItem {
            record: record.clone(),
            sentiment: classify(record),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SentimentBreakdown {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

pub fn sentiment_breakdown(items: &[FeedbackItem]) -> SentimentBreakdown {
    items
        .iter()
        .fold(SentimentBreakdown::default(), |mut acc, item| {
            match item.sentiment {
                Sentiment::Positive => acc.positive += 1,
                Sentiment::Neutral => acc.neutral += 1,
                Sentiment::Negative => acc.negative += 1,
            }
            acc
        })
}

fn newest_first(a: &Record, b: &Record) -> Ordering {
    match (a.submitted_at, b.submitted_at) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
