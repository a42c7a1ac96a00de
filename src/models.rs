use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Mentor,
    Mentee,
    Other(String),
}

impl Role {
    /// Accepts the survey answers ("Mentor(a)", "Mentorado(a)") and plain
    /// English spellings. Anything else is kept verbatim.
    pub fn parse(raw: &str) -> Role {
        let value = raw.trim();
        let lower = value.to_lowercase();
        // "mentorado" starts with "mentor", so mentees are checked first.
        if lower.starts_with("mentorad") || lower == "mentee" {
            Role::Mentee
        } else if lower.starts_with("mentor") {
            Role::Mentor
        } else {
            Role::Other(value.to_string())
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Mentor => write!(f, "Mentor"),
            Role::Mentee => write!(f, "Mentee"),
            Role::Other(value) => write!(f, "{value}"),
        }
    }
}

/// One survey submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// `None` when the timestamp could not be parsed.
    pub submitted_at: Option<NaiveDateTime>,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub role: Role,
    pub program: String,
    pub has_met: bool,
    pub meeting_number: Option<u32>,
    pub duration_minutes: Option<f64>,
    pub rating: Option<f64>,
    pub experience: String,
    pub engagement: Option<f64>,
    pub suggestion: String,
    pub comments: String,
    pub existing_feedback: String,
    pub validated: bool,
    pub extra: BTreeMap<String, String>,
}

impl Record {
    pub fn rating_value(&self) -> f64 {
        self.rating.unwrap_or(0.0)
    }

    pub fn engagement_value(&self) -> f64 {
        self.engagement.unwrap_or(0.0)
    }

    pub fn duration_value(&self) -> f64 {
        self.duration_minutes.unwrap_or(0.0)
    }

    /// Feedback already recorded on the sheet. Blank cells and the "."
    /// placeholder count as none.
    pub fn prior_feedback(&self) -> Option<&str> {
        let text = self.existing_feedback.trim();
        (!text.is_empty() && text != ".").then_some(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub struct FeedbackItem {
    pub record: Record,
    pub sentiment: Sentiment,
}

impl FeedbackItem {
    pub fn participant(&self) -> &str {
        &self.record.name
    }

    pub fn email(&self) -> &str {
        &self.record.email
    }

    pub fn rating(&self) -> f64 {
        self.record.rating_value()
    }

    pub fn engagement(&self) -> f64 {
        self.record.engagement_value()
    }

    pub fn experience(&self) -> &str {
        &self.record.experience
    }

    pub fn feedback(&self) -> Option<&str> {
        self.record.prior_feedback()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Kpis {
    pub total_records: usize,
    pub unique_participants: usize,
    pub mentor_records: usize,
    pub mentee_records: usize,
    pub unique_mentors: usize,
    pub unique_mentees: usize,
    pub completed_meetings: usize,
    pub average_rating: f64,
    pub average_engagement: f64,
    pub average_duration: f64,
    pub validated: usize,
}

/// Percent change per KPI between two equal-length windows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KpiGrowth {
    pub total_records: f64,
    pub unique_participants: f64,
    pub mentor_records: f64,
    pub mentee_records: f64,
    pub unique_mentors: f64,
    pub unique_mentees: f64,
    pub completed_meetings: f64,
    pub average_rating: f64,
    pub average_engagement: f64,
    pub average_duration: f64,
    pub validated: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub name: String,
    pub value: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartData {
    pub rating_distribution: Vec<Bucket>,
    pub program_distribution: Vec<Bucket>,
    pub engagement_distribution: Vec<Bucket>,
    pub duration_distribution: Vec<Bucket>,
    pub role_distribution: Vec<Bucket>,
    pub meeting_distribution: Vec<Bucket>,
}

/// Unknown kinds from the model read as `Neutral`; a blank kind is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum InsightKind {
    Positive,
    Negative,
    Warning,
    Neutral,
}

impl TryFrom<String> for InsightKind {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        match raw.trim().to_lowercase().as_str() {
            "" => Err("insight type is empty".to_string()),
            "positive" => Ok(InsightKind::Positive),
            "negative" => Ok(InsightKind::Negative),
            "warning" => Ok(InsightKind::Warning),
            _ => Ok(InsightKind::Neutral),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantSummary {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub program: String,
    pub record_count: usize,
    pub latest_meeting: Option<u32>,
    pub average_rating: Option<f64>,
    pub average_engagement: Option<f64>,
    pub validated: bool,
}
