use std::fmt::Write;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, error};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{PulseError, Result};
use crate::models::{FeedbackItem, Insight, InsightKind, KpiGrowth, Kpis, Record};

pub const FEEDBACK_UNAVAILABLE: &str =
    "Could not generate the analysis right now. Please try again later.";
const RECENT_EXCERPTS: usize = 3;

/// A hosted text-completion model: prompt in, text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// `None` when no API key is configured.
    pub fn from_config(config: &Config, http: reqwest::Client) -> Option<Self> {
        let api_key = config.api_key.clone()?;
        Some(Self {
            http,
            api_key,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .http
            .post(format!("{}/models/{}:generateContent", self.base_url, self.model))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| PulseError::Generation(format!("API call failed: {e}")))?;

        let payload: Value = response
            .json()
            .await
            .map_err(|e| PulseError::Generation(format!("failed to read API response: {e}")))?;

        payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| PulseError::Generation("no text in API response".to_string()))
    }
}

/// Asks the model for 3 to 5 insights. Any failure becomes a single
/// synthetic error insight; nothing is retried.
pub async fn generate_insights(
    generator: &dyn TextGenerator,
    kpis: &Kpis,
    growth: &KpiGrowth,
    recent: &[FeedbackItem],
) -> Vec<Insight> {
    let request_id = Uuid::new_v4();
    let prompt = insights_prompt(kpis, growth, recent);

    let text = match generator.generate(&prompt).await {
        Ok(text) => text,
        Err(err) => {
            error!(%request_id, error = %err, "insight generation failed");
            return vec![connection_error()];
        }
    };
    debug!(%request_id, chars = text.len(), "insight response received");

    let document: Value = match serde_json::from_str(strip_code_fences(&text)) {
        Ok(document) => document,
        Err(err) => {
            error!(%request_id, error = %err, "insight response is not JSON");
            return vec![format_error()];
        }
    };

    match serde_json::from_value::<Vec<Insight>>(document) {
        Ok(insights) if !insights.is_empty() && insights.iter().all(is_complete) => insights,
        _ => {
            error!(%request_id, "insight response has an unexpected shape");
            vec![shape_error()]
        }
    }
}

/// Per-record coaching notes in Markdown, or a fixed fallback message.
pub async fn individual_feedback(generator: &dyn TextGenerator, record: &Record) -> String {
    let request_id = Uuid::new_v4();
    match generator.generate(&feedback_prompt(record)).await {
        Ok(text) => text,
        Err(err) => {
            error!(%request_id, email = %record.email, error = %err, "feedback generation failed");
            FEEDBACK_UNAVAILABLE.to_string()
        }
    }
}

pub fn insights_prompt(kpis: &Kpis, growth: &KpiGrowth, recent: &[FeedbackItem]) -> String {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "You analyse data from a career mentorship program and write actionable insights \
         for the program coordinators. Write titles and descriptions in Brazilian Portuguese."
    );
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Program KPIs:");
    let _ = writeln!(
        prompt,
        "- Mentor respondents: {} (growth {:.1}%)",
        kpis.unique_mentors, growth.unique_mentors
    );
    let _ = writeln!(
        prompt,
        "- Mentee respondents: {} (growth {:.1}%)",
        kpis.unique_mentees, growth.unique_mentees
    );
    let _ = writeln!(
        prompt,
        "- Completed meetings: {} (growth {:.1}%)",
        kpis.completed_meetings, growth.completed_meetings
    );
    let _ = writeln!(
        prompt,
        "- Average meeting rating: {}/10 (growth {:.1}%)",
        kpis.average_rating, growth.average_rating
    );
    let _ = writeln!(
        prompt,
        "- Average meeting duration: {} minutes (growth {:.1}%)",
        kpis.average_duration, growth.average_duration
    );
    let _ = writeln!(
        prompt,
        "- Average pair engagement: {}/10 (growth {:.1}%)",
        kpis.average_engagement, growth.average_engagement
    );
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Recent feedback:");
    if recent.is_empty() {
        let _ = writeln!(prompt, "No recent feedback available.");
    } else {
        for item in recent.iter().take(RECENT_EXCERPTS) {
            let _ = writeln!(
                prompt,
                "- Participant: {}, rating: {}, engagement: {}, experience: {}",
                item.participant(),
                item.rating(),
                item.engagement(),
                item.experience()
            );
        }
    }
    let _ = writeln!(prompt);
    let _ = writeln!(
        prompt,
        "Answer with a JSON array only. Each element has: \"type\" (positive, negative, \
         warning or neutral), \"title\", \"description\" and \"icon\" (one of award, star, \
         alert-circle, users, user-x, clock, trending-up, alert-triangle, check-circle). \
         Return between 3 and 5 insights, favouring actionable ones."
    );
    prompt
}

pub fn feedback_prompt(record: &Record) -> String {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "You are a mentorship program specialist reviewing one participant's feedback for the \
         coordinators. Be professional, empathetic and constructive, and answer in Brazilian \
         Portuguese."
    );
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Participant feedback:");
    let _ = writeln!(prompt, "- Name: {}", record.name);
    let _ = writeln!(prompt, "- Meeting number: {}", record.meeting_number.unwrap_or(0));
    let _ = writeln!(prompt, "- Meeting rating (0-10): {}", record.rating_value());
    let _ = writeln!(prompt, "- Pair engagement (0-10): {}", record.engagement_value());
    let _ = writeln!(prompt, "- Experience: \"{}\"", record.experience);
    let _ = writeln!(prompt, "- Questions or suggestions: \"{}\"", record.suggestion);
    let _ = writeln!(prompt);
    let _ = writeln!(
        prompt,
        "Reply in Markdown with these sections: \"### Sentiment\" (positive, neutral or needs \
         attention, justified in one sentence), \"### Highlights\" (1-2 bullets), \
         \"### Points of attention\" (1-2 bullets) and \"### Suggested actions\" (1-2 concrete \
         actions for the coordinator). Say so explicitly when a section has nothing to report."
    );
    prompt
}

/// Removes a surrounding ```json fence, if any.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn is_complete(insight: &Insight) -> bool {
    [&insight.title, &insight.description, &insight.icon]
        .iter()
        .all(|field| !field.trim().is_empty())
}

fn connection_error() -> Insight {
    error_insight(
        "Insight service unavailable",
        "Could not generate insights right now. Check the connection or the API key.",
    )
}

fn format_error() -> Insight {
    error_insight(
        "Unreadable API response",
        "The API response could not be processed because its JSON is malformed.",
    )
}

fn shape_error() -> Insight {
    error_insight(
        "Unexpected insight format",
        "The API returned insights in an unexpected format. Check the configuration or try again.",
    )
}

fn error_insight(title: &str, description: &str) -> Insight {
    Insight {
        kind: InsightKind::Negative,
        title: title.to_string(),
        description: description.to_string(),
        icon: "alert-circle".to_string(),
    }
}
