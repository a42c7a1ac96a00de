use std::fmt::Write;

use crate::charts::{generate_chart_data, ChartOptions};
use crate::feedback::{recent_feedback, sentiment_breakdown, SentimentBreakdown};
use crate::filter::{DateWindow, FilterSet};
use crate::growth::calculate_growth;
use crate::kpi::calculate_kpis;
use crate::models::{Bucket, ChartData, FeedbackItem, Insight, KpiGrowth, Kpis, ParticipantSummary, Record};
use crate::participants::participant_summaries;

const RECENT_FEEDBACK: usize = 10;
const BAR_WIDTH: usize = 30;

/// Everything the dashboard shows for one filter state.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub scope: String,
    pub window: Option<DateWindow>,
    pub kpis: Kpis,
    pub growth: KpiGrowth,
    pub charts: ChartData,
    pub recent: Vec<FeedbackItem>,
    pub sentiment: SentimentBreakdown,
    pub participants: Vec<ParticipantSummary>,
}

impl Dashboard {
    /// Recomputes every aggregate from scratch for `filters`. Growth needs a
    /// window and stays at zero without one.
    pub fn assemble(
        records: &[Record],
        filters: &FilterSet,
        window: Option<DateWindow>,
        options: ChartOptions,
    ) -> Self {
        let filtered = match &window {
            Some(window) => filters.with_window(window).apply(records),
            None => filters.apply(records),
        };
        let growth = window
            .as_ref()
            .map(|window| calculate_growth(records, filters, window))
            .unwrap_or_default();
        let all_feedback = recent_feedback(&filtered, None);

        Self {
            scope: describe_scope(filters),
            window,
            kpis: calculate_kpis(&filtered),
            growth,
            charts: generate_chart_data(&filtered, options),
            sentiment: sentiment_breakdown(&all_feedback),
            recent: all_feedback.into_iter().take(RECENT_FEEDBACK).collect(),
            participants: participant_summaries(&filtered),
        }
    }
}

pub fn describe_scope(filters: &FilterSet) -> String {
    use crate::filter::Selection;

    let mut parts = Vec::new();
    if !filters.search.trim().is_empty() {
        parts.push(format!("search \"{}\"", filters.search.trim()));
    }
    if let Selection::Only(role) = &filters.role {
        parts.push(format!("role {role}"));
    }
    if let Selection::Only(program) = &filters.program {
        parts.push(format!("program {}", program.trim()));
    }
    if parts.is_empty() {
        "all participants".to_string()
    } else {
        parts.join(", ")
    }
}

pub fn kpi_lines(kpis: &Kpis, growth: &KpiGrowth) -> Vec<(String, String, f64)> {
    vec![
        ("Responses".into(), kpis.total_records.to_string(), growth.total_records),
        ("Participants".into(), kpis.unique_participants.to_string(), growth.unique_participants),
        ("Mentor respondents".into(), kpis.unique_mentors.to_string(), growth.unique_mentors),
        ("Mentee respondents".into(), kpis.unique_mentees.to_string(), growth.unique_mentees),
        ("Completed meetings".into(), kpis.completed_meetings.to_string(), growth.completed_meetings),
        ("Average rating".into(), format!("{}/10", kpis.average_rating), growth.average_rating),
        ("Average duration".into(), format!("{}min", kpis.average_duration), growth.average_duration),
        ("Average engagement".into(), format!("{}/10", kpis.average_engagement), growth.average_engagement),
        ("Validated".into(), kpis.validated.to_string(), growth.validated),
    ]
}

pub fn build_report(dashboard: &Dashboard, insights: Option<&[Insight]>) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Mentorship Program Dashboard");
    match &dashboard.window {
        Some(window) => {
            let _ = writeln!(
                output,
                "Generated for {} (responses from {} to {})",
                dashboard.scope,
                window.start.date(),
                window.end.date()
            );
        }
        None => {
            let _ = writeln!(output, "Generated for {} (all dates)", dashboard.scope);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Key Indicators");
    let _ = writeln!(output, "| Indicator | Value | Change |");
    let _ = writeln!(output, "|---|---|---|");
    for (label, value, change) in kpi_lines(&dashboard.kpis, &dashboard.growth) {
        let _ = writeln!(output, "| {label} | {value} | {change:+.1}% |");
    }

    let charts = &dashboard.charts;
    write_buckets(&mut output, "Rating Distribution", &charts.rating_distribution);
    write_buckets(&mut output, "Program Distribution", &charts.program_distribution);
    write_buckets(&mut output, "Engagement Distribution", &charts.engagement_distribution);
    write_buckets(&mut output, "Meeting Duration", &charts.duration_distribution);
    write_buckets(&mut output, "Mentors and Mentees", &charts.role_distribution);
    write_buckets(&mut output, "Meetings Held", &charts.meeting_distribution);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Sentiment");
    let _ = writeln!(
        output,
        "- positive: {}\n- neutral: {}\n- negative: {}",
        dashboard.sentiment.positive, dashboard.sentiment.neutral, dashboard.sentiment.negative
    );

    if let Some(insights) = insights {
        let _ = writeln!(output);
        let _ = writeln!(output, "## AI Insights");
        for insight in insights {
            let _ = writeln!(
                output,
                "- **{}** ({:?}, {}): {}",
                insight.title, insight.kind, insight.icon, insight.description
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Feedback");
    if dashboard.recent.is_empty() {
        let _ = writeln!(output, "No feedback recorded for this selection.");
    } else {
        for item in &dashboard.recent {
            let when = item
                .record
                .submitted_at
                .map(|at| at.format("%d/%m/%Y %H:%M").to_string())
                .unwrap_or_else(|| "unknown date".to_string());
            let _ = writeln!(
                output,
                "- {} ({}) on {} [{}] rating {}, engagement {}: {}",
                item.participant(),
                item.email(),
                when,
                item.sentiment,
                item.rating(),
                item.engagement(),
                item.experience()
            );
            if let Some(feedback) = item.feedback() {
                let _ = writeln!(output, "  - Feedback: {feedback}");
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Participants");
    if dashboard.participants.is_empty() {
        let _ = writeln!(output, "No participants found.");
    } else {
        let _ = writeln!(output, "| Name | Email | Role | Program | Meeting | Rating | Status |");
        let _ = writeln!(output, "|---|---|---|---|---|---|---|");
        for participant in &dashboard.participants {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} | {} |",
                participant.name,
                participant.email,
                participant.role,
                participant.program,
                participant
                    .latest_meeting
                    .map_or("N/A".to_string(), |n| n.to_string()),
                participant
                    .average_rating
                    .map_or("N/A".to_string(), |r| format!("{r}/10")),
                if participant.validated { "Validated" } else { "Pending" }
            );
        }
    }

    output
}

pub fn write_buckets(output: &mut String, title: &str, buckets: &[Bucket]) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## {title}");
    if buckets.is_empty() {
        let _ = writeln!(output, "No data.");
        return;
    }
    let max = buckets.iter().map(|b| b.value).max().unwrap_or(0).max(1);
    for bucket in buckets {
        let width = (bucket.value * BAR_WIDTH).div_ceil(max);
        let _ = writeln!(
            output,
            "- {:<24} {} {}",
            bucket.name,
            "#".repeat(width),
            bucket.value
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Selection;
    use crate::growth::window_for_days;
    use crate::models::{InsightKind, Role};
    use crate::testutil::sample_record;
    use chrono::NaiveDate;

    fn records() -> Vec<Record> {
        let mut happy = sample_record("avery@example.com", Role::Mentor, "2024-03-12");
        happy.rating = Some(9.0);
        happy.engagement = Some(9.0);
        happy.experience = "Excelente conversa".to_string();
        happy.existing_feedback = "Manter a cadência".to_string();
        vec![
            sample_record("jules@example.com", Role::Mentee, "2024-03-02"),
            happy,
            sample_record("kiara@example.com", Role::Mentee, "2024-03-15"),
        ]
    }

    #[test]
    fn assembles_window_and_growth() {
        let window = window_for_days(
            NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
        );
        let dashboard = Dashboard::assemble(
            &records(),
            &FilterSet::default(),
            window,
            ChartOptions::default(),
        );
        assert_eq!(dashboard.kpis.total_records, 2);
        assert_eq!(dashboard.growth.total_records, 100.0);
        assert_eq!(dashboard.sentiment.positive, 1);
        assert_eq!(dashboard.participants.len(), 2);
    }

    #[test]
    fn report_lists_sections() {
        let filters = FilterSet {
            role: Selection::Only(Role::Mentor),
            ..FilterSet::default()
        };
        let dashboard = Dashboard::assemble(&records(), &filters, None, ChartOptions::default());
        let insights = vec![Insight {
            kind: InsightKind::Positive,
            title: "Alta satisfação".to_string(),
            description: "Notas altas".to_string(),
            icon: "award".to_string(),
        }];
        let report = build_report(&dashboard, Some(&insights));

        assert!(report.contains("Generated for role Mentor (all dates)"));
        assert!(report.contains("| Responses | 1 | +0.0% |"));
        assert!(report.contains("## Meeting Duration"));
        assert!(report.contains("**Alta satisfação**"));
        assert!(report.contains("avery@example.com"));
        assert!(report.contains("  - Feedback: Manter a cadência"));
        assert!(!report.contains("jules@example.com"));
    }

    #[test]
    fn empty_selection_renders_placeholders() {
        let dashboard = Dashboard::assemble(&[], &FilterSet::default(), None, ChartOptions::default());
        let report = build_report(&dashboard, None);
        assert!(report.contains("No feedback recorded for this selection."));
        assert!(report.contains("No participants found."));
        assert!(!report.contains("## AI Insights"));
    }
}
