use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{ArgGroup, Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod charts;
mod config;
mod dates;
mod error;
mod feedback;
mod filter;
mod growth;
mod headers;
mod ingest;
mod insights;
mod kpi;
mod models;
mod participants;
mod report;
mod sentiment;
mod state;
#[cfg(test)]
mod testutil;

use charts::ChartOptions;
use config::Config;
use filter::{DateWindow, FilterSet, Selection};
use ingest::DataSource;
use insights::{GeminiClient, TextGenerator};
use models::Role;
use report::Dashboard;
use state::{AppState, LoadOutcome};

#[derive(Parser)]
#[command(name = "mentorship-pulse")]
#[command(about = "Analytics for mentorship program survey responses", long_about = None)]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,
    #[command(flatten)]
    filters: FilterArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
#[command(group(
    ArgGroup::new("source")
        .args(["csv_url", "csv", "json", "mock"])
        .multiple(false)
))]
struct SourceArgs {
    /// Published spreadsheet CSV URL (defaults to MENTORSHIP_SHEET_CSV_URL)
    #[arg(long)]
    csv_url: Option<String>,
    /// Local CSV export
    #[arg(long)]
    csv: Option<PathBuf>,
    /// JSON upload: an array of response objects
    #[arg(long)]
    json: Option<PathBuf>,
    /// Use the bundled mock responses
    #[arg(long)]
    mock: bool,
    /// Generative API key (defaults to GEMINI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,
}

#[derive(Args)]
struct FilterArgs {
    /// Case-insensitive substring of name or email
    #[arg(long, default_value = "")]
    search: String,
    /// Mentor or Mentee
    #[arg(long)]
    role: Option<String>,
    #[arg(long)]
    program: Option<String>,
    /// First day, inclusive (DD/MM/YYYY or YYYY-MM-DD)
    #[arg(long, value_parser = parse_day)]
    from: Option<NaiveDate>,
    /// Last day, inclusive (DD/MM/YYYY or YYYY-MM-DD)
    #[arg(long, value_parser = parse_day)]
    to: Option<NaiveDate>,
    /// Only the last N days; ignored when --from or --to is given
    #[arg(long)]
    since_days: Option<u64>,
    /// Group programs by cohort label in charts
    #[arg(long)]
    short_programs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print KPIs with growth against the previous period
    Kpis,
    /// Print every chart distribution
    Charts,
    /// List recent feedback with sentiment
    Feedback {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Summarize every participant
    Participants,
    /// Show one participant's feedback
    Participant {
        #[arg(long)]
        email: String,
        /// Ask the generative API for an analysis of each record
        #[arg(long)]
        ai: bool,
    },
    /// Generate AI insights for the selection
    Insights,
    /// Write the full dashboard as markdown
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        /// Include AI insights
        #[arg(long)]
        ai: bool,
    },
}

fn parse_day(raw: &str) -> Result<NaiveDate, String> {
    let parsed = dates::parse_date(raw);
    if parsed == dates::epoch() {
        return Err(format!("unrecognized date: {raw}"));
    }
    Ok(parsed.date())
}

impl SourceArgs {
    fn resolve(&self, config: &Config) -> DataSource {
        if self.mock {
            DataSource::Mock
        } else if let Some(path) = &self.json {
            DataSource::Upload(path.clone())
        } else if let Some(path) = &self.csv {
            DataSource::CsvFile(path.clone())
        } else if let Some(url) = self.csv_url.as_ref().or(config.sheet_csv_url.as_ref()) {
            DataSource::SheetUrl(url.clone())
        } else {
            DataSource::Mock
        }
    }
}

impl FilterArgs {
    fn filter_set(&self) -> FilterSet {
        FilterSet {
            search: self.search.clone(),
            role: Selection::from_option(self.role.as_deref().map(Role::parse)),
            program: Selection::from_option(self.program.clone()),
            start: None,
            end: None,
        }
    }

    fn window(&self, records: &[models::Record]) -> anyhow::Result<Option<DateWindow>> {
        let today = Local::now().date_naive();
        if self.from.is_some() || self.to.is_some() {
            let span = growth::data_span(records);
            let start = self
                .from
                .or_else(|| span.map(|s| s.start.date()))
                .unwrap_or(today);
            let end = self.to.unwrap_or(today);
            return Ok(growth::window_for_days(start, end));
        }
        match self.since_days {
            Some(days) => growth::window_since_days(today, days)
                .map(Some)
                .with_context(|| format!("--since-days {days} is out of range")),
            None => Ok(None),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(key) = cli.source.api_key.clone() {
        config.api_key = Some(key);
    }

    let http = reqwest::Client::new();
    let source = cli.source.resolve(&config);
    let mut state = AppState::new(config);

    let ticket = state.begin_load();
    let loaded = source.load(&http).await;
    match state.finish_load(ticket, loaded) {
        LoadOutcome::Applied(count) => info!(count, source = %source, "data ready"),
        LoadOutcome::Stale => anyhow::bail!("load superseded by a newer request"),
        LoadOutcome::Rejected => anyhow::bail!(
            "failed to load {}: {}",
            source,
            state.last_error().unwrap_or("unknown error")
        ),
    }

    let records = state.records();
    let filters = cli.filters.filter_set();
    let window = cli.filters.window(records)?;
    let options = ChartOptions {
        shorten_programs: cli.filters.short_programs,
    };
    let dashboard = Dashboard::assemble(records, &filters, window, options);
    let generator = GeminiClient::from_config(state.config(), http.clone());

    match cli.command {
        Commands::Kpis => {
            println!("KPIs for {}:", dashboard.scope);
            for (label, value, change) in report::kpi_lines(&dashboard.kpis, &dashboard.growth) {
                println!("- {label}: {value} ({change:+.1}%)");
            }
        }
        Commands::Charts => {
            let mut output = String::new();
            let charts = &dashboard.charts;
            report::write_buckets(&mut output, "Rating Distribution", &charts.rating_distribution);
            report::write_buckets(&mut output, "Program Distribution", &charts.program_distribution);
            report::write_buckets(
                &mut output,
                "Engagement Distribution",
                &charts.engagement_distribution,
            );
            report::write_buckets(&mut output, "Meeting Duration", &charts.duration_distribution);
            report::write_buckets(&mut output, "Mentors and Mentees", &charts.role_distribution);
            report::write_buckets(&mut output, "Meetings Held", &charts.meeting_distribution);
            print!("{output}");
        }
        Commands::Feedback { limit } => {
            let filtered = match &window {
                Some(window) => filters.with_window(window).apply(records),
                None => filters.apply(records),
            };
            let items = feedback::recent_feedback(&filtered, Some(limit));
            if items.is_empty() {
                println!("No feedback recorded for this selection.");
                return Ok(());
            }
            for item in items {
                println!(
                    "- [{}] {} ({}) rating {} engagement {}: {}",
                    item.sentiment,
                    item.participant(),
                    item.email(),
                    item.rating(),
                    item.engagement(),
                    item.experience()
                );
                if let Some(feedback) = item.feedback() {
                    println!("  feedback: {feedback}");
                }
            }
        }
        Commands::Participants => {
            if dashboard.participants.is_empty() {
                println!("No participants found.");
                return Ok(());
            }
            for participant in &dashboard.participants {
                println!(
                    "- {} ({}, {}) {} responses, rating {}, {}",
                    participant.name,
                    participant.email,
                    participant.role,
                    participant.record_count,
                    participant
                        .average_rating
                        .map_or("N/A".to_string(), |r| format!("{r}/10")),
                    if participant.validated { "validated" } else { "pending" }
                );
            }
        }
        Commands::Participant { email, ai } => {
            let own = participants::records_for(records, &email);
            if own.is_empty() {
                println!("No feedback found for {email}.");
                return Ok(());
            }
            for record in own {
                println!(
                    "## Meeting {} ({}) [{}]",
                    record.meeting_number.map_or("N/A".to_string(), |n| n.to_string()),
                    record
                        .submitted_at
                        .map_or("unknown date".to_string(), |at| at.to_string()),
                    sentiment::classify(record)
                );
                println!("{}", record.experience);
                if let Some(feedback) = record.prior_feedback() {
                    println!();
                    println!("Recorded feedback: {feedback}");
                }
                if ai {
                    match &generator {
                        Some(generator) => {
                            println!();
                            println!("{}", insights::individual_feedback(generator, record).await);
                        }
                        None => println!("Set GEMINI_API_KEY to enable AI feedback."),
                    }
                }
                println!();
            }
        }
        Commands::Insights => {
            let Some(generator) = &generator else {
                println!("Set GEMINI_API_KEY to enable AI insights.");
                return Ok(());
            };
            let insights = insights::generate_insights(
                generator as &dyn TextGenerator,
                &dashboard.kpis,
                &dashboard.growth,
                &dashboard.recent,
            )
            .await;
            for insight in insights {
                println!("- {} [{:?}]: {}", insight.title, insight.kind, insight.description);
            }
        }
        Commands::Report { out, ai } => {
            let insights = match (&generator, ai) {
                (Some(generator), true) => Some(
                    insights::generate_insights(
                        generator,
                        &dashboard.kpis,
                        &dashboard.growth,
                        &dashboard.recent,
                    )
                    .await,
                ),
                (None, true) => {
                    println!("Set GEMINI_API_KEY to include AI insights.");
                    None
                }
                _ => None,
            };
            let report = report::build_report(&dashboard, insights.as_deref());
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
