use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Bucket, ChartData, Record, Role};

pub const DURATION_BANDS: [&str; 4] = ["0-30 min", "31-60 min", "61-90 min", ">90 min"];
const MEETING_CAP: u32 = 8;

static COHORT_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.*?)\s*\(\s*turma\s*(\d+)\s*\)\s*$").expect("cohort suffix pattern")
});

#[derive(Debug, Clone, Copy, Default)]
pub struct ChartOptions {
    /// Group programs by their short cohort label instead of the full name.
    pub shorten_programs: bool,
}

pub fn generate_chart_data(records: &[Record], options: ChartOptions) -> ChartData {
    ChartData {
        rating_distribution: score_histogram(records, "Rating", |r| r.rating),
        program_distribution: program_distribution(records, options.shorten_programs),
        engagement_distribution: score_histogram(records, "Engagement", |r| r.engagement),
        duration_distribution: duration_distribution(records),
        role_distribution: role_distribution(records),
        meeting_distribution: meeting_distribution(records),
    }
}

/// One bucket per distinct reported score, ascending.
pub fn score_histogram(
    records: &[Record],
    prefix: &str,
    score: impl Fn(&Record) -> Option<f64>,
) -> Vec<Bucket> {
    let mut counts: Vec<(f64, usize)> = Vec::new();
    for value in records.iter().filter_map(|record| score(record)) {
        match counts.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }
    counts.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    counts
        .into_iter()
        .map(|(value, count)| Bucket {
            name: format!("{prefix} {}", format_score(value)),
            value: count,
        })
        .collect()
}

/// Counts per program in first-seen order.
pub fn program_distribution(records: &[Record], shorten: bool) -> Vec<Bucket> {
    let labels = records
        .iter()
        .map(|record| record.program.trim())
        .filter(|program| !program.is_empty())
        .map(|program| {
            if shorten {
                short_program_label(program)
            } else {
                program.to_string()
            }
        });
    count_in_order(labels)
}

/// "Instituto Embraer - Acelerando Carreiras (Turma 11)" becomes
/// "Acelerando Carreiras T11". Names without a recognizable pattern are
/// returned trimmed.
pub fn short_program_label(program: &str) -> String {
    let program = program.trim();
    let (base, cohort) = match COHORT_SUFFIX.captures(program) {
        Some(caps) => (
            caps.get(1).map_or("", |m| m.as_str()).to_string(),
            Some(caps[2].to_string()),
        ),
        None => (program.to_string(), None),
    };
    let name = base.rsplit(" - ").next().unwrap_or(base.as_str()).trim();

    match cohort {
        Some(cohort) => format!("{name} T{cohort}"),
        None => name.to_string(),
    }
}

/// Upper edges are inclusive: 30 is "0-30 min", 61 is "61-90 min".
pub fn duration_band(minutes: f64) -> Option<&'static str> {
    if minutes <= 0.0 {
        None
    } else if minutes <= 30.0 {
        Some(DURATION_BANDS[0])
    } else if minutes <= 60.0 {
        Some(DURATION_BANDS[1])
    } else if minutes <= 90.0 {
        Some(DURATION_BANDS[2])
    } else {
        Some(DURATION_BANDS[3])
    }
}

pub fn duration_distribution(records: &[Record]) -> Vec<Bucket> {
    let mut counts = [0usize; 4];
    for band in records.iter().filter_map(|r| duration_band(r.duration_value())) {
        if let Some(index) = DURATION_BANDS.iter().position(|b| *b == band) {
            counts[index] += 1;
        }
    }
    DURATION_BANDS
        .iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|(band, count)| Bucket {
            name: band.to_string(),
            value: count,
        })
        .collect()
}

pub fn role_distribution(records: &[Record]) -> Vec<Bucket> {
    let mentors = records.iter().filter(|r| r.role == Role::Mentor).count();
    let mentees = records.iter().filter(|r| r.role == Role::Mentee).count();
    vec![
        Bucket {
            name: "Mentors".to_string(),
            value: mentors,
        },
        Bucket {
            name: "Mentees".to_string(),
            value: mentees,
        },
    ]
}

/// Meetings 1 through 7 individually, everything later as "Meeting 8+".
pub fn meeting_distribution(records: &[Record]) -> Vec<Bucket> {
    let mut counts = [0usize; MEETING_CAP as usize];
    for number in records.iter().filter_map(|r| r.meeting_number) {
        if number >= 1 {
            counts[(number.min(MEETING_CAP) - 1) as usize] += 1;
        }
    }
    counts
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .map(|(index, count)| {
            let number = index as u32 + 1;
            let name = if number == MEETING_CAP {
                format!("Meeting {MEETING_CAP}+")
            } else {
                format!("Meeting {number}")
            };
            Bucket {
                name,
                value: *count,
            }
        })
        .collect()
}

fn count_in_order(labels: impl Iterator<Item = String>) -> Vec<Bucket> {
    let mut buckets: Vec<Bucket> = Vec::new();
    for label in labels {
        match buckets.iter_mut().find(|bucket| bucket.name == label) {
            Some(bucket) => bucket.value += 1,
            None => buckets.push(Bucket {
                name: label,
                value: 1,
            }),
        }
    }
    buckets
}

fn format_score(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}
