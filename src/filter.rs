use chrono::{NaiveDate, NaiveDateTime};

use crate::models::{Record, Role};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection<T> {
    #[default]
    All,
    Only(T),
}

impl<T> Selection<T> {
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(value) => Selection::Only(value),
            None => Selection::All,
        }
    }
}

/// Conjunctive record filter. Date bounds are inclusive and compared by
/// calendar day.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    pub search: String,
    pub role: Selection<Role>,
    pub program: Selection<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl FilterSet {
    pub fn matches(&self, record: &Record) -> bool {
        self.matches_search(record)
            && self.matches_role(record)
            && self.matches_program(record)
            && within_days(record.submitted_at, self.start, self.end)
    }

    pub fn apply(&self, records: &[Record]) -> Vec<Record> {
        records
            .iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect()
    }

    /// Same filter with its date bounds replaced by `window`.
    pub fn with_window(&self, window: &DateWindow) -> FilterSet {
        FilterSet {
            start: Some(window.start.date()),
            end: Some(window.end.date()),
            ..self.clone()
        }
    }

    fn matches_search(&self, record: &Record) -> bool {
        let needle = self.search.trim().to_lowercase();
        needle.is_empty()
            || record.name.to_lowercase().contains(&needle)
            || record.email.to_lowercase().contains(&needle)
    }

    fn matches_role(&self, record: &Record) -> bool {
        match &self.role {
            Selection::All => true,
            Selection::Only(role) => role == &record.role,
        }
    }

    fn matches_program(&self, record: &Record) -> bool {
        match &self.program {
            Selection::All => true,
            Selection::Only(program) => program.trim() == record.program.trim(),
        }
    }
}

/// A closed time interval used for period comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }
}

fn within_days(at: Option<NaiveDateTime>, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    if start.is_none() && end.is_none() {
        return true;
    }
    let Some(at) = at else {
        return false;
    };
    let day = at.date();
    start.map_or(true, |start| day >= start) && end.map_or(true, |end| day <= end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::sample_record;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn all_filters_keep_everything_in_order() {
        let records = vec![
            sample_record("b@example.com", Role::Mentor, "2024-03-02"),
            sample_record("a@example.com", Role::Mentee, "2024-03-01"),
            sample_record("c@example.com", Role::Mentee, "2024-03-05"),
        ];
        let filtered = FilterSet::default().apply(&records);
        assert_eq!(filtered, records);
    }

    #[test]
    fn search_matches_name_or_email_case_insensitively() {
        let mut record = sample_record("avery@example.com", Role::Mentor, "2024-03-02");
        record.name = "Avery Lee".to_string();
        let by_name = FilterSet {
            search: "LEE".to_string(),
            ..FilterSet::default()
        };
        let by_email = FilterSet {
            search: "Avery@".to_string(),
            ..FilterSet::default()
        };
        let miss = FilterSet {
            search: "jules".to_string(),
            ..FilterSet::default()
        };
        assert!(by_name.matches(&record));
        assert!(by_email.matches(&record));
        assert!(!miss.matches(&record));
    }

    #[test]
    fn role_and_program_are_exact() {
        let record = sample_record("a@example.com", Role::Mentee, "2024-03-02");
        let mentors = FilterSet {
            role: Selection::Only(Role::Mentor),
            ..FilterSet::default()
        };
        let program = FilterSet {
            program: Selection::Only(format!("  {}  ", record.program)),
            ..FilterSet::default()
        };
        let other_program = FilterSet {
            program: Selection::Only("Liderança".to_string()),
            ..FilterSet::default()
        };
        assert!(!mentors.matches(&record));
        assert!(program.matches(&record));
        assert!(!other_program.matches(&record));
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let records = vec![
            sample_record("a@example.com", Role::Mentor, "2024-02-29"),
            sample_record("b@example.com", Role::Mentor, "2024-03-01"),
            sample_record("c@example.com", Role::Mentor, "2024-03-31"),
            sample_record("d@example.com", Role::Mentor, "2024-04-01"),
        ];
        let march = FilterSet {
            start: Some(day(2024, 3, 1)),
            end: Some(day(2024, 3, 31)),
            ..FilterSet::default()
        };
        let emails: Vec<_> = march.apply(&records).into_iter().map(|r| r.email).collect();
        assert_eq!(emails, vec!["b@example.com", "c@example.com"]);
    }

    #[test]
    fn unparsed_timestamps_fail_date_bounds() {
        let mut record = sample_record("a@example.com", Role::Mentor, "2024-03-02");
        record.submitted_at = None;
        let open = FilterSet::default();
        let bounded = FilterSet {
            start: Some(day(1970, 1, 1)),
            ..FilterSet::default()
        };
        assert!(open.matches(&record));
        assert!(!bounded.matches(&record));
    }
}
