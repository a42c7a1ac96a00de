use chrono::{Days, Duration, NaiveDate, NaiveDateTime};

use crate::filter::{DateWindow, FilterSet};
use crate::kpi::{calculate_kpis, round_to};
use crate::models::{KpiGrowth, Kpis, Record};

/// Percent change rounded to one decimal. A previous value of zero yields
/// 100 when there is new activity and 0 otherwise.
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return if current > 0.0 { 100.0 } else { 0.0 };
    }
    round_to((current - previous) / previous * 100.0, 1)
}

/// The window of identical length ending one millisecond before `current`.
pub fn previous_window(current: &DateWindow) -> DateWindow {
    let length = current.end - current.start;
    let end = current.start - Duration::milliseconds(1);
    DateWindow::new(end - length, end)
}

/// Whole-day window from `since_days` days before `today` through the end
/// of `today`. `None` when the start falls outside the calendar.
pub fn window_since_days(today: NaiveDate, since_days: u64) -> Option<DateWindow> {
    let start = today.checked_sub_days(Days::new(since_days.max(1)))?;
    window_for_days(start, today)
}

/// Window spanning whole calendar days from `start` to `end`.
pub fn window_for_days(start: NaiveDate, end: NaiveDate) -> Option<DateWindow> {
    Some(DateWindow::new(
        start.and_hms_opt(0, 0, 0)?,
        end.and_hms_milli_opt(23, 59, 59, 999)?,
    ))
}

/// Compares the KPIs of `window` against the equally long window right
/// before it. `filters` contributes its non-date clauses to both sides.
pub fn calculate_growth(records: &[Record], filters: &FilterSet, window: &DateWindow) -> KpiGrowth {
    if window.end <= window.start {
        return KpiGrowth::default();
    }

    let previous = previous_window(window);
    let current_kpis = calculate_kpis(&filters.with_window(window).apply(records));
    let previous_kpis = calculate_kpis(&filters.with_window(&previous).apply(records));
    compare(&current_kpis, &previous_kpis)
}

pub fn compare(current: &Kpis, previous: &Kpis) -> KpiGrowth {
    let count = |cur: usize, prev: usize| percent_change(cur as f64, prev as f64);
    KpiGrowth {
        total_records: count(current.total_records, previous.total_records),
        unique_participants: count(current.unique_participants, previous.unique_participants),
        mentor_records: count(current.mentor_records, previous.mentor_records),
        mentee_records: count(current.mentee_records, previous.mentee_records),
        unique_mentors: count(current.unique_mentors, previous.unique_mentors),
        unique_mentees: count(current.unique_mentees, previous.unique_mentees),
        completed_meetings: count(current.completed_meetings, previous.completed_meetings),
        average_rating: percent_change(current.average_rating, previous.average_rating),
        average_engagement: percent_change(current.average_engagement, previous.average_engagement),
        average_duration: percent_change(current.average_duration, previous.average_duration),
        validated: count(current.validated, previous.validated),
    }
}

/// Earliest and latest parsed timestamps, used when no window was given.
pub fn data_span(records: &[Record]) -> Option<DateWindow> {
    let mut stamps = records.iter().filter_map(|record| record.submitted_at);
    let first = stamps.next()?;
    let (start, end) = stamps.fold((first, first), |(lo, hi), at: NaiveDateTime| {
        (lo.min(at), hi.max(at))
    });
    Some(DateWindow::new(start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::testutil::sample_record;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn percent_change_handles_zero_baselines() {
        assert_eq!(percent_change(0.0, 0.0), 0.0);
        assert_eq!(percent_change(5.0, 0.0), 100.0);
        assert_eq!(percent_change(10.0, 5.0), 100.0);
        assert_eq!(percent_change(5.0, 10.0), -50.0);
        assert_eq!(percent_change(8.5, 8.0), 6.3);
    }

    #[test]
    fn previous_window_has_same_length_and_ends_before_start() {
        let current = window_for_days(day(2024, 3, 11), day(2024, 3, 20)).unwrap();
        let previous = previous_window(&current);
        assert_eq!(previous.end - previous.start, current.end - current.start);
        assert!(previous.end < current.start);
        assert_eq!(previous.end.date(), day(2024, 3, 10));
        assert_eq!(previous.start.date(), day(2024, 3, 1));
    }

    #[test]
    fn growth_compares_adjacent_periods() {
        let records = vec![
            sample_record("a@example.com", Role::Mentor, "2024-03-02"),
            sample_record("b@example.com", Role::Mentee, "2024-03-12"),
            sample_record("c@example.com", Role::Mentee, "2024-03-15"),
        ];
        let window = window_for_days(day(2024, 3, 11), day(2024, 3, 20)).unwrap();
        let growth = calculate_growth(&records, &FilterSet::default(), &window);

        assert_eq!(growth.total_records, 100.0);
        assert_eq!(growth.unique_mentees, 100.0);
        assert_eq!(growth.unique_mentors, -100.0);
        assert_eq!(growth.average_rating, 0.0);
    }

    #[test]
    fn empty_window_yields_zero_growth() {
        let at = day(2024, 3, 11).and_hms_opt(0, 0, 0).unwrap();
        let growth = calculate_growth(&[], &FilterSet::default(), &DateWindow::new(at, at));
        assert_eq!(growth, KpiGrowth::default());
    }

    #[test]
    fn data_span_ignores_unparsed_records() {
        let mut unparsed = sample_record("x@example.com", Role::Mentor, "2024-01-01");
        unparsed.submitted_at = None;
        let records = vec![
            sample_record("a@example.com", Role::Mentor, "2024-03-02"),
            unparsed,
            sample_record("b@example.com", Role::Mentee, "2024-02-12"),
        ];
        let span = data_span(&records).unwrap();
        assert_eq!(span.start.date(), day(2024, 2, 12));
        assert_eq!(span.end.date(), day(2024, 3, 2));
        assert!(data_span(&[]).is_none());
    }

    #[test]
    fn since_days_window_covers_whole_days() {
        let window = window_since_days(day(2024, 3, 20), 0).unwrap();
        assert_eq!(window.start, day(2024, 3, 19).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(
            window.end,
            day(2024, 3, 20).and_hms_milli_opt(23, 59, 59, 999).unwrap()
        );
    }

    #[test]
    fn boundary_day_belongs_to_the_current_window_only() {
        let window = window_since_days(day(2024, 3, 20), 7).unwrap();
        let boundary = window.start.date().format("%Y-%m-%d").to_string();
        let records = vec![sample_record("edge@example.com", Role::Mentor, &boundary)];
        let previous = previous_window(&window);

        let filters = FilterSet::default();
        assert_eq!(filters.with_window(&window).apply(&records).len(), 1);
        assert!(filters.with_window(&previous).apply(&records).is_empty());
        assert_eq!(previous.end.date(), day(2024, 3, 12));
    }

    #[test]
    fn out_of_range_since_days_is_rejected() {
        assert!(window_since_days(day(2024, 3, 20), 100_000_000).is_none());
        assert!(window_since_days(day(2024, 3, 20), u64::MAX).is_none());
    }
}
