//! Cycle history derivation.
//!
//! Raw histories usually hold one menstruation event per bleeding day. This
//! module groups those days into periods and derives the ascending sequence of
//! cycle-start events the predictor works from. Nothing here is stored; it is
//! recomputed from raw events on every request.

use crate::CycleEvent;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Bleeding days at most this far apart belong to the same period
pub const MAX_INTRA_PERIOD_GAP_DAYS: i64 = 2;

/// A contiguous run of logged bleeding days
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeriodRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days_logged: usize,
}

impl PeriodRange {
    /// Inclusive length in days (a single logged day is 1)
    pub fn length_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// Group menstruation events into runs, in ascending date order
///
/// A run continues while the next menstruation event is within
/// [`MAX_INTRA_PERIOD_GAP_DAYS`] of the previous one and no event tagged with
/// another phase was logged in between.
fn period_runs(events: &[CycleEvent]) -> Vec<Vec<&CycleEvent>> {
    let mut sorted: Vec<&CycleEvent> = events.iter().collect();
    sorted.sort_by_key(|e| e.date);

    let mut runs = Vec::new();
    let mut current: Vec<&CycleEvent> = Vec::new();

    for event in sorted {
        if !event.is_menstruation() {
            if !current.is_empty() {
                runs.push(std::mem::take(&mut current));
            }
            continue;
        }

        let continues = current
            .last()
            .map(|prev| (event.date - prev.date).num_days() <= MAX_INTRA_PERIOD_GAP_DAYS)
            .unwrap_or(false);

        if !continues && !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
        current.push(event);
    }

    if !current.is_empty() {
        runs.push(current);
    }

    runs
}

/// Find start and end dates of every logged period, oldest first
pub fn period_ranges(events: &[CycleEvent]) -> Vec<PeriodRange> {
    period_runs(events)
        .into_iter()
        .filter_map(|run| {
            let first = run.first()?;
            let last = run.last()?;
            Some(PeriodRange {
                start_date: first.date,
                end_date: last.date,
                days_logged: run.len(),
            })
        })
        .collect()
}

/// Derive the cycle-start history: the first event of each period, ascending
pub fn cycle_history(events: &[CycleEvent]) -> Vec<CycleEvent> {
    let starts: Vec<CycleEvent> = period_runs(events)
        .into_iter()
        .filter_map(|run| run.first().map(|e| (*e).clone()))
        .collect();

    tracing::debug!(
        "Derived {} cycle starts from {} events",
        starts.len(),
        events.len()
    );

    starts
}

/// Most recent periods, newest first
///
/// Periods starting before `since` are dropped; at most `limit` are returned.
pub fn period_history(
    events: &[CycleEvent],
    limit: Option<usize>,
    since: Option<NaiveDate>,
) -> Vec<PeriodRange> {
    period_ranges(events)
        .into_iter()
        .rev()
        .filter(|p| since.map_or(true, |cutoff| p.start_date >= cutoff))
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

/// Cut-off date for "the last N months" using 30-day months
///
/// Saturates at [`NaiveDate::MIN`] when the span reaches past the calendar.
pub fn months_ago(today: NaiveDate, months: u32) -> NaiveDate {
    Duration::try_days(30 * i64::from(months))
        .and_then(|span| today.checked_sub_signed(span))
        .unwrap_or(NaiveDate::MIN)
}

/// Number of menstruation events logged on a day that already has one
///
/// Run grouping folds these into a single period day, so they are counted
/// here to be reported alongside the prediction.
pub fn duplicate_menstruation_days(events: &[CycleEvent]) -> usize {
    let mut seen = HashSet::new();
    events
        .iter()
        .filter(|e| e.is_menstruation())
        .filter(|e| !seen.insert(e.date))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TraditionalPhase, UserId};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(d: NaiveDate, phase: TraditionalPhase) -> CycleEvent {
        CycleEvent::new(UserId::new("test_user").unwrap(), d, phase)
    }

    fn bleed(y: i32, m: u32, d: u32) -> CycleEvent {
        event(date(y, m, d), TraditionalPhase::Menstruation)
    }

    #[test]
    fn test_consecutive_days_form_one_period() {
        let events = vec![bleed(2025, 1, 1), bleed(2025, 1, 2), bleed(2025, 1, 3)];

        let ranges = period_ranges(&events);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].start_date, date(2025, 1, 1));
        assert_eq!(ranges[0].end_date, date(2025, 1, 3));
        assert_eq!(ranges[0].length_days(), 3);
    }

    #[test]
    fn test_small_gap_stays_in_period() {
        // Jan 3 not logged
        let events = vec![bleed(2025, 1, 1), bleed(2025, 1, 2), bleed(2025, 1, 4)];

        let ranges = period_ranges(&events);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].end_date, date(2025, 1, 4));
        assert_eq!(ranges[0].days_logged, 3);
    }

    #[test]
    fn test_other_phase_event_splits_periods() {
        let events = vec![
            bleed(2025, 1, 1),
            event(date(2025, 1, 2), TraditionalPhase::Follicular),
            bleed(2025, 1, 3),
        ];

        assert_eq!(period_ranges(&events).len(), 2);
    }

    #[test]
    fn test_cycle_history_keeps_first_day_of_each_period() {
        let events = vec![
            bleed(2025, 1, 31),
            bleed(2025, 2, 1),
            bleed(2025, 1, 1),
            bleed(2025, 1, 2),
            event(date(2025, 1, 15), TraditionalPhase::Ovulation),
        ];

        let history = cycle_history(&events);
        let dates: Vec<_> = history.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![date(2025, 1, 1), date(2025, 1, 31)]);
        assert!(history.iter().all(|e| e.is_menstruation()));
    }

    #[test]
    fn test_cycle_history_empty_without_menstruation() {
        let events = vec![event(date(2025, 1, 10), TraditionalPhase::Luteal)];
        assert!(cycle_history(&events).is_empty());
    }

    #[test]
    fn test_period_history_newest_first_with_limit() {
        let events = vec![
            bleed(2025, 1, 1),
            bleed(2025, 1, 29),
            bleed(2025, 2, 26),
            bleed(2025, 3, 26),
        ];

        let recent = period_history(&events, Some(2), None);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].start_date, date(2025, 3, 26));
        assert_eq!(recent[1].start_date, date(2025, 2, 26));

        let since = period_history(&events, None, Some(date(2025, 2, 1)));
        assert_eq!(since.len(), 2);
    }

    #[test]
    fn test_months_ago_uses_thirty_day_months() {
        assert_eq!(months_ago(date(2025, 7, 1), 2), date(2025, 5, 2));
    }

    #[test]
    fn test_months_ago_saturates_at_calendar_start() {
        assert_eq!(months_ago(date(2026, 10, 19), 4_000_000), NaiveDate::MIN);
        assert_eq!(months_ago(date(2026, 10, 19), u32::MAX), NaiveDate::MIN);
    }

    #[test]
    fn test_duplicate_menstruation_days() {
        let events = vec![
            bleed(2024, 1, 1),
            bleed(2024, 1, 29),
            bleed(2024, 1, 29),
            event(date(2024, 2, 10), TraditionalPhase::Luteal),
            event(date(2024, 2, 10), TraditionalPhase::Luteal),
            bleed(2024, 2, 26),
        ];

        assert_eq!(duplicate_menstruation_days(&events), 1);
        assert_eq!(cycle_history(&events).len(), 3);
        assert_eq!(duplicate_menstruation_days(&[]), 0);
    }
}
