//! Descriptive statistics over a user's logged history.

use crate::history::{period_ranges, PeriodRange};
use crate::{CycleEvent, Level, TraditionalPhase};
use serde::Serialize;

/// Period length and spacing summary
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CycleStatistics {
    pub average_period_length: Option<f64>,
    /// Days without bleeding between the end of one period and the start of the next
    pub average_days_between: Option<f64>,
    pub total_periods: usize,
    /// Newest first
    pub last_two_periods: Vec<PeriodRange>,
}

/// Logging summary for one traditional phase
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct PhaseStatistics {
    pub phase: TraditionalPhase,
    pub occurrence_count: usize,
    pub average_pain: Option<f64>,
    pub average_energy: Option<f64>,
}

/// Mean self-reported levels over a set of events
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Default)]
pub struct LevelAverages {
    pub pain: Option<f64>,
    pub energy: Option<f64>,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

fn level_mean<'a>(levels: impl Iterator<Item = Option<&'a Level>>) -> Option<f64> {
    mean(levels.flatten().map(|l| f64::from(l.value())))
}

/// Periods considered by [`cycle_statistics`]
pub const RECENT_PERIODS: usize = 12;

/// Summarize the most recent [`RECENT_PERIODS`] periods
pub fn cycle_statistics(events: &[CycleEvent]) -> CycleStatistics {
    cycle_statistics_recent(events, RECENT_PERIODS)
}

/// Summarize period lengths and spacing over the latest `max_periods` periods
///
/// Older periods are left out so that a long history does not dilute the
/// averages. `total_periods` counts the periods actually analyzed.
pub fn cycle_statistics_recent(events: &[CycleEvent], max_periods: usize) -> CycleStatistics {
    let all = period_ranges(events);
    let ranges = &all[all.len().saturating_sub(max_periods)..];

    let average_period_length = mean(ranges.iter().map(|r| r.length_days() as f64));
    let average_days_between = mean(
        ranges
            .windows(2)
            .map(|pair| ((pair[1].start_date - pair[0].end_date).num_days() - 1) as f64),
    );
    let last_two_periods = ranges.iter().rev().take(2).cloned().collect();

    tracing::debug!(
        "Computed statistics over {} of {} periods",
        ranges.len(),
        all.len()
    );

    CycleStatistics {
        average_period_length,
        average_days_between,
        total_periods: ranges.len(),
        last_two_periods,
    }
}

/// Per-phase event counts and average pain/energy, in cycle order
pub fn phase_statistics(events: &[CycleEvent]) -> Vec<PhaseStatistics> {
    TraditionalPhase::ALL
        .iter()
        .map(|&phase| {
            let in_phase: Vec<&CycleEvent> = events.iter().filter(|e| e.phase == phase).collect();
            PhaseStatistics {
                phase,
                occurrence_count: in_phase.len(),
                average_pain: level_mean(in_phase.iter().map(|e| e.pain_level.as_ref())),
                average_energy: level_mean(in_phase.iter().map(|e| e.energy_level.as_ref())),
            }
        })
        .collect()
}

/// Average pain and energy across all events that report them
pub fn average_levels(events: &[CycleEvent]) -> LevelAverages {
    LevelAverages {
        pain: level_mean(events.iter().map(|e| e.pain_level.as_ref())),
        energy: level_mean(events.iter().map(|e| e.energy_level.as_ref())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UserId;
    use chrono::NaiveDate;

    fn event(y: i32, m: u32, d: u32, phase: TraditionalPhase) -> CycleEvent {
        CycleEvent::new(
            UserId::new("test_user").unwrap(),
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            phase,
        )
    }

    fn five_day_period(y: i32, m: u32, first: u32) -> Vec<CycleEvent> {
        (first..first + 5)
            .map(|d| event(y, m, d, TraditionalPhase::Menstruation))
            .collect()
    }

    #[test]
    fn test_cycle_statistics_with_normal_periods() {
        let mut events = five_day_period(2025, 1, 1);
        events.push(event(2025, 1, 31, TraditionalPhase::Menstruation));
        events.extend(five_day_period(2025, 2, 1).into_iter().take(4));

        let stats = cycle_statistics(&events);

        assert_eq!(stats.total_periods, 2);
        assert_eq!(stats.average_period_length, Some(5.0));
        assert_eq!(stats.average_days_between, Some(25.0));
        assert_eq!(stats.last_two_periods.len(), 2);
        assert_eq!(
            stats.last_two_periods[0].start_date,
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
        );
        assert_eq!(
            stats.last_two_periods[1].end_date,
            NaiveDate::from_ymd_opt(2025, 1, 5).unwrap()
        );
    }

    #[test]
    fn test_cycle_statistics_empty_events() {
        let stats = cycle_statistics(&[]);

        assert_eq!(stats.total_periods, 0);
        assert_eq!(stats.average_period_length, None);
        assert_eq!(stats.average_days_between, None);
        assert!(stats.last_two_periods.is_empty());
    }

    #[test]
    fn test_single_period_has_no_spacing() {
        let stats = cycle_statistics(&five_day_period(2025, 3, 10));
        assert_eq!(stats.total_periods, 1);
        assert_eq!(stats.average_days_between, None);
    }

    #[test]
    fn test_only_recent_periods_are_averaged() {
        // Two old 8-day periods, then twelve 4-day periods 28 days apart
        let mut events = Vec::new();
        let mut start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        for i in 0..14 {
            let length = if i < 2 { 8 } else { 4 };
            for day in 0..length {
                events.push(CycleEvent::new(
                    UserId::new("test_user").unwrap(),
                    start + chrono::Duration::days(day),
                    TraditionalPhase::Menstruation,
                ));
            }
            start += chrono::Duration::days(28);
        }

        let stats = cycle_statistics(&events);
        assert_eq!(stats.total_periods, RECENT_PERIODS);
        assert_eq!(stats.average_period_length, Some(4.0));
        assert_eq!(stats.average_days_between, Some(24.0));

        let everything = cycle_statistics_recent(&events, usize::MAX);
        assert_eq!(everything.total_periods, 14);
        assert!(everything.average_period_length.unwrap() > 4.0);
    }

    #[test]
    fn test_phase_statistics() {
        let events = vec![
            event(2025, 1, 1, TraditionalPhase::Menstruation)
                .with_pain(4)
                .unwrap(),
            event(2025, 1, 2, TraditionalPhase::Menstruation)
                .with_pain(2)
                .unwrap()
                .with_energy(1)
                .unwrap(),
            event(2025, 1, 14, TraditionalPhase::Ovulation)
                .with_energy(5)
                .unwrap(),
        ];

        let stats = phase_statistics(&events);

        assert_eq!(stats.len(), 4);
        assert_eq!(stats[0].phase, TraditionalPhase::Menstruation);
        assert_eq!(stats[0].occurrence_count, 2);
        assert_eq!(stats[0].average_pain, Some(3.0));
        assert_eq!(stats[0].average_energy, Some(1.0));
        assert_eq!(stats[1].occurrence_count, 0);
        assert_eq!(stats[1].average_pain, None);
        assert_eq!(stats[2].average_energy, Some(5.0));
    }

    #[test]
    fn test_average_levels() {
        let events = vec![
            event(2025, 1, 1, TraditionalPhase::Menstruation)
                .with_pain(5)
                .unwrap(),
            event(2025, 1, 9, TraditionalPhase::Follicular)
                .with_pain(2)
                .unwrap(),
            event(2025, 1, 10, TraditionalPhase::Follicular),
        ];

        let averages = average_levels(&events);
        assert_eq!(averages.pain, Some(3.5));
        assert_eq!(averages.energy, None);
        assert_eq!(average_levels(&[]), LevelAverages::default());
    }
}
