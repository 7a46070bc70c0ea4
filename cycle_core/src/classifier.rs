//! Phase classification for calendar dates.
//!
//! A date is placed in the cycle by its offset from a known cycle start,
//! taken modulo the average cycle duration, so dates in future (or past)
//! cycles classify the same way as dates in the current one.
//!
//! Boundaries come from [`PhaseConfig`], expressed on a nominal 28-day
//! cycle, and are scaled proportionally to the average duration:
//!
//! | traditional  | nominal days | functional    | nominal days      |
//! |--------------|--------------|---------------|-------------------|
//! | menstruation | [0, 5)       | power         | [0, 10), [15, 19) |
//! | follicular   | [5, 13)      | manifestation | [10, 15)          |
//! | ovulation    | [13, 16)     | nurture       | [19, end)         |
//! | luteal       | [16, end)    |               |                   |
//!
//! Windows are half-open, so a date on a boundary belongs to the later phase.

use crate::{
    Error, FunctionalPhase, Phase, PhaseConfig, PhaseWindow, Result, TraditionalPhase,
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// A half-open window `[start, end)` of cycle days
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct DayWindow<P> {
    phase: P,
    start: i64,
    end: i64,
}

impl<P: Copy> DayWindow<P> {
    fn contains(&self, day: i64) -> bool {
        self.start <= day && day < self.end
    }
}

/// Phase boundaries scaled to one average cycle duration
#[derive(Clone, Debug)]
pub struct ScaledBoundaries {
    duration: i64,
    traditional: Vec<DayWindow<TraditionalPhase>>,
    functional: Vec<DayWindow<FunctionalPhase>>,
}

impl ScaledBoundaries {
    pub fn new(model: &PhaseConfig, duration: i64) -> Result<Self> {
        if duration <= 0 {
            return Err(Error::InvalidDuration(duration));
        }
        let nominal = model.nominal_cycle_days;
        if nominal <= 0 {
            return Err(Error::Config(format!(
                "nominal cycle length must be positive, got {}",
                nominal
            )));
        }

        let cuts = [
            0,
            scale(model.follicular_start, nominal, duration),
            scale(model.ovulation_start, nominal, duration),
            scale(model.luteal_start, nominal, duration),
            duration,
        ];
        let traditional = TraditionalPhase::ALL
            .iter()
            .enumerate()
            .map(|(i, phase)| DayWindow {
                phase: *phase,
                start: cuts[i],
                end: cuts[i + 1],
            })
            .collect();

        let functional = model
            .functional_windows
            .iter()
            .map(|w| DayWindow {
                phase: w.phase,
                start: scale(w.day_start, nominal, duration),
                end: scale(w.day_end, nominal, duration),
            })
            .collect();

        Ok(Self {
            duration,
            traditional,
            functional,
        })
    }

    pub fn duration(&self) -> i64 {
        self.duration
    }

    fn traditional_at(&self, day: i64) -> Result<DayWindow<TraditionalPhase>> {
        self.traditional
            .iter()
            .find(|w| w.contains(day))
            .copied()
            .ok_or_else(|| uncovered(day, self.duration))
    }

    fn functional_at(&self, day: i64) -> Result<DayWindow<FunctionalPhase>> {
        self.functional
            .iter()
            .find(|w| w.contains(day))
            .copied()
            .ok_or_else(|| uncovered(day, self.duration))
    }

    /// Non-empty traditional windows as `(phase, start_day, end_day)`
    pub fn traditional_windows(&self) -> Vec<(TraditionalPhase, i64, i64)> {
        self.traditional
            .iter()
            .filter(|w| w.start < w.end)
            .map(|w| (w.phase, w.start, w.end))
            .collect()
    }

    /// Non-empty functional windows as `(phase, start_day, end_day)`
    pub fn functional_windows(&self) -> Vec<(FunctionalPhase, i64, i64)> {
        self.functional
            .iter()
            .filter(|w| w.start < w.end)
            .map(|w| (w.phase, w.start, w.end))
            .collect()
    }
}

/// `round(day * duration / nominal)`, half up, clamped to the cycle
fn scale(day: i64, nominal: i64, duration: i64) -> i64 {
    let scaled = (2 * i128::from(day) * i128::from(duration) + i128::from(nominal))
        / (2 * i128::from(nominal));
    scaled.clamp(0, i128::from(duration)) as i64
}

fn uncovered(day: i64, duration: i64) -> Error {
    Error::Config(format!(
        "phase boundaries do not cover day {} of a {}-day cycle",
        day, duration
    ))
}

fn offset(date: NaiveDate, days: i64) -> Result<NaiveDate> {
    Duration::try_days(days)
        .and_then(|d| date.checked_add_signed(d))
        .ok_or_else(|| Error::InvalidDate(format!("{} + {} days is out of range", date, days)))
}

/// Classify `target_date` using the default phase boundaries
pub fn classify(
    reference_start_date: NaiveDate,
    average_duration: i64,
    target_date: NaiveDate,
) -> Result<Phase> {
    classify_with(
        &PhaseConfig::default(),
        reference_start_date,
        average_duration,
        target_date,
    )
}

/// Classify `target_date` relative to a known cycle start
///
/// Dates before `reference_start_date` wrap into earlier cycles.
pub fn classify_with(
    model: &PhaseConfig,
    reference_start_date: NaiveDate,
    average_duration: i64,
    target_date: NaiveDate,
) -> Result<Phase> {
    let bounds = ScaledBoundaries::new(model, average_duration)?;
    classify_scaled(&bounds, reference_start_date, target_date)
}

fn classify_scaled(
    bounds: &ScaledBoundaries,
    reference_start_date: NaiveDate,
    target_date: NaiveDate,
) -> Result<Phase> {
    let duration = bounds.duration();
    let days_since = (target_date - reference_start_date).num_days();
    let cycle_index = days_since.div_euclid(duration);
    let day_in_cycle = days_since.rem_euclid(duration);

    let cycle_offset = cycle_index.checked_mul(duration).ok_or_else(|| {
        Error::InvalidDate(format!(
            "cycle {} of {} days is out of range",
            cycle_index, duration
        ))
    })?;
    let cycle_start = offset(reference_start_date, cycle_offset)?;

    let traditional = bounds.traditional_at(day_in_cycle)?;
    let functional = bounds.functional_at(day_in_cycle)?;

    let functional_window = PhaseWindow {
        start_date: offset(cycle_start, functional.start)?,
        end_date: offset(cycle_start, functional.end - 1)?,
        duration_days: functional.end - functional.start,
    };

    Ok(Phase {
        traditional: traditional.phase,
        functional: functional.phase,
        start_date: offset(cycle_start, traditional.start)?,
        end_date: offset(cycle_start, traditional.end - 1)?,
        duration_days: traditional.end - traditional.start,
        day_in_cycle,
        cycle_start,
        functional_window,
    })
}

/// The traditional phase that begins the day after `phase` ends
pub fn next_phase(phase: &Phase, average_duration: i64) -> Result<Phase> {
    next_phase_with(&PhaseConfig::default(), phase, average_duration)
}

pub fn next_phase_with(model: &PhaseConfig, phase: &Phase, average_duration: i64) -> Result<Phase> {
    let day_after = offset(phase.end_date, 1)?;
    classify_with(model, phase.cycle_start, average_duration, day_after)
}

/// A stretch of days sharing both the traditional and the functional phase
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalendarEntry {
    pub traditional: TraditionalPhase,
    pub functional: FunctionalPhase,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Split `[from, from + days)` into consecutive entries at every phase change
///
/// The first and last entries are clipped to the requested range.
pub fn phase_calendar(
    model: &PhaseConfig,
    reference_start_date: NaiveDate,
    average_duration: i64,
    from: NaiveDate,
    days: u32,
) -> Result<Vec<CalendarEntry>> {
    let bounds = ScaledBoundaries::new(model, average_duration)?;
    let mut entries = Vec::new();
    if days == 0 {
        return Ok(entries);
    }
    let last_day = offset(from, i64::from(days) - 1)?;

    let mut cursor = from;
    while cursor <= last_day {
        let phase = classify_scaled(&bounds, reference_start_date, cursor)?;
        let segment_end = phase
            .end_date
            .min(phase.functional_window.end_date)
            .min(last_day);

        entries.push(CalendarEntry {
            traditional: phase.traditional,
            functional: phase.functional,
            start_date: cursor,
            end_date: segment_end,
        });
        cursor = offset(segment_end, 1)?;
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn day(reference: NaiveDate, n: i64) -> NaiveDate {
        reference + Duration::days(n)
    }

    #[test]
    fn test_functional_phase_examples() {
        let reference = date(2024, 1, 1);

        let phase = classify(reference, 28, date(2024, 1, 12)).unwrap();
        assert_eq!(phase.day_in_cycle, 11);
        assert_eq!(phase.functional, FunctionalPhase::Manifestation);

        let phase = classify(reference, 28, reference).unwrap();
        assert_eq!(phase.day_in_cycle, 0);
        assert_eq!(phase.functional, FunctionalPhase::Power);
        assert_eq!(phase.traditional, TraditionalPhase::Menstruation);
    }

    #[test]
    fn test_window_dates() {
        let reference = date(2024, 1, 1);
        let phase = classify(reference, 28, date(2024, 1, 12)).unwrap();

        assert_eq!(phase.traditional, TraditionalPhase::Follicular);
        assert_eq!(phase.start_date, date(2024, 1, 6));
        assert_eq!(phase.end_date, date(2024, 1, 13));
        assert_eq!(phase.duration_days, 8);

        assert_eq!(phase.functional_window.start_date, date(2024, 1, 11));
        assert_eq!(phase.functional_window.end_date, date(2024, 1, 15));
        assert_eq!(phase.functional_window.duration_days, 5);
        assert!(phase.window().contains(date(2024, 1, 12)));
    }

    #[test]
    fn test_boundary_belongs_to_later_phase() {
        let reference = date(2024, 1, 1);
        let cases = [
            (4, TraditionalPhase::Menstruation, FunctionalPhase::Power),
            (5, TraditionalPhase::Follicular, FunctionalPhase::Power),
            (10, TraditionalPhase::Follicular, FunctionalPhase::Manifestation),
            (13, TraditionalPhase::Ovulation, FunctionalPhase::Manifestation),
            (15, TraditionalPhase::Ovulation, FunctionalPhase::Power),
            (16, TraditionalPhase::Luteal, FunctionalPhase::Power),
            (19, TraditionalPhase::Luteal, FunctionalPhase::Nurture),
            (27, TraditionalPhase::Luteal, FunctionalPhase::Nurture),
        ];

        for (n, traditional, functional) in cases {
            let phase = classify(reference, 28, day(reference, n)).unwrap();
            assert_eq!(phase.traditional, traditional, "day {}", n);
            assert_eq!(phase.functional, functional, "day {}", n);
        }
    }

    #[test]
    fn test_end_boundary_moves_to_next_phase() {
        let reference = date(2024, 1, 1);
        let phase = classify(reference, 28, date(2024, 1, 3)).unwrap();

        let on_boundary = classify(reference, 28, day(phase.end_date, 1)).unwrap();
        assert_ne!(on_boundary.traditional, phase.traditional);
        assert_eq!(on_boundary.traditional, phase.traditional.next());
    }

    #[test]
    fn test_future_cycles_wrap() {
        let reference = date(2024, 1, 1);
        let phase = classify(reference, 28, day(reference, 2 * 28 + 11)).unwrap();

        assert_eq!(phase.day_in_cycle, 11);
        assert_eq!(phase.cycle_start, day(reference, 56));
        assert_eq!(phase.start_date, day(reference, 56 + 5));
    }

    #[test]
    fn test_past_dates_wrap_backwards() {
        let reference = date(2024, 1, 1);
        let phase = classify(reference, 28, date(2023, 12, 31)).unwrap();

        assert_eq!(phase.day_in_cycle, 27);
        assert_eq!(phase.traditional, TraditionalPhase::Luteal);
        assert_eq!(phase.functional, FunctionalPhase::Nurture);
        assert_eq!(phase.cycle_start, date(2023, 12, 4));
        assert_eq!(phase.end_date, date(2023, 12, 31));
    }

    #[test]
    fn test_boundaries_scale_with_duration() {
        let reference = date(2024, 1, 1);

        // 35 days: follicular 6, ovulation 16, luteal 20; manifestation [13, 19)
        let phase = classify(reference, 35, day(reference, 5)).unwrap();
        assert_eq!(phase.traditional, TraditionalPhase::Menstruation);
        let phase = classify(reference, 35, day(reference, 6)).unwrap();
        assert_eq!(phase.traditional, TraditionalPhase::Follicular);
        let phase = classify(reference, 35, day(reference, 12)).unwrap();
        assert_eq!(phase.functional, FunctionalPhase::Power);
        let phase = classify(reference, 35, day(reference, 13)).unwrap();
        assert_eq!(phase.functional, FunctionalPhase::Manifestation);
        let phase = classify(reference, 35, day(reference, 34)).unwrap();
        assert_eq!(phase.end_date, day(reference, 34));
        assert_eq!(phase.functional, FunctionalPhase::Nurture);
    }

    #[test]
    fn test_windows_partition_every_duration() {
        let model = PhaseConfig::default();
        for duration in 1..=60 {
            let bounds = ScaledBoundaries::new(&model, duration).unwrap();

            for windows in [
                bounds
                    .traditional_windows()
                    .iter()
                    .map(|w| (w.1, w.2))
                    .collect::<Vec<_>>(),
                bounds
                    .functional_windows()
                    .iter()
                    .map(|w| (w.1, w.2))
                    .collect::<Vec<_>>(),
            ] {
                let mut expected_start = 0;
                for (start, end) in windows {
                    assert_eq!(start, expected_start, "duration {}", duration);
                    assert!(end > start);
                    expected_start = end;
                }
                assert_eq!(expected_start, duration);
            }

            let reference = date(2024, 1, 1);
            for n in 0..duration {
                let phase = classify(reference, duration, day(reference, n)).unwrap();
                assert!(phase.window().contains(day(reference, n)));
                assert!(phase.functional_window.contains(day(reference, n)));
            }
        }
    }

    #[test]
    fn test_invalid_duration() {
        let reference = date(2024, 1, 1);
        assert!(matches!(
            classify(reference, 0, reference),
            Err(Error::InvalidDuration(0))
        ));
        assert!(matches!(
            classify(reference, -3, reference),
            Err(Error::InvalidDuration(-3))
        ));
    }

    #[test]
    fn test_unrepresentable_window_is_invalid_date() {
        let reference = date(2024, 1, 1);
        assert!(matches!(
            classify(reference, i64::MAX, reference),
            Err(Error::InvalidDate(_))
        ));
        assert!(matches!(
            classify(reference, i64::MAX, date(2023, 12, 31)),
            Err(Error::InvalidDate(_))
        ));
    }

    #[test]
    fn test_next_phase_follows_end_date() {
        let reference = date(2024, 1, 1);
        let follicular = classify(reference, 28, date(2024, 1, 8)).unwrap();

        let ovulation = next_phase(&follicular, 28).unwrap();
        assert_eq!(ovulation.traditional, TraditionalPhase::Ovulation);
        assert_eq!(ovulation.start_date, date(2024, 1, 14));

        let luteal = next_phase(&ovulation, 28).unwrap();
        let menstruation = next_phase(&luteal, 28).unwrap();
        assert_eq!(menstruation.traditional, TraditionalPhase::Menstruation);
        assert_eq!(menstruation.start_date, date(2024, 1, 29));
    }

    #[test]
    fn test_calendar_splits_on_both_groupings() {
        let reference = date(2024, 1, 1);
        let entries =
            phase_calendar(&PhaseConfig::default(), reference, 28, reference, 28).unwrap();

        let spans: Vec<_> = entries
            .iter()
            .map(|e| {
                (
                    e.traditional,
                    e.functional,
                    (e.start_date - reference).num_days(),
                    (e.end_date - reference).num_days(),
                )
            })
            .collect();

        use FunctionalPhase::*;
        use TraditionalPhase::*;
        assert_eq!(
            spans,
            vec![
                (Menstruation, Power, 0, 4),
                (Follicular, Power, 5, 9),
                (Follicular, Manifestation, 10, 12),
                (Ovulation, Manifestation, 13, 14),
                (Ovulation, Power, 15, 15),
                (Luteal, Power, 16, 18),
                (Luteal, Nurture, 19, 27),
            ]
        );
    }

    #[test]
    fn test_calendar_clips_to_range() {
        let reference = date(2024, 1, 1);
        let entries = phase_calendar(
            &PhaseConfig::default(),
            reference,
            28,
            date(2024, 1, 3),
            4,
        )
        .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].start_date, date(2024, 1, 3));
        assert_eq!(entries[1].end_date, date(2024, 1, 6));
        assert!(phase_calendar(&PhaseConfig::default(), reference, 28, reference, 0)
            .unwrap()
            .is_empty());
    }
}
