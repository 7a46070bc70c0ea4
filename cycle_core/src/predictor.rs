//! Next-cycle prediction from a history of cycle-start events.
//!
//! The average cycle length is the rounded mean of the gaps between
//! consecutive start dates. Data-quality problems (duplicate, out-of-order or
//! implausibly distant dates) never fail the prediction: the offending gaps
//! are left out and the result carries a warning instead. Only an empty
//! history is an error.

use crate::{
    CycleEvent, Error, PredictionConfig, PredictionResult, PredictionWarning, Result,
};
use chrono::{Duration, NaiveDate};

/// Predict the next cycle start using the default [`PredictionConfig`]
pub fn predict_next_cycle(history: &[CycleEvent]) -> Result<PredictionResult> {
    predict_next_cycle_with(history, &PredictionConfig::default())
}

/// Predict the next cycle start
///
/// `history` is expected in ascending date order and to hold menstruation
/// starts only; other events are ignored. Gaps are measured from the latest
/// date accepted so far, so a single out-of-order entry does not distort the
/// gap that follows it.
pub fn predict_next_cycle_with(
    history: &[CycleEvent],
    config: &PredictionConfig,
) -> Result<PredictionResult> {
    let dates: Vec<NaiveDate> = history
        .iter()
        .filter(|e| e.is_menstruation())
        .map(|e| e.date)
        .collect();

    let (&first, rest) = dates.split_first().ok_or(Error::InsufficientData)?;

    let mut latest = first;
    let mut gaps = Vec::with_capacity(rest.len());
    let mut non_increasing = 0;
    let mut out_of_range = 0;

    for &date in rest {
        let gap = (date - latest).num_days();
        if gap <= 0 {
            tracing::warn!(
                "Ignoring start date {} ({} days after {}): not after the previous start",
                date,
                gap,
                latest
            );
            non_increasing += 1;
            continue;
        }

        latest = date;
        if gap > config.max_cycle_days {
            tracing::warn!(
                "Ignoring {}-day gap ending {}: longer than {} days",
                gap,
                date,
                config.max_cycle_days
            );
            out_of_range += 1;
            continue;
        }
        gaps.push(gap);
    }

    let mut warnings = Vec::new();
    if non_increasing > 0 {
        warnings.push(PredictionWarning::NonIncreasingDates {
            excluded: non_increasing,
        });
    }
    if out_of_range > 0 {
        warnings.push(PredictionWarning::OutOfRangeGaps {
            excluded: out_of_range,
            max_days: config.max_cycle_days,
        });
    }

    let stats = GapStats::from_gaps(&gaps);
    let average_duration = match &stats {
        Some(stats) => {
            if stats.spread > config.irregularity_spread_days {
                warnings.push(PredictionWarning::IrregularCycle {
                    spread_days: stats.spread,
                });
            }
            stats.rounded_mean
        }
        None => {
            warnings.push(PredictionWarning::InsufficientHistory);
            config.default_cycle_days
        }
    };

    let next_start = Duration::try_days(average_duration)
        .and_then(|span| latest.checked_add_signed(span))
        .ok_or_else(|| {
            Error::InvalidDate(format!(
                "{} + {} days is out of range",
                latest, average_duration
            ))
        })?;

    tracing::debug!(
        "Predicted next start {} (average {} days from {} gaps)",
        next_start,
        average_duration,
        gaps.len()
    );

    Ok(PredictionResult {
        next_start,
        average_duration,
        last_start: latest,
        gaps_used: gaps.len(),
        gap_spread: stats.as_ref().map(|s| s.spread),
        std_deviation: stats.as_ref().map(|s| s.std_deviation),
        warnings,
    })
}

/// Summary of the accepted gaps
struct GapStats {
    rounded_mean: i64,
    spread: i64,
    std_deviation: f64,
}

impl GapStats {
    /// `None` when there are no gaps to summarize
    fn from_gaps(gaps: &[i64]) -> Option<Self> {
        let min = *gaps.iter().min()?;
        let max = *gaps.iter().max()?;
        let n = gaps.len() as i64;
        let sum: i64 = gaps.iter().sum();

        // Half rounds up; all gaps are positive here
        let rounded_mean = (2 * sum + n) / (2 * n);

        let mean = sum as f64 / n as f64;
        let variance = gaps
            .iter()
            .map(|&g| {
                let d = g as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n as f64;

        Some(GapStats {
            rounded_mean,
            spread: max - min,
            std_deviation: variance.sqrt(),
        })
    }
}
