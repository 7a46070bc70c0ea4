//! Advice engine combining prediction, classification and recommendations.
//!
//! The engine owns nothing mutable: it holds the configured models and the
//! recommendation table, and every call recomputes from the raw events it is
//! given.
//!
//! 1. Derive the cycle-start history from raw events
//! 2. Predict the average cycle length and next start
//! 3. Classify the target date against the latest start
//! 4. Select the bundle for the functional phase

use crate::classifier::{classify_with, next_phase_with, phase_calendar, CalendarEntry};
use crate::history::{cycle_history, duplicate_menstruation_days};
use crate::predictor::predict_next_cycle_with;
use crate::recommendation::select_recommendations;
use crate::{
    Config, CycleEvent, Phase, PhaseConfig, PredictionConfig, PredictionResult,
    PredictionWarning, RecommendationBundle, RecommendationTable, Result,
};
use chrono::NaiveDate;
use serde::Serialize;

/// Everything a front-end needs to show for one day
#[derive(Clone, Debug, Serialize)]
pub struct Advice {
    pub date: NaiveDate,
    pub prediction: PredictionResult,
    pub phase: Phase,
    /// The traditional phase following `phase`
    pub next_phase: Phase,
    /// Whether the functional phase calls for the bundle's fasting protocol
    pub fasting_recommended: bool,
    pub recommendations: RecommendationBundle,
}

#[derive(Clone, Debug)]
pub struct CycleEngine {
    prediction: PredictionConfig,
    phases: PhaseConfig,
    table: RecommendationTable,
}

impl CycleEngine {
    pub fn new(config: &Config, table: RecommendationTable) -> Self {
        Self {
            prediction: config.prediction.clone(),
            phases: config.phases.clone(),
            table,
        }
    }

    /// Build an engine with the recommendation table the config points at
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let table = RecommendationTable::from_config(&config.recommendations)?;
        Ok(Self::new(config, table))
    }

    /// Predict the next cycle start from raw events
    ///
    /// Bleeding days logged twice are folded into one period day before
    /// prediction; they are still reported as excluded duplicates.
    pub fn predict(&self, events: &[CycleEvent]) -> Result<PredictionResult> {
        let mut prediction = predict_next_cycle_with(&cycle_history(events), &self.prediction)?;

        let duplicates = duplicate_menstruation_days(events);
        if duplicates > 0 {
            tracing::warn!("Ignoring {} duplicate menstruation entries", duplicates);
            let existing = prediction.warnings.iter_mut().find_map(|w| match w {
                PredictionWarning::NonIncreasingDates { excluded } => Some(excluded),
                _ => None,
            });
            match existing {
                Some(excluded) => *excluded += duplicates,
                None => prediction.warnings.insert(
                    0,
                    PredictionWarning::NonIncreasingDates {
                        excluded: duplicates,
                    },
                ),
            }
        }

        Ok(prediction)
    }

    /// Phase and recommendations for `target`
    pub fn advise(&self, events: &[CycleEvent], target: NaiveDate) -> Result<Advice> {
        let prediction = self.predict(events)?;
        let phase = classify_with(
            &self.phases,
            prediction.last_start,
            prediction.average_duration,
            target,
        )?;
        let next_phase = next_phase_with(&self.phases, &phase, prediction.average_duration)?;
        let recommendations = select_recommendations(&self.table, phase.functional)?.clone();

        tracing::info!(
            "{} is day {} of the cycle: {} / {}",
            target,
            phase.day_in_cycle + 1,
            phase.traditional,
            phase.functional
        );

        Ok(Advice {
            date: target,
            prediction,
            fasting_recommended: phase.functional.is_fasting_recommended(),
            phase,
            next_phase,
            recommendations,
        })
    }

    /// Phase calendar for `days` days starting at `from`
    pub fn calendar(
        &self,
        events: &[CycleEvent],
        from: NaiveDate,
        days: u32,
    ) -> Result<Vec<CalendarEntry>> {
        let prediction = self.predict(events)?;
        phase_calendar(
            &self.phases,
            prediction.last_start,
            prediction.average_duration,
            from,
            days,
        )
    }
}

impl Default for CycleEngine {
    fn default() -> Self {
        Self::new(&Config::default(), RecommendationTable::builtin())
    }
}
