#![forbid(unsafe_code)]

//! Core domain model and business logic for Cyclewise.
//!
//! This crate provides:
//! - Domain types (events, phases, predictions, recommendation bundles)
//! - Cycle history derivation and next-cycle prediction
//! - Phase classification on the traditional and functional models
//! - Recommendation table lookup
//! - Persistence (JSONL event store, CSV import/export)
//! - Descriptive statistics

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod history;
pub mod predictor;
pub mod classifier;
pub mod recommendation;
pub mod statistics;
pub mod store;
pub mod csv_io;
pub mod engine;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::{
    Config, DataConfig, FunctionalWindowConfig, PhaseConfig, PredictionConfig,
    RecommendationsConfig,
};
pub use history::{cycle_history, period_history, PeriodRange};
pub use predictor::{predict_next_cycle, predict_next_cycle_with};
pub use classifier::{classify, classify_with, next_phase, phase_calendar, CalendarEntry};
pub use recommendation::{select_recommendations, select_recommendations_by_tag};
pub use statistics::{
    cycle_statistics, cycle_statistics_recent, phase_statistics, CycleStatistics, PhaseStatistics,
};
pub use store::{EventStore, JsonlEventStore, MemoryEventStore};
pub use csv_io::{export_csv, import_csv, ImportReport};
pub use engine::{Advice, CycleEngine};
