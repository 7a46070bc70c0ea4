//! Core domain types for the Cyclewise system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Phase tags (traditional and functional)
//! - Logged cycle events and their validated fields
//! - Prediction results and warnings
//! - Classified phases and recommendation bundles

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::Error;

// ============================================================================
// Phase Tags
// ============================================================================

/// One of the four classical menstrual-cycle stages
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TraditionalPhase {
    #[serde(alias = "menstruacion")]
    Menstruation,
    #[serde(alias = "folicular")]
    Follicular,
    #[serde(alias = "ovulacion")]
    Ovulation,
    #[serde(alias = "lutea")]
    Luteal,
}

impl TraditionalPhase {
    /// All phases in cycle order
    pub const ALL: [TraditionalPhase; 4] = [
        TraditionalPhase::Menstruation,
        TraditionalPhase::Follicular,
        TraditionalPhase::Ovulation,
        TraditionalPhase::Luteal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TraditionalPhase::Menstruation => "menstruation",
            TraditionalPhase::Follicular => "follicular",
            TraditionalPhase::Ovulation => "ovulation",
            TraditionalPhase::Luteal => "luteal",
        }
    }

    /// The phase that follows this one; luteal wraps to menstruation
    pub fn next(&self) -> TraditionalPhase {
        match self {
            TraditionalPhase::Menstruation => TraditionalPhase::Follicular,
            TraditionalPhase::Follicular => TraditionalPhase::Ovulation,
            TraditionalPhase::Ovulation => TraditionalPhase::Luteal,
            TraditionalPhase::Luteal => TraditionalPhase::Menstruation,
        }
    }
}

impl fmt::Display for TraditionalPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TraditionalPhase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "menstruation" | "menstruacion" => Ok(TraditionalPhase::Menstruation),
            "follicular" | "folicular" => Ok(TraditionalPhase::Follicular),
            "ovulation" | "ovulacion" => Ok(TraditionalPhase::Ovulation),
            "luteal" | "lutea" => Ok(TraditionalPhase::Luteal),
            other => Err(Error::UnknownPhase(other.to_string())),
        }
    }
}

/// Three-way grouping used to select dietary and fasting guidance
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum FunctionalPhase {
    Power,
    Manifestation,
    Nurture,
}

impl FunctionalPhase {
    pub const ALL: [FunctionalPhase; 3] = [
        FunctionalPhase::Power,
        FunctionalPhase::Manifestation,
        FunctionalPhase::Nurture,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionalPhase::Power => "power",
            FunctionalPhase::Manifestation => "manifestation",
            FunctionalPhase::Nurture => "nurture",
        }
    }

    /// Extended fasting is only suggested during power windows
    pub fn is_fasting_recommended(&self) -> bool {
        matches!(self, FunctionalPhase::Power)
    }
}

impl fmt::Display for FunctionalPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FunctionalPhase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "power" => Ok(FunctionalPhase::Power),
            "manifestation" => Ok(FunctionalPhase::Manifestation),
            "nurture" => Ok(FunctionalPhase::Nurture),
            other => Err(Error::UnknownPhase(other.to_string())),
        }
    }
}

// ============================================================================
// Event Types
// ============================================================================

/// A self-reported pain or energy level in `0..=5`
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(try_from = "u8", into = "u8")]
pub struct Level(u8);

impl Level {
    pub const MAX: u8 = 5;

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Level {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > Self::MAX {
            return Err(Error::InvalidEvent(format!(
                "level {} is outside 0..={}",
                value,
                Self::MAX
            )));
        }
        Ok(Level(value))
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX)
    }
}

/// Identifier of the person who owns a history
///
/// Restricted to ASCII alphanumerics, `-` and `_` so it can key a store
/// (and name a file) without escaping.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    pub const MAX_LEN: usize = 64;

    pub fn new(id: impl Into<String>) -> Result<Self, Error> {
        let id = id.into();
        if id.is_empty() || id.len() > Self::MAX_LEN {
            return Err(Error::InvalidEvent(format!(
                "user id must be 1..={} characters",
                Self::MAX_LEN
            )));
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::InvalidEvent(format!(
                "user id '{}' contains unsupported characters",
                id
            )));
        }
        Ok(UserId(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        UserId::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single logged observation for one day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CycleEvent {
    pub id: Uuid,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub phase: TraditionalPhase,
    #[serde(default)]
    pub pain_level: Option<Level>,
    #[serde(default)]
    pub energy_level: Option<Level>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CycleEvent {
    pub fn new(user_id: UserId, date: NaiveDate, phase: TraditionalPhase) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            date,
            phase,
            pain_level: None,
            energy_level: None,
            notes: None,
        }
    }

    pub fn with_pain(mut self, level: u8) -> Result<Self, Error> {
        self.pain_level = Some(Level::try_from(level)?);
        Ok(self)
    }

    pub fn with_energy(mut self, level: u8) -> Result<Self, Error> {
        self.energy_level = Some(Level::try_from(level)?);
        Ok(self)
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        let note = note.into();
        self.notes = if note.trim().is_empty() { None } else { Some(note) };
        self
    }

    /// True for events that mark a day of bleeding
    pub fn is_menstruation(&self) -> bool {
        self.phase == TraditionalPhase::Menstruation
    }
}

// ============================================================================
// Prediction Types
// ============================================================================

/// Non-fatal observations attached to a prediction
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredictionWarning {
    /// Fewer than two usable start dates; the default duration was assumed
    InsufficientHistory,
    /// Accepted gaps vary by more than the configured threshold
    IrregularCycle { spread_days: i64 },
    /// Duplicate or out-of-order start dates were left out of the average
    NonIncreasingDates { excluded: usize },
    /// Implausibly long gaps (usually a missed log) were left out of the average
    OutOfRangeGaps { excluded: usize, max_days: i64 },
}

impl fmt::Display for PredictionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionWarning::InsufficientHistory => f.write_str("insufficient history"),
            PredictionWarning::IrregularCycle { spread_days } => write!(
                f,
                "irregular cycle: cycle lengths vary by {} days",
                spread_days
            ),
            PredictionWarning::NonIncreasingDates { excluded } => write!(
                f,
                "{} duplicate or out-of-order start date(s) ignored",
                excluded
            ),
            PredictionWarning::OutOfRangeGaps { excluded, max_days } => write!(
                f,
                "{} gap(s) longer than {} days ignored",
                excluded, max_days
            ),
        }
    }
}

/// Outcome of a next-cycle prediction
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PredictionResult {
    pub next_start: NaiveDate,
    pub average_duration: i64,
    pub last_start: NaiveDate,
    /// Number of gaps that contributed to the average
    pub gaps_used: usize,
    /// Difference between the longest and shortest accepted gap
    pub gap_spread: Option<i64>,
    /// Population standard deviation of accepted gaps
    pub std_deviation: Option<f64>,
    pub warnings: Vec<PredictionWarning>,
}

impl PredictionResult {
    /// All warnings joined into one line, or `None` when the prediction is clean
    pub fn warning(&self) -> Option<String> {
        if self.warnings.is_empty() {
            return None;
        }
        Some(
            self.warnings
                .iter()
                .map(|w| w.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    pub fn has_warning(&self, predicate: impl Fn(&PredictionWarning) -> bool) -> bool {
        self.warnings.iter().any(predicate)
    }
}

// ============================================================================
// Phase Types
// ============================================================================

/// An inclusive calendar range covered by one phase window
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhaseWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_days: i64,
}

impl PhaseWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Classification of one calendar date
///
/// `start_date`/`end_date`/`duration_days` describe the traditional window;
/// the functional window is carried separately because the two groupings
/// have different boundaries.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Phase {
    pub traditional: TraditionalPhase,
    pub functional: FunctionalPhase,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_days: i64,
    /// 0-indexed day within the containing cycle
    pub day_in_cycle: i64,
    pub cycle_start: NaiveDate,
    pub functional_window: PhaseWindow,
}

impl Phase {
    pub fn window(&self) -> PhaseWindow {
        PhaseWindow {
            start_date: self.start_date,
            end_date: self.end_date,
            duration_days: self.duration_days,
        }
    }
}

// ============================================================================
// Recommendation Types
// ============================================================================

/// Dietary, fasting and activity guidance for one functional phase
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RecommendationBundle {
    pub phase: FunctionalPhase,
    pub diet_style: String,
    pub fasting_protocol: String,
    /// Food lists keyed by category ("proteins", "vegetables", ...)
    #[serde(default)]
    pub foods: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default)]
    pub supplements: Vec<String>,
}

/// The immutable lookup table of bundles, one per functional phase
#[derive(Clone, Debug)]
pub struct RecommendationTable {
    pub bundles: HashMap<FunctionalPhase, RecommendationBundle>,
}
