//! Configuration file support for Cyclewise.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/cyclewise/config.toml`.
//! Every field has a default, so a missing or partial file is fine.

use crate::{Error, FunctionalPhase, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub prediction: PredictionConfig,

    #[serde(default)]
    pub phases: PhaseConfig,

    #[serde(default)]
    pub recommendations: RecommendationsConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Tunables for next-cycle prediction
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PredictionConfig {
    /// Cycle length assumed when fewer than two start dates are usable
    #[serde(default = "default_cycle_days")]
    pub default_cycle_days: i64,

    /// Max-minus-min gap above which the cycle is reported as irregular
    #[serde(default = "default_irregularity_spread_days")]
    pub irregularity_spread_days: i64,

    /// Gaps longer than this are treated as missed logs and ignored
    #[serde(default = "default_max_cycle_days")]
    pub max_cycle_days: i64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            default_cycle_days: default_cycle_days(),
            irregularity_spread_days: default_irregularity_spread_days(),
            max_cycle_days: default_max_cycle_days(),
        }
    }
}

/// A functional window expressed in days of the nominal cycle, half-open
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FunctionalWindowConfig {
    pub phase: FunctionalPhase,
    pub day_start: i64,
    pub day_end: i64,
}

/// Phase boundaries on the nominal cycle
///
/// Cut-offs are 0-indexed days of a `nominal_cycle_days` cycle and are scaled
/// proportionally when classifying against a different average duration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PhaseConfig {
    #[serde(default = "default_cycle_days")]
    pub nominal_cycle_days: i64,

    #[serde(default = "default_follicular_start")]
    pub follicular_start: i64,

    #[serde(default = "default_ovulation_start")]
    pub ovulation_start: i64,

    #[serde(default = "default_luteal_start")]
    pub luteal_start: i64,

    #[serde(default = "default_functional_windows")]
    pub functional_windows: Vec<FunctionalWindowConfig>,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            nominal_cycle_days: default_cycle_days(),
            follicular_start: default_follicular_start(),
            ovulation_start: default_ovulation_start(),
            luteal_start: default_luteal_start(),
            functional_windows: default_functional_windows(),
        }
    }
}

/// Where the recommendation table comes from
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct RecommendationsConfig {
    /// TOML file with a custom table; the built-in table is used when unset
    #[serde(default)]
    pub table_path: Option<PathBuf>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("cyclewise")
}

fn default_cycle_days() -> i64 {
    28
}

fn default_irregularity_spread_days() -> i64 {
    7
}

fn default_max_cycle_days() -> i64 {
    90
}

fn default_follicular_start() -> i64 {
    5
}

fn default_ovulation_start() -> i64 {
    13
}

fn default_luteal_start() -> i64 {
    16
}

fn default_functional_windows() -> Vec<FunctionalWindowConfig> {
    vec![
        FunctionalWindowConfig {
            phase: FunctionalPhase::Power,
            day_start: 0,
            day_end: 10,
        },
        FunctionalWindowConfig {
            phase: FunctionalPhase::Manifestation,
            day_start: 10,
            day_end: 15,
        },
        FunctionalWindowConfig {
            phase: FunctionalPhase::Power,
            day_start: 15,
            day_end: 19,
        },
        FunctionalWindowConfig {
            phase: FunctionalPhase::Nurture,
            day_start: 19,
            day_end: 28,
        },
    ]
}

impl PredictionConfig {
    /// Upper bound for any configured cycle length
    pub const MAX_CONFIGURABLE_DAYS: i64 = 365;

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("default_cycle_days", self.default_cycle_days),
            ("max_cycle_days", self.max_cycle_days),
            ("irregularity_spread_days", self.irregularity_spread_days),
        ] {
            if value > Self::MAX_CONFIGURABLE_DAYS {
                return Err(Error::Config(format!(
                    "prediction.{} must be at most {}, got {}",
                    name,
                    Self::MAX_CONFIGURABLE_DAYS,
                    value
                )));
            }
        }
        if self.default_cycle_days <= 0 {
            return Err(Error::Config(format!(
                "prediction.default_cycle_days must be positive, got {}",
                self.default_cycle_days
            )));
        }
        if self.irregularity_spread_days < 0 {
            return Err(Error::Config(format!(
                "prediction.irregularity_spread_days must not be negative, got {}",
                self.irregularity_spread_days
            )));
        }
        if self.max_cycle_days < self.default_cycle_days {
            return Err(Error::Config(format!(
                "prediction.max_cycle_days ({}) is shorter than default_cycle_days ({})",
                self.max_cycle_days, self.default_cycle_days
            )));
        }
        Ok(())
    }
}

impl PhaseConfig {
    /// Check that the traditional cut-offs are ordered and the functional
    /// windows tile `[0, nominal_cycle_days)` without gaps or overlaps
    pub fn validate(&self) -> Result<()> {
        let nominal = self.nominal_cycle_days;
        if nominal <= 0 {
            return Err(Error::Config(format!(
                "phases.nominal_cycle_days must be positive, got {}",
                nominal
            )));
        }

        let cuts = [self.follicular_start, self.ovulation_start, self.luteal_start];
        let ordered = 0 < cuts[0] && cuts[0] <= cuts[1] && cuts[1] <= cuts[2] && cuts[2] < nominal;
        if !ordered {
            return Err(Error::Config(format!(
                "phases: expected 0 < follicular_start <= ovulation_start <= luteal_start < {}, got {:?}",
                nominal, cuts
            )));
        }

        let mut expected_start = 0;
        for window in &self.functional_windows {
            if window.day_start != expected_start {
                return Err(Error::Config(format!(
                    "phases.functional_windows: {} window starts at day {}, expected {}",
                    window.phase, window.day_start, expected_start
                )));
            }
            if window.day_end <= window.day_start {
                return Err(Error::Config(format!(
                    "phases.functional_windows: {} window [{}, {}) is empty",
                    window.phase, window.day_start, window.day_end
                )));
            }
            expected_start = window.day_end;
        }
        if expected_start != nominal {
            return Err(Error::Config(format!(
                "phases.functional_windows must end at day {}, ends at {}",
                nominal, expected_start
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("cyclewise").join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        self.prediction.validate()?;
        self.phases.validate()?;
        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }
}
