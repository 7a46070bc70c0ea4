//! Error types for the cycle_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for cycle_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No usable history at all (prediction cannot even anchor on a date)
    #[error("Insufficient data: no cycle start events recorded")]
    InsufficientData,

    /// Average cycle duration must be a positive number of days
    #[error("Invalid cycle duration: {0} days")]
    InvalidDuration(i64),

    /// A computed date fell outside the representable calendar
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Phase tag outside the recognized set, or missing from the recommendation table
    #[error("Unknown phase: {0}")]
    UnknownPhase(String),

    /// Event failed validation (levels out of range, bad user id, ...)
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Text suitable for showing to the person using the front-end.
    ///
    /// Only missing data is explained; everything else is an upstream bug or
    /// an environment problem and is reported generically.
    pub fn user_message(&self) -> String {
        match self {
            Error::InsufficientData => {
                "Not enough data yet: log the first day of your period to get a prediction."
                    .to_string()
            }
            Error::InvalidEvent(reason) => format!("That entry could not be saved: {}", reason),
            _ => "Something went wrong while computing your cycle. Please try again later."
                .to_string(),
        }
    }
}
