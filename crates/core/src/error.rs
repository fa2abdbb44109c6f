//! Error types for window resolution, per-fire persistence and configuration

use chrono::NaiveDateTime;
use thiserror::Error;

/// The dispersion window could not be determined. Fatal for the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("Unable to determine dispersion 'start': no fire has any activity")]
    MissingStart,

    #[error("Unable to determine dispersion 'num_hours'")]
    MissingNumHours,

    #[error("Dispersion window starting {start} for {num_hours} hours is out of range")]
    OutOfRange { start: NaiveDateTime, num_hours: i64 },
}

/// A fire's activity layout does not meet the persistence precondition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Each fire must belong to an event when running persistence")]
    MissingEvent,

    #[error("Each fire must have only 1 activity object when running persistence (found {found})")]
    ActivityCount { found: usize },

    #[error("Each fire must have only 1 active area when running persistence (found {found})")]
    ActiveAreaCount { found: usize },
}

/// Recoverable per-fire failure, recorded and skipped by the batch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FireError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Persisted activity after {after} falls outside the supported calendar")]
    DateOverflow { after: NaiveDateTime },
}

/// Configuration could not be layered or parsed
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config override '{0}': expected SECTION.KEY=VALUE")]
    InvalidOverride(String),
}
