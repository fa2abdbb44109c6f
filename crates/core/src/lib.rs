//! Fire Activity Persistence Core Library
//!
//! Extends modeled wildfire activity through the end of a dispersion window so
//! that downstream plume rise and dispersion stages see every fire active for
//! the whole period they model.
//!
//! ## Persistence
//!
//! - Dispersion window resolved from configuration or from the fire population
//! - Each fire's single day of activity copied forward one day at a time
//! - Per-fire failure isolation: invalid fires are reported, never fatal
//! - Optional pruning of fires and activity outside the window
//! - Sequential or rayon-parallel batches with identical results

// Data model: fires, activity, dispersion window
pub mod core_types;

// Configuration layers and typed persistence config
pub mod config;

// Error types
pub mod error;

// Window resolution, persistence engine, failure isolation, pruning
pub mod persistence;

// Re-export core types
pub use core_types::{ActiveArea, ActivityEntry, FireEvent, FireInformation, FireRecord};
pub use core_types::DispersionWindow;

// Re-export configuration and errors
pub use config::{ConfigLayers, DispersionOverrides, PersistenceConfig, PersistenceOptions};
pub use error::{ConfigError, FireError, ResolutionError, ValidationError};

// Re-export persistence types
pub use persistence::{FailureRecord, FailureReport, FailureSink, FireRecordView};
pub use persistence::{PersistenceEngine, PersistenceOutcome, PruneSummary, UnusedFirePruner};
