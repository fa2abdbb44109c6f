//! Fire activity persistence
//!
//! Fires whose known activity stops before the end of the dispersion window
//! are extended by copying their last activity entry forward one day at a
//! time. A copy is made for every day whose shifted start is at or before the
//! window's last hour, so the persisted activity covers the whole window.
//!
//! # Batch flow
//! 1. The dispersion window is resolved once for the whole population
//!    ([`resolve_window`]); a resolution failure aborts before any fire is
//!    touched.
//! 2. Every fire is persisted independently behind a [`FailureBoundary`]; a
//!    fire that fails validation is recorded and left unchanged.
//! 3. Optionally, [`UnusedFirePruner`] drops what lies outside the window.
//!
//! [`PersistenceEngine::run_parallel`] spreads step 2 over the rayon pool.
//! The window is frozen before any fire is processed, each fire's mutation is
//! local to that fire, and failures are folded into the report afterwards in
//! population order, so both runs produce identical results.

pub mod failure;
pub mod prune;
pub mod resolver;
pub mod view;

pub use failure::{FailureBoundary, FailureRecord, FailureReport, FailureSink};
pub use prune::{PruneSummary, UnusedFirePruner};
pub use resolver::{earliest_start, latest_end, resolve_window};
pub use view::FireRecordView;

use crate::config::PersistenceConfig;
use crate::core_types::fire::{ActiveArea, ActivityEntry};
use crate::core_types::window::DispersionWindow;
use crate::error::{FireError, ResolutionError, ValidationError};
use chrono::{Duration, NaiveDateTime};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

/// Days between consecutive persisted activity entries
pub const PERSISTENCE_STEP_DAYS: i64 = 1;

fn step() -> Duration {
    Duration::days(PERSISTENCE_STEP_DAYS)
}

/// Entries synthesized by one batch
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PersistenceTally {
    /// Total new activity entries
    pub created: usize,
    /// New activity entries per successfully processed fire id
    pub created_by_fire: FxHashMap<String, usize>,
}

impl PersistenceTally {
    fn add(&mut self, fire_id: &str, created: usize) {
        self.created += created;
        *self.created_by_fire.entry(fire_id.to_owned()).or_insert(0) += created;
    }
}

/// Result of a full persistence run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceOutcome {
    /// Window the batch was persisted against
    pub window: DispersionWindow,
    /// Total new activity entries
    pub created: usize,
    /// New activity entries per successfully processed fire id
    pub created_by_fire: FxHashMap<String, usize>,
    /// Fires that were skipped
    pub failures: FailureReport,
    /// Present when pruning was enabled
    pub pruned: Option<PruneSummary>,
}

/// Persistence stage driven by a [`PersistenceConfig`]
#[derive(Debug, Clone, Default)]
pub struct PersistenceEngine {
    config: PersistenceConfig,
}

impl PersistenceEngine {
    pub fn new(config: PersistenceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PersistenceConfig {
        &self.config
    }

    /// Resolve the window and persist every fire sequentially.
    ///
    /// # Errors
    /// Returns [`ResolutionError`] if the dispersion window cannot be
    /// determined. No fire is modified in that case. Per-fire failures are
    /// reported in [`PersistenceOutcome::failures`], never as an error.
    pub fn run<F: FireRecordView>(
        &self,
        fires: &mut Vec<F>,
    ) -> Result<PersistenceOutcome, ResolutionError> {
        let window = self.resolve(fires.as_slice())?;
        let mut failures = FailureReport::new();
        let tally = persist_fires(fires.as_mut_slice(), &window, &mut failures);
        Ok(self.finish(fires, window, tally, failures))
    }

    /// Same as [`run`](Self::run) with fires persisted on the rayon thread pool
    ///
    /// # Errors
    /// See [`run`](Self::run).
    pub fn run_parallel<F: FireRecordView + Send>(
        &self,
        fires: &mut Vec<F>,
    ) -> Result<PersistenceOutcome, ResolutionError> {
        let window = self.resolve(fires.as_slice())?;
        let mut failures = FailureReport::new();
        let tally = persist_fires_parallel(fires.as_mut_slice(), &window, &mut failures);
        Ok(self.finish(fires, window, tally, failures))
    }

    fn resolve<F: FireRecordView>(
        &self,
        fires: &[F],
    ) -> Result<DispersionWindow, ResolutionError> {
        let window = resolve_window(fires, &self.config.dispersion)?;
        debug!(
            "Dispersion window: {} for {} hours",
            window.start(),
            window.num_hours()
        );
        Ok(window)
    }

    fn finish<F: FireRecordView>(
        &self,
        fires: &mut Vec<F>,
        window: DispersionWindow,
        tally: PersistenceTally,
        failures: FailureReport,
    ) -> PersistenceOutcome {
        info!("Persistence model created {} new fire records", tally.created);

        let pruned = self
            .config
            .persistence
            .prune_unused_fires
            .then(|| UnusedFirePruner::new(window).prune(fires));

        PersistenceOutcome {
            window,
            created: tally.created,
            created_by_fire: tally.created_by_fire,
            failures,
            pruned,
        }
    }
}

/// Persist every fire against `window`, sending failures to `sink`
pub fn persist_fires<F, S>(
    fires: &mut [F],
    window: &DispersionWindow,
    sink: &mut S,
) -> PersistenceTally
where
    F: FireRecordView,
    S: FailureSink + ?Sized,
{
    let mut tally = PersistenceTally::default();
    let mut boundary = FailureBoundary::new(sink);

    for fire in fires.iter_mut() {
        if let Some(created) = boundary.guard(fire, |fire| persist_fire(fire, window)) {
            tally.add(fire.fire_id(), created);
        }
    }
    tally
}

/// [`persist_fires`] with the per-fire work spread over the rayon pool
pub fn persist_fires_parallel<F, S>(
    fires: &mut [F],
    window: &DispersionWindow,
    sink: &mut S,
) -> PersistenceTally
where
    F: FireRecordView + Send,
    S: FailureSink + ?Sized,
{
    let results: Vec<Result<usize, FireError>> = fires
        .par_iter_mut()
        .map(|fire| persist_fire(fire, window))
        .collect();

    let mut tally = PersistenceTally::default();
    let mut boundary = FailureBoundary::new(sink);
    for (fire, result) in fires.iter().zip(results) {
        if let Some(created) = boundary.absorb(fire, result) {
            tally.add(fire.fire_id(), created);
        }
    }
    tally
}

/// Persist one fire, returning the number of activity entries appended.
///
/// The fire must belong to an event and hold exactly one activity entry with
/// exactly one active area. Copies of that entry are appended with the active area moved forward
/// one day at a time, starting the day after the known activity, for as long
/// as the shifted start is at or before the window's last hour.
///
/// On error the fire is left unchanged.
///
/// # Errors
/// - [`FireError::Validation`] if the fire has no event or the activity
///   layout is not one entry with one active area.
/// - [`FireError::DateOverflow`] if the shifted dates leave the calendar.
pub fn persist_fire<F: FireRecordView + ?Sized>(
    fire: &mut F,
    window: &DispersionWindow,
) -> Result<usize, FireError> {
    if fire.event_id().is_none() {
        return Err(ValidationError::MissingEvent.into());
    }
    let template = sole_activity(fire.activity())?;
    let area = sole_active_area(template)?;

    let mut start = advance(area.start)?;
    let mut end = advance(area.end)?;
    let mut persisted = Vec::new();

    while start <= window.last_hour() {
        persisted.push(template.with_active_window(start, end));
        start = advance(start)?;
        end = advance(end)?;
    }

    let created = persisted.len();
    for entry in persisted {
        fire.push_activity(entry);
    }
    Ok(created)
}

fn sole_activity(activity: &[ActivityEntry]) -> Result<&ActivityEntry, ValidationError> {
    match activity {
        [entry] => Ok(entry),
        _ => Err(ValidationError::ActivityCount {
            found: activity.len(),
        }),
    }
}

fn sole_active_area(entry: &ActivityEntry) -> Result<&ActiveArea, ValidationError> {
    match entry.active_areas.as_slice() {
        [area] => Ok(area),
        areas => Err(ValidationError::ActiveAreaCount { found: areas.len() }),
    }
}

fn advance(at: NaiveDateTime) -> Result<NaiveDateTime, FireError> {
    at.checked_add_signed(step())
        .ok_or(FireError::DateOverflow { after: at })
}
