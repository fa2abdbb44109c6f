//! Per-fire failure isolation
//!
//! A fire that fails persistence is recorded against its identifier and
//! skipped; the batch carries on with the next fire. Only [`FireError`]s are
//! absorbed. Panics are not caught and abort the batch.

use super::view::FireRecordView;
use crate::error::FireError;
use tracing::warn;

/// One fire that could not be processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub fire_id: String,
    pub event_id: Option<String>,
    pub error: FireError,
}

/// Destination for per-fire failures
pub trait FailureSink {
    fn record(&mut self, failure: FailureRecord);
}

/// Ordered, append-only list of per-fire failures for one batch
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FailureReport {
    failures: Vec<FailureRecord>,
}

impl FailureReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FailureRecord> {
        self.failures.iter()
    }

    /// Whether any failure was recorded for `fire_id`
    pub fn contains(&self, fire_id: &str) -> bool {
        self.failures.iter().any(|f| f.fire_id == fire_id)
    }
}

impl FailureSink for FailureReport {
    fn record(&mut self, failure: FailureRecord) {
        self.failures.push(failure);
    }
}

impl<'a> IntoIterator for &'a FailureReport {
    type Item = &'a FailureRecord;
    type IntoIter = std::slice::Iter<'a, FailureRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.iter()
    }
}

/// Runs per-fire work and forwards failures to a sink
pub struct FailureBoundary<'s, S: FailureSink + ?Sized> {
    sink: &'s mut S,
}

impl<'s, S: FailureSink + ?Sized> FailureBoundary<'s, S> {
    pub fn new(sink: &'s mut S) -> Self {
        Self { sink }
    }

    /// Run `op` on `fire`, returning its value or `None` once the failure is recorded
    pub fn guard<F, T, Op>(&mut self, fire: &mut F, op: Op) -> Option<T>
    where
        F: FireRecordView + ?Sized,
        Op: FnOnce(&mut F) -> Result<T, FireError>,
    {
        let result = op(fire);
        self.absorb(&*fire, result)
    }

    /// Fold an already computed per-fire result into the sink
    pub fn absorb<F, T>(&mut self, fire: &F, result: Result<T, FireError>) -> Option<T>
    where
        F: FireRecordView + ?Sized,
    {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                warn!("Skipping fire {}: {}", fire.fire_id(), error);
                self.sink.record(FailureRecord {
                    fire_id: fire.fire_id().to_owned(),
                    event_id: fire.event_id().map(str::to_owned),
                    error,
                });
                None
            }
        }
    }
}
