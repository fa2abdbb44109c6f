//! Dispersion time window

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

/// The `[start, start + num_hours)` period downstream dispersion runs over.
///
/// Resolved once per batch and read-only afterwards. `last_hour` is computed
/// at construction so a window that would overflow the calendar can never
/// exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispersionWindow {
    start: NaiveDateTime,
    num_hours: u32,
    last_hour: NaiveDateTime,
}

impl DispersionWindow {
    /// Create a window, or `None` if `start + num_hours` is not representable
    pub fn try_new(start: NaiveDateTime, num_hours: u32) -> Option<Self> {
        let last_hour = start.checked_add_signed(Duration::hours(i64::from(num_hours)))?;
        Some(Self {
            start,
            num_hours,
            last_hour,
        })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn num_hours(&self) -> u32 {
        self.num_hours
    }

    /// `start + num_hours`
    pub fn last_hour(&self) -> NaiveDateTime {
        self.last_hour
    }

    /// True when `start..end` shares no time with the window
    pub fn excludes(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        end <= self.start || start >= self.last_hour
    }
}
