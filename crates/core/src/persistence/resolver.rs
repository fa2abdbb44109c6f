//! Dispersion window resolution
//!
//! The window comes from configuration when both `start` and `num_hours` are
//! given, otherwise it is inferred from the activity of the whole fire
//! population. Resolution is a pure function of its inputs.

use super::view::FireRecordView;
use crate::config::DispersionOverrides;
use crate::core_types::window::DispersionWindow;
use crate::error::ResolutionError;
use chrono::NaiveDateTime;

/// Earliest active-area start across the population
pub fn earliest_start<F: FireRecordView>(fires: &[F]) -> Option<NaiveDateTime> {
    fires.iter().filter_map(FireRecordView::earliest_start).min()
}

/// Latest active-area end across the population
pub fn latest_end<F: FireRecordView>(fires: &[F]) -> Option<NaiveDateTime> {
    fires.iter().filter_map(FireRecordView::latest_end).max()
}

/// Resolve the dispersion window for a batch.
///
/// - Both overrides set: used unchanged.
/// - `start` missing: the population's earliest start.
/// - `num_hours` missing: whole hours from the earliest start to the latest
///   end, only when the start was itself taken from the population. With an
///   explicitly configured start there is no sound duration to infer.
///
/// # Errors
/// - [`ResolutionError::MissingStart`] if a value is needed from the
///   population and no fire has any activity.
/// - [`ResolutionError::MissingNumHours`] if `num_hours` cannot be inferred.
/// - [`ResolutionError::OutOfRange`] if the window does not fit the calendar.
pub fn resolve_window<F: FireRecordView>(
    fires: &[F],
    overrides: &DispersionOverrides,
) -> Result<DispersionWindow, ResolutionError> {
    if let DispersionOverrides {
        start: Some(start),
        num_hours: Some(num_hours),
    } = *overrides
    {
        return window(start, num_hours);
    }

    let earliest = earliest_start(fires).ok_or(ResolutionError::MissingStart)?;
    let start = overrides.start.unwrap_or(earliest);

    let num_hours = match overrides.num_hours {
        Some(num_hours) => num_hours,
        None if start == earliest => inferred_num_hours(fires, earliest)?,
        None => return Err(ResolutionError::MissingNumHours),
    };

    window(start, num_hours)
}

fn inferred_num_hours<F: FireRecordView>(
    fires: &[F],
    earliest: NaiveDateTime,
) -> Result<u32, ResolutionError> {
    let latest = latest_end(fires)
        .filter(|latest| *latest > earliest)
        .ok_or(ResolutionError::MissingNumHours)?;

    let hours = (latest - earliest).num_hours();
    if hours == 0 {
        // Less than one whole hour of activity
        return Err(ResolutionError::MissingNumHours);
    }
    u32::try_from(hours).map_err(|_| ResolutionError::OutOfRange {
        start: earliest,
        num_hours: hours,
    })
}

fn window(start: NaiveDateTime, num_hours: u32) -> Result<DispersionWindow, ResolutionError> {
    DispersionWindow::try_new(start, num_hours).ok_or(ResolutionError::OutOfRange {
        start,
        num_hours: i64::from(num_hours),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::fire::{ActivityEntry, FireRecord};
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 1, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .unwrap()
    }

    fn fire(id: &str, start: NaiveDateTime, end: NaiveDateTime) -> FireRecord {
        FireRecord::new(id).with_activity(ActivityEntry::single(start, end))
    }

    #[test]
    fn test_configured_window_is_returned_unchanged() {
        let overrides = DispersionOverrides::new(Some(at(5, 0)), Some(12));
        let empty: Vec<FireRecord> = Vec::new();

        let window = resolve_window(&empty, &overrides).unwrap();
        assert_eq!(window.start(), at(5, 0));
        assert_eq!(window.num_hours(), 12);
    }

    #[test]
    fn test_window_from_population_extrema() {
        let fires = vec![fire("a", at(1, 0), at(2, 0)), fire("b", at(2, 0), at(3, 0))];

        let window = resolve_window(&fires, &DispersionOverrides::default()).unwrap();
        assert_eq!(window.start(), at(1, 0));
        assert_eq!(window.num_hours(), 48);
    }

    #[test]
    fn test_configured_hours_with_inferred_start() {
        let fires = vec![fire("a", at(2, 6), at(2, 18))];
        let overrides = DispersionOverrides::new(None, Some(0));

        let window = resolve_window(&fires, &overrides).unwrap();
        assert_eq!(window.start(), at(2, 6));
        assert_eq!(window.num_hours(), 0);
    }

    #[test]
    fn test_configured_start_without_hours_fails() {
        let fires = vec![fire("a", at(1, 0), at(3, 0))];
        let overrides = DispersionOverrides::new(Some(at(2, 0)), None);

        assert_eq!(
            resolve_window(&fires, &overrides),
            Err(ResolutionError::MissingNumHours)
        );
    }

    #[test]
    fn test_configured_start_matching_earliest_infers_hours() {
        let fires = vec![fire("a", at(1, 0), at(3, 0))];
        let overrides = DispersionOverrides::new(Some(at(1, 0)), None);

        let window = resolve_window(&fires, &overrides).unwrap();
        assert_eq!(window.num_hours(), 48);
    }

    #[test]
    fn test_no_activity_fails() {
        let fires = vec![FireRecord::new("bare")];
        assert_eq!(
            resolve_window(&fires, &DispersionOverrides::default()),
            Err(ResolutionError::MissingStart)
        );
        // A configured start still needs the population to infer hours
        assert_eq!(
            resolve_window(&fires, &DispersionOverrides::new(Some(at(1, 0)), None)),
            Err(ResolutionError::MissingStart)
        );
    }

    #[test]
    fn test_degenerate_population_span_fails() {
        let instant = vec![fire("a", at(1, 0), at(1, 0))];
        assert_eq!(
            resolve_window(&instant, &DispersionOverrides::default()),
            Err(ResolutionError::MissingNumHours)
        );

        let short = vec![fire(
            "a",
            at(1, 0),
            at(1, 0) + chrono::Duration::minutes(30),
        )];
        assert_eq!(
            resolve_window(&short, &DispersionOverrides::default()),
            Err(ResolutionError::MissingNumHours)
        );
    }

    #[test]
    fn test_partial_hours_are_truncated() {
        let fires = vec![fire(
            "a",
            at(1, 0),
            at(2, 5) + chrono::Duration::minutes(59),
        )];
        let window = resolve_window(&fires, &DispersionOverrides::default()).unwrap();
        assert_eq!(window.num_hours(), 29);
    }

    #[test]
    fn test_configured_window_out_of_range() {
        let empty: Vec<FireRecord> = Vec::new();
        let overrides = DispersionOverrides::new(Some(NaiveDateTime::MAX), Some(1));
        assert!(matches!(
            resolve_window(&empty, &overrides),
            Err(ResolutionError::OutOfRange { num_hours: 1, .. })
        ));
    }
}
