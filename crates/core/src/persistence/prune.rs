//! Removal of fires and activity that cannot contribute to dispersion
//!
//! Opt-in via `persistence.prune_unused_fires`; never part of the default run.

use super::view::FireRecordView;
use crate::core_types::fire::ActivityEntry;
use crate::core_types::window::DispersionWindow;
use serde::Serialize;
use tracing::debug;

/// What a prune pass removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PruneSummary {
    /// Fires whose activity lay entirely outside the window
    pub fires_removed: usize,
    /// Activity entries removed from fires that were kept
    pub activity_removed: usize,
}

/// Drops fires and activity entries lying entirely outside a dispersion window
#[derive(Debug, Clone, Copy)]
pub struct UnusedFirePruner {
    window: DispersionWindow,
}

impl UnusedFirePruner {
    pub fn new(window: DispersionWindow) -> Self {
        Self { window }
    }

    /// An entry is unused when every one of its active areas ends at or before
    /// the window start or starts at or after the last hour. Entries without
    /// active areas are unused.
    pub fn is_unused(&self, entry: &ActivityEntry) -> bool {
        entry
            .active_areas
            .iter()
            .all(|area| self.window.excludes(area.start, area.end))
    }

    /// Prune `fires` in place, preserving the order of what remains.
    ///
    /// A fire with no used activity (including no activity at all) is removed
    /// entirely. Pruning twice with the same window removes nothing the
    /// second time.
    pub fn prune<F: FireRecordView>(&self, fires: &mut Vec<F>) -> PruneSummary {
        let before = fires.len();
        let mut activity_removed = 0;

        fires.retain_mut(|fire| {
            if fire.activity().iter().all(|entry| self.is_unused(entry)) {
                debug!("Pruning fire {} outside dispersion window", fire.fire_id());
                return false;
            }
            let count = fire.activity().len();
            fire.retain_activity(|entry| !self.is_unused(entry));
            activity_removed += count - fire.activity().len();
            true
        });

        let summary = PruneSummary {
            fires_removed: before - fires.len(),
            activity_removed,
        };
        debug!(
            "Pruned {} fires and {} activity entries",
            summary.fires_removed, summary.activity_removed
        );
        summary
    }
}
