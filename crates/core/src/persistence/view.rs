//! Accessor trait over a fire's nested activity structure
//!
//! The engine, resolver and pruner only ever touch fires through
//! [`FireRecordView`], so callers can persist their own fire representation
//! as long as it exposes identifiers and an appendable activity list.

use crate::core_types::fire::{ActivityEntry, FireRecord};
use chrono::NaiveDateTime;

/// Read/append access to one fire's activity
pub trait FireRecordView {
    /// Identifier failures are attributed to
    fn fire_id(&self) -> &str;

    /// Identifier of the event the fire belongs to, if known
    fn event_id(&self) -> Option<&str>;

    /// Activity entries in order
    fn activity(&self) -> &[ActivityEntry];

    /// Append an activity entry after the existing ones
    fn push_activity(&mut self, entry: ActivityEntry);

    /// Keep only the activity entries for which `keep` returns true, in order
    fn retain_activity<P>(&mut self, keep: P)
    where
        P: FnMut(&ActivityEntry) -> bool;

    /// Earliest active-area start across all activity
    fn earliest_start(&self) -> Option<NaiveDateTime> {
        self.activity()
            .iter()
            .filter_map(|entry| entry.bounds().map(|(start, _)| start))
            .min()
    }

    /// Latest active-area end across all activity
    fn latest_end(&self) -> Option<NaiveDateTime> {
        self.activity()
            .iter()
            .filter_map(|entry| entry.bounds().map(|(_, end)| end))
            .max()
    }
}

impl FireRecordView for FireRecord {
    fn fire_id(&self) -> &str {
        &self.id
    }

    fn event_id(&self) -> Option<&str> {
        self.event_of.as_ref().map(|event| event.id.as_str())
    }

    fn activity(&self) -> &[ActivityEntry] {
        &self.activity
    }

    fn push_activity(&mut self, entry: ActivityEntry) {
        self.activity.push(entry);
    }

    fn retain_activity<P>(&mut self, keep: P)
    where
        P: FnMut(&ActivityEntry) -> bool,
    {
        self.activity.retain(keep);
    }
}
