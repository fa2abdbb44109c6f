//! Fire records and their nested activity structure
//!
//! A fire owns an ordered list of activity entries and each activity entry owns
//! an ordered list of active areas. Only the fields the persistence engine reads
//! or writes are typed; everything else upstream stages attach (locations,
//! consumption, emissions, timeprofiles, ...) is kept verbatim in `extra` so a
//! load, persist, dump cycle never loses data.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event a fire belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireEvent {
    /// Event identifier shared by every fire of the same event
    pub id: String,
    /// Human readable event name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FireEvent {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            extra: Map::new(),
        }
    }
}

/// One contiguous period of fire activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveArea {
    /// First hour of activity (fire-local wall clock)
    pub start: NaiveDateTime,
    /// End of activity (fire-local wall clock)
    pub end: NaiveDateTime,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ActiveArea {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start,
            end,
            extra: Map::new(),
        }
    }

    /// Build a new active area from this one with `start`/`end` replaced.
    ///
    /// Every other field is copied from `self`.
    #[must_use]
    pub fn with_window(&self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start,
            end,
            ..self.clone()
        }
    }
}

/// Time-bounded snapshot of a fire's growth
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActivityEntry {
    #[serde(default)]
    pub active_areas: Vec<ActiveArea>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ActivityEntry {
    pub fn new(active_areas: Vec<ActiveArea>) -> Self {
        Self {
            active_areas,
            extra: Map::new(),
        }
    }

    /// Single-area activity entry spanning `start..end`
    pub fn single(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self::new(vec![ActiveArea::new(start, end)])
    }

    /// Build a new activity entry from this template with every active area
    /// moved to `start`/`end`.
    ///
    /// The template is left untouched. Persistence only calls this on entries
    /// holding exactly one active area.
    #[must_use]
    pub fn with_active_window(&self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            active_areas: self
                .active_areas
                .iter()
                .map(|area| area.with_window(start, end))
                .collect(),
            ..self.clone()
        }
    }

    /// Earliest start and latest end over this entry's active areas
    pub fn bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let start = self.active_areas.iter().map(|a| a.start).min()?;
        let end = self.active_areas.iter().map(|a| a.end).max()?;
        Some((start, end))
    }
}

/// One modeled wildfire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_of: Option<FireEvent>,
    #[serde(default)]
    pub activity: Vec<ActivityEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FireRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            event_of: None,
            activity: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Attach the fire to an event
    #[must_use]
    pub fn with_event(mut self, event: FireEvent) -> Self {
        self.event_of = Some(event);
        self
    }

    /// Append an activity entry
    #[must_use]
    pub fn with_activity(mut self, entry: ActivityEntry) -> Self {
        self.activity.push(entry);
        self
    }
}

/// Top-level fire information document exchanged between pipeline stages
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FireInformation {
    #[serde(default)]
    pub fire_information: Vec<FireRecord>,
    /// Bluesky-style nested configuration (`{"dispersion": {...}, ...}`)
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub config: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
