use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ScheduleError, ScheduleResult};
use crate::slot::SlotIndex;

pub type EventId = Uuid;

/// A titled, non-empty interval of slots placed on the schedule.
///
/// Fields are private so every `Event` in existence has passed [`Event::new`]:
/// the title is non-blank and `start < end`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEvent")]
pub struct Event {
    id: EventId,
    title: String,
    start: SlotIndex,
    end: SlotIndex,
}

#[derive(Deserialize)]
struct RawEvent {
    id: EventId,
    title: String,
    start: SlotIndex,
    end: SlotIndex,
}

impl TryFrom<RawEvent> for Event {
    type Error = ScheduleError;

    fn try_from(raw: RawEvent) -> ScheduleResult<Self> {
        Event::new(raw.id, raw.title, raw.start, raw.end)
    }
}

impl Event {
    pub fn new(id: EventId, title: String, start: SlotIndex, end: SlotIndex) -> ScheduleResult<Self> {
        let title = validate_title(title)?;
        if end <= start {
            return Err(ScheduleError::Validation(format!(
                "End {end} must be after start {start}"
            )));
        }
        Ok(Self {
            id,
            title,
            start,
            end,
        })
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn start(&self) -> SlotIndex {
        self.start
    }

    pub fn end(&self) -> SlotIndex {
        self.end
    }

    pub fn duration_slots(&self) -> u16 {
        self.start.slots_until(self.end)
    }

    /// Half-open interval test: touching at a boundary is not an overlap.
    pub fn overlaps(&self, start: SlotIndex, end: SlotIndex) -> bool {
        start < self.end && end > self.start
    }

    pub fn covers(&self, slot: SlotIndex) -> bool {
        self.start <= slot && slot < self.end
    }
}

/// Fields of an event that an edit may replace. `None` keeps the current value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub start: Option<SlotIndex>,
    pub end: Option<SlotIndex>,
}

/// All placed events, in insertion order.
///
/// Deserialization re-checks id uniqueness and the no-overlap rule, so a
/// tampered or corrupted store never yields an inconsistent schedule.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Event>", into = "Vec<Event>")]
pub struct Schedule {
    events: Vec<Event>,
}

impl TryFrom<Vec<Event>> for Schedule {
    type Error = ScheduleError;

    fn try_from(events: Vec<Event>) -> ScheduleResult<Self> {
        let mut ids = HashSet::new();
        for (index, event) in events.iter().enumerate() {
            if !ids.insert(event.id) {
                return Err(ScheduleError::Validation(format!(
                    "Duplicate event id {}",
                    event.id
                )));
            }
            if let Some(other) = events[..index]
                .iter()
                .find(|other| other.overlaps(event.start, event.end))
            {
                return Err(ScheduleError::Overlap {
                    id: other.id,
                    title: other.title.clone(),
                });
            }
        }
        Ok(Self { events })
    }
}

impl From<Schedule> for Vec<Event> {
    fn from(schedule: Schedule) -> Self {
        schedule.events
    }
}

impl Schedule {
    pub(crate) fn from_events_unchecked(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, id: EventId) -> Option<&Event> {
        self.events.iter().find(|event| event.id == id)
    }

    /// Events ordered by start time, for timeline rendering.
    pub fn chronological(&self) -> Vec<&Event> {
        let mut events = self.events.iter().collect::<Vec<_>>();
        events.sort_by_key(|event| event.start);
        events
    }

    /// The event occupying `slot`, if any. At most one can, by the no-overlap rule.
    pub fn event_at(&self, slot: SlotIndex) -> Option<&Event> {
        self.events.iter().find(|event| event.covers(slot))
    }

    pub fn count_titled(&self, title: &str) -> usize {
        self.events.iter().filter(|event| event.title == title).count()
    }

    /// Resolves a full id or a unique id prefix, as typed on the command line.
    pub fn find_by_prefix(&self, prefix: &str) -> ScheduleResult<&Event> {
        let prefix = prefix.trim().to_ascii_lowercase();
        if prefix.is_empty() {
            return Err(ScheduleError::Validation("Event id must not be empty".to_string()));
        }
        let mut matches = self
            .events
            .iter()
            .filter(|event| event.id.to_string().starts_with(&prefix));
        match (matches.next(), matches.next()) {
            (Some(event), None) => Ok(event),
            (None, _) => Err(ScheduleError::NotFound(format!("event '{prefix}'"))),
            (Some(_), Some(_)) => Err(ScheduleError::Validation(format!(
                "Event id prefix '{prefix}' is ambiguous"
            ))),
        }
    }
}

/// Ordered, duplicate-free set of reusable titles.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Labels {
    labels: Vec<String>,
}

impl TryFrom<Vec<String>> for Labels {
    type Error = ScheduleError;

    fn try_from(raw: Vec<String>) -> ScheduleResult<Self> {
        let mut labels = Labels::default();
        for label in raw {
            labels = labels.add_label(&label)?;
        }
        Ok(labels)
    }
}

impl From<Labels> for Vec<String> {
    fn from(labels: Labels) -> Self {
        labels.labels
    }
}

impl Labels {
    pub(crate) fn from_labels_unchecked(labels: Vec<String>) -> Self {
        Self { labels }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.labels.iter()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|existing| existing == label)
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|existing| existing == label)
    }
}

pub(crate) fn validate_title(title: String) -> ScheduleResult<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ScheduleError::Validation("Title must not be empty".to_string()));
    }
    if trimmed.len() == title.len() {
        Ok(title)
    } else {
        Ok(trimmed.to_string())
    }
}
