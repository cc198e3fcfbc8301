/// Validated transformations over schedule and label values.
///
/// Every operation borrows the current value and returns a new one, so a
/// failing call leaves the caller's state exactly as it was.
use log::debug;
use uuid::Uuid;

use crate::error::{ScheduleError, ScheduleResult};
use crate::slot::{SlotIndex, duration_to_slots};
use crate::types::{Event, EventId, EventPatch, Labels, Schedule, validate_title};

impl Schedule {
    /// Places a new event of `duration_minutes` starting at `start`.
    pub fn add_event(
        &self,
        title: &str,
        start: SlotIndex,
        duration_minutes: u32,
    ) -> ScheduleResult<Schedule> {
        let slots = duration_to_slots(duration_minutes)?;
        let end = start.forward(slots).ok_or_else(|| {
            ScheduleError::Validation(format!(
                "Event starting at {start} runs past {}",
                SlotIndex::WINDOW_END
            ))
        })?;
        let event = Event::new(Uuid::new_v4(), title.to_string(), start, end)?;
        self.check_free(event.start(), event.end(), None)?;

        debug!("Placing '{}' at {}-{}", event.title(), event.start(), event.end());
        let mut events = self.events().to_vec();
        events.push(event);
        Ok(Schedule::from_events_unchecked(events))
    }

    /// Replaces the patched fields of event `id`, re-checking overlap against
    /// every other event.
    pub fn edit_event(&self, id: EventId, patch: EventPatch) -> ScheduleResult<Schedule> {
        let position = self.position_of(id)?;
        let current = &self.events()[position];
        let edited = Event::new(
            id,
            patch.title.unwrap_or_else(|| current.title().to_string()),
            patch.start.unwrap_or(current.start()),
            patch.end.unwrap_or(current.end()),
        )?;
        self.check_free(edited.start(), edited.end(), Some(id))?;

        debug!("Editing {id}: '{}' {}-{}", edited.title(), edited.start(), edited.end());
        let mut events = self.events().to_vec();
        events[position] = edited;
        Ok(Schedule::from_events_unchecked(events))
    }

    /// Removes event `id`. Deleting an unknown id is reported as `NotFound`.
    pub fn delete_event(&self, id: EventId) -> ScheduleResult<Schedule> {
        let position = self.position_of(id)?;
        let mut events = self.events().to_vec();
        let removed = events.remove(position);
        debug!("Deleted '{}' ({id})", removed.title());
        Ok(Schedule::from_events_unchecked(events))
    }

    /// The first event intersecting `[start, end)`, ignoring `exclude`.
    pub fn find_conflict(
        &self,
        start: SlotIndex,
        end: SlotIndex,
        exclude: Option<EventId>,
    ) -> Option<&Event> {
        self.events()
            .iter()
            .filter(|event| Some(event.id()) != exclude)
            .find(|event| event.overlaps(start, end))
    }

    fn check_free(
        &self,
        start: SlotIndex,
        end: SlotIndex,
        exclude: Option<EventId>,
    ) -> ScheduleResult<()> {
        match self.find_conflict(start, end, exclude) {
            Some(conflict) => Err(ScheduleError::Overlap {
                id: conflict.id(),
                title: conflict.title().to_string(),
            }),
            None => Ok(()),
        }
    }

    fn position_of(&self, id: EventId) -> ScheduleResult<usize> {
        self.events()
            .iter()
            .position(|event| event.id() == id)
            .ok_or_else(|| ScheduleError::NotFound(format!("event {id}")))
    }
}

impl Labels {
    /// Appends `label` (trimmed) unless it is blank or already present.
    pub fn add_label(&self, label: &str) -> ScheduleResult<Labels> {
        let label = validate_title(label.to_string())?;
        if self.contains(&label) {
            return Err(ScheduleError::Duplicate(label));
        }
        let mut labels = self.as_slice().to_vec();
        labels.push(label);
        Ok(Labels::from_labels_unchecked(labels))
    }
}

/// Removes `label` and every event titled with it, as one step.
pub fn remove_label(
    schedule: &Schedule,
    labels: &Labels,
    label: &str,
) -> ScheduleResult<(Schedule, Labels)> {
    let position = labels
        .position(label)
        .ok_or_else(|| ScheduleError::NotFound(format!("label '{label}'")))?;

    let mut remaining_labels = labels.as_slice().to_vec();
    remaining_labels.remove(position);
    let remaining_events = schedule
        .events()
        .iter()
        .filter(|event| event.title() != label)
        .cloned()
        .collect::<Vec<_>>();

    debug!(
        "Removed label '{label}' and {} event(s)",
        schedule.len() - remaining_events.len()
    );
    Ok((
        Schedule::from_events_unchecked(remaining_events),
        Labels::from_labels_unchecked(remaining_labels),
    ))
}
