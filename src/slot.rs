/// Discretization of the planning window into fixed-width time slots.
use std::fmt;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::{ScheduleError, ScheduleResult};

/// Opening time of the planning window, in minutes since midnight (09:00).
pub const WINDOW_START_MINUTES: u32 = 9 * 60;
/// Closing time of the planning window, in minutes since midnight (18:00).
pub const WINDOW_END_MINUTES: u32 = 18 * 60;
/// Width of a single slot.
pub const SLOT_MINUTES: u32 = 5;
/// Number of slots between window start and window end.
pub const SLOT_COUNT: u16 = ((WINDOW_END_MINUTES - WINDOW_START_MINUTES) / SLOT_MINUTES) as u16;

/// A slot boundary, counted in slots since the window start.
///
/// Values range over `0..=SLOT_COUNT`. Every value below `SLOT_COUNT` names
/// the slot that starts there; `SLOT_COUNT` itself is the window end and is
/// only meaningful as the end of an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotIndex(u16);

impl SlotIndex {
    pub const WINDOW_START: SlotIndex = SlotIndex(0);
    pub const WINDOW_END: SlotIndex = SlotIndex(SLOT_COUNT);

    pub fn new(value: u16) -> Option<Self> {
        (value <= SLOT_COUNT).then_some(Self(value))
    }

    pub fn get(self) -> u16 {
        self.0
    }

    /// Moves the boundary forward by `slots`, staying inside the window.
    pub fn forward(self, slots: u16) -> Option<Self> {
        self.0.checked_add(slots).and_then(Self::new)
    }

    /// Number of slots from `self` up to `later`, zero if `later` is not later.
    pub fn slots_until(self, later: SlotIndex) -> u16 {
        later.0.saturating_sub(self.0)
    }

    pub fn minutes_since_midnight(self) -> u32 {
        WINDOW_START_MINUTES + u32::from(self.0) * SLOT_MINUTES
    }

    /// Whether this boundary starts a full hour, used for timeline markers.
    pub fn is_hour_start(self) -> bool {
        self.minutes_since_midnight() % 60 == 0
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&index_to_time(*self))
    }
}

impl Serialize for SlotIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&index_to_time(*self))
    }
}

impl<'de> Deserialize<'de> for SlotIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_boundary(&raw).map_err(de::Error::custom)
    }
}

/// Converts an "HH:MM" start time to the slot it begins.
///
/// Times outside `[09:00, 18:00)` or off the slot grid are rejected, never clamped.
pub fn time_to_index(time: &str) -> ScheduleResult<SlotIndex> {
    let index = parse_boundary(time)?;
    if index == SlotIndex::WINDOW_END {
        return Err(outside_window(time));
    }
    Ok(index)
}

/// Like [`time_to_index`] but also accepts the window end, for event ends.
pub fn parse_boundary(time: &str) -> ScheduleResult<SlotIndex> {
    let parsed = NaiveTime::parse_from_str(time.trim(), "%H:%M").map_err(|_| {
        ScheduleError::Validation(format!("Invalid time '{time}', expected HH:MM"))
    })?;
    let minutes = parsed.hour() * 60 + parsed.minute();
    if !(WINDOW_START_MINUTES..=WINDOW_END_MINUTES).contains(&minutes) {
        return Err(outside_window(time));
    }
    let offset = minutes - WINDOW_START_MINUTES;
    if offset % SLOT_MINUTES != 0 {
        return Err(ScheduleError::Validation(format!(
            "Time '{time}' is not on the {SLOT_MINUTES}-minute grid"
        )));
    }
    Ok(SlotIndex((offset / SLOT_MINUTES) as u16))
}

/// Renders a slot boundary as zero-padded "HH:MM".
pub fn index_to_time(index: SlotIndex) -> String {
    let minutes = index.minutes_since_midnight();
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Converts a duration in minutes to a whole, positive number of slots.
pub fn duration_to_slots(minutes: u32) -> ScheduleResult<u16> {
    if minutes == 0 || minutes % SLOT_MINUTES != 0 {
        return Err(ScheduleError::Validation(format!(
            "Duration must be a positive multiple of {SLOT_MINUTES} minutes"
        )));
    }
    u16::try_from(minutes / SLOT_MINUTES)
        .map_err(|_| ScheduleError::Validation(format!("Duration of {minutes} minutes is too long")))
}

pub fn slots_to_minutes(slots: u16) -> u32 {
    u32::from(slots) * SLOT_MINUTES
}

fn outside_window(time: &str) -> ScheduleError {
    ScheduleError::Validation(format!(
        "Time '{time}' is outside {}-{}",
        index_to_time(SlotIndex::WINDOW_START),
        index_to_time(SlotIndex::WINDOW_END)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_has_expected_slot_count() {
        assert_eq!(SLOT_COUNT, 108);
    }

    #[test]
    fn every_aligned_time_round_trips() {
        for raw in 0..SLOT_COUNT {
            let index = SlotIndex::new(raw).unwrap();
            let time = index_to_time(index);
            assert_eq!(time_to_index(&time).unwrap(), index);
            assert_eq!(index_to_time(time_to_index(&time).unwrap()), time);
        }
    }

    #[test]
    fn known_times_map_to_known_indices() {
        assert_eq!(time_to_index("09:00").unwrap().get(), 0);
        assert_eq!(time_to_index("12:00").unwrap().get(), 36);
        assert_eq!(time_to_index("17:55").unwrap().get(), 107);
        assert_eq!(index_to_time(SlotIndex::new(42).unwrap()), "12:30");
    }

    #[test]
    fn window_end_is_a_boundary_but_not_a_start() {
        assert!(time_to_index("18:00").is_err());
        assert_eq!(parse_boundary("18:00").unwrap(), SlotIndex::WINDOW_END);
        assert_eq!(index_to_time(SlotIndex::WINDOW_END), "18:00");
    }

    #[test]
    fn rejects_times_outside_window() {
        assert!(matches!(time_to_index("08:55"), Err(ScheduleError::Validation(_))));
        assert!(matches!(time_to_index("18:05"), Err(ScheduleError::Validation(_))));
        assert!(matches!(parse_boundary("23:00"), Err(ScheduleError::Validation(_))));
    }

    #[test]
    fn rejects_misaligned_and_malformed_times() {
        assert!(time_to_index("12:03").is_err());
        assert!(time_to_index("noon").is_err());
        assert!(time_to_index("").is_err());
        assert!(time_to_index("25:00").is_err());
    }

    #[test]
    fn durations_must_fill_whole_slots() {
        assert_eq!(duration_to_slots(30).unwrap(), 6);
        assert_eq!(duration_to_slots(5).unwrap(), 1);
        assert!(duration_to_slots(0).is_err());
        assert!(duration_to_slots(7).is_err());
        assert_eq!(slots_to_minutes(6), 30);
    }

    #[test]
    fn forward_stays_inside_window() {
        let last = SlotIndex::new(SLOT_COUNT - 1).unwrap();
        assert_eq!(last.forward(1), Some(SlotIndex::WINDOW_END));
        assert_eq!(last.forward(2), None);
        assert_eq!(SlotIndex::new(SLOT_COUNT + 1), None);
    }

    #[test]
    fn serializes_as_time_string() {
        let index = time_to_index("10:15").unwrap();
        let json = serde_json::to_string(&index).unwrap();
        assert_eq!(json, "\"10:15\"");
        let back: SlotIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(back, index);
        assert!(serde_json::from_str::<SlotIndex>("\"07:00\"").is_err());
    }
}
