/// Import of the older quarter-hour text format.
///
/// That format stored one free-text cell per 15-minute row from 09:00, as a
/// JSON array of 36 strings. Empty cells are free time.
use uuid::Uuid;

use crate::error::{ScheduleError, ScheduleResult};
use crate::slot::{SLOT_MINUTES, SlotIndex};
use crate::types::{Event, Labels, Schedule};

pub const LEGACY_ROW_COUNT: usize = 36;
const LEGACY_ROW_MINUTES: u32 = 15;

/// Converts quarter-hour cells to events, merging runs of equal text.
///
/// Every distinct title also becomes a label, in order of first appearance.
pub fn from_slot_texts(texts: &[String]) -> ScheduleResult<(Schedule, Labels)> {
    if texts.len() > LEGACY_ROW_COUNT {
        return Err(ScheduleError::Validation(format!(
            "Expected at most {LEGACY_ROW_COUNT} rows, found {}",
            texts.len()
        )));
    }
    let slots_per_row = (LEGACY_ROW_MINUTES / SLOT_MINUTES) as u16;

    let mut events = Vec::new();
    let mut labels = Labels::default();
    let mut run: Option<(&str, usize)> = None;

    // A trailing empty row closes the final run.
    for (row, text) in texts.iter().map(|t| t.trim()).chain([""]).enumerate() {
        if let Some((title, first_row)) = run {
            if title == text {
                continue;
            }
            let start = row_boundary(first_row, slots_per_row)?;
            let end = row_boundary(row, slots_per_row)?;
            events.push(Event::new(Uuid::new_v4(), title.to_string(), start, end)?);
            if !labels.contains(title) {
                labels = labels.add_label(title)?;
            }
            run = None;
        }
        if !text.is_empty() {
            run = Some((text, row));
        }
    }

    Ok((Schedule::try_from(events)?, labels))
}

fn row_boundary(row: usize, slots_per_row: u16) -> ScheduleResult<SlotIndex> {
    u16::try_from(row)
        .ok()
        .and_then(|row| row.checked_mul(slots_per_row))
        .and_then(SlotIndex::new)
        .ok_or_else(|| ScheduleError::Validation(format!("Row {row} is outside the day")))
}
