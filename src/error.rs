/// Error types for schedule and label operations.
use thiserror::Error;

use crate::types::EventId;

/// Validation failures returned by the scheduling model.
///
/// None of these are fatal: callers report them and keep their previous state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Overlaps with '{title}'")]
    Overlap { id: EventId, title: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Label '{0}' already exists")]
    Duplicate(String),

    #[error("{0}")]
    Validation(String),
}

/// Result type alias for scheduling operations.
pub type ScheduleResult<T> = Result<T, ScheduleError>;
