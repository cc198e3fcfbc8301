mod state;

use crossterm::event::KeyCode;

use crate::types::EventId;

pub use state::{App, ConfirmPopup, EventField, EventPopup, NewLabelPopup};

/// Possible input events the app reacts to.
pub enum AppEvent {
    Tick,
    KeyPress(KeyCode),
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppView {
    Timeline,
    Labels,
    Help,
}

/// Views reachable from the tab bar, in display order.
pub const TABS: [AppView; 3] = [AppView::Timeline, AppView::Labels, AppView::Help];

/// What a confirmed popup will do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteEvent(EventId),
    RemoveLabel(String),
}
