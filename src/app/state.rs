use anyhow::Result;
use chrono::{DateTime, Local};
use crossterm::event::KeyCode;
use log::{error, info, warn};
use rusqlite::Connection;

use crate::config::Config;
use crate::db;
use crate::error::ScheduleError;
use crate::schedule::remove_label;
use crate::slot::{
    SLOT_COUNT, SLOT_MINUTES, SlotIndex, duration_to_slots, slots_to_minutes, time_to_index,
};
use crate::types::{EventId, EventPatch, Labels, Schedule};

use super::{AppEvent, AppView, ConfirmAction, TABS};

const SLOTS_PER_HOUR: i32 = (60 / SLOT_MINUTES) as i32;

/// The top-level application state.
pub struct App {
    pub running: bool,
    pub db: Connection,
    pub view: AppView,
    previous_view: AppView,
    pub schedule: Schedule,
    pub labels: Labels,
    pub cursor: SlotIndex,
    pub selected_label_index: usize,
    pub status: Option<String>,
    pub last_saved: Option<DateTime<Local>>,
    default_duration: u32,
    pub event_popup: Option<EventPopup>,
    pub new_label_popup: Option<NewLabelPopup>,
    pub confirm_popup: Option<ConfirmPopup>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventField {
    Title,
    Start,
    Duration,
}

/// Form for placing a new event or editing an existing one.
#[derive(Clone, Debug)]
pub struct EventPopup {
    pub editing: Option<EventId>,
    pub title: String,
    pub label_index: Option<usize>,
    pub start: String,
    pub duration: String,
    pub field: EventField,
}

#[derive(Clone, Debug, Default)]
pub struct NewLabelPopup {
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct ConfirmPopup {
    pub message: String,
    pub action: ConfirmAction,
}

impl EventPopup {
    fn select_prev_label(&mut self, labels: &Labels) {
        if labels.is_empty() {
            return;
        }
        let index = match self.label_index {
            Some(0) | None => labels.len() - 1,
            Some(index) => index - 1,
        };
        self.pick_label(labels, index);
    }

    fn select_next_label(&mut self, labels: &Labels) {
        if labels.is_empty() {
            return;
        }
        let index = match self.label_index {
            Some(index) => (index + 1) % labels.len(),
            None => 0,
        };
        self.pick_label(labels, index);
    }

    fn pick_label(&mut self, labels: &Labels, index: usize) {
        if let Some(label) = labels.get(index) {
            self.title = label.to_string();
            self.label_index = Some(index);
        }
    }

    fn next_field(&mut self) {
        self.field = match self.field {
            EventField::Title => EventField::Start,
            EventField::Start => EventField::Duration,
            EventField::Duration => EventField::Title,
        };
    }

    fn input_mut(&mut self) -> &mut String {
        match self.field {
            EventField::Title => &mut self.title,
            EventField::Start => &mut self.start,
            EventField::Duration => &mut self.duration,
        }
    }
}

impl App {
    /// Loads the stored schedule and labels. Invalid stored data is an error
    /// rather than silently starting empty and overwriting it.
    pub fn load(db: Connection, config: &Config) -> Result<Self> {
        let schedule = db::load_schedule(&db)?;
        let labels = db::load_labels(&db, &config.default_labels)?;
        let last_saved = db::last_saved(&db)?;
        let cursor = schedule
            .chronological()
            .first()
            .map(|event| event.start())
            .unwrap_or(SlotIndex::WINDOW_START);
        info!(
            "Loaded {} event(s) and {} label(s)",
            schedule.len(),
            labels.len()
        );

        Ok(Self {
            running: true,
            db,
            view: AppView::Timeline,
            previous_view: AppView::Timeline,
            schedule,
            labels,
            cursor,
            selected_label_index: 0,
            status: None,
            last_saved,
            default_duration: config.default_duration,
            event_popup: None,
            new_label_popup: None,
            confirm_popup: None,
        })
    }

    /// Central update function - process an event and mutate state.
    pub fn update(&mut self, event: AppEvent) {
        match event {
            AppEvent::Tick => {}
            AppEvent::Quit => self.running = false,
            AppEvent::KeyPress(key) => self.handle_key(key),
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        if self.confirm_popup.is_some() {
            self.handle_confirm_key(key);
            return;
        }
        if self.event_popup.is_some() {
            self.handle_event_popup_key(key);
            return;
        }
        if self.new_label_popup.is_some() {
            self.handle_new_label_key(key);
            return;
        }

        match key {
            KeyCode::Char('q') => self.running = false,
            KeyCode::Char('t') => self.navigate_to(AppView::Timeline),
            KeyCode::Char('l') => self.navigate_to(AppView::Labels),
            KeyCode::Char('?') => {
                if self.view == AppView::Help {
                    self.go_back();
                } else {
                    self.navigate_to(AppView::Help);
                }
            }
            KeyCode::Tab => self.navigate_tab(1),
            KeyCode::BackTab => self.navigate_tab(TABS.len() - 1),
            KeyCode::Esc => self.go_back(),
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-SLOTS_PER_HOUR),
            KeyCode::PageDown => self.move_selection(SLOTS_PER_HOUR),
            KeyCode::Home => self.move_selection(-i32::from(SLOT_COUNT)),
            KeyCode::End => self.move_selection(i32::from(SLOT_COUNT)),
            KeyCode::Char('n') => match self.view {
                AppView::Timeline => self.open_new_event_popup(None),
                AppView::Labels => self.new_label_popup = Some(NewLabelPopup::default()),
                AppView::Help => {}
            },
            KeyCode::Char('e') => {
                if self.view == AppView::Timeline {
                    self.open_edit_popup();
                }
            }
            KeyCode::Enter => self.open_selected(),
            KeyCode::Char('d') | KeyCode::Delete => self.open_delete_confirm(),
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
    }

    fn navigate_to(&mut self, view: AppView) {
        if self.view != view {
            if view == AppView::Help {
                self.previous_view = self.view;
            }
            self.view = view;
            self.clear_status();
        }
    }

    fn navigate_tab(&mut self, step: usize) {
        let current = TABS.iter().position(|v| *v == self.view).unwrap_or(0);
        self.navigate_to(TABS[(current + step) % TABS.len()]);
    }

    fn go_back(&mut self) {
        if self.view == AppView::Help {
            self.view = self.previous_view;
        }
        self.clear_status();
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    fn move_selection(&mut self, delta: i32) {
        match self.view {
            AppView::Timeline => {
                let target =
                    (i32::from(self.cursor.get()) + delta).clamp(0, i32::from(SLOT_COUNT) - 1);
                if let Some(cursor) = u16::try_from(target).ok().and_then(SlotIndex::new) {
                    self.cursor = cursor;
                }
            }
            AppView::Labels => {
                if self.labels.is_empty() {
                    return;
                }
                let last = self.labels.len() as i32 - 1;
                let target = (self.selected_label_index as i32 + delta).clamp(0, last);
                self.selected_label_index = target as usize;
            }
            AppView::Help => {}
        }
    }

    fn open_selected(&mut self) {
        match self.view {
            AppView::Timeline => {
                if self.schedule.event_at(self.cursor).is_some() {
                    self.open_edit_popup();
                } else {
                    self.open_new_event_popup(None);
                }
            }
            AppView::Labels => {
                let Some(label) = self.labels.get(self.selected_label_index).map(str::to_string)
                else {
                    return;
                };
                self.navigate_to(AppView::Timeline);
                self.open_new_event_popup(Some(label));
            }
            AppView::Help => {}
        }
    }

    fn open_new_event_popup(&mut self, title: Option<String>) {
        let title = title
            .or_else(|| self.labels.get(0).map(str::to_string))
            .unwrap_or_default();
        self.event_popup = Some(EventPopup {
            editing: None,
            label_index: self.labels.position(&title),
            title,
            start: self.cursor.to_string(),
            duration: self.default_duration.to_string(),
            field: EventField::Title,
        });
        self.clear_status();
    }

    fn open_edit_popup(&mut self) {
        let Some(event) = self.schedule.event_at(self.cursor) else {
            self.status = Some("No event at this time.".to_string());
            return;
        };
        self.event_popup = Some(EventPopup {
            editing: Some(event.id()),
            title: event.title().to_string(),
            label_index: self.labels.position(event.title()),
            start: event.start().to_string(),
            duration: slots_to_minutes(event.duration_slots()).to_string(),
            field: EventField::Title,
        });
        self.clear_status();
    }

    fn open_delete_confirm(&mut self) {
        match self.view {
            AppView::Timeline => {
                let Some(event) = self.schedule.event_at(self.cursor) else {
                    self.status = Some("No event at this time.".to_string());
                    return;
                };
                self.confirm_popup = Some(ConfirmPopup {
                    message: format!(
                        "Delete '{}' ({}-{})?",
                        event.title(),
                        event.start(),
                        event.end()
                    ),
                    action: ConfirmAction::DeleteEvent(event.id()),
                });
            }
            AppView::Labels => {
                let Some(label) = self.labels.get(self.selected_label_index) else {
                    return;
                };
                let affected = self.schedule.count_titled(label);
                self.confirm_popup = Some(ConfirmPopup {
                    message: format!(
                        "Remove label '{label}' and its {affected} event(s)?"
                    ),
                    action: ConfirmAction::RemoveLabel(label.to_string()),
                });
            }
            AppView::Help => {}
        }
    }

    fn handle_confirm_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('y') | KeyCode::Enter => {
                if let Some(popup) = self.confirm_popup.take() {
                    self.apply_confirm(popup.action);
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.confirm_popup = None;
                self.clear_status();
            }
            _ => {}
        }
    }

    fn apply_confirm(&mut self, action: ConfirmAction) {
        match action {
            ConfirmAction::DeleteEvent(id) => match self.schedule.delete_event(id) {
                Ok(schedule) => self.commit_schedule(schedule, "Event deleted.".to_string()),
                Err(err) => self.status = Some(err.to_string()),
            },
            ConfirmAction::RemoveLabel(label) => {
                match remove_label(&self.schedule, &self.labels, &label) {
                    Ok((schedule, labels)) => {
                        self.commit_state(schedule, labels, format!("Label '{label}' removed."));
                        self.selected_label_index = self
                            .selected_label_index
                            .min(self.labels.len().saturating_sub(1));
                    }
                    Err(err) => self.status = Some(err.to_string()),
                }
            }
        }
    }

    fn handle_event_popup_key(&mut self, key: KeyCode) {
        let Some(popup) = self.event_popup.as_mut() else {
            return;
        };
        match key {
            KeyCode::Esc => {
                self.event_popup = None;
                self.clear_status();
            }
            KeyCode::Enter => self.apply_event_popup(),
            KeyCode::Tab => popup.next_field(),
            KeyCode::Up => {
                if popup.field == EventField::Title {
                    popup.select_prev_label(&self.labels);
                }
            }
            KeyCode::Down => {
                if popup.field == EventField::Title {
                    popup.select_next_label(&self.labels);
                }
            }
            KeyCode::Backspace | KeyCode::Delete => {
                popup.input_mut().pop();
                if popup.field == EventField::Title {
                    popup.label_index = self.labels.position(&popup.title);
                }
            }
            KeyCode::Char(ch) => {
                if ch.is_control() {
                    return;
                }
                popup.input_mut().push(ch);
                if popup.field == EventField::Title {
                    popup.label_index = self.labels.position(&popup.title);
                }
            }
            _ => {}
        }
    }

    fn apply_event_popup(&mut self) {
        let Some(popup) = self.event_popup.as_ref() else {
            return;
        };
        match self.schedule_from_popup(popup) {
            Ok((schedule, start)) => {
                let message = if popup.editing.is_some() {
                    "Event updated."
                } else {
                    "Event added."
                };
                self.event_popup = None;
                self.cursor = start;
                self.commit_schedule(schedule, message.to_string());
            }
            Err(err) => {
                warn!("Rejected event: {err}");
                self.status = Some(err.to_string());
            }
        }
    }

    fn schedule_from_popup(&self, popup: &EventPopup) -> Result<(Schedule, SlotIndex), ScheduleError> {
        let start = time_to_index(&popup.start)?;
        let minutes = popup.duration.trim().parse::<u32>().map_err(|_| {
            ScheduleError::Validation(format!("Invalid duration '{}'", popup.duration))
        })?;
        let schedule = match popup.editing {
            Some(id) => {
                let end = start
                    .forward(duration_to_slots(minutes)?)
                    .ok_or_else(|| {
                        ScheduleError::Validation(format!(
                            "Event starting at {start} runs past {}",
                            SlotIndex::WINDOW_END
                        ))
                    })?;
                self.schedule.edit_event(
                    id,
                    EventPatch {
                        title: Some(popup.title.clone()),
                        start: Some(start),
                        end: Some(end),
                    },
                )?
            }
            None => self.schedule.add_event(&popup.title, start, minutes)?,
        };
        Ok((schedule, start))
    }

    fn handle_new_label_key(&mut self, key: KeyCode) {
        let Some(popup) = self.new_label_popup.as_mut() else {
            return;
        };
        match key {
            KeyCode::Esc => {
                self.new_label_popup = None;
                self.clear_status();
            }
            KeyCode::Enter => self.apply_new_label_popup(),
            KeyCode::Backspace | KeyCode::Delete => {
                popup.name.pop();
            }
            KeyCode::Char(ch) => {
                if !ch.is_control() {
                    popup.name.push(ch);
                }
            }
            _ => {}
        }
    }

    fn apply_new_label_popup(&mut self) {
        let Some(popup) = self.new_label_popup.as_ref() else {
            return;
        };
        match self.labels.add_label(&popup.name) {
            Ok(labels) => {
                let message = format!("Label '{}' added.", popup.name.trim());
                self.new_label_popup = None;
                self.selected_label_index = labels.len() - 1;
                self.commit_labels(labels, message);
            }
            Err(err) => self.status = Some(err.to_string()),
        }
    }

    fn reload(&mut self) {
        let loaded = db::load_schedule(&self.db).and_then(|schedule| {
            let labels = db::load_labels(&self.db, self.labels.as_slice())?;
            Ok((schedule, labels))
        });
        match loaded {
            Ok((schedule, labels)) => {
                self.schedule = schedule;
                self.labels = labels;
                self.selected_label_index = self
                    .selected_label_index
                    .min(self.labels.len().saturating_sub(1));
                self.status = Some("Reloaded.".to_string());
            }
            Err(err) => {
                error!("Failed to reload: {err:#}");
                self.status = Some(format!("Failed to reload: {err}"));
            }
        }
    }

    fn commit_schedule(&mut self, schedule: Schedule, message: String) {
        self.schedule = schedule;
        let result = db::save_schedule(&self.schedule, &self.db);
        self.after_save(result, message);
    }

    fn commit_labels(&mut self, labels: Labels, message: String) {
        self.labels = labels;
        let result = db::save_labels(&self.labels, &self.db);
        self.after_save(result, message);
    }

    fn commit_state(&mut self, schedule: Schedule, labels: Labels, message: String) {
        self.schedule = schedule;
        self.labels = labels;
        let result = db::save_state(&self.schedule, &self.labels, &self.db);
        self.after_save(result, message);
    }

    /// A failed write keeps the in-memory change and tells the user.
    fn after_save(&mut self, result: Result<()>, message: String) {
        match result {
            Ok(()) => {
                info!("{message}");
                self.last_saved = Some(Local::now());
                self.status = Some(message);
            }
            Err(err) => {
                error!("Failed to save: {err:#}");
                self.status = Some(format!("{message} Saving failed: {err}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::load(db::open_in_memory(), &Config::default()).unwrap()
    }

    fn press(app: &mut App, keys: &[KeyCode]) {
        for key in keys {
            app.update(AppEvent::KeyPress(*key));
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.update(AppEvent::KeyPress(KeyCode::Char(ch)));
        }
    }

    fn clear_field(app: &mut App) {
        press(app, &[KeyCode::Backspace; 8]);
    }

    fn at(time: &str) -> SlotIndex {
        time_to_index(time).unwrap()
    }

    fn add_via_popup(app: &mut App, start: &str, title: &str, minutes: &str) {
        app.cursor = at(start);
        press(app, &[KeyCode::Char('n')]);
        clear_field(app);
        clear_field(app);
        type_text(app, title);
        press(app, &[KeyCode::Tab, KeyCode::Tab]);
        clear_field(app);
        type_text(app, minutes);
        press(app, &[KeyCode::Enter]);
    }

    #[test]
    fn new_event_uses_cursor_and_defaults() {
        let mut app = app();
        app.cursor = at("12:00");
        press(&mut app, &[KeyCode::Char('n')]);
        let popup = app.event_popup.clone().unwrap();
        assert_eq!(popup.start, "12:00");
        assert_eq!(popup.duration, "30");
        assert_eq!(popup.title, "Parade");
        assert_eq!(popup.label_index, Some(0));

        press(&mut app, &[KeyCode::Enter]);
        assert!(app.event_popup.is_none());
        assert_eq!(app.schedule.len(), 1);
        assert_eq!(db::load_schedule(&app.db).unwrap(), app.schedule);
        assert!(app.last_saved.is_some());
    }

    #[test]
    fn overlapping_event_keeps_popup_and_state() {
        let mut app = app();
        add_via_popup(&mut app, "12:00", "Lunch", "30");
        assert_eq!(app.schedule.len(), 1);

        add_via_popup(&mut app, "12:15", "Photo", "15");
        assert!(app.event_popup.is_some());
        assert_eq!(app.schedule.len(), 1);
        assert!(app.status.as_deref().unwrap_or_default().contains("Lunch"));

        press(&mut app, &[KeyCode::Esc]);
        add_via_popup(&mut app, "12:30", "Photo", "15");
        assert_eq!(app.schedule.len(), 2);
    }

    #[test]
    fn title_cycles_through_labels() {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('n'), KeyCode::Down]);
        let popup = app.event_popup.clone().unwrap();
        assert_eq!(popup.title, "Show");
        assert_eq!(popup.label_index, Some(1));
        press(&mut app, &[KeyCode::Up, KeyCode::Up]);
        let popup = app.event_popup.clone().unwrap();
        assert_eq!(popup.label_index, Some(app.labels.len() - 1));
        type_text(&mut app, "!");
        assert_eq!(app.event_popup.clone().unwrap().label_index, None);
    }

    #[test]
    fn edit_changes_duration() {
        let mut app = app();
        add_via_popup(&mut app, "12:00", "Lunch", "30");
        app.cursor = at("12:10");
        press(&mut app, &[KeyCode::Char('e')]);
        assert!(app.event_popup.as_ref().unwrap().editing.is_some());
        press(&mut app, &[KeyCode::Tab, KeyCode::Tab]);
        clear_field(&mut app);
        type_text(&mut app, "15");
        press(&mut app, &[KeyCode::Enter]);

        let event = &app.schedule.events()[0];
        assert_eq!(event.end(), at("12:15"));
        assert_eq!(app.schedule.len(), 1);
    }

    #[test]
    fn delete_requires_confirmation() {
        let mut app = app();
        add_via_popup(&mut app, "10:00", "Parade", "45");
        app.cursor = at("10:30");
        press(&mut app, &[KeyCode::Char('d')]);
        assert!(app.confirm_popup.is_some());
        press(&mut app, &[KeyCode::Char('n')]);
        assert_eq!(app.schedule.len(), 1);

        press(&mut app, &[KeyCode::Char('d'), KeyCode::Char('y')]);
        assert!(app.schedule.is_empty());
        assert!(db::load_schedule(&app.db).unwrap().is_empty());
    }

    #[test]
    fn removing_selected_label_cascades_and_clamps_selection() {
        let mut app = app();
        add_via_popup(&mut app, "10:00", "Shopping", "30");
        add_via_popup(&mut app, "11:00", "Parade", "30");
        let last = app.labels.len() - 1;
        assert_eq!(app.labels.get(last), Some("Shopping"));

        press(&mut app, &[KeyCode::Char('l'), KeyCode::End]);
        assert_eq!(app.selected_label_index, last);
        press(&mut app, &[KeyCode::Char('d'), KeyCode::Enter]);

        assert!(!app.labels.contains("Shopping"));
        assert_eq!(app.schedule.count_titled("Shopping"), 0);
        assert_eq!(app.schedule.len(), 1);
        assert_eq!(app.selected_label_index, app.labels.len() - 1);
        let stored = db::load_labels(&app.db, &[]).unwrap();
        assert_eq!(stored, app.labels);
    }

    #[test]
    fn duplicate_label_is_rejected() {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('l'), KeyCode::Char('n')]);
        type_text(&mut app, "Parade");
        press(&mut app, &[KeyCode::Enter]);
        assert!(app.new_label_popup.is_some());
        assert!(app.status.as_deref().unwrap_or_default().contains("already exists"));

        type_text(&mut app, " night");
        press(&mut app, &[KeyCode::Enter]);
        assert!(app.new_label_popup.is_none());
        assert!(app.labels.contains("Parade night"));
        assert_eq!(app.labels.get(app.selected_label_index), Some("Parade night"));
    }

    #[test]
    fn cursor_stays_inside_window() {
        let mut app = app();
        press(&mut app, &[KeyCode::Up]);
        assert_eq!(app.cursor, SlotIndex::WINDOW_START);
        press(&mut app, &[KeyCode::End, KeyCode::Down]);
        assert_eq!(app.cursor.get(), SLOT_COUNT - 1);
        press(&mut app, &[KeyCode::Home, KeyCode::PageDown]);
        assert_eq!(app.cursor, at("10:00"));
    }

    #[test]
    fn help_returns_to_previous_view() {
        let mut app = app();
        press(&mut app, &[KeyCode::Char('l'), KeyCode::Char('?')]);
        assert_eq!(app.view, AppView::Help);
        press(&mut app, &[KeyCode::Esc]);
        assert_eq!(app.view, AppView::Labels);
        press(&mut app, &[KeyCode::Char('q')]);
        assert!(!app.running);
    }
}
