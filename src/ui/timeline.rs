use std::ops::Range;

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span, Text},
};

use super::helpers::{clamp_name, format_minutes, title_style_color};
use super::theme::Theme;
use crate::app::App;
use crate::slot::{SLOT_COUNT, SLOT_MINUTES, SlotIndex, slots_to_minutes};

const TITLE_WIDTH: usize = 28;

/// Renders the rows of the day around the cursor, `height` rows tall.
pub fn build_timeline_text(app: &App, height: u16) -> Text<'_> {
    let mut lines = vec![summary_line(app), Line::from("")];

    for raw in visible_rows(app.cursor.get(), SLOT_COUNT, height) {
        let Some(slot) = SlotIndex::new(raw) else {
            continue;
        };
        lines.push(slot_line(app, slot));
    }

    Text::from(lines)
}

/// Window of `height` rows out of `total`, keeping `cursor` roughly centered.
pub fn visible_rows(cursor: u16, total: u16, height: u16) -> Range<u16> {
    if height >= total {
        return 0..total;
    }
    let start = cursor.saturating_sub(height / 2).min(total - height);
    start..start + height
}

fn summary_line(app: &App) -> Line<'_> {
    let planned = app
        .schedule
        .events()
        .iter()
        .map(|event| slots_to_minutes(event.duration_slots()))
        .sum::<u32>();
    let free = slots_to_minutes(SLOT_COUNT).saturating_sub(planned);
    Line::from(vec![
        Span::styled(
            format!("  {} event(s)", app.schedule.len()),
            Style::default()
                .fg(Theme::heading())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("   planned {}", format_minutes(planned)),
            Style::default().fg(Theme::text()),
        ),
        Span::styled(
            format!("   free {}", format_minutes(free)),
            Style::default().fg(Theme::muted()),
        ),
    ])
}

fn slot_line(app: &App, slot: SlotIndex) -> Line<'_> {
    let selected = slot == app.cursor;
    let marker_style = if selected {
        Style::default()
            .fg(Theme::marker())
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Theme::muted())
    };

    // Label every quarter hour, emphasise full hours.
    let show_time = slot.minutes_since_midnight() % (3 * SLOT_MINUTES) == 0;
    let time_label = if show_time || selected {
        slot.to_string()
    } else {
        "     ".to_string()
    };
    let mut time_style = if slot.is_hour_start() {
        Style::default()
            .fg(Theme::hour_mark())
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Theme::muted())
    };
    if selected {
        time_style = time_style.fg(Theme::cursor());
    }

    let mut spans = vec![
        Span::styled(if selected { "> " } else { "  " }, marker_style),
        Span::styled(time_label, time_style),
        Span::raw(" "),
    ];

    match app.schedule.event_at(slot) {
        Some(event) => {
            let color = title_style_color(event.title());
            spans.push(Span::styled("██", Style::default().fg(color)));
            if event.start() == slot {
                let mut title_style = Style::default().fg(color).add_modifier(Modifier::BOLD);
                if selected {
                    title_style = title_style.add_modifier(Modifier::REVERSED);
                }
                spans.push(Span::raw(" "));
                spans.push(Span::styled(clamp_name(event.title(), TITLE_WIDTH), title_style));
                spans.push(Span::styled(
                    format!(
                        " {}-{}  {}",
                        event.start(),
                        event.end(),
                        format_minutes(slots_to_minutes(event.duration_slots()))
                    ),
                    Style::default().fg(Theme::muted()),
                ));
            }
        }
        None => {
            let style = if selected {
                Style::default().fg(Theme::cursor())
            } else {
                Style::default().fg(Theme::muted())
            };
            spans.push(Span::styled(if slot.is_hour_start() { "──" } else { "··" }, style));
        }
    }

    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db;
    use crate::slot::time_to_index;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn visible_rows_fit_whole_day_when_tall() {
        assert_eq!(visible_rows(50, 108, 200), 0..108);
    }

    #[test]
    fn visible_rows_follow_cursor() {
        assert_eq!(visible_rows(0, 108, 20), 0..20);
        assert_eq!(visible_rows(50, 108, 20), 40..60);
        assert_eq!(visible_rows(107, 108, 20), 88..108);
    }

    #[test]
    fn timeline_shows_event_title_on_start_row() {
        let mut app = App::load(db::open_in_memory(), &Config::default()).unwrap();
        app.schedule = app
            .schedule
            .add_event("Lunch", time_to_index("12:00").unwrap(), 30)
            .unwrap();
        app.cursor = time_to_index("12:00").unwrap();

        let text = build_timeline_text(&app, 10);
        assert_eq!(text.lines.len(), 12);
        let rendered = text.lines.iter().map(line_text).collect::<Vec<_>>();
        assert!(rendered[0].contains("1 event(s)"));
        assert!(rendered[0].contains("planned 30m"));
        let start_row = rendered
            .iter()
            .find(|line| line.contains("Lunch"))
            .unwrap();
        assert!(start_row.starts_with("> 12:00"));
        assert!(start_row.contains("12:00-12:30"));
        assert_eq!(rendered.iter().filter(|line| line.contains("Lunch")).count(), 1);
    }
}
