mod help;
mod helpers;
mod labels;
mod theme;
mod timeline;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    prelude::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};

use crate::app::{App, AppView, ConfirmPopup, EventField, EventPopup, NewLabelPopup, TABS};
use helpers::title_style_color;
use theme::Theme;

/// Rows taken by borders, tab bar, view title and key hints inside the body.
const BODY_CHROME_ROWS: u16 = 11;

/// Renders the entire UI for a single frame.
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(area);

    let header_lines = vec![Line::from(vec![
        Span::styled(
            "  Parkday  ",
            Style::default().fg(Color::Black).bg(Theme::brand()),
        ),
        Span::raw(" "),
        Span::styled(
            "day planner",
            Style::default()
                .fg(Theme::frame())
                .add_modifier(Modifier::BOLD),
        ),
    ])];
    let header = Paragraph::new(Text::from(header_lines))
        .alignment(Alignment::Left)
        .block(rounded_block());
    frame.render_widget(header, layout[0]);

    let (title, body_text) = match app.view {
        AppView::Timeline => {
            let rows = layout[1].height.saturating_sub(BODY_CHROME_ROWS).max(1);
            ("Timeline", timeline::build_timeline_text(app, rows))
        }
        AppView::Labels => ("Labels", labels::build_labels_text(app)),
        AppView::Help => ("Help", help::build_help_text()),
    };

    let mut body_lines = vec![
        tabs_line(app),
        Line::from(""),
        Line::from(Span::styled(
            format!("  {title}"),
            Style::default()
                .fg(Theme::heading())
                .add_modifier(Modifier::BOLD),
        )),
    ];
    body_lines.extend(body_text.lines);
    body_lines.push(Line::from(""));
    body_lines.push(Line::from(Span::styled(
        "----------------------------------------",
        Style::default().fg(Theme::muted()),
    )));
    body_lines.extend(keybinds_lines(app));
    let body = Paragraph::new(Text::from(body_lines))
        .style(Style::default().fg(Theme::text()))
        .alignment(Alignment::Left)
        .block(rounded_block());
    frame.render_widget(body, layout[1]);

    let footer = Paragraph::new(Text::from(status_line(app)))
        .alignment(Alignment::Left)
        .block(rounded_block());
    frame.render_widget(footer, layout[2]);

    if let Some(popup) = &app.event_popup {
        render_event_popup(frame, popup, app);
    }
    if let Some(popup) = &app.new_label_popup {
        render_new_label_popup(frame, popup);
    }
    if let Some(popup) = &app.confirm_popup {
        render_confirm_popup(frame, popup);
    }
}

fn rounded_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .style(Style::default().fg(Theme::frame()))
}

fn render_event_popup(frame: &mut Frame, popup: &EventPopup, app: &App) {
    let area = centered_rect(60, 70, frame.area());
    frame.render_widget(Clear, area);

    let arrow_style = Style::default()
        .fg(Theme::marker())
        .add_modifier(Modifier::BOLD);
    let field_styles = |field: EventField| {
        if popup.field == field {
            (
                Style::default()
                    .fg(Theme::cursor())
                    .add_modifier(Modifier::BOLD),
                Style::default()
                    .fg(Theme::cursor())
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            (
                Style::default().fg(Theme::muted()),
                Style::default().fg(Theme::text()),
            )
        }
    };

    let heading = if popup.editing.is_some() {
        "Edit event"
    } else {
        "New event"
    };
    let mut lines = vec![
        Line::from(Span::styled(
            heading,
            Style::default()
                .fg(Theme::heading())
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for (field, name, value) in [
        (EventField::Title, "Title:    ", popup.title.as_str()),
        (EventField::Start, "Start:    ", popup.start.as_str()),
        (EventField::Duration, "Minutes:  ", popup.duration.as_str()),
    ] {
        let (title_style, value_style) = field_styles(field);
        let active = popup.field == field;
        lines.push(Line::from(vec![
            Span::styled(if active { "> " } else { "  " }, arrow_style),
            Span::styled(name, title_style),
            Span::styled(value.to_string(), value_style),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Labels",
        Style::default().fg(Theme::muted()),
    )));
    for (index, label) in app.labels.iter().enumerate() {
        let selected = popup.label_index == Some(index);
        let marker_style = if selected {
            arrow_style
        } else {
            Style::default().fg(Theme::muted())
        };
        let mut name_style = Style::default().fg(title_style_color(label));
        if selected {
            name_style = name_style.add_modifier(Modifier::BOLD);
        }
        lines.push(Line::from(vec![
            Span::styled(if selected { "> " } else { "  " }, marker_style),
            Span::styled(label.clone(), name_style),
        ]));
    }

    if let Some(status) = &app.status {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            status.clone(),
            Style::default().fg(Theme::warn()).add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Type to edit. Tab: next field. Up/Down: pick label. Enter: save. Esc: cancel.",
        Style::default().fg(Theme::muted()),
    )));

    let title = if popup.editing.is_some() {
        " Edit "
    } else {
        " New "
    };
    let widget = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false })
        .block(rounded_block().title(title));
    frame.render_widget(widget, area);
}

fn render_new_label_popup(frame: &mut Frame, popup: &NewLabelPopup) {
    let area = centered_rect(50, 30, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled(
            "New label",
            Style::default()
                .fg(Theme::heading())
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Name: ", Style::default().fg(Theme::muted())),
            Span::styled(
                popup.name.as_str(),
                Style::default()
                    .fg(Theme::cursor())
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Type to edit. Enter: save. Esc: cancel.",
            Style::default().fg(Theme::muted()),
        )),
    ];

    let widget = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Left)
        .block(rounded_block().title(" New Label "));
    frame.render_widget(widget, area);
}

fn render_confirm_popup(frame: &mut Frame, popup: &ConfirmPopup) {
    let area = centered_rect(50, 25, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled(
            popup.message.as_str(),
            Style::default()
                .fg(Theme::warn())
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "y / Enter: confirm   n / Esc: cancel",
            Style::default().fg(Theme::muted()),
        )),
    ];
    let widget = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true })
        .block(rounded_block().title(" Confirm "));
    frame.render_widget(widget, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

fn tabs_line(app: &App) -> Line<'_> {
    let mut spans = Vec::new();
    for (index, view) in TABS.iter().enumerate() {
        if index > 0 {
            spans.push(Span::raw("  "));
        }
        let name = match view {
            AppView::Timeline => "Timeline",
            AppView::Labels => "Labels",
            AppView::Help => "Help",
        };
        let style = if *view == app.view {
            Style::default()
                .fg(Color::Black)
                .bg(Theme::cursor())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Theme::muted())
        };
        spans.push(Span::styled(format!(" {name} "), style));
    }

    Line::from(spans)
}

fn status_line(app: &App) -> Line<'_> {
    // Popups show their own errors.
    let status = app
        .status
        .as_deref()
        .filter(|_| app.event_popup.is_none() && app.new_label_popup.is_none());
    if let Some(status) = status {
        return Line::from(Span::styled(
            status,
            Style::default()
                .fg(Theme::warn())
                .add_modifier(Modifier::BOLD),
        ));
    }
    match app.last_saved {
        Some(saved) => Line::from(Span::styled(
            format!("● Saved {}", saved.format("%H:%M:%S")),
            Style::default().fg(Theme::muted()),
        )),
        None => Line::from(Span::styled(
            "● Nothing saved yet",
            Style::default().fg(Theme::muted()),
        )),
    }
}

fn keybinds_lines(app: &App) -> Vec<Line<'static>> {
    let (primary, secondary) = match app.view {
        AppView::Timeline => (
            "Up/Down: Move  PgUp/PgDn: Hour  n: New  Enter/e: Edit  d: Delete",
            "Tab: Next view  r: Reload  ?: Help  q: Quit",
        ),
        AppView::Labels => (
            "Up/Down: Select  n: New  Enter: Plan event  d: Remove",
            "Tab: Next view  r: Reload  ?: Help  q: Quit",
        ),
        AppView::Help => ("Press ? or ESC to close this help screen", ""),
    };
    vec![
        Line::from(Span::styled(primary, Style::default().fg(Theme::muted()))),
        Line::from(Span::styled(secondary, Style::default().fg(Theme::muted()))),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db;
    use ratatui::{Terminal, backend::TestBackend};

    #[test]
    fn draws_every_view_without_panicking() {
        let mut app = App::load(db::open_in_memory(), &Config::default()).unwrap();
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        for view in TABS {
            app.view = view;
            terminal.draw(|frame| draw(frame, &app)).unwrap();
        }
    }

    #[test]
    fn draws_tiny_terminal() {
        let app = App::load(db::open_in_memory(), &Config::default()).unwrap();
        let mut terminal = Terminal::new(TestBackend::new(20, 8)).unwrap();
        terminal.draw(|frame| draw(frame, &app)).unwrap();
    }
}
