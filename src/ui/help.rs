use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span, Text},
};

use super::theme::Theme;

pub fn build_help_text() -> Text<'static> {
    let mut lines = Vec::new();

    lines.push(Line::from(Span::styled(
        "Key bindings",
        Style::default()
            .fg(Theme::heading())
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));

    lines.push(section_title("Global"));
    lines.extend(section_lines(&[
        "q / Ctrl+C: Quit",
        "?: Toggle help",
        "Tab / Shift+Tab: Next / previous view",
        "t/l: Timeline / Labels",
        "r: Reload from disk",
        "esc: Back",
    ]));

    lines.push(Line::from(""));
    lines.push(section_title("Timeline"));
    lines.extend(section_lines(&[
        "Up/Down: Move 5 minutes",
        "PgUp/PgDn: Move one hour",
        "Home/End: Opening / closing time",
        "n: New event here",
        "Enter / e: Edit event here",
        "d: Delete event here",
    ]));

    lines.push(Line::from(""));
    lines.push(section_title("Labels"));
    lines.extend(section_lines(&[
        "n: New label",
        "Enter: Plan an event with this label",
        "d: Remove label and its events",
    ]));

    lines.push(Line::from(""));
    lines.push(section_title("Event form"));
    lines.extend(section_lines(&[
        "Tab: Next field",
        "Up/Down: Pick a label as title",
        "Enter: Save  esc: Cancel",
    ]));

    Text::from(lines)
}

fn section_title(title: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        title,
        Style::default()
            .fg(Theme::hour_mark())
            .add_modifier(Modifier::BOLD),
    ))
}

fn section_lines(items: &[&'static str]) -> Vec<Line<'static>> {
    items
        .iter()
        .map(|item| {
            Line::from(Span::styled(
                format!("  {item}"),
                Style::default().fg(Theme::text()),
            ))
        })
        .collect()
}
