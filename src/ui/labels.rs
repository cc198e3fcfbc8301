use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span, Text},
};

use super::helpers::{clamp_name, title_style_color};
use super::theme::Theme;
use crate::app::App;

pub fn build_labels_text(app: &App) -> Text<'_> {
    if app.labels.is_empty() {
        return Text::from("  No labels yet. Press 'n' to create one.");
    }

    let lines = app
        .labels
        .iter()
        .enumerate()
        .map(|(index, label)| {
            let selected = index == app.selected_label_index;
            let marker_style = if selected {
                Style::default()
                    .fg(Theme::cursor())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Theme::muted())
            };
            let name_style = Style::default()
                .fg(title_style_color(label))
                .add_modifier(Modifier::BOLD);
            let count = app.schedule.count_titled(label);
            Line::from(vec![
                Span::styled(if selected { "> " } else { "  " }, marker_style),
                Span::styled(clamp_name(label, 24), name_style),
                Span::styled(
                    format!("  {count} event(s)"),
                    Style::default().fg(Theme::muted()),
                ),
            ])
        })
        .collect::<Vec<_>>();

    Text::from(lines)
}
