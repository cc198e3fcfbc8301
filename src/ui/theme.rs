use ratatui::style::Color;

/// Colors shared by every view of the planner.
pub struct Theme;

impl Theme {
    /// Header badge, candy-floss pink
    pub fn brand() -> Color {
        Color::Rgb(255, 110, 180)
    }

    /// Borders around header, body and popups
    pub fn frame() -> Color {
        Color::Rgb(90, 170, 210)
    }

    /// Full-hour rows on the timeline and help section titles
    pub fn hour_mark() -> Color {
        Color::Rgb(255, 200, 90)
    }

    /// Rejected input or failed save
    pub fn warn() -> Color {
        Color::Rgb(255, 135, 60)
    }

    /// Slot or field under the cursor
    pub fn cursor() -> Color {
        Color::Rgb(140, 225, 255)
    }

    /// The `>` in front of the current row
    pub fn marker() -> Color {
        Color::Rgb(120, 215, 120)
    }

    /// Free slots and hints
    pub fn muted() -> Color {
        Color::Rgb(110, 110, 125)
    }

    pub fn text() -> Color {
        Color::Rgb(235, 235, 240)
    }

    /// View titles and event counts
    pub fn heading() -> Color {
        Color::Rgb(175, 155, 255)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_drawn_side_by_side_are_distinguishable() {
        let roles = [
            Theme::brand(),
            Theme::frame(),
            Theme::hour_mark(),
            Theme::warn(),
            Theme::cursor(),
            Theme::marker(),
            Theme::muted(),
            Theme::heading(),
        ];
        for (i, a) in roles.iter().enumerate() {
            for b in &roles[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
