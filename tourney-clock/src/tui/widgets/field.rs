// Field widget: entrants, chips and prize pool.
//
// Key-value display:
// Players, Buy-ins / Add-ons, Avg stack / Total chips, Prize pool

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::display::DisplaySlots;
use crate::tui::ViewState;

/// Render the field panel into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let paragraph = Paragraph::new(build_field_lines(&state.slots))
        .block(Block::default().borders(Borders::ALL).title("Field"));
    frame.render_widget(paragraph, area);
}

fn build_field_lines(slots: &DisplaySlots) -> Vec<Line<'static>> {
    let row = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(label, Style::default().fg(Color::Gray)),
            Span::styled(value, Style::default().fg(Color::White)),
        ])
    };

    let mut lines = vec![
        row(" Players:    ", slots.players.to_string()),
        row(
            " Entries:    ",
            format!("{} buy-ins, {} add-ons", slots.buy_ins, slots.add_ons),
        ),
        row(
            " Avg stack:  ",
            format!(
                "{} ({} in play)",
                group_thousands(slots.average_chips),
                group_thousands(slots.total_chips)
            ),
        ),
    ];
    if !slots.prize_pool.is_empty() {
        lines.push(row(" Prize pool: ", slots.prize_pool.clone()));
    }
    lines
}

/// `1234567` -> `1,234,567`.
pub fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(22_222), "22,222");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
        assert_eq!(group_thousands(-4_500), "-4,500");
    }

    #[test]
    fn prize_pool_line_only_when_set() {
        let mut slots = DisplaySlots::default();
        assert_eq!(build_field_lines(&slots).len(), 3);
        slots.prize_pool = "1st: $500".into();
        assert_eq!(build_field_lines(&slots).len(), 4);
    }
}
