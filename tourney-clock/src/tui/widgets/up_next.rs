// Up-next widget: next level's blinds and minutes to the next break.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::tui::ViewState;

/// Render the up-next panel into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let slots = &state.slots;
    let break_color = match slots.next_break.as_str() {
        "PAUSED" => Color::Yellow,
        "N/A" => Color::DarkGray,
        _ => Color::Green,
    };

    let lines = vec![
        Line::from(vec![
            Span::styled(" Next level: ", Style::default().fg(Color::Gray)),
            Span::styled(slots.next_level.clone(), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::styled(" Next break: ", Style::default().fg(Color::Gray)),
            Span::styled(
                slots.next_break.clone(),
                Style::default()
                    .fg(break_color)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
    ];

    let paragraph =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Up Next"));
    frame.render_widget(paragraph, area);
}
