// Level banner widget: the current level's banner and blinds.
//
// Line 1: banner (e.g. "LEVEL 4"), bold
// Line 2: blinds or break description, green during a break

use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::tui::ViewState;

/// Render the level banner into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let slots = &state.slots;
    let description_color = if slots.is_break {
        Color::Green
    } else {
        Color::Cyan
    };

    let lines = vec![
        Line::from(Span::styled(
            slots.level.clone(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            slots.description.clone(),
            Style::default()
                .fg(description_color)
                .add_modifier(Modifier::BOLD),
        )),
    ];

    let title = if slots.is_break { "Break" } else { "Level" };
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_banner_and_description() {
        let backend = ratatui::backend::TestBackend::new(40, 4);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let mut state = ViewState::default();
        state.slots.level = "LEVEL 4".into();
        state.slots.description = "100/200 ante 200".into();
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("LEVEL 4"));
        assert!(text.contains("100/200 ante 200"));
    }
}
