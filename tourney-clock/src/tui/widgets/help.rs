// Help overlay widget.
//
// Renders a centered modal listing the key bindings. Displayed on top of the
// main layout when `ViewState::show_help` is true.

use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

/// Key column, description column.
pub const BINDINGS: &[(&str, &str)] = &[
    ("Space / Enter", "start or stop the clock"),
    ("Left / Right", "previous / next level *"),
    ("Down / Up", "minus / plus one minute *"),
    ("PgUp / PgDn", "add / remove a player"),
    ("Home = .", "add a buy-in"),
    ("End - ,", "remove a buy-in"),
    ("a / A", "add / remove an add-on"),
    ("m", "mute or unmute sound"),
    ("f", "next footer"),
    ("Backspace", "lock / unlock level controls"),
    ("Shift+key", "x10 where the server allows it"),
    ("q / Esc", "quit"),
];

const DIALOG_WIDTH: u16 = 52;
// Bindings, the footnote, a blank line and the borders.
const DIALOG_HEIGHT: u16 = BINDINGS.len() as u16 + 4;

/// Render the help overlay centered on the screen.
pub fn render(frame: &mut Frame, area: Rect) {
    let dialog_area = centered_rect(DIALOG_WIDTH, DIALOG_HEIGHT, area);

    // Clear the area behind the dialog so it renders cleanly on top
    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            " Keys (Esc to close) ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let mut lines: Vec<Line> = BINDINGS
        .iter()
        .map(|(keys, what)| {
            Line::from(vec![
                Span::styled(
                    format!(" {keys:<15}"),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(*what, Style::default().fg(Color::Gray)),
            ])
        })
        .collect();
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        " * only while unlocked and paused",
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(Style::default().bg(Color::Black));

    frame.render_widget(paragraph, dialog_area);
}

/// Compute a centered rectangle of the given size within `area`.
///
/// If the area is too small, the dialog is clamped to the available space.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let clamped_width = width.min(area.width);
    let clamped_height = height.min(area.height);

    let vertical = Layout::vertical([Constraint::Length(clamped_height)])
        .flex(Flex::Center)
        .split(area);

    let horizontal = Layout::horizontal([Constraint::Length(clamped_width)])
        .flex(Flex::Center)
        .split(vertical[0]);

    horizontal[0]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
