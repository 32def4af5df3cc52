// Clock face widget: the big countdown.
//
// Draws the clock string in 5-row block digits when the area is large enough,
// falling back to a single bold line otherwise. Breaks are drawn in green,
// a paused clock in yellow with a PAUSED caption underneath.

use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::tui::ViewState;

const GLYPH_ROWS: usize = 5;

/// Block glyph for one clock character, top row first.
fn glyph(c: char) -> [&'static str; GLYPH_ROWS] {
    match c {
        '0' => ["███", "█ █", "█ █", "█ █", "███"],
        '1' => ["  █", "  █", "  █", "  █", "  █"],
        '2' => ["███", "  █", "███", "█  ", "███"],
        '3' => ["███", "  █", "███", "  █", "███"],
        '4' => ["█ █", "█ █", "███", "  █", "  █"],
        '5' => ["███", "█  ", "███", "  █", "███"],
        '6' => ["███", "█  ", "███", "█ █", "███"],
        '7' => ["███", "  █", "  █", "  █", "  █"],
        '8' => ["███", "█ █", "███", "█ █", "███"],
        '9' => ["███", "█ █", "███", "  █", "███"],
        ':' => [" ", "█", " ", "█", " "],
        '-' => ["   ", "   ", "███", "   ", "   "],
        _ => ["   ", "   ", "   ", "   ", "   "],
    }
}

/// Render `text` as block digits, one string per row.
pub fn big_text(text: &str) -> Vec<String> {
    let mut rows = vec![String::new(); GLYPH_ROWS];
    for (i, c) in text.chars().enumerate() {
        for (row, part) in rows.iter_mut().zip(glyph(c)) {
            if i > 0 {
                row.push(' ');
            }
            row.push_str(part);
        }
    }
    rows
}

/// Render the clock face into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let slots = &state.slots;
    let color = clock_color(slots.is_break, slots.paused);
    let style = Style::default().fg(color).add_modifier(Modifier::BOLD);

    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);

    let rows = big_text(&slots.clock);
    let fits = rows
        .first()
        .is_some_and(|r| r.chars().count() <= inner.width as usize)
        && inner.height as usize > GLYPH_ROWS;

    let mut lines: Vec<Line> = Vec::new();
    if fits {
        let padding = (inner.height as usize).saturating_sub(GLYPH_ROWS + 1) / 2;
        lines.extend(std::iter::repeat(Line::raw("")).take(padding));
        lines.extend(rows.into_iter().map(|r| Line::from(Span::styled(r, style))));
    } else {
        lines.push(Line::from(Span::styled(slots.clock.clone(), style)));
    }

    if slots.paused {
        lines.push(Line::from(Span::styled(
            "PAUSED",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(paragraph, area);
}

pub fn clock_color(is_break: bool, paused: bool) -> Color {
    if paused {
        Color::Yellow
    } else if is_break {
        Color::Green
    } else {
        Color::White
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
