// Status bar widget: event name, model version, lock and mute indicators.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::tui::ViewState;

/// Render the status bar into the given area.
///
/// Layout: [event name] [version] | [lock] [sound] [restart notice]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut spans = Vec::new();

    let name = if state.slots.event_name.is_empty() {
        "Waiting for server..."
    } else {
        state.slots.event_name.as_str()
    };
    spans.push(Span::styled(
        format!(" {name} "),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled(
        format!("v{}", state.slots.version),
        Style::default().fg(Color::DarkGray),
    ));
    spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));

    let (lock, lock_color) = lock_indicator(state.controls_locked);
    spans.push(Span::styled(lock, Style::default().fg(lock_color)));
    spans.push(Span::raw(" "));

    let (sound, sound_color) = sound_indicator(state.slots.muted);
    spans.push(Span::styled(sound, Style::default().fg(sound_color)));

    if let Some(reason) = &state.restarting {
        spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));
        spans.push(Span::styled(
            format!("restarting: {reason}"),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

pub fn lock_indicator(locked: bool) -> (&'static str, Color) {
    if locked {
        ("[LOCKED]", Color::Green)
    } else {
        ("[UNLOCKED]", Color::Yellow)
    }
}

pub fn sound_indicator(muted: bool) -> (&'static str, Color) {
    if muted {
        ("[MUTED]", Color::Red)
    } else {
        ("[SOUND]", Color::Gray)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
