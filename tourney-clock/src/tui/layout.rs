// Screen layout: panel arrangement and sizing.
//
// Divides the terminal area into fixed zones for the clock display:
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +--------------------------------------------------+
// | Level Banner (4 rows)                             |
// +--------------------------------------------------+
// | Clock Face (fill)                                 |
// +-------------------------+------------------------+
// | Up Next (50%)            | Field (50%)            |
// +-------------------------+------------------------+
// | Footer (1 row)                                    |
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Height of the up-next and field panels, borders included.
const INFO_HEIGHT: u16 = 6;

/// Resolved screen areas for each dashboard zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: event name, lock and mute indicators.
    pub status_bar: Rect,
    /// Current level banner and blinds.
    pub level_banner: Rect,
    /// The big countdown.
    pub clock_face: Rect,
    /// Next level and time to the next break.
    pub up_next: Rect,
    /// Players, buy-ins, add-ons, chip counts and prize pool.
    pub field: Rect,
    /// Rotating footer text.
    pub footer: Rect,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
}

/// Build the dashboard layout from the available terminal area.
pub fn build_layout(area: Rect) -> AppLayout {
    // Vertical: status(1) | banner(4) | clock(fill) | info(6) | footer(1) | help(1)
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(4),
            Constraint::Min(7),
            Constraint::Length(INFO_HEIGHT),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(vertical[3]);

    AppLayout {
        status_bar: vertical[0],
        level_banner: vertical[1],
        clock_face: vertical[2],
        up_next: horizontal[0],
        field: horizontal[1],
        footer: vertical[4],
        help_bar: vertical[5],
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
