// TUI dashboard: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` holding the last display slots pushed by the sync
// engine. The engine pushes `UiUpdate` messages over an mpsc channel; the TUI
// applies them to `ViewState` and re-renders at ~30 fps.

pub mod input;
pub mod layout;
pub mod widgets;

use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::debug;

use crate::display::{self, DisplaySlots};
use crate::protocol::{Snapshot, UiUpdate, UserCommand};

use layout::{build_layout, AppLayout};

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state that mirrors what the engine last pushed.
pub struct ViewState {
    pub slots: DisplaySlots,
    pub footer: String,
    pub controls_locked: bool,
    pub show_help: bool,
    /// Set while the engine restarts after a protocol change; cleared by the
    /// next slots update.
    pub restarting: Option<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            slots: display::compose(&Snapshot::placeholder(), 0),
            footer: String::new(),
            controls_locked: true,
            show_help: false,
            restarting: None,
        }
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Slots(slots) => {
            if state.restarting.is_some() && slots.version > Snapshot::placeholder().version {
                state.restarting = None;
            }
            state.slots = *slots;
        }
        UiUpdate::Footer(text) => {
            state.footer = text;
        }
        UiUpdate::ControlsLocked(locked) => {
            state.controls_locked = locked;
        }
        UiUpdate::Restarting { reason } => {
            state.restarting = Some(reason);
            state.footer.clear();
        }
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete dashboard frame.
fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);
    widgets::level_banner::render(frame, layout.level_banner, state);
    widgets::clock_face::render(frame, layout.clock_face, state);
    widgets::up_next::render(frame, layout.up_next, state);
    widgets::field::render(frame, layout.field, state);
    render_footer(frame, &layout, state);
    render_help_bar(frame, &layout);

    if state.show_help {
        widgets::help::render(frame, frame.area());
    }
}

fn render_footer(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let paragraph = Paragraph::new(Line::from(Span::styled(
        state.footer.clone(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(ratatui::layout::Alignment::Center);
    frame.render_widget(paragraph, layout.footer);
}

fn render_help_bar(frame: &mut Frame, layout: &AppLayout) {
    let text = " Space:Start/Stop | Arrows:Level/Time | PgUp/PgDn:Players | Bksp:Lock | ?:Help | q:Quit";
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        text,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, layout.help_bar);
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// 1. Initializes the terminal (enters raw mode, enables alternate screen).
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: UI updates, keyboard input, render ticks.
/// 4. Restores the terminal on clean exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::default();
    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let result = loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => apply_ui_update(&mut view_state, ui_update),
                    // Channel closed: the engine is gone
                    None => break Ok(()),
                }
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            debug!(?cmd, "key command");
                            let quit = cmd == UserCommand::Quit;
                            let _ = cmd_tx.send(cmd).await;
                            if quit {
                                break Ok(());
                            }
                        }
                    }
                    Some(Ok(_)) => {
                        // Mouse and resize events: the next render tick redraws
                    }
                    Some(Err(e)) => break Err(anyhow::Error::new(e).context("terminal input failed")),
                    None => break Ok(()),
                }
            }

            _ = render_tick.tick() => {
                if let Err(e) = terminal.draw(|frame| render_frame(frame, &view_state)) {
                    break Err(anyhow::Error::new(e).context("failed to draw frame"));
                }
            }
        }
    };

    ratatui::restore();
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
