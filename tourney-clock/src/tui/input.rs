// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages for the sync
// engine, or into local ViewState changes (the help overlay).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::ViewState;
use crate::protocol::{Command, UserCommand};

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// engine. Returns `None` when it was handled locally or is unbound.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Only process key press events. On Windows, crossterm emits both
    // Press and Release events for each physical keypress.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    if key_event.modifiers.contains(KeyModifiers::CONTROL)
        && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    // Help overlay: Esc or any help key closes it, everything else is blocked
    if view_state.show_help {
        if matches!(
            key_event.code,
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('?') | KeyCode::Char('/')
        ) {
            view_state.show_help = false;
        }
        return None;
    }

    let shift = key_event.modifiers.contains(KeyModifiers::SHIFT);
    let send = |command| Some(UserCommand::Send { command, shift });

    match key_event.code {
        KeyCode::Char(' ') | KeyCode::Enter => Some(UserCommand::TogglePause),

        // Level and time: the engine drops these unless unlocked and paused
        KeyCode::Left => send(Command::PreviousLevel),
        KeyCode::Right => send(Command::SkipLevel),
        KeyCode::Down => send(Command::MinusMinute),
        KeyCode::Up => send(Command::PlusMinute),

        KeyCode::PageUp => send(Command::AddPlayer),
        KeyCode::PageDown => send(Command::RemovePlayer),
        KeyCode::Home | KeyCode::Char('=') | KeyCode::Char('.') => send(Command::AddBuyIn),
        KeyCode::End | KeyCode::Char('-') | KeyCode::Char(',') => send(Command::RemoveBuyIn),

        // Shift picks the direction here, so it is not forwarded as x10
        KeyCode::Char('a') => Some(UserCommand::Send {
            command: Command::AddAddOn,
            shift: false,
        }),
        KeyCode::Char('A') => Some(UserCommand::Send {
            command: Command::RemoveAddOn,
            shift: false,
        }),

        KeyCode::Char('m') => Some(UserCommand::ToggleMute),
        KeyCode::Char('f') => Some(UserCommand::NextFooter),
        KeyCode::Backspace => Some(UserCommand::ToggleControlsLock),

        KeyCode::Char('?') | KeyCode::Char('/') | KeyCode::F(1) => {
            view_state.show_help = true;
            None
        }

        KeyCode::Char('q') | KeyCode::Esc => Some(UserCommand::Quit),

        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn shifted(code: KeyCode) -> KeyEvent {
        KeyEvent {
            modifiers: KeyModifiers::SHIFT,
            ..key(code)
        }
    }

    fn sent(command: Command, shift: bool) -> Option<UserCommand> {
        Some(UserCommand::Send { command, shift })
    }

    #[test]
    fn pause_keys() {
        let mut state = ViewState::default();
        assert_eq!(
            handle_key(key(KeyCode::Char(' ')), &mut state),
            Some(UserCommand::TogglePause)
        );
        assert_eq!(
            handle_key(key(KeyCode::Enter), &mut state),
            Some(UserCommand::TogglePause)
        );
    }

    #[test]
    fn level_and_time_keys() {
        let mut state = ViewState::default();
        assert_eq!(
            handle_key(key(KeyCode::Left), &mut state),
            sent(Command::PreviousLevel, false)
        );
        assert_eq!(
            handle_key(key(KeyCode::Right), &mut state),
            sent(Command::SkipLevel, false)
        );
        assert_eq!(
            handle_key(key(KeyCode::Down), &mut state),
            sent(Command::MinusMinute, false)
        );
        assert_eq!(
            handle_key(shifted(KeyCode::Up), &mut state),
            sent(Command::PlusMinute, true)
        );
    }

    #[test]
    fn player_and_buy_in_keys() {
        let mut state = ViewState::default();
        assert_eq!(
            handle_key(key(KeyCode::PageUp), &mut state),
            sent(Command::AddPlayer, false)
        );
        assert_eq!(
            handle_key(shifted(KeyCode::PageDown), &mut state),
            sent(Command::RemovePlayer, true)
        );
        for code in [KeyCode::Home, KeyCode::Char('='), KeyCode::Char('.')] {
            assert_eq!(handle_key(key(code), &mut state), sent(Command::AddBuyIn, false));
        }
        for code in [KeyCode::End, KeyCode::Char('-'), KeyCode::Char(',')] {
            assert_eq!(
                handle_key(key(code), &mut state),
                sent(Command::RemoveBuyIn, false)
            );
        }
    }

    #[test]
    fn add_on_keys_ignore_shift_flag() {
        let mut state = ViewState::default();
        assert_eq!(
            handle_key(key(KeyCode::Char('a')), &mut state),
            sent(Command::AddAddOn, false)
        );
        assert_eq!(
            handle_key(shifted(KeyCode::Char('A')), &mut state),
            sent(Command::RemoveAddOn, false)
        );
    }

    #[test]
    fn local_engine_commands() {
        let mut state = ViewState::default();
        assert_eq!(
            handle_key(key(KeyCode::Char('m')), &mut state),
            Some(UserCommand::ToggleMute)
        );
        assert_eq!(
            handle_key(key(KeyCode::Char('f')), &mut state),
            Some(UserCommand::NextFooter)
        );
        assert_eq!(
            handle_key(key(KeyCode::Backspace), &mut state),
            Some(UserCommand::ToggleControlsLock)
        );
    }

    #[test]
    fn help_overlay_opens_and_esc_closes_it() {
        let mut state = ViewState::default();
        assert_eq!(handle_key(key(KeyCode::F(1)), &mut state), None);
        assert!(state.show_help);

        // Keys are swallowed while the overlay is up.
        assert_eq!(handle_key(key(KeyCode::Char(' ')), &mut state), None);
        assert!(state.show_help);

        // Esc closes the overlay instead of quitting.
        assert_eq!(handle_key(key(KeyCode::Esc), &mut state), None);
        assert!(!state.show_help);

        assert_eq!(handle_key(key(KeyCode::Char('?')), &mut state), None);
        assert!(state.show_help);
    }

    #[test]
    fn quit_keys() {
        let mut state = ViewState::default();
        assert_eq!(
            handle_key(key(KeyCode::Char('q')), &mut state),
            Some(UserCommand::Quit)
        );
        assert_eq!(handle_key(key(KeyCode::Esc), &mut state), Some(UserCommand::Quit));

        let ctrl_c = KeyEvent {
            modifiers: KeyModifiers::CONTROL,
            ..key(KeyCode::Char('c'))
        };
        state.show_help = true;
        assert_eq!(handle_key(ctrl_c, &mut state), Some(UserCommand::Quit));
    }

    #[test]
    fn release_events_are_ignored() {
        let mut state = ViewState::default();
        let release = KeyEvent {
            kind: KeyEventKind::Release,
            ..key(KeyCode::Char(' '))
        };
        assert_eq!(handle_key(release, &mut state), None);
    }

    #[test]
    fn unbound_keys_do_nothing() {
        let mut state = ViewState::default();
        assert_eq!(handle_key(key(KeyCode::Char('z')), &mut state), None);
        assert_eq!(handle_key(key(KeyCode::Tab), &mut state), None);
    }
}
