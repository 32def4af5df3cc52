// Composing the values shown on the dashboard from a snapshot at an instant.
//
// Everything here is recomputed from scratch on every render; nothing derived
// is cached between renders.

use tracing::error;

use crate::clock;
use crate::protocol::Snapshot;

/// Shown in the clock slot when the level has no usable time anchor.
pub const MISSING_CLOCK: &str = "--:--";

/// Values for every named display slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplaySlots {
    pub event_name: String,
    /// Banner of the current level, e.g. "LEVEL 4".
    pub level: String,
    /// Blinds, or the break's description.
    pub description: String,
    pub clock: String,
    pub next_level: String,
    pub next_break: String,
    pub paused: bool,
    pub is_break: bool,
    pub muted: bool,
    pub players: i64,
    pub buy_ins: i64,
    pub add_ons: i64,
    pub average_chips: i64,
    pub total_chips: i64,
    pub prize_pool: String,
    pub version: i64,
}

pub fn compose(snapshot: &Snapshot, now: i64) -> DisplaySlots {
    let state = &snapshot.state;
    let level = snapshot.current_level();

    let clock = match clock::remaining(snapshot, now) {
        Ok(ms) => format_hmmss(ms),
        Err(e) => {
            error!("cannot render clock: {e}");
            MISSING_CLOCK.to_string()
        }
    };

    let next_break = match clock::next_break_estimate(snapshot, now) {
        Ok(estimate) => next_break_text(state.is_clock_running, estimate),
        Err(e) => {
            error!("cannot estimate next break: {e}");
            "???".to_string()
        }
    };

    let transients = snapshot.transients.clone().unwrap_or_default();

    DisplaySlots {
        event_name: snapshot.event_name.clone(),
        level: level.map(|l| l.banner.clone()).unwrap_or_default(),
        description: level.map(|l| l.description.clone()).unwrap_or_default(),
        clock,
        next_level: snapshot
            .next_level()
            .map(|l| l.description.clone())
            .unwrap_or_else(|| "N/A".to_string()),
        next_break,
        paused: !state.is_clock_running,
        is_break: level.is_some_and(|l| l.is_break),
        muted: state.sound_muted,
        players: state.current_players,
        buy_ins: state.buy_ins,
        add_ons: state.add_ons,
        average_chips: transients.average_chips,
        total_chips: transients.total_chips,
        prize_pool: state.prize_pool.clone(),
        version: snapshot.version,
    }
}

/// Format a millisecond duration for the big clock: `mm:ss` under an hour,
/// `h:mm:ss` otherwise. Anything under a second reads `00:00`.
pub fn format_hmmss(ms: i64) -> String {
    if ms < 1000 {
        return "00:00".to_string();
    }
    let seconds = ms / 1000;
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h == 0 {
        format!("{m:02}:{s:02}")
    } else {
        format!("{h}:{m:02}:{s:02}")
    }
}

fn next_break_text(running: bool, estimate: Option<i64>) -> String {
    if !running {
        return "PAUSED".to_string();
    }
    match estimate {
        None => "N/A".to_string(),
        Some(ms) => format!("{} MIN", ms.max(0) / 60_000),
    }
}
