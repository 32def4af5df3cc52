// Clock prediction: remaining time, next-break lookahead, and the optimistic
// local level advance applied between authoritative updates.
//
// All arithmetic is in unix milliseconds. Nothing here touches the network or
// the render sink; the engine calls these with the current wall-clock time.

use thiserror::Error;
use tracing::{debug, info};

use crate::protocol::Snapshot;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClockError {
    /// Neither an absolute end time nor a remaining-duration fallback is set.
    #[error("level {level} has neither an end timestamp nor a remaining duration")]
    MissingAnchor { level: usize },
}

// ---------------------------------------------------------------------------
// Wall clock source
// ---------------------------------------------------------------------------

/// Source of "now" in unix milliseconds. Injected so tests can pin time.
pub trait WallClock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

// ---------------------------------------------------------------------------
// Prediction
// ---------------------------------------------------------------------------

/// Milliseconds left in the current level. Negative once the level's end
/// timestamp has passed.
pub fn remaining(snapshot: &Snapshot, now: i64) -> Result<i64, ClockError> {
    if let Some(ends_at) = snapshot.state.current_level_ends_at {
        return Ok(ends_at - now);
    }
    if let Some(remaining) = snapshot.state.time_remaining_millis {
        return Ok(remaining);
    }
    Err(ClockError::MissingAnchor {
        level: snapshot.state.current_level_number,
    })
}

/// Milliseconds until the next break level starts, or `None` when the clock
/// is paused or no break lies ahead.
pub fn next_break_estimate(snapshot: &Snapshot, now: i64) -> Result<Option<i64>, ClockError> {
    if !snapshot.state.is_clock_running {
        return Ok(None);
    }

    let mut until = remaining(snapshot, now)?;
    let start = snapshot.state.current_level_number + 1;
    for level in snapshot.structure.levels.iter().skip(start) {
        if level.is_break {
            return Ok(Some(until));
        }
        until += level.duration_millis();
    }
    Ok(None)
}

/// How long the engine should sleep before the countdown display next changes
/// second. Wakes 5ms past the boundary so the render lands on the new value.
pub fn millis_until_next_second(remaining: i64) -> u64 {
    if remaining <= 0 {
        0
    } else {
        5 + (remaining % 1000) as u64
    }
}

/// Step to the next level if the current one has run out.
///
/// Returns whether the snapshot changed. The new level's end is anchored on
/// the previous level's end rather than on `now`, so repeated local advances
/// do not drift from the last authoritative anchor. A paused clock (no end
/// timestamp) never expires here.
pub fn advance_if_expired(snapshot: &mut Snapshot, now: i64) -> Result<bool, ClockError> {
    let Some(old_ends_at) = snapshot.state.current_level_ends_at else {
        // Still validates the anchor so a broken snapshot is reported.
        remaining(snapshot, now)?;
        return Ok(false);
    };
    if old_ends_at - now > 0 {
        return Ok(false);
    }

    let next_index = snapshot.state.current_level_number + 1;
    let Some(next) = snapshot.structure.levels.get(next_index) else {
        info!("last level expired, stopping the clock until the server confirms");
        let state = &mut snapshot.state;
        state.current_level_number = snapshot.structure.levels.len().saturating_sub(1);
        state.is_clock_running = false;
        state.current_level_ends_at = None;
        state.time_remaining_millis = Some(0);
        return Ok(true);
    };

    let duration = next.duration_millis();
    let auto_pause = next.auto_pause;
    let state = &mut snapshot.state;
    state.current_level_number = next_index;

    if auto_pause {
        debug!(level = next_index, "entered auto-pause level");
        state.is_clock_running = false;
        state.current_level_ends_at = None;
        state.time_remaining_millis = Some(duration);
    } else {
        state.current_level_ends_at = Some(old_ends_at + duration);
        state.time_remaining_millis = None;
    }

    debug!(level = next_index, "advanced level locally");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Level, Snapshot, State, Structure};

    const MIN: i64 = 60_000;
    const T: i64 = 1_700_000_000_000;

    fn level(minutes: i64, is_break: bool) -> Level {
        Level {
            banner: String::new(),
            description: format!("{minutes}m"),
            duration_minutes: minutes,
            is_break,
            auto_pause: false,
        }
    }

    fn running_at(levels: Vec<Level>, index: usize, ends_at: i64) -> Snapshot {
        Snapshot {
            event_id: 1,
            version: 1,
            event_name: "test".into(),
            footer_plugs_id: 0,
            structure: Structure {
                levels,
                ..Structure::default()
            },
            state: State {
                current_level_number: index,
                is_clock_running: true,
                current_level_ends_at: Some(ends_at),
                ..State::default()
            },
            transients: None,
        }
    }

    #[test]
    fn remaining_prefers_end_timestamp() {
        let mut snap = running_at(vec![level(20, false)], 0, T);
        snap.state.time_remaining_millis = Some(5);
        assert_eq!(remaining(&snap, T - 1500), Ok(1500));
        assert_eq!(remaining(&snap, T + 10), Ok(-10));
    }

    #[test]
    fn remaining_falls_back_when_paused() {
        let mut snap = running_at(vec![level(20, false)], 0, T);
        snap.state.is_clock_running = false;
        snap.state.current_level_ends_at = None;
        snap.state.time_remaining_millis = Some(90_000);
        assert_eq!(remaining(&snap, T), Ok(90_000));
    }

    #[test]
    fn remaining_without_anchor_is_an_error() {
        let mut snap = running_at(vec![level(20, false)], 0, T);
        snap.state.current_level_ends_at = None;
        assert_eq!(remaining(&snap, T), Err(ClockError::MissingAnchor { level: 0 }));
    }

    #[test]
    fn level_rollover_anchors_on_previous_end() {
        let mut snap = running_at(vec![level(20, false), level(15, false)], 0, T);
        let advanced = advance_if_expired(&mut snap, T + 1).unwrap();
        assert!(advanced);
        assert_eq!(snap.state.current_level_number, 1);
        assert_eq!(snap.state.current_level_ends_at, Some(T + 15 * MIN));
        assert!(snap.state.is_clock_running);
    }

    #[test]
    fn unexpired_level_is_left_alone() {
        let mut snap = running_at(vec![level(20, false), level(15, false)], 0, T);
        let before = snap.clone();
        assert_eq!(advance_if_expired(&mut snap, T - 1), Ok(false));
        assert_eq!(snap, before);
    }

    #[test]
    fn terminal_clamp_stops_clock_and_sticks() {
        let mut snap = running_at(vec![level(20, false), level(15, false)], 1, T);
        assert_eq!(advance_if_expired(&mut snap, T + 1), Ok(true));
        assert_eq!(snap.state.current_level_number, 1);
        assert!(!snap.state.is_clock_running);
        assert_eq!(remaining(&snap, T + 1), Ok(0));

        let after_clamp = snap.clone();
        assert_eq!(advance_if_expired(&mut snap, T + 60 * MIN), Ok(false));
        assert_eq!(snap, after_clamp);
    }

    #[test]
    fn entering_auto_pause_level_stops_clock() {
        let mut brk = level(10, true);
        brk.auto_pause = true;
        let mut snap = running_at(vec![level(20, false), brk], 0, T);

        assert_eq!(advance_if_expired(&mut snap, T), Ok(true));
        assert_eq!(snap.state.current_level_number, 1);
        assert!(!snap.state.is_clock_running);
        assert_eq!(snap.state.current_level_ends_at, None);
        assert_eq!(remaining(&snap, T + 5 * MIN), Ok(10 * MIN));
    }

    #[test]
    fn paused_clock_never_expires() {
        let mut snap = running_at(vec![level(20, false), level(15, false)], 0, T);
        snap.state.is_clock_running = false;
        snap.state.current_level_ends_at = None;
        snap.state.time_remaining_millis = Some(0);
        assert_eq!(advance_if_expired(&mut snap, T + MIN), Ok(false));
        assert_eq!(snap.state.current_level_number, 0);
    }

    #[test]
    fn next_break_accumulates_play_levels() {
        let levels = vec![
            level(20, false),
            level(20, false),
            level(30, false),
            level(10, true),
            level(20, false),
        ];
        let snap = running_at(levels, 0, T + 5 * MIN);
        assert_eq!(next_break_estimate(&snap, T), Ok(Some(55 * MIN)));
    }

    #[test]
    fn next_break_none_without_future_break() {
        let snap = running_at(vec![level(10, true), level(20, false)], 0, T);
        assert_eq!(next_break_estimate(&snap, T - MIN), Ok(None));
    }

    #[test]
    fn next_break_none_while_paused() {
        let levels = vec![level(20, false), level(10, true)];
        let mut snap = running_at(levels, 0, T);
        snap.state.is_clock_running = false;
        assert_eq!(next_break_estimate(&snap, T - MIN), Ok(None));
    }

    #[test]
    fn next_break_is_recomputed_from_now() {
        let snap = running_at(vec![level(20, false), level(10, true)], 0, T);
        let early = next_break_estimate(&snap, T - 2 * MIN).unwrap();
        let later = next_break_estimate(&snap, T - MIN).unwrap();
        assert_eq!(early, Some(2 * MIN));
        assert_eq!(later, Some(MIN));
    }

    #[test]
    fn tick_lands_just_past_second_boundary() {
        assert_eq!(millis_until_next_second(3_250), 255);
        assert_eq!(millis_until_next_second(3_000), 5);
        assert_eq!(millis_until_next_second(0), 0);
        assert_eq!(millis_until_next_second(-40), 0);
    }
}
