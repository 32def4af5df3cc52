// Wire types shared with the clock server, plus the message types that flow
// between the engine and the terminal dashboard.
//
// The server encodes its models with PascalCase field names, so every wire
// struct here renames accordingly.

use serde::{Deserialize, Serialize};

use crate::display::DisplaySlots;

/// Protocol version this client was built against. Used only until the first
/// authoritative snapshot arrives; after that the held snapshot's value wins.
pub const CLIENT_PROTOCOL_VERSION: i64 = 13;

/// Version carried by the bootstrap placeholder. Lower than anything the
/// server assigns, so the first listen request is answered immediately.
pub const PLACEHOLDER_VERSION: i64 = -1;

// ---------------------------------------------------------------------------
// Snapshot (authoritative model)
// ---------------------------------------------------------------------------

/// The full authoritative model of tournament and clock state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Snapshot {
    #[serde(rename = "EventID", default)]
    pub event_id: i64,
    pub version: i64,
    #[serde(default)]
    pub event_name: String,
    /// Id of the footer text batch to display. Zero means none.
    #[serde(rename = "FooterPlugsID", default)]
    pub footer_plugs_id: i64,
    pub structure: Structure,
    pub state: State,
    #[serde(default)]
    pub transients: Option<Transients>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Structure {
    pub levels: Vec<Level>,
    #[serde(default)]
    pub chips_per_buy_in: i64,
    #[serde(default)]
    pub chips_per_add_on: i64,
}

/// One ordered segment of the event: a play period or a break.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Level {
    #[serde(default)]
    pub banner: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duration_minutes: i64,
    #[serde(default)]
    pub is_break: bool,
    #[serde(default)]
    pub auto_pause: bool,
}

impl Level {
    pub fn duration_millis(&self) -> i64 {
        self.duration_minutes * 60_000
    }
}

/// Mutable tournament state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct State {
    pub current_level_number: usize,
    pub is_clock_running: bool,
    /// Absolute end of the current level in unix millis; present while timed.
    #[serde(default)]
    pub current_level_ends_at: Option<i64>,
    /// Remaining time in the current level; present while paused.
    #[serde(default)]
    pub time_remaining_millis: Option<i64>,
    #[serde(default)]
    pub sound_muted: bool,
    #[serde(default)]
    pub current_players: i64,
    #[serde(default)]
    pub buy_ins: i64,
    #[serde(default)]
    pub add_ons: i64,
    #[serde(default)]
    pub prize_pool: String,
}

/// Display fields derived by the server on every authoritative update.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Transients {
    #[serde(default)]
    pub protocol_version: i64,
    #[serde(default)]
    pub total_chips: i64,
    #[serde(default)]
    pub average_chips: i64,
}

impl Snapshot {
    /// Fail-safe model shown before the first server update: a single break
    /// level, clock stopped, nothing that could be mistaken for real data.
    pub fn placeholder() -> Self {
        Snapshot {
            event_id: 0,
            version: PLACEHOLDER_VERSION,
            event_name: String::new(),
            footer_plugs_id: 0,
            structure: Structure {
                levels: vec![Level {
                    banner: String::new(),
                    description: "LOADING...".to_string(),
                    duration_minutes: 0,
                    is_break: true,
                    auto_pause: false,
                }],
                chips_per_buy_in: 0,
                chips_per_add_on: 0,
            },
            state: State {
                time_remaining_millis: Some(0),
                ..State::default()
            },
            transients: Some(Transients {
                protocol_version: CLIENT_PROTOCOL_VERSION,
                ..Transients::default()
            }),
        }
    }

    pub fn protocol_version(&self) -> i64 {
        self.transients
            .as_ref()
            .map(|t| t.protocol_version)
            .unwrap_or_default()
    }

    pub fn current_level(&self) -> Option<&Level> {
        self.structure.levels.get(self.state.current_level_number)
    }

    pub fn next_level(&self) -> Option<&Level> {
        self.structure
            .levels
            .get(self.state.current_level_number + 1)
    }

    pub fn last_level_index(&self) -> usize {
        self.structure.levels.len().saturating_sub(1)
    }

    /// The footer batch this snapshot asks for, if any.
    pub fn content_id(&self) -> Option<i64> {
        (self.footer_plugs_id != 0).then_some(self.footer_plugs_id)
    }
}

// ---------------------------------------------------------------------------
// Requests and secondary content
// ---------------------------------------------------------------------------

/// Body of the long-poll change-notification request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListenRequest {
    #[serde(rename = "TournamentID")]
    pub tournament_id: i64,
    pub version: i64,
    pub protocol_version: i64,
}

/// A batch of rotating footer texts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContentBatch {
    #[serde(rename = "FooterPlugsID")]
    pub id: i64,
    #[serde(default)]
    pub text_plugs: Vec<String>,
}

/// Server-side mutations the dashboard can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    StartClock,
    StopClock,
    PreviousLevel,
    SkipLevel,
    PlusMinute,
    MinusMinute,
    AddPlayer,
    RemovePlayer,
    AddBuyIn,
    RemoveBuyIn,
    AddAddOn,
    RemoveAddOn,
    MuteSound,
    UnmuteSound,
}

impl Command {
    /// Level and time changes are only honored while the clock controls are
    /// unlocked and the clock is paused.
    pub fn requires_unlocked_pause(self) -> bool {
        matches!(
            self,
            Command::PreviousLevel
                | Command::SkipLevel
                | Command::PlusMinute
                | Command::MinusMinute
        )
    }
}

/// Body of the fire-and-forget command request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommandRequest {
    pub event: Command,
    #[serde(rename = "TournamentID")]
    pub tournament_id: i64,
    pub shift: bool,
}

// ---------------------------------------------------------------------------
// Engine <-> dashboard messages
// ---------------------------------------------------------------------------

/// Updates pushed from the engine to the render sink.
#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    /// Freshly computed values for every named display slot.
    Slots(Box<DisplaySlots>),
    /// Footer line to show.
    Footer(String),
    /// Clock-controls lock state changed.
    ControlsLocked(bool),
    /// The engine hit a fatal incompatibility and is restarting from scratch.
    Restarting { reason: String },
}

/// Commands produced by keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    /// Start or stop the clock depending on the held running flag.
    TogglePause,
    /// Mute or unmute depending on the held flag.
    ToggleMute,
    /// Forward a server command; `shift` asks the server for the x10 variant.
    Send { command: Command, shift: bool },
    NextFooter,
    ToggleControlsLock,
    Quit,
}
