// Sync engine: keeps the held snapshot in step with the server and pushes
// display updates to the dashboard.
//
// One task owns everything. Each tick cycle races the long-poll listener, the
// clock's next-second wait (while running) and a footer fetch (when the
// snapshot names a batch not yet loaded). Whatever settles first is applied,
// the display is recomposed, and the next cycle is requested. Keyboard
// commands and footer rotation interrupt a cycle; the listener and fetch
// requests live in their components and are picked up again by the next one.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::clock::{self, WallClock};
use crate::config::Config;
use crate::content::{ContentFetcher, ContentOutcome, FooterRotator};
use crate::display;
use crate::listener::{ListenOutcome, LongPollListener};
use crate::model::{ModelStore, ReplaceOutcome, SyncError};
use crate::protocol::{Command, CommandRequest, UiUpdate, UserCommand};
use crate::race::{self, Settled};
use crate::scheduler::TickScheduler;
use crate::transport::Transport;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Delay before the next cycle after a failed listen or footer fetch, so an
/// unreachable server is not polled every few milliseconds.
pub const FAILURE_BACKOFF: Duration = Duration::from_secs(1);

pub const LOCKED_FOOTER: &str = "level/clock controls re-locked";
pub const UNLOCKED_FOOTER: &str = "level/clock controls available when paused";

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// What woke the engine.
enum Wake {
    Tick,
    Settled(Option<Settled>),
    Command(Option<UserCommand>),
    RotateFooter,
}

pub struct Engine {
    tournament_id: i64,
    tick_delay: Duration,
    footer_interval: Duration,
    store: ModelStore,
    listener: LongPollListener,
    content: ContentFetcher,
    rotator: FooterRotator,
    scheduler: TickScheduler,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn WallClock>,
    controls_locked: bool,
    ui_tx: mpsc::Sender<UiUpdate>,
}

impl Engine {
    pub fn new(
        config: &Config,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn WallClock>,
        ui_tx: mpsc::Sender<UiUpdate>,
    ) -> Self {
        let sync = &config.sync;
        Engine {
            tournament_id: config.server.tournament_id,
            tick_delay: sync.tick_delay(),
            footer_interval: sync.footer_interval(),
            store: ModelStore::new(),
            listener: LongPollListener::new(
                transport.clone(),
                config.server.tournament_id,
                sync.listen_timeout(),
                sync.listen_jitter(),
            ),
            content: ContentFetcher::new(transport.clone(), sync.content_timeout()),
            rotator: FooterRotator::new(),
            scheduler: TickScheduler::new(),
            transport,
            clock,
            controls_locked: true,
            ui_tx,
        }
    }

    /// Run until the user quits (`Ok`) or the server's protocol changes
    /// underneath us (`Err(SyncError::Incompatible)`), in which case the
    /// caller should throw this engine away and start a fresh one.
    pub async fn run(mut self, cmd_rx: &mut mpsc::Receiver<UserCommand>) -> Result<(), SyncError> {
        info!(tournament = self.tournament_id, "sync engine started");

        let mut footer_timer = footer_interval(self.footer_interval);
        self.send(UiUpdate::ControlsLocked(self.controls_locked)).await;
        self.render().await;
        self.scheduler.request(Duration::ZERO);

        loop {
            let rotating = self.controls_locked && self.rotator.len() > 1;

            let wake = tokio::select! {
                _ = self.scheduler.next_live() => Wake::Tick,
                cmd = cmd_rx.recv() => Wake::Command(cmd),
                _ = footer_timer.tick(), if rotating => Wake::RotateFooter,
            };

            let wake = match wake {
                Wake::Tick => {
                    let waits = cycle_waits(
                        &mut self.listener,
                        &mut self.content,
                        &self.store,
                        self.clock.as_ref(),
                    );
                    tokio::select! {
                        settled = race::first_settled(waits) => Wake::Settled(settled),
                        cmd = cmd_rx.recv() => Wake::Command(cmd),
                        _ = footer_timer.tick(), if rotating => Wake::RotateFooter,
                    }
                }
                other => other,
            };

            match wake {
                Wake::Settled(settled) => {
                    let delay = self.apply(settled).await?;
                    self.render().await;
                    self.scheduler.request(delay);
                }
                Wake::Command(None) => {
                    info!("command channel closed, stopping sync engine");
                    return Ok(());
                }
                Wake::Command(Some(UserCommand::Quit)) => {
                    info!("quit requested");
                    return Ok(());
                }
                Wake::Command(Some(cmd)) => {
                    self.handle_command(cmd, &mut footer_timer).await;
                    self.scheduler.request(Duration::ZERO);
                }
                Wake::RotateFooter => {
                    if let Some(text) = self.rotator.advance().map(str::to_string) {
                        self.send(UiUpdate::Footer(text)).await;
                    }
                    self.scheduler.request(Duration::ZERO);
                }
                Wake::Tick => {}
            }
        }
    }

    /// Apply the winner of a cycle's race. Returns the delay before the next
    /// cycle.
    async fn apply(&mut self, settled: Option<Settled>) -> Result<Duration, SyncError> {
        let Some(settled) = settled else {
            return Ok(self.tick_delay);
        };

        match settled {
            Settled::Listen(ListenOutcome::Changed(snapshot)) => {
                match self.store.replace(snapshot) {
                    Ok(ReplaceOutcome::Applied { .. }) => {
                        if self.store.current().content_id().is_none() {
                            self.content.reset();
                            if !self.rotator.is_empty() {
                                debug!("snapshot no longer names a footer batch");
                                self.rotator.clear();
                                self.send(UiUpdate::Footer(String::new())).await;
                            }
                        }
                    }
                    Ok(ReplaceOutcome::Stale { .. }) => {}
                    Err(e @ SyncError::Incompatible { .. }) => {
                        error!("{e}");
                        return Err(e);
                    }
                    Err(e) => warn!("discarding snapshot: {e}"),
                }
            }
            Settled::Listen(ListenOutcome::TimedOut) => {
                debug!(version = self.store.version(), "listen session expired");
            }
            Settled::Listen(ListenOutcome::Failed(reason)) => {
                warn!("listen failed, retrying: {reason}");
                return Ok(FAILURE_BACKOFF.max(self.tick_delay));
            }
            Settled::ClockTick => {
                let now = self.clock.now_millis();
                match self.store.advance_locally(now) {
                    Ok(true) => info!(
                        level = self.store.current().state.current_level_number,
                        "level expired, advanced locally"
                    ),
                    Ok(false) => {}
                    Err(e) => error!("cannot advance clock: {e}"),
                }
            }
            Settled::Content(ContentOutcome::Loaded { id, texts }) => {
                if Some(id) == self.store.current().content_id() {
                    let first = self.rotator.set_texts(texts).map(str::to_string);
                    if self.controls_locked {
                        if let Some(text) = first {
                            self.send(UiUpdate::Footer(text)).await;
                        }
                    }
                }
            }
            Settled::Content(ContentOutcome::Failed { id, reason }) => {
                debug!(id, "footer batch not loaded: {reason}");
                return Ok(FAILURE_BACKOFF.max(self.tick_delay));
            }
        }
        Ok(self.tick_delay)
    }

    async fn handle_command(&mut self, cmd: UserCommand, footer_timer: &mut Interval) {
        let state = &self.store.current().state;
        match cmd {
            UserCommand::TogglePause => {
                let command = if state.is_clock_running {
                    Command::StopClock
                } else {
                    Command::StartClock
                };
                self.dispatch(command, false);
            }
            UserCommand::ToggleMute => {
                let command = if state.sound_muted {
                    Command::UnmuteSound
                } else {
                    Command::MuteSound
                };
                self.dispatch(command, false);
            }
            UserCommand::Send { command, shift } => {
                if command.requires_unlocked_pause()
                    && (self.controls_locked || state.is_clock_running)
                {
                    info!(
                        ?command,
                        locked = self.controls_locked,
                        running = state.is_clock_running,
                        "ignoring level/time command"
                    );
                    return;
                }
                self.dispatch(command, shift);
            }
            UserCommand::NextFooter => {
                if !self.controls_locked {
                    return;
                }
                footer_timer.reset();
                if let Some(text) = self.rotator.advance().map(str::to_string) {
                    self.send(UiUpdate::Footer(text)).await;
                }
            }
            UserCommand::ToggleControlsLock => {
                self.controls_locked = !self.controls_locked;
                info!(locked = self.controls_locked, "clock controls lock toggled");
                let footer = if self.controls_locked {
                    footer_timer.reset();
                    LOCKED_FOOTER
                } else {
                    UNLOCKED_FOOTER
                };
                self.send(UiUpdate::ControlsLocked(self.controls_locked)).await;
                self.send(UiUpdate::Footer(footer.to_string())).await;
            }
            UserCommand::Quit => {}
        }
    }

    /// Fire a command at the server without waiting for it. The effect
    /// arrives through the listener like any other change.
    fn dispatch(&self, command: Command, shift: bool) {
        let request = CommandRequest {
            event: command,
            tournament_id: self.tournament_id,
            shift,
        };
        let transport = self.transport.clone();
        info!(?command, shift, "sending command");
        tokio::spawn(async move {
            if let Err(e) = transport.send_command(request).await {
                warn!(?command, "command failed: {e}");
            }
        });
    }

    async fn render(&self) {
        let slots = display::compose(self.store.current(), self.clock.now_millis());
        self.send(UiUpdate::Slots(Box::new(slots))).await;
    }

    async fn send(&self, update: UiUpdate) {
        let _ = self.ui_tx.send(update).await;
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Assemble the waits for one cycle.
fn cycle_waits<'a>(
    listener: &'a mut LongPollListener,
    content: &'a mut ContentFetcher,
    store: &ModelStore,
    clock: &dyn WallClock,
) -> Vec<BoxFuture<'a, Settled>> {
    let snapshot = store.current();
    let mut waits = vec![listener
        .wait(snapshot.version, snapshot.protocol_version())
        .map(Settled::Listen)
        .boxed()];

    if snapshot.state.is_clock_running {
        match clock::remaining(snapshot, clock.now_millis()) {
            Ok(ms) => {
                let delay = Duration::from_millis(clock::millis_until_next_second(ms));
                waits.push(
                    async move {
                        tokio::time::sleep(delay).await;
                        Settled::ClockTick
                    }
                    .boxed(),
                );
            }
            Err(e) => error!("running clock without a time anchor: {e}"),
        }
    }

    let content_id = snapshot.content_id();
    if let Some(id) = content_id.filter(|_| content.wants(content_id)) {
        waits.push(content.wait(id).map(Settled::Content).boxed());
    }

    waits
}

fn footer_interval(period: Duration) -> Interval {
    let mut timer = tokio::time::interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}
