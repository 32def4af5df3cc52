// Tournament clock entry point.
//
// Startup sequence:
// 1. Load config (first CLI argument overrides the tournament id)
// 2. Initialize tracing (log to file, not terminal)
// 3. Create mpsc channels and the HTTP transport
// 4. Spawn the sync engine task, restarting it on protocol changes
// 5. Run the TUI until the user quits
// 6. Cleanup on exit

use std::sync::Arc;

use tourney_clock::app::Engine;
use tourney_clock::clock::{SystemClock, WallClock};
use tourney_clock::config::{self, LoggingConfig};
use tourney_clock::model::SyncError;
use tourney_clock::protocol::UiUpdate;
use tourney_clock::transport::{HttpTransport, Transport};
use tourney_clock::tui;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let mut config = config::load_config().context("failed to load configuration")?;
    let arg = std::env::args().nth(1);
    config::apply_tournament_override(&mut config, arg.as_deref())
        .context("invalid tournament id argument")?;

    // 2. Initialize tracing
    init_tracing(&config.logging)?;
    info!(
        "Tournament clock starting: server={}, tournament={}",
        config.server.base_url, config.server.tournament_id
    );

    // 3. Channels and transport
    let (cmd_tx, mut cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::from_config(&config));
    let clock: Arc<dyn WallClock> = Arc::new(SystemClock);

    // 4. Sync engine. A protocol change throws away every piece of engine
    //    state and starts over from the placeholder.
    let engine_handle = tokio::spawn(async move {
        loop {
            let engine = Engine::new(&config, transport.clone(), clock.clone(), ui_tx.clone());
            match engine.run(&mut cmd_rx).await {
                Ok(()) => break,
                Err(e @ SyncError::Incompatible { .. }) => {
                    warn!("restarting sync engine: {e}");
                    let _ = ui_tx
                        .send(UiUpdate::Restarting {
                            reason: e.to_string(),
                        })
                        .await;
                }
                Err(e) => {
                    error!("sync engine stopped: {e}");
                    break;
                }
            }
        }
    });

    // 5. Run the TUI (blocks until the user quits)
    if let Err(e) = tui::run(ui_rx, cmd_tx).await {
        error!("TUI error: {:#}", e);
    }

    // 6. Cleanup: the engine sees the quit command or the closed channel
    let _ = tokio::time::timeout(std::time::Duration::from_secs(2), engine_handle).await;

    info!("Tournament clock shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by the TUI).
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join(&logging.dir);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let log_file = std::fs::File::create(log_dir.join("tourney-clock.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter)),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
