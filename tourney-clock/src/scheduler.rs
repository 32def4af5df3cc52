// Single-flight tick scheduling with epoch fencing.
//
// Every `request` supersedes all earlier ones. Timers already running for an
// older epoch still fire, but `next_live` drops them, so at most one tick
// chain is ever live.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::trace;

pub struct TickScheduler {
    epoch: u64,
    fired_tx: mpsc::UnboundedSender<u64>,
    fired_rx: mpsc::UnboundedReceiver<u64>,
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TickScheduler {
    pub fn new() -> Self {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        TickScheduler {
            epoch: 0,
            fired_tx,
            fired_rx,
        }
    }

    /// The latest requested epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Schedule a tick after `delay`, superseding any pending one. Returns
    /// the new epoch.
    pub fn request(&mut self, delay: Duration) -> u64 {
        self.epoch += 1;
        let epoch = self.epoch;
        let tx = self.fired_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(epoch);
        });
        epoch
    }

    /// Wait for the next tick belonging to the latest epoch. Cancel safe.
    pub async fn next_live(&mut self) -> u64 {
        loop {
            let Some(fired) = self.fired_rx.recv().await else {
                // Unreachable while we hold a sender.
                return std::future::pending().await;
            };
            if fired == self.epoch {
                return fired;
            }
            trace!(fired, live = self.epoch, "discarding stale tick");
        }
    }
}
