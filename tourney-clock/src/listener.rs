// Long-poll listener: keeps at most one "wait for a newer snapshot" request
// open against the server.
//
// A session is bound to the version it was opened with. When the engine asks
// to wait on a different version the old request is aborted and its result is
// never seen. The session task owns the request, so dropping the future
// returned by `wait` (e.g. when a race is interrupted) leaves the request
// running for the next cycle to pick up.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::protocol::{ListenRequest, Snapshot};
use crate::transport::Transport;

/// How a listen session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ListenOutcome {
    /// The server answered with a newer snapshot.
    Changed(Snapshot),
    /// Nothing changed before the session expired.
    TimedOut,
    /// The request failed; retried on the next cycle.
    Failed(String),
}

struct Session {
    version: i64,
    protocol_version: i64,
    handle: JoinHandle<ListenOutcome>,
}

pub struct LongPollListener {
    transport: Arc<dyn Transport>,
    tournament_id: i64,
    timeout: Duration,
    jitter: Duration,
    session: Option<Session>,
}

impl LongPollListener {
    pub fn new(
        transport: Arc<dyn Transport>,
        tournament_id: i64,
        timeout: Duration,
        jitter: Duration,
    ) -> Self {
        LongPollListener {
            transport,
            tournament_id,
            timeout,
            jitter,
            session: None,
        }
    }

    /// Version of the open session, if any.
    pub fn open_version(&self) -> Option<i64> {
        self.session.as_ref().map(|s| s.version)
    }

    /// Wait on the session for `version`, opening one if none is open or the
    /// open one was started for a different version.
    pub fn wait(
        &mut self,
        version: i64,
        protocol_version: i64,
    ) -> impl Future<Output = ListenOutcome> + Send + '_ {
        let stale = self
            .session
            .as_ref()
            .is_some_and(|s| s.version != version || s.protocol_version != protocol_version);
        if stale {
            debug!(
                open = self.open_version(),
                held = version,
                "superseding listen session"
            );
            self.abort();
        }
        if self.session.is_none() {
            self.open(version, protocol_version);
        }

        async move {
            let Some(session) = self.session.as_mut() else {
                return ListenOutcome::Failed("listen session missing".into());
            };
            let joined = (&mut session.handle).await;
            self.session = None;
            match joined {
                Ok(outcome) => outcome,
                Err(e) => ListenOutcome::Failed(format!("listen task ended: {e}")),
            }
        }
    }

    /// Abort the open session. Safe to call when nothing is open.
    pub fn abort(&mut self) {
        if let Some(session) = self.session.take() {
            session.handle.abort();
        }
    }

    fn open(&mut self, version: i64, protocol_version: i64) {
        let deadline = self.timeout + self.jitter_sample();
        let request = ListenRequest {
            tournament_id: self.tournament_id,
            version,
            protocol_version,
        };
        let transport = self.transport.clone();
        debug!(version, ?deadline, "opening listen session");

        let handle = tokio::spawn(async move {
            match tokio::time::timeout(deadline, transport.listen(request)).await {
                Ok(Ok(Some(snapshot))) => ListenOutcome::Changed(snapshot),
                Ok(Ok(None)) => ListenOutcome::TimedOut,
                Ok(Err(e)) => {
                    warn!("listen request failed: {e}");
                    ListenOutcome::Failed(e.to_string())
                }
                Err(_) => ListenOutcome::TimedOut,
            }
        });

        self.session = Some(Session {
            version,
            protocol_version,
            handle,
        });
    }

    fn jitter_sample(&self) -> Duration {
        let max = self.jitter.as_millis() as u64;
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max))
    }
}

impl Drop for LongPollListener {
    fn drop(&mut self) {
        self.abort();
    }
}
