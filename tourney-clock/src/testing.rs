// In-memory transport and snapshot builders shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{oneshot, Notify};

use crate::protocol::{
    CommandRequest, ContentBatch, Level, ListenRequest, Snapshot, State, Structure, Transients,
    CLIENT_PROTOCOL_VERSION,
};
use crate::transport::{Transport, TransportError};

/// Scripted transport. Each `listen` call consumes the next scripted reply; a
/// call with nothing scripted (or whose sender was dropped) never answers.
#[derive(Default)]
pub(crate) struct FakeTransport {
    listen_replies: Mutex<VecDeque<oneshot::Receiver<Option<Snapshot>>>>,
    listen_requests: Mutex<Vec<ListenRequest>>,
    live_listens: AtomicUsize,
    peak_listens: AtomicUsize,
    content: Mutex<HashMap<i64, Vec<String>>>,
    content_gate: Mutex<Option<Arc<Notify>>>,
    content_calls: AtomicUsize,
    commands: Mutex<Vec<CommandRequest>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a reply for the next unanswered `listen` call.
    pub(crate) fn script_listen(&self) -> oneshot::Sender<Option<Snapshot>> {
        let (tx, rx) = oneshot::channel();
        self.listen_replies.lock().unwrap().push_back(rx);
        tx
    }

    pub(crate) fn listen_requests(&self) -> Vec<ListenRequest> {
        self.listen_requests.lock().unwrap().clone()
    }

    /// Listen calls currently running.
    pub(crate) fn live_listens(&self) -> usize {
        self.live_listens.load(Ordering::SeqCst)
    }

    /// Most listen calls ever running at once.
    pub(crate) fn peak_listens(&self) -> usize {
        self.peak_listens.load(Ordering::SeqCst)
    }

    pub(crate) fn set_content(&self, id: i64, texts: &[&str]) {
        self.content
            .lock()
            .unwrap()
            .insert(id, texts.iter().map(|s| s.to_string()).collect());
    }

    /// Hold every content fetch until the returned `Notify` is signalled.
    pub(crate) fn gate_content(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.content_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub(crate) fn content_calls(&self) -> usize {
        self.content_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn commands(&self) -> Vec<CommandRequest> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn listen(&self, request: ListenRequest) -> Result<Option<Snapshot>, TransportError> {
        self.listen_requests.lock().unwrap().push(request);
        let live = self.live_listens.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_listens.fetch_max(live, Ordering::SeqCst);
        let _live = LiveGuard(&self.live_listens);

        let reply = self.listen_replies.lock().unwrap().pop_front();
        match reply {
            Some(rx) => match rx.await {
                Ok(snapshot) => Ok(snapshot),
                Err(_) => std::future::pending().await,
            },
            None => std::future::pending().await,
        }
    }

    async fn fetch_content(&self, id: i64) -> Result<ContentBatch, TransportError> {
        self.content_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.content_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let texts = self.content.lock().unwrap().get(&id).cloned();
        match texts {
            Some(text_plugs) => Ok(ContentBatch { id, text_plugs }),
            None => Err(TransportError::Status {
                url: format!("/api/footerPlugs/{id}"),
                status: 404,
            }),
        }
    }

    async fn send_command(&self, request: CommandRequest) -> Result<(), TransportError> {
        self.commands.lock().unwrap().push(request);
        Ok(())
    }
}

/// Counts a listen call as finished however its future ends, including when
/// the task running it is aborted.
struct LiveGuard<'a>(&'a AtomicUsize);

impl Drop for LiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Snapshot builders
// ---------------------------------------------------------------------------

pub(crate) fn play_level(description: &str, minutes: i64) -> Level {
    Level {
        banner: String::new(),
        description: description.to_string(),
        duration_minutes: minutes,
        is_break: false,
        auto_pause: false,
    }
}

pub(crate) fn break_level(description: &str, minutes: i64) -> Level {
    Level {
        is_break: true,
        ..play_level(description, minutes)
    }
}

/// A paused snapshot at `version` with the given levels.
pub(crate) fn snapshot_with(version: i64, levels: Vec<Level>) -> Snapshot {
    let remaining = levels.first().map(Level::duration_millis);
    Snapshot {
        event_id: 1,
        version,
        event_name: "Tuesday Deepstack".into(),
        footer_plugs_id: 0,
        structure: Structure {
            levels,
            ..Structure::default()
        },
        state: State {
            time_remaining_millis: remaining,
            ..State::default()
        },
        transients: Some(Transients {
            protocol_version: CLIENT_PROTOCOL_VERSION,
            ..Transients::default()
        }),
    }
}

pub(crate) fn snapshot(version: i64) -> Snapshot {
    snapshot_with(
        version,
        vec![
            play_level("25/50", 20),
            play_level("50/100", 20),
            break_level("Color up", 10),
        ],
    )
}
