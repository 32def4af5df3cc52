// Footer content: fetching the text batch a snapshot points at, and rotating
// through it on the dashboard.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::protocol::ContentBatch;
use crate::transport::{Transport, TransportError};

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ContentOutcome {
    Loaded { id: i64, texts: Vec<String> },
    Failed { id: i64, reason: String },
}

struct Fetch {
    id: i64,
    handle: JoinHandle<Result<ContentBatch, TransportError>>,
}

/// Fetches footer batches by id, one request at a time.
pub struct ContentFetcher {
    transport: Arc<dyn Transport>,
    timeout: Duration,
    loaded_id: Option<i64>,
    in_flight: Option<Fetch>,
}

impl ContentFetcher {
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        ContentFetcher {
            transport,
            timeout,
            loaded_id: None,
            in_flight: None,
        }
    }

    /// Whether `id` names a batch other than the one already loaded.
    pub fn wants(&self, id: Option<i64>) -> bool {
        id.is_some() && id != self.loaded_id
    }

    pub fn loaded_id(&self) -> Option<i64> {
        self.loaded_id
    }

    /// Wait for batch `id`. An in-flight fetch of the same id is reused; one
    /// for a different id is aborted.
    pub fn wait(&mut self, id: i64) -> impl Future<Output = ContentOutcome> + Send + '_ {
        if let Some(fetch) = &self.in_flight {
            if fetch.id != id {
                debug!(old = fetch.id, new = id, "dropping fetch for replaced footer batch");
                self.abort();
            }
        }
        if self.in_flight.is_none() {
            self.start(id);
        }

        async move {
            let Some(fetch) = self.in_flight.as_mut() else {
                return ContentOutcome::Failed {
                    id,
                    reason: "fetch missing".into(),
                };
            };
            let joined = (&mut fetch.handle).await;
            self.in_flight = None;
            match joined {
                Ok(Ok(batch)) => {
                    info!(id, count = batch.text_plugs.len(), "loaded footer batch");
                    self.loaded_id = Some(id);
                    ContentOutcome::Loaded {
                        id,
                        texts: batch.text_plugs.iter().map(|t| sanitize(t)).collect(),
                    }
                }
                Ok(Err(e)) => {
                    warn!(id, "footer fetch failed: {e}");
                    ContentOutcome::Failed {
                        id,
                        reason: e.to_string(),
                    }
                }
                Err(e) => ContentOutcome::Failed {
                    id,
                    reason: format!("fetch task ended: {e}"),
                },
            }
        }
    }

    pub fn abort(&mut self) {
        if let Some(fetch) = self.in_flight.take() {
            fetch.handle.abort();
        }
    }

    /// Forget the loaded batch and drop any fetch in flight, so the next id
    /// named is fetched again even if it matches the old one.
    pub fn reset(&mut self) {
        self.abort();
        self.loaded_id = None;
    }

    fn start(&mut self, id: i64) {
        let transport = self.transport.clone();
        let timeout = self.timeout;
        debug!(id, "fetching footer batch");
        let handle = tokio::spawn(async move {
            tokio::time::timeout(timeout, transport.fetch_content(id))
                .await
                .unwrap_or(Err(TransportError::TimedOut {
                    after_ms: timeout.as_millis() as u64,
                }))
        });
        self.in_flight = Some(Fetch { id, handle });
    }
}

impl Drop for ContentFetcher {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Strip the markup footer texts are authored with for the web display.
pub fn sanitize(text: &str) -> String {
    let mut out = text.to_string();
    for tag in ["<nobr>", "</nobr>", "<NOBR>", "</NOBR>", "<br>", "<br/>", "<br />"] {
        out = out.replace(tag, if tag.starts_with("<br") { " " } else { "" });
    }
    out.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

// ---------------------------------------------------------------------------
// Rotator
// ---------------------------------------------------------------------------

/// Cycles through a shuffled batch of footer texts.
#[derive(Debug, Default)]
pub struct FooterRotator {
    texts: Vec<String>,
    position: usize,
}

impl FooterRotator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the batch. Returns the first text to show.
    pub fn set_texts(&mut self, mut texts: Vec<String>) -> Option<&str> {
        texts.retain(|t| !t.is_empty());
        texts.shuffle(&mut rand::thread_rng());
        self.texts = texts;
        self.position = 0;
        self.current()
    }

    pub fn clear(&mut self) {
        self.texts.clear();
        self.position = 0;
    }

    pub fn current(&self) -> Option<&str> {
        self.texts.get(self.position).map(String::as_str)
    }

    /// Step to the next text. Each pass through the batch gets a fresh order,
    /// never starting with the text that ended the previous pass.
    pub fn advance(&mut self) -> Option<&str> {
        if self.texts.is_empty() {
            return None;
        }
        self.position += 1;
        if self.position == self.texts.len() {
            let last = self.texts.len() - 1;
            let ended = self.texts[last].clone();
            self.texts.shuffle(&mut rand::thread_rng());
            if last > 0 && self.texts[0] == ended {
                self.texts.swap(0, last);
            }
            self.position = 0;
        }
        self.current()
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}
