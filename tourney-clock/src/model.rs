// Model store: the single owner of the latest known snapshot.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clock::{self, ClockError};
use crate::protocol::{Snapshot, CLIENT_PROTOCOL_VERSION};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The server speaks a different protocol than the held snapshot. The only
    /// recovery is to discard all client state and start over.
    #[error("protocol version changed from {held} to {received}; client must restart")]
    Incompatible { held: i64, received: i64 },

    #[error("invalid snapshot version {version}: {message}")]
    InvalidSnapshot { version: i64, message: String },
}

/// What a replace did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Applied { version: i64 },
    /// The snapshot was not newer than the held one and was ignored.
    Stale { held: i64, received: i64 },
}

/// Holds the authoritative snapshot. Starts from the fail-safe placeholder.
#[derive(Debug, Clone)]
pub struct ModelStore {
    snapshot: Snapshot,
    /// False until the first authoritative snapshot has been accepted.
    initialized: bool,
}

impl Default for ModelStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelStore {
    pub fn new() -> Self {
        ModelStore {
            snapshot: Snapshot::placeholder(),
            initialized: false,
        }
    }

    pub fn current(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn version(&self) -> i64 {
        self.snapshot.version
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Replace the held snapshot with an authoritative one.
    ///
    /// The protocol check runs first: once initialized, any protocol change is
    /// fatal regardless of version. Then anything not strictly newer is a
    /// no-op.
    pub fn replace(&mut self, mut next: Snapshot) -> Result<ReplaceOutcome, SyncError> {
        let held_protocol = self.snapshot.protocol_version();
        let received_protocol = next.protocol_version();
        if self.initialized && held_protocol != received_protocol {
            warn!(
                held = held_protocol,
                received = received_protocol,
                "protocol version mismatch"
            );
            return Err(SyncError::Incompatible {
                held: held_protocol,
                received: received_protocol,
            });
        }

        if next.version <= self.snapshot.version {
            debug!(
                held = self.snapshot.version,
                received = next.version,
                "ignoring stale snapshot"
            );
            return Ok(ReplaceOutcome::Stale {
                held: self.snapshot.version,
                received: next.version,
            });
        }

        if next.structure.levels.is_empty() {
            return Err(SyncError::InvalidSnapshot {
                version: next.version,
                message: "structure has no levels".into(),
            });
        }

        let last = next.last_level_index();
        if next.state.current_level_number > last {
            warn!(
                level = next.state.current_level_number,
                last, "clamping out-of-range level number"
            );
            next.state.current_level_number = last;
        }

        if !self.initialized && received_protocol != CLIENT_PROTOCOL_VERSION {
            warn!(
                server = received_protocol,
                client = CLIENT_PROTOCOL_VERSION,
                "server protocol differs from the one this client was built for"
            );
        }

        let version = next.version;
        info!(version, "applied snapshot from server");
        self.snapshot = next;
        self.initialized = true;
        Ok(ReplaceOutcome::Applied { version })
    }

    /// Optimistically advance the held snapshot if its level has expired.
    /// Superseded by the next authoritative replace.
    pub fn advance_locally(&mut self, now: i64) -> Result<bool, ClockError> {
        clock::advance_if_expired(&mut self.snapshot, now)
    }
}
