//! Shared server state
//!
//! Every request goes through one [`ServerState`]. Each call takes the lock
//! once, so a reset by a new offer can never interleave with a candidate
//! append or a poll.
//!
//! Hosts that spin up a fresh instance per request (`wasmtime serve`) lose
//! memory between calls. For those, a snapshot file can be configured: the
//! store is reloaded from it and written back inside the same lock.
//!
//! Snapshots are written to a temporary file next to the target and renamed
//! into place, so a reader sees either the previous or the next state, never
//! a partial one. The lock does not span instances: two instances that load
//! the same snapshot concurrently each save their own result, and the last
//! rename wins. A candidate can be lost that way; the peer's next trickle or
//! a fresh offer recovers.

use crate::config::Config;
use crate::error::SignalingError;
use crate::store::{Outcome, SignalingStore};
use parking_lot::Mutex;
use rendezvous_protocol::{Role, Signal, SignalingResponse};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Handle to the single negotiation; cheap to clone
#[derive(Default, Clone)]
pub struct ServerState {
    store: Arc<Mutex<SignalingStore>>,
    state_file: Option<Arc<PathBuf>>,
}

impl ServerState {
    /// Create a purely in-memory state handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a state handle backed by a snapshot file
    pub fn with_state_file(path: impl Into<PathBuf>) -> Self {
        Self {
            store: Arc::default(),
            state_file: Some(Arc::new(path.into())),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        match &config.state_file {
            Some(path) => Self::with_state_file(path.clone()),
            None => Self::new(),
        }
    }

    /// Apply a posted signal to the negotiation
    pub fn apply(&self, signal: &Signal) -> Vec<Outcome> {
        self.with_store(true, |store| store.apply(signal))
    }

    /// Serve a poll, using the declared role when there is one
    pub fn resolve(&self, role: Option<Role>) -> SignalingResponse {
        self.with_store(false, |store| match role {
            Some(role) => store.resolve_for(role),
            None => store.resolve(),
        })
    }

    /// Copy of the current negotiation state
    pub fn snapshot(&self) -> SignalingStore {
        self.with_store(false, |store| store.clone())
    }

    fn with_store<R>(&self, mutates: bool, f: impl FnOnce(&mut SignalingStore) -> R) -> R {
        let mut store = self.store.lock();

        if let Some(path) = &self.state_file {
            *store = load_snapshot(path);
        }

        let result = f(&mut store);

        if mutates {
            if let Some(path) = &self.state_file {
                if let Err(e) = save_snapshot(path, &store) {
                    warn!(path = %path.display(), error = %e, "failed to save state snapshot");
                }
            }
        }

        result
    }
}

/// Read the snapshot, or start empty if it is missing or unreadable
fn load_snapshot(path: &Path) -> SignalingStore {
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "corrupt state snapshot, starting empty");
            SignalingStore::default()
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no state snapshot yet");
            SignalingStore::default()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read state snapshot, starting empty");
            SignalingStore::default()
        }
    }
}

/// Atomically replace the snapshot
fn save_snapshot(path: &Path, store: &SignalingStore) -> Result<(), SignalingError> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let json = serde_json::to_vec(store)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&json)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
