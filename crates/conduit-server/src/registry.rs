//! Active-connection bookkeeping.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::warn;

use conduit_core::ids::ConnectionId;

/// Tracks which connection identities currently have a live socket.
///
/// Every socket gets its own token, so when a newer socket supersedes an
/// identity's entry, the superseded socket's teardown cannot clear the entry
/// its replacement now owns. Purely observational otherwise: the broker owns
/// the message streams and each pump owns its own lifecycle.
pub struct ConnectionRegistry {
    active: RwLock<HashMap<ConnectionId, u64>>,
    next_token: AtomicU64,
}

impl ConnectionRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            active: RwLock::new(HashMap::new()),
            next_token: AtomicU64::new(0),
        }
    }

    /// Record a socket for `id`, superseding any previous socket's entry.
    ///
    /// Returns the token the socket must present to [`Self::remove`].
    pub fn add(&self, id: &ConnectionId) -> u64 {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed) + 1;
        if self.active.write().insert(id.clone(), token).is_some() {
            warn!(connection_id = %id, "duplicate connection id; superseding");
        }
        token
    }

    /// Drop the entry for `id` if `token` still owns it. Returns whether the
    /// entry was removed.
    pub fn remove(&self, id: &ConnectionId, token: u64) -> bool {
        let mut active = self.active.write();
        if active.get(id) == Some(&token) {
            let _ = active.remove(id);
            true
        } else {
            false
        }
    }

    /// Whether the identity currently has a live socket.
    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.active.read().contains_key(id)
    }

    /// Number of live sockets.
    pub fn count(&self) -> usize {
        self.active.read().len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
