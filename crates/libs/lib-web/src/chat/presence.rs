//! # Presence Table
//!
//! In-memory registry of live chat connections, shared across sessions as
//! `Arc<PresenceTable>`. Tracks which usernames are online and holds the
//! outbound channel for each connection, keyed by friend code for routing.
//!
//! Durable identity lives in the database; this table only reflects what is
//! connected right now. Restarting the server empties it.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::chat::protocol::ServerEvent;

/// Unique id assigned to each websocket connection at accept time.
pub type ConnId = Uuid;

/// Identity a connection is bound to after a successful handshake.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionBinding {
    pub username: String,
    pub code: String,
}

/// Routing handle for one live connection.
#[derive(Debug, Clone)]
struct PeerHandle {
    conn_id: ConnId,
    tx: UnboundedSender<ServerEvent>,
}

#[derive(Default)]
struct PresenceInner {
    /// username -> friend code, one entry per online user.
    online: HashMap<String, String>,
    /// friend code -> routing handle, in lockstep with `online`.
    connections: HashMap<String, PeerHandle>,
}

/// Shared presence state. All mutation happens under one mutex so the two
/// maps can never be observed out of sync.
#[derive(Default)]
pub struct PresenceTable {
    inner: Mutex<PresenceInner>,
}

impl PresenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `binding` to this connection and mark the user online.
    ///
    /// Returns `false` when the username is already online on a *different*
    /// connection. Re-binding the same identity on the same connection is
    /// idempotent and returns `true`.
    pub fn set_online(
        &self,
        conn_id: ConnId,
        binding: &ConnectionBinding,
        tx: UnboundedSender<ServerEvent>,
    ) -> bool {
        let mut inner = self.lock();

        if let Some(existing_code) = inner.online.get(&binding.username) {
            let held_by_self = inner
                .connections
                .get(existing_code)
                .is_some_and(|handle| handle.conn_id == conn_id);
            return held_by_self;
        }

        inner
            .online
            .insert(binding.username.clone(), binding.code.clone());
        inner
            .connections
            .insert(binding.code.clone(), PeerHandle { conn_id, tx });
        true
    }

    /// Remove this connection's entries, if it still owns them.
    ///
    /// Keyed by `conn_id` so a stale session closing late cannot evict a
    /// newer connection that reused the same identity. Returns `true` when
    /// an entry was actually removed.
    pub fn set_offline(&self, conn_id: ConnId, binding: &ConnectionBinding) -> bool {
        let mut inner = self.lock();

        let owned = inner
            .connections
            .get(&binding.code)
            .is_some_and(|handle| handle.conn_id == conn_id);
        if !owned {
            return false;
        }

        inner.connections.remove(&binding.code);
        inner.online.remove(&binding.username);
        true
    }

    /// Snapshot of all online usernames, sorted for stable output.
    pub fn online_usernames(&self) -> Vec<String> {
        let inner = self.lock();
        let mut users: Vec<String> = inner.online.keys().cloned().collect();
        users.sort();
        users
    }

    /// Outbound channel for the connection bound to `code`, if online.
    pub fn sender_for_code(&self, code: &str) -> Option<UnboundedSender<ServerEvent>> {
        let inner = self.lock();
        inner.connections.get(code).map(|handle| handle.tx.clone())
    }

    /// Send `event` to every live connection. Send failures are ignored;
    /// a closed peer is cleaned up by its own session teardown.
    pub fn broadcast(&self, event: &ServerEvent) {
        let senders: Vec<UnboundedSender<ServerEvent>> = {
            let inner = self.lock();
            inner
                .connections
                .values()
                .map(|handle| handle.tx.clone())
                .collect()
        };

        for tx in senders {
            let _ = tx.send(event.clone());
        }
    }

    /// Broadcast the current online-user list to everyone.
    pub fn broadcast_presence(&self) {
        let event = ServerEvent::OnlineUsers {
            users: self.online_usernames(),
        };
        self.broadcast(&event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PresenceInner> {
        // A poisoned presence mutex means a panic mid-update; the maps are
        // only inconsistent within one insert/remove pair, so recover.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[cfg(test)]
    fn is_consistent(&self) -> bool {
        let inner = self.lock();
        if inner.online.len() != inner.connections.len() {
            return false;
        }
        inner
            .online
            .iter()
            .all(|(_, code)| inner.connections.contains_key(code))
    }
}

// ========== Tests ==========
