//! Connection registry - the shared map of live connections by user.
//!
//! The registry is the only state shared between connection tasks and the
//! liveness monitor. Every operation is an in-memory map mutation guarded
//! by a single `RwLock`; none performs I/O, so the lock is never held
//! across a socket write.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, RwLock};

use crate::domain::foundation::{ConnectionId, Timestamp, UserId};
use crate::ports::{CloseReason, FrameSink, SinkError};

/// One live physical connection bound to an authenticated user.
///
/// The transport task that created the handle owns its lifetime; the
/// registry holds a non-owning lookup entry. The last-activity clock is
/// bumped on every inbound frame (the sole heartbeat mechanism) and read
/// by the liveness monitor.
pub struct ConnectionHandle {
    id: ConnectionId,
    user: UserId,
    last_activity_ms: AtomicI64,
    closed: watch::Sender<bool>,
    sink: Box<dyn FrameSink>,
}

impl ConnectionHandle {
    /// Creates an open handle with the activity clock set to now.
    pub fn new(user: UserId, sink: Box<dyn FrameSink>) -> Arc<Self> {
        let (closed, _) = watch::channel(false);
        Arc::new(Self {
            id: ConnectionId::new(),
            user,
            last_activity_ms: AtomicI64::new(Timestamp::now().unix_millis()),
            closed,
            sink,
        })
    }

    /// This connection's unique id.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The user this connection represents.
    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// Records inbound traffic.
    pub fn touch(&self) {
        self.last_activity_ms
            .store(Timestamp::now().unix_millis(), Ordering::Relaxed);
    }

    /// Milliseconds since the last inbound frame, measured against `now_ms`.
    pub fn idle_millis(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.last_activity_ms.load(Ordering::Relaxed))
    }

    /// Whether the connection is still open.
    pub fn is_open(&self) -> bool {
        !*self.closed.borrow()
    }

    /// Marks the handle closed without touching the sink.
    ///
    /// Returns false when the handle was already closed, which makes every
    /// close path idempotent.
    pub fn mark_closed(&self) -> bool {
        !self.closed.send_replace(true)
    }

    /// Resolves once the handle has been closed from any path.
    ///
    /// The transport's read loop selects on this so a forced eviction
    /// unblocks a pending read immediately.
    pub async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Writes a text frame to the peer.
    ///
    /// Rejected once the handle is closed, so a message racing with an
    /// eviction is dropped instead of queued onto a dead socket.
    pub fn send_text(&self, text: String) -> Result<(), SinkError> {
        if !self.is_open() {
            return Err(SinkError::Closed);
        }
        self.sink.send_text(text)
    }

    /// Closes the connection; the transport releases the socket on its
    /// next poll. Subsequent sends fail with [`SinkError::Closed`].
    /// Idempotent: a second close is a no-op.
    pub fn close(&self, reason: CloseReason) -> Result<(), SinkError> {
        if !self.mark_closed() {
            return Ok(());
        }
        self.sink.close(reason)
    }

    /// Backdates the activity clock; test hook for liveness scenarios.
    #[cfg(test)]
    pub(crate) fn set_last_activity_ms(&self, ms: i64) {
        self.last_activity_ms.store(ms, Ordering::Relaxed);
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("user", &self.user)
            .field("open", &self.is_open())
            .finish()
    }
}

/// Live connections keyed by user identifier.
///
/// Invariant: at most one entry per identifier at any instant.
/// Registering a new connection for an identifier already present
/// atomically replaces the previous entry (last-writer-wins).
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<UserId, Arc<ConnectionHandle>>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts or atomically replaces the entry for the handle's user.
    ///
    /// Returns the displaced handle, if any, untouched: whether to close
    /// it is the caller's policy, not the registry's.
    pub async fn register(&self, handle: Arc<ConnectionHandle>) -> Option<Arc<ConnectionHandle>> {
        let user = handle.user().clone();
        self.connections.write().await.insert(user, handle)
    }

    /// Looks up the live connection for `user`.
    ///
    /// Handles already marked closed are skipped; their removal stays
    /// with [`ConnectionRegistry::remove`] so each connection's lifecycle
    /// is the single writer of its own entry.
    pub async fn lookup(&self, user: &UserId) -> Option<Arc<ConnectionHandle>> {
        self.connections
            .read()
            .await
            .get(user)
            .filter(|handle| handle.is_open())
            .cloned()
    }

    /// Removes the entry for the handle's user only if it still points at
    /// this handle (compare-and-remove), so a late close from a
    /// superseded connection never evicts its replacement.
    ///
    /// Returns whether an entry was removed.
    pub async fn remove(&self, handle: &ConnectionHandle) -> bool {
        let mut connections = self.connections.write().await;
        let is_current = connections
            .get(handle.user())
            .is_some_and(|current| current.id() == handle.id());
        if is_current {
            connections.remove(handle.user());
        }
        is_current
    }

    /// Point-in-time view of all entries, for iteration without holding
    /// the lock for the whole scan.
    pub async fn snapshot(&self) -> Vec<Arc<ConnectionHandle>> {
        self.connections.read().await.values().cloned().collect()
    }

    /// Number of registered entries, open or not yet reclaimed.
    pub async fn connected_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
