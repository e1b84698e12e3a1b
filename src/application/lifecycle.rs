//! Connection lifecycle controller.
//!
//! One controller instance serves every connection; the transport adapter
//! invokes `on_open` / `on_message` / `on_close` from its event loop. The
//! controller composes the registry and router rather than extending any
//! transport type, so the whole lifecycle runs under test with in-memory
//! sinks.
//!
//! A connection only ever reaches `on_open` with a resolved, non-empty
//! identity; connections without one are rejected by the handshake layer
//! before the controller sees them.

use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::ports::{CloseReason, FrameSink};

use super::registry::{ConnectionHandle, ConnectionRegistry};
use super::router::MessageRouter;

/// Orchestrates registration, dispatch and deregistration for connections.
pub struct ConnectionLifecycle {
    registry: Arc<ConnectionRegistry>,
    router: MessageRouter,
}

impl ConnectionLifecycle {
    /// Creates a controller over the given registry.
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            router: MessageRouter::new(registry.clone()),
            registry,
        }
    }

    /// The registry this controller maintains.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Transition into `Open`: create the handle and register it.
    ///
    /// If another connection was registered for the same user it is closed
    /// with the superseded code, so the user never receives duplicate
    /// delivery across two sockets.
    pub async fn on_open(&self, user: UserId, sink: Box<dyn FrameSink>) -> Arc<ConnectionHandle> {
        let handle = ConnectionHandle::new(user, sink);

        if let Some(previous) = self.registry.register(handle.clone()).await {
            tracing::info!(
                user_id = %handle.user(),
                superseded = %previous.id(),
                "superseding existing connection"
            );
            if let Err(e) = previous.close(CloseReason::Superseded) {
                tracing::debug!(
                    user_id = %handle.user(),
                    error = %e,
                    "failed to close superseded connection"
                );
            }
        }

        tracing::info!(user_id = %handle.user(), connection_id = %handle.id(), "user connected");
        handle
    }

    /// Hands one inbound text frame to the router.
    pub async fn on_message(&self, conn: &ConnectionHandle, payload: &str) {
        self.router.dispatch(conn, payload).await;
    }

    /// Transition into `Closed` (terminal), from any path: client close,
    /// transport error or forced eviction.
    ///
    /// Idempotent: repeated close signals for the same handle are no-ops,
    /// and compare-and-remove guarantees a late close never evicts a newer
    /// registration.
    pub async fn on_close(&self, conn: &ConnectionHandle) {
        conn.mark_closed();
        if self.registry.remove(conn).await {
            tracing::info!(user_id = %conn.user(), connection_id = %conn.id(), "user disconnected");
        }
    }
}
