//! Message router - per-frame dispatch between live connections.
//!
//! Every inbound frame is handled terminally in one step: heartbeat reply,
//! forward to the target user, or log-and-discard. Delivery is best-effort
//! at-most-once: an unreachable target drops the message silently, and a
//! write failure is narrowed to the affected connection.

use std::sync::Arc;

use crate::domain::envelope::{self, DirectMessage, RelayedMessage};
use crate::domain::foundation::UserId;

use super::registry::{ConnectionHandle, ConnectionRegistry};

/// Routes decoded envelopes through the registry to their target.
pub struct MessageRouter {
    registry: Arc<ConnectionRegistry>,
}

impl MessageRouter {
    /// Creates a router over the given registry.
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Handles one inbound text frame from `conn`.
    pub async fn dispatch(&self, conn: &ConnectionHandle, payload: &str) {
        // Any inbound frame counts as activity; there is no separate
        // transport-level heartbeat.
        conn.touch();

        if envelope::is_ping(payload) {
            if let Err(e) = conn.send_text(envelope::PONG.to_string()) {
                tracing::debug!(user_id = %conn.user(), error = %e, "failed to answer heartbeat");
            }
            return;
        }

        match DirectMessage::parse(payload) {
            Ok(message) => self.forward(conn, message).await,
            Err(_) => {
                // Constrained clients send unstructured control text over
                // the same channel; accepted and dropped without a reply.
                tracing::info!(
                    user_id = %conn.user(),
                    payload = %payload,
                    "unstructured message discarded"
                );
            }
        }
    }

    /// Forwards a structured message to its target, if reachable.
    async fn forward(&self, sender: &ConnectionHandle, message: DirectMessage) {
        let target_user = match UserId::new(message.to_user.as_str()) {
            Ok(user) => user,
            Err(_) => {
                tracing::debug!(user_id = %sender.user(), "empty target, message dropped");
                return;
            }
        };

        // The sender identity always comes from the connection, never from
        // the raw payload.
        let outbound = RelayedMessage::new(sender.user().as_str(), message);

        let Some(target) = self.registry.lookup(&target_user).await else {
            tracing::debug!(
                user_id = %sender.user(),
                target = %target_user,
                "target not connected, message dropped"
            );
            return;
        };

        match target.send_text(outbound.to_json()) {
            Ok(()) => {
                // Cosmetic confirmation to the sender; best-effort like
                // everything else on this path.
                let ack = format!(
                    "system: delivered {} message to {}",
                    outbound.content_type, target_user
                );
                if let Err(e) = sender.send_text(ack) {
                    tracing::debug!(user_id = %sender.user(), error = %e, "failed to send delivery ack");
                }
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %sender.user(),
                    target = %target_user,
                    error = %e,
                    "failed to forward message"
                );
            }
        }
    }
}
