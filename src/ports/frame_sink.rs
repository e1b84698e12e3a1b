//! FrameSink port - outbound side of one physical connection.
//!
//! The transport adapter implements this trait so the core can write text
//! frames and close a connection without touching socket types.
//! Implementations enqueue rather than perform I/O, so callers never hold a
//! registry lock across a real socket write and a stalled peer can only
//! stall its own writer.

use thiserror::Error;

/// Why a connection is being closed.
///
/// Each reason maps to a distinct wire close code so client telemetry can
/// tell voluntary disconnects from server-initiated reclamation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Ordinary end of session.
    Normal,

    /// A newer connection registered for the same user.
    Superseded,

    /// No traffic within the liveness threshold; reclaimed by the monitor.
    StaleSession,
}

impl CloseReason {
    /// WebSocket close code carried by the close frame.
    pub fn code(&self) -> u16 {
        match self {
            CloseReason::Normal => 1000,
            CloseReason::Superseded => 4000,
            CloseReason::StaleSession => 4500,
        }
    }

    /// Human-readable reason placed in the close frame.
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::Normal => "normal closure",
            CloseReason::Superseded => "superseded by a newer connection",
            CloseReason::StaleSession => "stale session",
        }
    }
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors surfaced by a sink.
///
/// Always handled locally by the caller: a sink failure is logged and
/// never propagates past the affected connection.
#[derive(Debug, Clone, Error)]
pub enum SinkError {
    #[error("connection already closed")]
    Closed,

    #[error("transport failure: {0}")]
    Transport(String),
}

/// Outbound half of one physical bidirectional channel.
pub trait FrameSink: Send + Sync {
    /// Enqueues a text frame for delivery to the peer.
    fn send_text(&self, text: String) -> Result<(), SinkError>;

    /// Enqueues a close frame carrying the reason's code, after which the
    /// transport releases the underlying socket.
    fn close(&self, reason: CloseReason) -> Result<(), SinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_codes_are_distinguishable() {
        assert_eq!(CloseReason::Normal.code(), 1000);
        assert_ne!(CloseReason::Superseded.code(), CloseReason::Normal.code());
        assert_ne!(CloseReason::StaleSession.code(), CloseReason::Normal.code());
        assert_ne!(CloseReason::StaleSession.code(), CloseReason::Superseded.code());
    }

    #[test]
    fn stale_session_code_is_in_the_private_range() {
        let code = CloseReason::StaleSession.code();
        assert!((4000..5000).contains(&code));
    }
}
