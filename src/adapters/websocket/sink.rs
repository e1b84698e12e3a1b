//! Channel-backed `FrameSink` wiring the core to a connection's writer task.

use tokio::sync::mpsc;

use crate::ports::{CloseReason, FrameSink, SinkError};

/// Frame queued for a connection's writer task.
#[derive(Debug, Clone, PartialEq)]
pub enum WireFrame {
    /// A text payload for the peer.
    Text(String),

    /// Close the socket with the reason's code; terminal for the writer.
    Close(CloseReason),
}

/// `FrameSink` that enqueues frames onto the writer task's channel.
///
/// Sends never block: the channel is unbounded, so a slow peer stalls only
/// its own writer task, never the task calling into the sink. Once the
/// writer has gone away every send fails with [`SinkError::Closed`].
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<WireFrame>,
}

impl ChannelSink {
    /// Wraps the sending half of a connection's outbound channel.
    pub fn new(tx: mpsc::UnboundedSender<WireFrame>) -> Self {
        Self { tx }
    }
}

impl FrameSink for ChannelSink {
    fn send_text(&self, text: String) -> Result<(), SinkError> {
        self.tx
            .send(WireFrame::Text(text))
            .map_err(|_| SinkError::Closed)
    }

    fn close(&self, reason: CloseReason) -> Result<(), SinkError> {
        self.tx
            .send(WireFrame::Close(reason))
            .map_err(|_| SinkError::Closed)
    }
}
