//! WebSocket transport adapter.
//!
//! Implements the `FrameSink` port over axum WebSocket connections and
//! drives the connection lifecycle from the socket event loop.

mod handler;
mod sink;

pub use handler::{relay_router, ws_handler, ConnectParams, RelayState};
pub use sink::{ChannelSink, WireFrame};
