//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the relay core to the outside world:
//! - `websocket` - axum WebSocket transport

pub mod websocket;
