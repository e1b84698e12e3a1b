//! Ports - Interfaces between the relay core and the outside world.
//!
//! Following hexagonal architecture, ports define the contracts the
//! application core depends on; adapters implement them.
//!
//! - `FrameSink` - outbound side of one connection (write text, close)

mod frame_sink;

pub use frame_sink::{CloseReason, FrameSink, SinkError};
