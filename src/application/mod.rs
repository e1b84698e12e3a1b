//! Application layer - the relay core.
//!
//! Everything here is transport-agnostic: the only way out is the
//! [`crate::ports::FrameSink`] port, so the registry, router, lifecycle and
//! liveness monitor all run under test with in-memory sinks.
//!
//! - `registry` - connection handles and the shared user → connection map
//! - `router` - per-frame dispatch between live connections
//! - `lifecycle` - open / message / close orchestration per connection
//! - `liveness` - periodic reclamation of silent connections

pub mod lifecycle;
pub mod liveness;
pub mod registry;
pub mod router;

pub use lifecycle::ConnectionLifecycle;
pub use liveness::LivenessMonitor;
pub use registry::{ConnectionHandle, ConnectionRegistry};
pub use router::MessageRouter;

#[cfg(test)]
pub(crate) mod test_support;
