//! Courier - Real-time point-to-point message relay
//!
//! Authenticated users hold one live WebSocket connection each; messages
//! addressed to a user identifier are routed to whichever connection
//! currently represents that user, and a periodic liveness monitor
//! reclaims connections that have gone silent.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
