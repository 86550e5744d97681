//! Radio session management
//!
//! This module provides the `ConnectionController` that manages:
//! - Connection attempts against the voice server
//! - Fixed-backoff reconnection with a give-up cap
//! - Audio stream (re)initialization and transmit state
//! - Routing of transport events to log lines and follow-up actions

mod config;
mod controller;
pub mod router;
mod state;
mod stats;
pub mod timer;

pub use config::{
    SessionConfig, MAX_CONNECT_ATTEMPTS, PARTICIPANT_SETTLE, RECONNECT_DELAY, STREAM_SETTLE,
};
pub use controller::{ConnectionController, ControlMessage};
pub use state::SessionState;
pub use stats::{SessionPhase, SessionStatus};
