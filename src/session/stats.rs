use chrono::{DateTime, Utc};
use serde::Serialize;

/// Coarse lifecycle phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Not connected; a reconnect may be scheduled
    Disconnected,
    /// A dial is in flight
    Connecting,
    /// Connected, streaming and (normally) transmitting
    Connected,
    /// Reconnect cap reached; terminal
    GivenUp,
}

/// Snapshot of a session, published after every handled message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    /// Server endpoint
    pub address: String,

    pub phase: SessionPhase,

    /// Attempts since the last successful connection
    pub connect_attempts: u32,

    pub is_connected: bool,

    pub is_transmitting: bool,

    /// Whether an audio stream is open
    pub stream_open: bool,

    /// When the current connection was established
    pub connected_since: Option<DateTime<Utc>>,

    /// Streams opened over the life of the process
    pub streams_opened: u64,
}
