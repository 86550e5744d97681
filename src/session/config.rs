use std::time::Duration;

use crate::audio::AudioDevices;
use crate::tls::TlsPolicy;
use crate::transport::Credentials;

/// Fixed delay between reconnect attempts.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(10);

/// Consecutive attempts after which the controller gives up.
pub const MAX_CONNECT_ATTEMPTS: u32 = 100;

/// Pause before reading the roster after a user or channel change.
pub const PARTICIPANT_SETTLE: Duration = Duration::from_millis(100);

/// Pause between destroying and reopening an audio stream.
pub const STREAM_SETTLE: Duration = Duration::from_millis(50);

/// Configuration for a radio session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Server endpoint (e.g., "mumble.example.org:64738")
    pub address: String,

    /// Channel to join once connected; empty stays in the server default
    pub channel_name: String,

    pub credentials: Credentials,

    pub tls: TlsPolicy,

    /// Capture and playback devices
    pub devices: AudioDevices,

    /// Delay before each reconnect attempt
    /// Default: 10 seconds
    pub reconnect_delay: Duration,

    /// Give up after this many consecutive attempts
    /// Default: 100
    pub max_connect_attempts: u32,

    pub participant_settle: Duration,

    pub stream_settle: Duration,

    /// Treat a failed stream open as a dropped connection instead of a fatal
    /// error
    pub retry_stream_failures: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            address: "localhost:64738".to_string(),
            channel_name: "root".to_string(),
            credentials: Credentials::default(),
            tls: TlsPolicy::default(),
            devices: AudioDevices::default(),
            reconnect_delay: RECONNECT_DELAY,
            max_connect_attempts: MAX_CONNECT_ATTEMPTS,
            participant_settle: PARTICIPANT_SETTLE,
            stream_settle: STREAM_SETTLE,
            retry_stream_failures: false,
        }
    }
}
