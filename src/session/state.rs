use chrono::{DateTime, Utc};

use crate::audio::{AudioDevices, AudioStream};
use crate::transport::{ConnectionId, TransportHandle};

/// A dial that has been handed off but not yet confirmed.
pub(crate) struct PendingConnection {
    pub(crate) id: ConnectionId,
    pub(crate) handle: Box<dyn TransportHandle>,
}

/// Everything the controller knows about the session.
///
/// Only the controller mutates this. The immutable fields are fixed at
/// construction; the rest follow the connection lifecycle:
/// `transmitting` implies `connected`, and `stream` is only held while
/// connected.
pub struct SessionState {
    address: String,
    channel_name: String,
    devices: AudioDevices,

    pub(crate) connect_attempts: u32,
    pub(crate) connected: bool,
    pub(crate) transmitting: bool,
    pub(crate) given_up: bool,

    pub(crate) pending: Option<PendingConnection>,
    pub(crate) transport: Option<Box<dyn TransportHandle>>,
    pub(crate) live_connection: Option<ConnectionId>,
    pub(crate) stream: Option<Box<dyn AudioStream>>,

    pub(crate) connected_since: Option<DateTime<Utc>>,
    pub(crate) streams_opened: u64,
}

impl SessionState {
    pub fn new(address: String, channel_name: String, devices: AudioDevices) -> Self {
        Self {
            address,
            channel_name,
            devices,
            connect_attempts: 0,
            connected: false,
            transmitting: false,
            given_up: false,
            pending: None,
            transport: None,
            live_connection: None,
            stream: None,
            connected_since: None,
            streams_opened: 0,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn channel_name(&self) -> &str {
        &self.channel_name
    }

    pub fn devices(&self) -> &AudioDevices {
        &self.devices
    }

    pub fn connect_attempts(&self) -> u32 {
        self.connect_attempts
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_transmitting(&self) -> bool {
        self.transmitting
    }

    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    pub fn is_connecting(&self) -> bool {
        self.pending.is_some()
    }

    /// The handle of the confirmed connection, if any.
    pub fn transport(&self) -> Option<&dyn TransportHandle> {
        self.transport.as_deref()
    }

    /// Whether `connection` is the dial currently in flight or live.
    pub(crate) fn is_current(&self, connection: ConnectionId) -> bool {
        self.live_connection == Some(connection)
            || self.pending.as_ref().map(|p| p.id) == Some(connection)
    }
}
