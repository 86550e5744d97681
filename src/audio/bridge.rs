use anyhow::Result;

use crate::transport::TransportHandle;

/// Local audio devices bound to the session.
///
/// Empty identifiers select the system default device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioDevices {
    /// Device the radio's receive audio is played out to
    pub playback_device: String,
    /// Device the radio's audio is captured from
    pub capture_device: String,
}

/// Binds a live transport to local capture/playback devices.
///
/// Implementations:
/// - [`super::MonitorBridge`]: device-less stream that tracks and logs source state
/// - A codec-backed bridge plugs in here to move real audio
#[async_trait::async_trait]
pub trait AudioBridge: Send + Sync {
    /// Open a stream for `transport` on the given devices.
    async fn open(
        &self,
        transport: &dyn TransportHandle,
        devices: &AudioDevices,
    ) -> Result<Box<dyn AudioStream>>;

    /// Get bridge name for logging
    fn name(&self) -> &str;
}

/// An open audio stream.
///
/// Source control is fire-and-forget: the controller never waits on it.
pub trait AudioStream: Send + Sync {
    /// Start feeding captured audio into the session.
    fn start_source(&mut self);

    /// Stop feeding captured audio.
    fn stop_source(&mut self);

    /// Whether the capture source is currently running
    fn is_source_active(&self) -> bool;

    /// Release the devices.
    fn destroy(self: Box<Self>);
}
