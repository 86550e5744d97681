use anyhow::Result;
use tracing::{debug, info};

use super::bridge::{AudioBridge, AudioDevices, AudioStream};
use crate::transport::TransportHandle;

/// Bridge that binds to device names without driving hardware.
///
/// It keeps the stream/source lifecycle observable in the log, which is all
/// the controller needs from a bridge when no codec backend is linked in.
#[derive(Debug, Default)]
pub struct MonitorBridge;

impl MonitorBridge {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl AudioBridge for MonitorBridge {
    async fn open(
        &self,
        _transport: &dyn TransportHandle,
        devices: &AudioDevices,
    ) -> Result<Box<dyn AudioStream>> {
        info!(
            "Audio stream opened (capture: {}, playback: {})",
            device_label(&devices.capture_device),
            device_label(&devices.playback_device)
        );

        Ok(Box::new(MonitorStream {
            devices: devices.clone(),
            source_active: false,
        }))
    }

    fn name(&self) -> &str {
        "monitor"
    }
}

struct MonitorStream {
    devices: AudioDevices,
    source_active: bool,
}

impl AudioStream for MonitorStream {
    fn start_source(&mut self) {
        self.source_active = true;
        info!("Transmit source started on {}", device_label(&self.devices.capture_device));
    }

    fn stop_source(&mut self) {
        self.source_active = false;
        info!("Transmit source stopped");
    }

    fn is_source_active(&self) -> bool {
        self.source_active
    }

    fn destroy(self: Box<Self>) {
        debug!("Audio stream destroyed");
    }
}

fn device_label(name: &str) -> &str {
    if name.is_empty() {
        "default"
    } else {
        name
    }
}
