pub mod bridge;
pub mod monitor;

pub use bridge::{AudioBridge, AudioDevices, AudioStream};
pub use monitor::MonitorBridge;
