pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod sanitize;
pub mod session;
pub mod tls;
pub mod transport;

pub use audio::{AudioBridge, AudioDevices, AudioStream, MonitorBridge};
pub use cli::Cli;
pub use config::Config;
pub use error::FatalError;
pub use session::{ConnectionController, SessionConfig, SessionPhase, SessionStatus};
pub use tls::{ClientIdentity, TlsPolicy};
pub use transport::{SessionTransport, TlsTransport, TransportEvent, TransportHandle};
