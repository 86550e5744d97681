pub mod client;
pub mod events;
pub mod tls;

pub use client::{
    ChannelId, ChannelInfo, ConnectRequest, ConnectionId, Credentials, EventSink,
    SessionTransport, TransportHandle,
};
pub use events::{DisconnectKind, PermissionDeniedKind, TransportEvent, UserChangeKind};
pub use tls::TlsTransport;
