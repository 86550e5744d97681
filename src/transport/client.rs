use anyhow::Result;
use tokio::sync::mpsc;
use tracing::debug;

use super::events::TransportEvent;
use crate::session::ControlMessage;
use crate::tls::TlsPolicy;

/// Identifies one dial. Events tagged with a superseded id are dropped by the
/// controller.
pub type ConnectionId = u64;

/// Opaque channel reference handed out by a transport's channel directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u32);

/// Snapshot of the channel the local user currently sits in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub name: String,
    /// Users in the channel, including ourselves.
    pub user_count: usize,
}

/// Login credentials presented to the server.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Everything a transport needs to dial.
#[derive(Debug, Clone)]
pub struct ConnectRequest {
    /// Server endpoint, `host:port`.
    pub address: String,
    pub credentials: Credentials,
    pub tls: TlsPolicy,
}

/// Delivery path for transport events back to the controller.
///
/// Each sink is stamped with the [`ConnectionId`] of the dial it was created
/// for. Sending never blocks; a closed controller just drops the event.
#[derive(Debug, Clone)]
pub struct EventSink {
    connection: ConnectionId,
    tx: mpsc::UnboundedSender<ControlMessage>,
}

impl EventSink {
    pub fn new(connection: ConnectionId, tx: mpsc::UnboundedSender<ControlMessage>) -> Self {
        Self { connection, tx }
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    /// Push an event to the controller.
    pub fn emit(&self, event: TransportEvent) {
        debug!(connection = self.connection, event = event.name(), "transport event");
        let _ = self.tx.send(ControlMessage::Transport {
            connection: self.connection,
            event,
        });
    }
}

/// Dials the voice server.
///
/// `connect` returns once the dial has been handed off. A handle being
/// returned does not mean the session is up: success is reported by a
/// [`TransportEvent::Connected`] through `events`, failure after this point by
/// [`TransportEvent::Disconnected`].
#[async_trait::async_trait]
pub trait SessionTransport: Send + Sync {
    async fn connect(
        &self,
        request: &ConnectRequest,
        events: EventSink,
    ) -> Result<Box<dyn TransportHandle>>;

    /// Transport name for logging
    fn name(&self) -> &str;
}

/// A live (or pending) connection.
#[async_trait::async_trait]
pub trait TransportHandle: Send + Sync {
    /// Close the connection. Calling it on an already-closed handle is a no-op.
    async fn disconnect(&self) -> Result<()>;

    /// Look a channel up by name in the server's channel directory.
    fn find_channel(&self, name: &str) -> Option<ChannelId>;

    /// Move the local user into `channel`.
    async fn move_to_channel(&self, channel: ChannelId) -> Result<()>;

    /// The channel the local user is in, if the roster knows it yet.
    fn current_channel(&self) -> Option<ChannelInfo>;
}
