//! Secure-channel transport.
//!
//! Dials the server over TCP, performs the TLS handshake according to the
//! configured [`TlsPolicy`](crate::tls::TlsPolicy), and reports the channel's
//! lifecycle. Voice-protocol framing rides on top of this channel and is not
//! interpreted here, so the channel directory stays empty.
//!
//! [`TransportEvent::Connected`] from this transport means the secure channel
//! is up. No login has been exchanged with the server at that point, so a
//! "Connected to" line does not mean the credentials were accepted.

use anyhow::{Context, Result};
use rustls::pki_types::ServerName;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tracing::{debug, info, trace, warn};

use super::client::{
    ChannelId, ChannelInfo, ConnectRequest, EventSink, SessionTransport, TransportHandle,
};
use super::events::{DisconnectKind, TransportEvent};

/// Upper bound on the TCP dial plus the TLS handshake.
pub const DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// TCP + TLS transport.
#[derive(Debug)]
pub struct TlsTransport {
    dial_timeout: Duration,
}

impl TlsTransport {
    pub fn new() -> Self {
        Self::with_timeout(DIAL_TIMEOUT)
    }

    /// Fail a dial whose TCP connect and handshake take longer than `dial_timeout`.
    pub fn with_timeout(dial_timeout: Duration) -> Self {
        Self { dial_timeout }
    }
}

impl Default for TlsTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SessionTransport for TlsTransport {
    async fn connect(
        &self,
        request: &ConnectRequest,
        events: EventSink,
    ) -> Result<Box<dyn TransportHandle>> {
        let config = request.tls.client_config()?;

        let server_name = ServerName::try_from(host_of(&request.address).to_string())
            .with_context(|| format!("invalid server name in {}", request.address))?;
        let connector = TlsConnector::from(Arc::new(config));

        let dial = async {
            let tcp = TcpStream::connect(&request.address)
                .await
                .with_context(|| format!("dial {}", request.address))?;
            let remote_addr = tcp
                .peer_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_else(|_| request.address.clone());

            let stream = connector
                .connect(server_name, tcp)
                .await
                .context("TLS handshake failed")?;
            Ok::<_, anyhow::Error>((stream, remote_addr))
        };

        let (mut stream, remote_addr) = timeout(self.dial_timeout, dial)
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "no TLS session with {} within {:?}",
                    request.address,
                    self.dial_timeout
                )
            })??;

        info!(
            "Secure channel to {} established as {}",
            remote_addr, request.credentials.username
        );

        let (closed_tx, mut closed_rx) = watch::channel(false);

        events.emit(TransportEvent::Connected {
            remote_addr,
            welcome_message: None,
        });

        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];

            loop {
                tokio::select! {
                    _ = closed_rx.changed() => {
                        if let Err(e) = stream.shutdown().await {
                            debug!("TLS shutdown: {}", e);
                        }
                        break;
                    }
                    read = stream.read(&mut buf) => match read {
                        Ok(0) => {
                            info!("Server closed the connection");
                            events.emit(TransportEvent::Disconnected { kind: DisconnectKind::Error });
                            break;
                        }
                        Ok(n) => trace!("received {} bytes", n),
                        Err(e) => {
                            warn!("Read error: {}", e);
                            events.emit(TransportEvent::Disconnected { kind: DisconnectKind::Error });
                            break;
                        }
                    }
                }
            }

            debug!(connection = events.connection(), "reader task stopped");
        });

        Ok(Box::new(TlsHandle { closed: closed_tx }))
    }

    fn name(&self) -> &str {
        "tls"
    }
}

struct TlsHandle {
    closed: watch::Sender<bool>,
}

#[async_trait::async_trait]
impl TransportHandle for TlsHandle {
    async fn disconnect(&self) -> Result<()> {
        // No receiver left means the reader already exited
        self.closed.send_replace(true);
        Ok(())
    }

    fn find_channel(&self, _name: &str) -> Option<ChannelId> {
        None
    }

    async fn move_to_channel(&self, channel: ChannelId) -> Result<()> {
        anyhow::bail!("channel {:?} is not in the directory", channel)
    }

    fn current_channel(&self) -> Option<ChannelInfo> {
        None
    }
}

/// Host part of a `host:port` address, without IPv6 brackets.
fn host_of(address: &str) -> &str {
    let host = match address.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => address,
    };
    host.trim_start_matches('[').trim_end_matches(']')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("mumble.example.org:64738"), "mumble.example.org");
        assert_eq!(host_of("10.0.0.7:64738"), "10.0.0.7");
        assert_eq!(host_of("[::1]:64738"), "::1");
        assert_eq!(host_of("localhost"), "localhost");
    }
}
