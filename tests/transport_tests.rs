// Tests for the TLS transport against a server that never answers
//
// The listener accepts TCP connections and holds them open without speaking
// TLS, so the handshake can only end through the dial timeout.

use anyhow::Result;
use rcs7100::session::{ConnectionController, SessionConfig};
use rcs7100::transport::{ConnectRequest, Credentials, EventSink, SessionTransport};
use rcs7100::{FatalError, MonitorBridge, TlsPolicy, TlsTransport};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{timeout, Instant};

/// Accept connections and keep them open without ever writing.
async fn silent_server() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?.to_string();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    Ok(address)
}

#[tokio::test]
async fn test_silent_server_fails_the_dial() -> Result<()> {
    let address = silent_server().await?;
    let transport = TlsTransport::with_timeout(Duration::from_millis(200));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let request = ConnectRequest {
        address,
        credentials: Credentials::default(),
        tls: TlsPolicy::default(),
    };

    let start = Instant::now();
    let result = timeout(
        Duration::from_secs(5),
        transport.connect(&request, EventSink::new(1, tx)),
    )
    .await?;

    assert!(result.is_err());
    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(rx.try_recv().is_err(), "no event for a failed dial");

    Ok(())
}

#[tokio::test]
async fn test_silent_server_counts_toward_attempt_cap() -> Result<()> {
    let address = silent_server().await?;
    let config = SessionConfig {
        address,
        channel_name: String::new(),
        reconnect_delay: Duration::from_millis(50),
        max_connect_attempts: 2,
        ..SessionConfig::default()
    };
    let controller = ConnectionController::new(
        config,
        Arc::new(TlsTransport::with_timeout(Duration::from_millis(200))),
        Arc::new(MonitorBridge::new()),
    );

    let err = timeout(
        Duration::from_secs(5),
        controller.run(std::future::pending::<()>()),
    )
    .await?
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<FatalError>(),
        Some(FatalError::GaveUp { attempts: 2 })
    ));

    Ok(())
}

#[tokio::test]
async fn test_shutdown_interrupts_handshake() -> Result<()> {
    let address = silent_server().await?;
    let config = SessionConfig {
        address,
        channel_name: String::new(),
        ..SessionConfig::default()
    };
    let controller = ConnectionController::new(
        config,
        Arc::new(TlsTransport::new()),
        Arc::new(MonitorBridge::new()),
    );

    let start = Instant::now();
    timeout(
        Duration::from_secs(3),
        controller.run(tokio::time::sleep(Duration::from_millis(200))),
    )
    .await??;

    assert!(start.elapsed() < Duration::from_secs(3));

    Ok(())
}
