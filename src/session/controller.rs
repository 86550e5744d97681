use anyhow::Result;
use chrono::Utc;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use super::config::SessionConfig;
use super::router::{self, Action};
use super::state::{PendingConnection, SessionState};
use super::stats::{SessionPhase, SessionStatus};
use super::timer::DeferredTask;
use crate::audio::AudioBridge;
use crate::error::FatalError;
use crate::sanitize;
use crate::transport::{
    ConnectRequest, ConnectionId, DisconnectKind, EventSink, SessionTransport, TransportEvent,
};

/// Input to the controller's inbox.
#[derive(Debug)]
pub enum ControlMessage {
    /// An event from the transport, tagged with the dial it belongs to
    Transport {
        connection: ConnectionId,
        event: TransportEvent,
    },
    /// The reconnect backoff elapsed
    ReconnectDue,
    /// The roster settle delay elapsed
    ParticipantCheckDue,
}

/// Owns the session and drives it through connect, stream, and reconnect.
///
/// All state changes happen on whichever task calls into the controller;
/// transport callbacks and timers only post [`ControlMessage`]s to its inbox.
pub struct ConnectionController {
    config: SessionConfig,
    state: SessionState,

    transport: Arc<dyn SessionTransport>,
    bridge: Arc<dyn AudioBridge>,

    inbox_tx: mpsc::UnboundedSender<ControlMessage>,
    inbox_rx: mpsc::UnboundedReceiver<ControlMessage>,

    reconnect_timer: DeferredTask,
    participant_timer: DeferredTask,

    next_connection: ConnectionId,
    status_tx: watch::Sender<SessionStatus>,
}

impl ConnectionController {
    pub fn new(
        config: SessionConfig,
        transport: Arc<dyn SessionTransport>,
        bridge: Arc<dyn AudioBridge>,
    ) -> Self {
        let state = SessionState::new(
            config.address.clone(),
            config.channel_name.clone(),
            config.devices.clone(),
        );
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        let mut controller = Self {
            config,
            state,
            transport,
            bridge,
            inbox_tx,
            inbox_rx,
            reconnect_timer: DeferredTask::new("reconnect"),
            participant_timer: DeferredTask::new("participant check"),
            next_connection: 0,
            status_tx: watch::channel(SessionStatus {
                address: String::new(),
                phase: SessionPhase::Disconnected,
                connect_attempts: 0,
                is_connected: false,
                is_transmitting: false,
                stream_open: false,
                connected_since: None,
                streams_opened: 0,
            })
            .0,
        };
        controller.publish_status();
        controller
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Receive a status snapshot after every handled message.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    pub fn status(&self) -> SessionStatus {
        let phase = if self.state.given_up {
            SessionPhase::GivenUp
        } else if self.state.connected {
            SessionPhase::Connected
        } else if self.state.pending.is_some() {
            SessionPhase::Connecting
        } else {
            SessionPhase::Disconnected
        };

        SessionStatus {
            address: self.state.address().to_string(),
            phase,
            connect_attempts: self.state.connect_attempts,
            is_connected: self.state.connected,
            is_transmitting: self.state.transmitting,
            stream_open: self.state.stream.is_some(),
            connected_since: self.state.connected_since,
            streams_opened: self.state.streams_opened,
        }
    }

    /// Whether a reconnect attempt is waiting on its backoff.
    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_timer.is_pending()
    }

    /// Connect and keep the session alive until `shutdown` resolves.
    ///
    /// Returns `Ok` after an orderly shutdown and an error wrapping
    /// [`FatalError`] when the session cannot continue.
    pub async fn run<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!(
            "Starting session with {} as {}",
            self.state.address(),
            self.config.credentials.username
        );

        tokio::pin!(shutdown);
        let outcome = self.drive(shutdown).await;

        self.shutdown().await;
        outcome
    }

    async fn drive<F>(&mut self, mut shutdown: Pin<&mut F>) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let Some(connected) = until_shutdown(shutdown.as_mut(), self.connect()).await else {
            return Ok(());
        };
        connected?;
        self.publish_status();

        loop {
            let Some(Some(message)) = until_shutdown(shutdown.as_mut(), self.inbox_rx.recv()).await
            else {
                return Ok(());
            };

            match until_shutdown(shutdown.as_mut(), self.handle(message)).await {
                Some(handled) => handled?,
                None => return Ok(()),
            }
        }
    }

    /// Wait for the next inbox message and handle it.
    pub async fn step(&mut self) -> Result<()> {
        match self.inbox_rx.recv().await {
            Some(message) => self.handle(message).await,
            None => Ok(()),
        }
    }

    pub async fn handle(&mut self, message: ControlMessage) -> Result<()> {
        let result = match message {
            ControlMessage::Transport { connection, event } => {
                self.on_transport_event(connection, event).await
            }
            ControlMessage::ReconnectDue => self.connect().await,
            ControlMessage::ParticipantCheckDue => {
                self.announce_participants();
                Ok(())
            }
        };

        self.publish_status();
        result
    }

    async fn on_transport_event(
        &mut self,
        connection: ConnectionId,
        event: TransportEvent,
    ) -> Result<()> {
        if !self.state.is_current(connection) {
            debug!(connection, event = event.name(), "dropping event from stale connection");
            return Ok(());
        }

        let routed = router::route(event);
        if let Some(line) = &routed.line {
            info!("{}", line);
        }

        match routed.action {
            Action::Connected {
                remote_addr,
                welcome_message,
            } => {
                self.on_connected(connection, remote_addr, welcome_message)
                    .await
            }
            Action::Disconnected { kind } => self.on_disconnected(kind).await,
            Action::CheckParticipants => {
                if self.state.connected {
                    self.participant_timer.schedule(
                        self.config.participant_settle,
                        &self.inbox_tx,
                        ControlMessage::ParticipantCheckDue,
                    );
                }
                Ok(())
            }
            Action::None => Ok(()),
        }
    }

    /// Start one connection attempt.
    ///
    /// A dial failure feeds straight into [`Self::reconnect`]; a successful
    /// dial only becomes a connection once its connected event arrives.
    pub async fn connect(&mut self) -> Result<()> {
        self.state.connect_attempts += 1;

        if let Some(stale) = self.state.pending.take() {
            if let Err(e) = stale.handle.disconnect().await {
                debug!("Discarding stale dial: {:#}", e);
            }
        }

        self.next_connection += 1;
        let id = self.next_connection;

        let request = ConnectRequest {
            address: self.state.address().to_string(),
            credentials: self.config.credentials.clone(),
            tls: self.config.tls.clone(),
        };
        let events = EventSink::new(id, self.inbox_tx.clone());

        debug!(
            attempt = self.state.connect_attempts,
            transport = self.transport.name(),
            "dialing {}",
            request.address
        );

        match self.transport.connect(&request, events).await {
            Ok(handle) => {
                self.state.pending = Some(PendingConnection { id, handle });
                Ok(())
            }
            Err(e) => {
                info!(
                    "Connection to {} failed ({:#}), attempting again in {} seconds...",
                    self.state.address(),
                    e,
                    self.config.reconnect_delay.as_secs()
                );
                self.reconnect().await
            }
        }
    }

    /// Tear the connection down and schedule the next attempt, or give up
    /// once the attempt cap is reached.
    pub async fn reconnect(&mut self) -> Result<()> {
        self.teardown().await;

        if self.state.connect_attempts < self.config.max_connect_attempts {
            self.reconnect_timer.schedule(
                self.config.reconnect_delay,
                &self.inbox_tx,
                ControlMessage::ReconnectDue,
            );
            return Ok(());
        }

        error!("Unable to connect, giving up");
        self.state.given_up = true;
        Err(FatalError::GaveUp {
            attempts: self.state.connect_attempts,
        }
        .into())
    }

    async fn on_connected(
        &mut self,
        connection: ConnectionId,
        remote_addr: String,
        welcome_message: Option<String>,
    ) -> Result<()> {
        let pending = match self.state.pending.take() {
            Some(pending) if pending.id == connection => pending,
            other => {
                // Duplicate connected event for the live connection
                self.state.pending = other;
                debug!(connection, "ignoring repeated connected event");
                return Ok(());
            }
        };

        if let Some(previous) = self.state.transport.replace(pending.handle) {
            if let Err(e) = previous.disconnect().await {
                debug!("Closing superseded connection: {:#}", e);
            }
        }
        self.reconnect_timer.cancel();

        self.state.live_connection = Some(connection);
        self.state.connect_attempts = 0;
        self.state.connected = true;
        self.state.connected_since = Some(Utc::now());

        info!("Connected to {}", remote_addr);
        if let Some(welcome) = welcome_message {
            info!("Welcome message: {}", sanitize::html(&welcome));
        }

        if !self.state.channel_name().is_empty() {
            let channel = self.state.channel_name().to_string();
            self.change_channel(&channel).await;
        }

        self.open_stream().await
    }

    async fn on_disconnected(&mut self, kind: DisconnectKind) -> Result<()> {
        self.stop_transmit();
        self.state.connected = false;

        match kind.reason() {
            Some(reason) => info!(
                "Connection to {} disconnected ({}), attempting again in {} seconds...",
                self.state.address(),
                reason,
                self.config.reconnect_delay.as_secs()
            ),
            None => info!(
                "Connection to {} disconnected, attempting again in {} seconds...",
                self.state.address(),
                self.config.reconnect_delay.as_secs()
            ),
        }

        self.reconnect().await
    }

    /// Bind the audio devices to the live connection and start transmitting.
    pub async fn open_stream(&mut self) -> Result<()> {
        let Some(transport) = self.state.transport.as_deref() else {
            warn!("No live connection to open an audio stream on");
            return Ok(());
        };

        let opened = self.bridge.open(transport, &self.config.devices).await;
        match opened {
            Ok(stream) => {
                if let Some(previous) = self.state.stream.replace(stream) {
                    previous.destroy();
                }
                self.state.streams_opened += 1;
                debug!(bridge = self.bridge.name(), "audio stream open");

                self.start_transmit();
                Ok(())
            }
            Err(e) => {
                error!("Stream open error ({:#})", e);
                if self.config.retry_stream_failures {
                    self.reconnect().await
                } else {
                    Err(FatalError::StreamOpen(format!("{:#}", e)).into())
                }
            }
        }
    }

    /// Recycle the audio stream without touching the connection.
    pub async fn reset_stream(&mut self) -> Result<()> {
        self.destroy_stream();
        tokio::time::sleep(self.config.stream_settle).await;
        self.open_stream().await
    }

    pub fn start_transmit(&mut self) {
        if !self.state.connected {
            return;
        }

        match self.state.stream.as_mut() {
            Some(stream) => {
                self.state.transmitting = true;
                stream.start_source();
            }
            None => debug!("transmit requested without an open stream"),
        }
    }

    pub fn stop_transmit(&mut self) {
        if !self.state.connected {
            return;
        }

        if let Some(stream) = self.state.stream.as_mut() {
            stream.stop_source();
        }
        self.state.transmitting = false;
    }

    /// Move into the channel called `name`. Returns whether it was found.
    pub async fn change_channel(&mut self, name: &str) -> bool {
        let found = self
            .state
            .transport
            .as_deref()
            .and_then(|transport| transport.find_channel(name).map(|id| (transport, id)));

        match found {
            Some((transport, channel)) => {
                if let Err(e) = transport.move_to_channel(channel).await {
                    warn!("Unable to move to channel {}: {:#}", name, e);
                }
                true
            }
            None => {
                info!("Unable to find channel: {}", name);
                false
            }
        }
    }

    /// Log how many users share our channel. Returns the announced line.
    pub fn announce_participants(&self) -> Option<String> {
        let channel = self.state.transport()?.current_channel()?;
        let line = router::participant_line(&channel);
        info!("{}", line);
        Some(line)
    }

    /// Cancel pending work and close the connection.
    pub async fn shutdown(&mut self) {
        self.reconnect_timer.cancel();

        let was_connected = self.state.connected;
        self.teardown().await;
        self.publish_status();

        if was_connected {
            info!("Disconnected from {}", self.state.address());
        }
    }

    fn destroy_stream(&mut self) {
        if let Some(stream) = self.state.stream.take() {
            stream.destroy();
        }
        self.state.transmitting = false;
    }

    /// Stop transmitting, drop the stream, and disconnect every handle.
    async fn teardown(&mut self) {
        self.participant_timer.cancel();
        self.stop_transmit();
        self.destroy_stream();

        self.state.connected = false;
        self.state.connected_since = None;
        self.state.live_connection = None;

        if let Some(transport) = self.state.transport.take() {
            if let Err(e) = transport.disconnect().await {
                warn!("Disconnect failed: {:#}", e);
            }
        }
        if let Some(pending) = self.state.pending.take() {
            if let Err(e) = pending.handle.disconnect().await {
                debug!("Discarding pending dial: {:#}", e);
            }
        }
    }

    fn publish_status(&mut self) {
        self.status_tx.send_replace(self.status());
    }
}

/// Run `work` unless `shutdown` resolves first. A dial or handshake stuck
/// inside `work` is dropped on shutdown.
async fn until_shutdown<F, W>(shutdown: Pin<&mut F>, work: W) -> Option<W::Output>
where
    F: Future<Output = ()>,
    W: Future,
{
    tokio::select! {
        _ = shutdown => {
            info!("Shutdown requested");
            None
        }
        output = work => Some(output),
    }
}
