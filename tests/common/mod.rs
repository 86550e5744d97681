// Test doubles for the session transport and audio bridge
//
// Both mocks record every call in shared counters so tests can hold an
// `Arc` to the mock while the controller owns a trait object of it.

#![allow(dead_code)]

use anyhow::{bail, Result};
use rcs7100::audio::{AudioBridge, AudioDevices, AudioStream};
use rcs7100::transport::{
    ChannelId, ChannelInfo, ConnectRequest, EventSink, SessionTransport, TransportEvent,
    TransportHandle,
};
use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Outcome of one dial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dial {
    Fail,
    Succeed,
    /// Never completes, like a server that accepts TCP and then goes silent
    Hang,
}

/// Server-side view the mock handles read from
#[derive(Debug, Default)]
pub struct Roster {
    pub channels: HashMap<String, u32>,
    pub current: Option<ChannelInfo>,
    pub moves: Vec<ChannelId>,
}

pub struct MockTransport {
    plan: Mutex<VecDeque<Dial>>,
    fallback: Dial,
    pub connects: AtomicUsize,
    pub disconnects: Arc<AtomicUsize>,
    pub roster: Arc<Mutex<Roster>>,
    sinks: Mutex<Vec<EventSink>>,
    last_request: Mutex<Option<ConnectRequest>>,
}

impl MockTransport {
    /// Every dial succeeds.
    pub fn new() -> Self {
        Self::with_plan(Vec::new(), Dial::Succeed)
    }

    /// Dials follow `plan`, then `fallback` once it runs out.
    pub fn with_plan(plan: Vec<Dial>, fallback: Dial) -> Self {
        Self {
            plan: Mutex::new(plan.into()),
            fallback,
            connects: AtomicUsize::new(0),
            disconnects: Arc::new(AtomicUsize::new(0)),
            roster: Arc::new(Mutex::new(Roster::default())),
            sinks: Mutex::new(Vec::new()),
            last_request: Mutex::new(None),
        }
    }

    /// `failures` failed dials followed by successes.
    pub fn failing(failures: usize) -> Self {
        Self::with_plan(vec![Dial::Fail; failures], Dial::Succeed)
    }

    pub fn always_failing() -> Self {
        Self::with_plan(Vec::new(), Dial::Fail)
    }

    pub fn hanging() -> Self {
        Self::with_plan(Vec::new(), Dial::Hang)
    }

    pub fn with_channel(self, name: &str, id: u32) -> Self {
        self.roster.lock().unwrap().channels.insert(name.to_string(), id);
        self
    }

    pub fn with_current(self, name: &str, user_count: usize) -> Self {
        self.roster.lock().unwrap().current = Some(ChannelInfo {
            name: name.to_string(),
            user_count,
        });
        self
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn moves(&self) -> Vec<ChannelId> {
        self.roster.lock().unwrap().moves.clone()
    }

    /// Sink handed to the most recent successful dial.
    pub fn last_sink(&self) -> EventSink {
        self.sinks.lock().unwrap().last().cloned().expect("no successful dial yet")
    }

    /// Sink of the `n`th successful dial (0-based).
    pub fn sink(&self, n: usize) -> EventSink {
        self.sinks.lock().unwrap()[n].clone()
    }

    pub fn last_request(&self) -> Option<ConnectRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SessionTransport for MockTransport {
    async fn connect(
        &self,
        request: &ConnectRequest,
        events: EventSink,
    ) -> Result<Box<dyn TransportHandle>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());

        let dial = self.plan.lock().unwrap().pop_front().unwrap_or(self.fallback);
        match dial {
            Dial::Fail => bail!("connection refused"),
            Dial::Hang => std::future::pending::<()>().await,
            Dial::Succeed => {}
        }

        events.emit(TransportEvent::Connected {
            remote_addr: "192.0.2.10:64738".to_string(),
            welcome_message: Some("<b>Welcome</b> to the repeater".to_string()),
        });
        self.sinks.lock().unwrap().push(events);

        Ok(Box::new(MockHandle {
            disconnects: Arc::clone(&self.disconnects),
            roster: Arc::clone(&self.roster),
        }))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

struct MockHandle {
    disconnects: Arc<AtomicUsize>,
    roster: Arc<Mutex<Roster>>,
}

#[async_trait::async_trait]
impl TransportHandle for MockHandle {
    async fn disconnect(&self) -> Result<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn find_channel(&self, name: &str) -> Option<ChannelId> {
        self.roster.lock().unwrap().channels.get(name).map(|id| ChannelId(*id))
    }

    async fn move_to_channel(&self, channel: ChannelId) -> Result<()> {
        let mut roster = self.roster.lock().unwrap();
        roster.moves.push(channel);
        let name = roster
            .channels
            .iter()
            .find(|(_, id)| **id == channel.0)
            .map(|(name, _)| name.clone());
        if let Some(name) = name {
            roster.current = Some(ChannelInfo { name, user_count: 1 });
        }
        Ok(())
    }

    fn current_channel(&self) -> Option<ChannelInfo> {
        self.roster.lock().unwrap().current.clone()
    }
}

pub struct MockBridge {
    pub opens: AtomicUsize,
    pub destroys: Arc<AtomicUsize>,
    pub source_active: Arc<AtomicBool>,
    pub fail_opens: AtomicBool,
    pub last_devices: Mutex<Option<AudioDevices>>,
}

impl MockBridge {
    pub fn new() -> Self {
        Self {
            opens: AtomicUsize::new(0),
            destroys: Arc::new(AtomicUsize::new(0)),
            source_active: Arc::new(AtomicBool::new(false)),
            fail_opens: AtomicBool::new(false),
            last_devices: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        let bridge = Self::new();
        bridge.fail_opens.store(true, Ordering::SeqCst);
        bridge
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn destroy_count(&self) -> usize {
        self.destroys.load(Ordering::SeqCst)
    }

    pub fn is_source_active(&self) -> bool {
        self.source_active.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AudioBridge for MockBridge {
    async fn open(
        &self,
        _transport: &dyn TransportHandle,
        devices: &AudioDevices,
    ) -> Result<Box<dyn AudioStream>> {
        if self.fail_opens.load(Ordering::SeqCst) {
            bail!("no such device: {}", devices.capture_device);
        }

        self.opens.fetch_add(1, Ordering::SeqCst);
        *self.last_devices.lock().unwrap() = Some(devices.clone());

        Ok(Box::new(MockStream {
            destroys: Arc::clone(&self.destroys),
            source_active: Arc::clone(&self.source_active),
        }))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

struct MockStream {
    destroys: Arc<AtomicUsize>,
    source_active: Arc<AtomicBool>,
}

impl AudioStream for MockStream {
    fn start_source(&mut self) {
        self.source_active.store(true, Ordering::SeqCst);
    }

    fn stop_source(&mut self) {
        self.source_active.store(false, Ordering::SeqCst);
    }

    fn is_source_active(&self) -> bool {
        self.source_active.load(Ordering::SeqCst)
    }

    fn destroy(self: Box<Self>) {
        self.source_active.store(false, Ordering::SeqCst);
        self.destroys.fetch_add(1, Ordering::SeqCst);
    }
}

/// Log output captured from the thread-local default subscriber
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Capture INFO-and-above events on the current thread until the guard drops.
///
/// Only works with the current-thread runtime `#[tokio::test]` uses by default.
pub fn capture_logs() -> (tracing::subscriber::DefaultGuard, LogBuffer) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .with_writer(move || writer.clone())
        .finish();

    (tracing::subscriber::set_default(subscriber), buffer)
}
