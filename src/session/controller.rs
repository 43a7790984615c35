use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use super::config::SessionConfig;
use super::observers::{ObserverRegistry, Subscription};
use super::state::{format_duration, ErrorInfo, SessionState};
use crate::capture::{AudioChunk, CaptureFactory};
use crate::error::{SessionError, TransportError};
use crate::transport::{
    ClientMessage, Connection, ServerMessage, TransportChannel, TransportEvent, TransportFactory,
};

/// Lifecycle phase of the controller. `Idle` is initial; there is no
/// terminal phase while the controller is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Connecting,
    Ready,
    Recording,
}

/// The recording session controller.
///
/// Owns the one capture device binding and the one transport channel,
/// mediates between them, and publishes a full immutable snapshot to every
/// subscriber on each state change. Commands come from observers (UI, HTTP
/// handlers); events come from the transport, the capture device, and the
/// elapsed-time ticker.
///
/// The local transition into recording is deliberately optimistic: it does
/// not wait for the server's `recording_started` confirmation, which is
/// advisory only.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Mutex<Inner>>,
    observers: ObserverRegistry,
    config: Arc<SessionConfig>,
    capture_factory: Arc<dyn CaptureFactory>,
    transport_factory: Arc<dyn TransportFactory>,
}

struct Inner {
    state: SessionState,
    phase: Phase,
    /// Supersede counter: bumped by `disconnect`/`destroy`. In-flight
    /// continuations and spawned tasks compare their captured value against
    /// this before mutating state, and bow out (releasing anything they
    /// acquired) when it moved on.
    epoch: u64,
    transport: Option<Arc<dyn TransportChannel>>,
    capture: Option<Box<dyn crate::capture::CaptureDevice>>,
    inbound_task: Option<JoinHandle<()>>,
    pump_task: Option<JoinHandle<()>>,
    ticker_task: Option<JoinHandle<()>>,
    started_at: Option<chrono::DateTime<Utc>>,
}

impl SessionController {
    pub fn new(
        config: SessionConfig,
        capture_factory: Arc<dyn CaptureFactory>,
        transport_factory: Arc<dyn TransportFactory>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: SessionState::default(),
                phase: Phase::Idle,
                epoch: 0,
                transport: None,
                capture: None,
                inbound_task: None,
                pump_task: None,
                ticker_task: None,
                started_at: None,
            })),
            observers: ObserverRegistry::new(),
            config: Arc::new(config),
            capture_factory,
            transport_factory,
        }
    }

    /// Subscribe to state snapshots. Every mutation delivers the full
    /// current state to all subscribers, in subscription order.
    pub fn subscribe(
        &self,
        callback: impl Fn(&SessionState) + Send + Sync + 'static,
    ) -> Subscription {
        self.observers.subscribe(callback)
    }

    /// Current snapshot.
    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state.clone()
    }

    /// Open the transport channel. Valid from `Idle`; a no-op when already
    /// connecting or connected. Requires a resolved identity.
    pub async fn connect(&self) -> Result<(), SessionError> {
        let identity = match &self.config.identity {
            Some(identity) => identity.clone(),
            None => {
                self.surface_unauthenticated().await;
                return Err(SessionError::Unauthenticated);
            }
        };

        let epoch = {
            let mut inner = self.inner.lock().await;
            if inner.phase != Phase::Idle {
                return Ok(());
            }
            inner.phase = Phase::Connecting;
            inner.epoch
        };

        // The lock is released across the handshake; the epoch check below
        // discards this continuation if a disconnect won the race.
        let result = self.transport_factory.connect(&identity.user_id).await;

        let mut inner = self.inner.lock().await;
        match result {
            Ok(Connection { channel, events }) => {
                if inner.epoch != epoch {
                    channel.close().await;
                    return Ok(());
                }
                let channel: Arc<dyn TransportChannel> = Arc::from(channel);
                inner.transport = Some(channel);
                let task = tokio::spawn(run_inbound(self.clone(), events, epoch));
                if let Some(old) = inner.inbound_task.replace(task) {
                    old.abort();
                }
                inner.phase = Phase::Ready;
                inner.state.connected = true;
                inner.state.last_error = None;
                self.observers.notify(&inner.state);
                info!("Session controller ready");
                Ok(())
            }
            Err(e) => {
                if inner.epoch != epoch {
                    return Ok(());
                }
                inner.phase = Phase::Idle;
                inner.state.last_error = Some(ErrorInfo::from(&e));
                self.observers.notify(&inner.state);
                warn!("Connect failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// Begin a recording. Auto-connects first when idle. The title must be
    /// non-empty after trimming; guard rejections happen before any side
    /// effect and leave no trace in the snapshot.
    pub async fn start_recording(&self, title: &str) -> Result<(), SessionError> {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(SessionError::EmptyTitle);
        }
        let identity = match &self.config.identity {
            Some(identity) => identity.clone(),
            None => {
                self.surface_unauthenticated().await;
                return Err(SessionError::Unauthenticated);
            }
        };
        {
            let inner = self.inner.lock().await;
            if inner.phase == Phase::Recording {
                return Err(SessionError::AlreadyRecording);
            }
        }

        // Ensure the transport is open, propagating connect failures.
        let connected = self.inner.lock().await.state.connected;
        if !connected {
            self.connect().await?;
        }

        let attempt_id = Uuid::new_v4();
        info!(%attempt_id, title = %title, "Starting recording");

        let epoch = self.inner.lock().await.epoch;

        // Request device access; a capture fault leaves the transport and
        // phase untouched.
        let mut device = self.capture_factory.create();
        if let Err(e) = device.acquire().await {
            warn!(%attempt_id, "Capture access failed: {}", e);
            self.surface_capture_error(&e, epoch).await;
            return Err(e.into());
        }

        let chunks = match device.start(self.config.chunk_interval).await {
            Ok(rx) => rx,
            Err(e) => {
                warn!(%attempt_id, "Capture start failed: {}", e);
                device.stop().await;
                self.surface_capture_error(&e, epoch).await;
                return Err(e.into());
            }
        };

        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            // Superseded while acquiring; release the hardware and bow out.
            device.stop().await;
            return Ok(());
        }
        if inner.phase == Phase::Recording {
            device.stop().await;
            return Err(SessionError::AlreadyRecording);
        }
        let transport = match inner.transport.clone() {
            Some(transport) => transport,
            None => {
                device.stop().await;
                let e = TransportError::Connect(
                    "channel closed before recording could start".into(),
                );
                inner.state.last_error = Some(ErrorInfo::from(&e));
                self.observers.notify(&inner.state);
                return Err(e.into());
            }
        };

        // Announce the recording, then forward chunks as binary frames.
        transport
            .send_control(&ClientMessage::StartRecording {
                title: title.clone(),
                user_id: identity.user_id.clone(),
            })
            .await;

        let pump = tokio::spawn(run_pump(chunks, Arc::clone(&transport)));
        let ticker = tokio::spawn(run_ticker(
            Arc::clone(&self.inner),
            self.observers.clone(),
            epoch,
        ));
        if let Some(old) = inner.pump_task.replace(pump) {
            old.abort();
        }
        if let Some(old) = inner.ticker_task.replace(ticker) {
            old.abort();
        }
        inner.capture = Some(device);
        inner.started_at = Some(Utc::now());

        inner.phase = Phase::Recording;
        inner.state.recording = true;
        inner.state.elapsed_seconds = 0;
        inner.state.last_error = None;
        self.observers.notify(&inner.state);
        Ok(())
    }

    /// Stop the current recording: release the hardware, tell the server
    /// (best-effort), reset the elapsed counter, return to `Ready`.
    pub async fn stop_recording(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;
        if inner.phase != Phase::Recording {
            return Err(SessionError::NotRecording);
        }

        if let Some(mut device) = inner.capture.take() {
            device.stop().await;
        }
        if let Some(transport) = inner.transport.clone() {
            if transport.is_open() {
                transport.send_control(&ClientMessage::StopRecording).await;
            }
        }
        if let Some(task) = inner.ticker_task.take() {
            task.abort();
        }
        if let Some(task) = inner.pump_task.take() {
            task.abort();
        }
        if let Some(started_at) = inner.started_at.take() {
            let ran = Utc::now().signed_duration_since(started_at);
            info!(
                "Recording stopped after {}",
                format_duration(ran.num_seconds().max(0) as u64)
            );
        }

        inner.phase = Phase::Ready;
        inner.state.recording = false;
        inner.state.elapsed_seconds = 0;
        inner.state.last_error = None;
        self.observers.notify(&inner.state);
        Ok(())
    }

    /// Tear down unconditionally: stop capture, close the transport, cancel
    /// the ticker, reset every state field to its default.
    pub async fn disconnect(&self) {
        let mut inner = self.inner.lock().await;
        info!("Disconnecting session");
        inner.epoch += 1;
        if let Some(mut device) = inner.capture.take() {
            device.stop().await;
        }
        if let Some(transport) = inner.transport.take() {
            transport.close().await;
        }
        for task in [
            inner.inbound_task.take(),
            inner.pump_task.take(),
            inner.ticker_task.take(),
        ]
        .into_iter()
        .flatten()
        {
            task.abort();
        }
        inner.started_at = None;
        inner.phase = Phase::Idle;
        inner.state = SessionState::default();
        self.observers.notify(&inner.state);
    }

    /// `disconnect` plus dropping every observer subscription.
    pub async fn destroy(&self) {
        self.disconnect().await;
        self.observers.clear();
    }

    async fn surface_unauthenticated(&self) {
        let mut inner = self.inner.lock().await;
        inner.state.last_error = Some(ErrorInfo::unauthenticated());
        self.observers.notify(&inner.state);
    }

    async fn surface_capture_error(&self, e: &crate::error::CaptureError, epoch: u64) {
        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            return;
        }
        inner.state.last_error = Some(ErrorInfo::from(e));
        self.observers.notify(&inner.state);
    }

    async fn handle_transport_event(&self, epoch: u64, event: TransportEvent) {
        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            return;
        }
        match event {
            TransportEvent::Message(message) => match message {
                ServerMessage::SessionCreated { meeting_id } => {
                    info!("Session created: {}", meeting_id);
                    inner.state.session_id = Some(meeting_id);
                    self.observers.notify(&inner.state);
                }
                ServerMessage::RecordingStarted => {
                    debug!("Server confirmed recording start");
                }
                ServerMessage::RecordingStopped => {
                    if inner.state.recording {
                        // Server-side stop flips the flag; the capture
                        // device stays held until an explicit stop or
                        // disconnect.
                        inner.phase = Phase::Ready;
                        inner.state.recording = false;
                        self.observers.notify(&inner.state);
                    }
                }
                ServerMessage::Error { message } => {
                    warn!("Server reported error: {}", message);
                    inner.state.last_error = Some(ErrorInfo::server_reported(message));
                    // Advisory: a recording in progress keeps going.
                    self.observers.notify(&inner.state);
                }
                ServerMessage::Unknown => {
                    trace!("Ignoring unknown control message");
                }
            },
            TransportEvent::Closed => {
                if inner.state.recording {
                    warn!("Channel closed mid-recording; capture stays held until disconnect");
                }
                inner.transport = None;
                if let Some(task) = inner.ticker_task.take() {
                    task.abort();
                }
                inner.phase = Phase::Idle;
                inner.state.connected = false;
                inner.state.recording = false;
                inner.state.session_id = None;
                self.observers.notify(&inner.state);
            }
        }
    }
}

async fn run_inbound(
    controller: SessionController,
    mut events: mpsc::Receiver<TransportEvent>,
    epoch: u64,
) {
    while let Some(event) = events.recv().await {
        let closed = matches!(event, TransportEvent::Closed);
        controller.handle_transport_event(epoch, event).await;
        if closed {
            break;
        }
    }
    debug!("Inbound event task stopped");
}

async fn run_pump(mut chunks: mpsc::Receiver<AudioChunk>, transport: Arc<dyn TransportChannel>) {
    while let Some(chunk) = chunks.recv().await {
        // Only non-empty chunks go out; sends while the channel is not
        // open are dropped by the transport.
        if chunk.payload.is_empty() {
            continue;
        }
        transport.send_audio(chunk.payload).await;
    }
    debug!("Capture ended");
}

async fn run_ticker(
    inner: Arc<Mutex<Inner>>,
    observers: ObserverRegistry,
    epoch: u64,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    interval.tick().await; // the immediate first tick is not a second
    loop {
        interval.tick().await;
        let mut guard = inner.lock().await;
        if guard.epoch != epoch || !guard.state.recording {
            break;
        }
        guard.state.elapsed_seconds += 1;
        observers.notify(&guard.state);
    }
}
