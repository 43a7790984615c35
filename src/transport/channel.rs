use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::StreamExt;
use futures::SinkExt;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};
use url::Url;

use super::messages::{ClientMessage, ServerMessage};
use crate::error::TransportError;

type WsSink = futures::stream::SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;

/// Inbound event from the channel, delivered in arrival order.
#[derive(Debug)]
pub enum TransportEvent {
    /// A parsed control message.
    Message(ServerMessage),
    /// The channel went Open -> Closed; all in-flight state on the wire is
    /// lost and sends become silent no-ops.
    Closed,
}

/// One duplex connection to the ingestion endpoint.
///
/// Sends while the channel is not Open are dropped, not queued: the wire has
/// at-most-effort delivery and nothing here buffers for resend.
#[async_trait]
pub trait TransportChannel: Send + Sync {
    async fn send_control(&self, message: &ClientMessage);
    async fn send_audio(&self, chunk: Vec<u8>);
    fn is_open(&self) -> bool;
    /// Idempotent.
    async fn close(&self);
}

/// An established connection: the channel plus its inbound event stream.
pub struct Connection {
    pub channel: Box<dyn TransportChannel>,
    pub events: mpsc::Receiver<TransportEvent>,
}

/// Creates one connection per call. Reconnection is a fresh `connect` by the
/// owner; there is no automatic retry.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn connect(&self, user_id: &str) -> Result<Connection, TransportError>;
}

/// Whether an endpoint qualifies as a secure context for capture:
/// TLS (`wss`) anywhere, or any scheme on localhost.
pub fn is_secure_endpoint(url: &Url) -> bool {
    if url.scheme() == "wss" {
        return true;
    }
    matches!(
        url.host_str(),
        Some("localhost") | Some("127.0.0.1") | Some("[::1]") | Some("::1")
    )
}

/// WebSocket transport against the configured ingestion endpoint.
pub struct WebSocketFactory {
    endpoint: String,
}

impl WebSocketFactory {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    /// Session URL: the configured endpoint with the authenticated user
    /// identity appended as a `user_id` query parameter. No bearer token is
    /// carried on this channel.
    pub fn session_url(&self, user_id: &str) -> Result<Url, TransportError> {
        let mut url = Url::parse(&self.endpoint).map_err(|e| TransportError::InvalidEndpoint {
            url: self.endpoint.clone(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut().append_pair("user_id", user_id);
        Ok(url)
    }
}

#[async_trait]
impl TransportFactory for WebSocketFactory {
    async fn connect(&self, user_id: &str) -> Result<Connection, TransportError> {
        let url = self.session_url(user_id)?;
        info!("Connecting to ingestion endpoint at {}", self.endpoint);

        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        info!("Ingestion channel open");

        let (ws_write, mut ws_read) = ws_stream.split();
        let open = Arc::new(AtomicBool::new(true));
        let (event_tx, event_rx) = mpsc::channel(64);

        // Reader task: parse control messages, surface the close. The
        // receiver side dropping ends the task early.
        let reader_open = Arc::clone(&open);
        tokio::spawn(async move {
            loop {
                match ws_read.next().await {
                    Some(Ok(WsMessage::Text(text))) => {
                        match serde_json::from_str::<ServerMessage>(&text) {
                            Ok(message) => {
                                if event_tx
                                    .send(TransportEvent::Message(message))
                                    .await
                                    .is_err()
                                {
                                    break;
                                }
                            }
                            // Unknown shapes are ignored (forward-compatible)
                            Err(e) => debug!("Ignoring unparseable control message: {}", e),
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => {} // ping/pong handled by tungstenite; binary unexpected
                    Some(Err(e)) => {
                        warn!("Ingestion channel error: {}", e);
                        break;
                    }
                }
            }
            reader_open.store(false, Ordering::SeqCst);
            let _ = event_tx.send(TransportEvent::Closed).await;
            debug!("Ingestion channel reader stopped");
        });

        let channel = WebSocketChannel {
            sink: Mutex::new(ws_write),
            open,
        };

        Ok(Connection {
            channel: Box::new(channel),
            events: event_rx,
        })
    }
}

struct WebSocketChannel {
    sink: Mutex<WsSink>,
    open: Arc<AtomicBool>,
}

impl WebSocketChannel {
    async fn send(&self, message: WsMessage) {
        if !self.is_open() {
            trace!("Dropping send; channel not open");
            return;
        }
        let mut sink = self.sink.lock().await;
        if let Err(e) = sink.send(message).await {
            debug!("Send failed, marking channel closed: {}", e);
            self.open.store(false, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl TransportChannel for WebSocketChannel {
    async fn send_control(&self, message: &ClientMessage) {
        match serde_json::to_string(message) {
            Ok(json) => self.send(WsMessage::Text(json)).await,
            Err(e) => warn!("Failed to encode control message: {}", e),
        }
    }

    async fn send_audio(&self, chunk: Vec<u8>) {
        self.send(WsMessage::Binary(chunk)).await;
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            info!("Closing ingestion channel");
            let mut sink = self.sink.lock().await;
            let _ = sink.close().await;
        }
    }
}
