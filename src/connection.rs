//! WebSocket connection lifecycle and raw frame I/O.
//!
//! [`ConnectionManager`] owns the socket, sends framed commands, answers
//! protocol heartbeats, and exposes a pull-based supply of decoded
//! frames. It never retries or reconnects on its own: a transport
//! failure marks the manager disconnected and surfaces as a
//! [`Connection`](crate::MarketwireError::Connection) error, leaving the
//! retry policy to the caller.

use std::collections::VecDeque;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use tungstenite::Message;
use tungstenite::client::IntoClientRequest;
use tungstenite::http::{HeaderName, HeaderValue};

use crate::Result;
use crate::error::MarketwireError;
use crate::protocol::{self, RawFrame};

/// Write half of the websocket connection.
pub type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Read half of the websocket connection.
pub type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Idle timeout applied to each socket read unless overridden.
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Browser-like request headers the chart endpoint expects.
#[must_use]
pub fn default_headers() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Accept-Encoding", "gzip, deflate, br, zstd"),
        ("Accept-Language", "en-US,en;q=0.9"),
        ("Cache-Control", "no-cache"),
        ("Origin", "https://www.tradingview.com"),
        ("Pragma", "no-cache"),
        (
            "User-Agent",
            "Mozilla/5.0 (Windows NT 6.3; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/107.0.0.0 Safari/537.36",
        ),
    ]
}

/// Owns the socket and the decode side of the wire protocol.
///
/// Heartbeat frames are echoed back verbatim during reads and never
/// surface to the consumer. Dropping the manager drops the underlying
/// TCP stream, so the socket cannot leak on scope exit.
pub struct ConnectionManager {
    writer: Option<WsWriter>,
    reader: Option<WsReader>,
    pending: VecDeque<RawFrame>,
    idle_timeout: Duration,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    /// Creates a disconnected manager.
    #[must_use]
    pub fn new() -> Self {
        Self {
            writer: None,
            reader: None,
            pending: VecDeque::new(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// Overrides the per-read idle timeout.
    #[must_use]
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Returns `true` while the socket halves are held.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.writer.is_some() && self.reader.is_some()
    }

    /// Opens the socket with the given extra request headers.
    ///
    /// # Errors
    ///
    /// Returns [`MarketwireError::Connection`] if DNS, TLS, or the
    /// websocket handshake fails. Never retried internally.
    pub async fn connect(&mut self, url: &str, headers: &[(&str, &str)]) -> Result<()> {
        let mut request = url
            .into_client_request()
            .map_err(|e| MarketwireError::Connection(format!("invalid websocket url: {e}")))?;
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                MarketwireError::Connection(format!("invalid header name {name}: {e}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                MarketwireError::Connection(format!("invalid header value for {name}: {e}"))
            })?;
            request.headers_mut().insert(name, value);
        }

        let (ws_stream, _) = connect_async(request)
            .await
            .map_err(|e| MarketwireError::Connection(format!("websocket connect failed: {e}")))?;
        info!(url, "WebSocket handshake completed");

        let (writer, reader) = ws_stream.split();
        self.writer = Some(writer);
        self.reader = Some(reader);
        self.pending.clear();

        Ok(())
    }

    /// Encodes a command and writes it to the socket.
    ///
    /// # Errors
    ///
    /// Returns [`MarketwireError::Session`] when called before `connect`
    /// or after `disconnect`, or when the write itself fails.
    pub async fn send(&mut self, method: &str, params: &[Value]) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(MarketwireError::Session(
                "cannot send: not connected".into(),
            ));
        };

        let frame = protocol::encode(method, params);
        writer
            .send(Message::Text(frame.into()))
            .await
            .map_err(|e| MarketwireError::Session(format!("failed to send {method}: {e}")))?;
        debug!(method, "Sent command");

        Ok(())
    }

    /// Pulls the next decoded data frame.
    ///
    /// Heartbeats are echoed and skipped; malformed segments are logged
    /// and skipped; everything else is yielded in transport order.
    ///
    /// # Errors
    ///
    /// Returns [`MarketwireError::Session`] when not connected, and
    /// [`MarketwireError::Connection`] when the socket closes, errors,
    /// or stays silent past the idle timeout. Either transport failure
    /// marks the manager disconnected.
    pub async fn next_frame(&mut self) -> Result<RawFrame> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Ok(frame);
            }

            if self.writer.is_none() {
                return Err(MarketwireError::Session(
                    "cannot receive: not connected".into(),
                ));
            }
            let read = {
                let Some(reader) = self.reader.as_mut() else {
                    return Err(MarketwireError::Session(
                        "cannot receive: not connected".into(),
                    ));
                };
                tokio::time::timeout(self.idle_timeout, reader.next()).await
            };

            let msg = match read {
                Ok(msg) => msg,
                Err(_) => {
                    self.teardown();
                    return Err(MarketwireError::Connection(format!(
                        "no data within idle timeout of {:?}",
                        self.idle_timeout
                    )));
                }
            };

            match msg {
                Some(Ok(Message::Text(text))) => self.ingest(text.as_str()).await?,
                Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                    Ok(text) => {
                        let owned = text.to_owned();
                        self.ingest(&owned).await?;
                    }
                    Err(_) => warn!("Dropping non-UTF-8 binary message"),
                },
                Some(Ok(Message::Close(_))) | None => {
                    self.teardown();
                    return Err(MarketwireError::Connection(
                        "websocket closed by peer".into(),
                    ));
                }
                Some(Ok(_)) => {} // Ping/Pong/Frame, handled by the transport
                Some(Err(e)) => {
                    self.teardown();
                    return Err(MarketwireError::Connection(format!(
                        "websocket read failed: {e}"
                    )));
                }
            }
        }
    }

    /// Decodes one transport read, echoing heartbeats and queueing data
    /// frames. Per-segment parse failures are logged and skipped so one
    /// bad segment never kills the stream.
    async fn ingest(&mut self, raw: &str) -> Result<()> {
        if protocol::is_heartbeat(raw) {
            debug!(raw, "Echoing heartbeat");
            if let Some(writer) = self.writer.as_mut() {
                writer
                    .send(Message::Text(raw.to_owned().into()))
                    .await
                    .map_err(|e| {
                        MarketwireError::Connection(format!("heartbeat echo failed: {e}"))
                    })?;
            }
            return Ok(());
        }

        for decoded in protocol::decode(raw) {
            match decoded {
                Ok(frame) => self.pending.push_back(frame),
                Err(e) => warn!("Dropping undecodable segment: {e}"),
            }
        }

        Ok(())
    }

    /// Closes the socket. Idempotent: closing twice is a no-op.
    pub async fn disconnect(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.close().await {
                warn!("Error closing websocket: {e}");
            } else {
                info!("WebSocket connection closed");
            }
        }
        self.reader = None;
        self.pending.clear();
    }

    /// Drops the socket halves after a transport failure.
    fn teardown(&mut self) {
        self.writer = None;
        self.reader = None;
        self.pending.clear();
    }
}
