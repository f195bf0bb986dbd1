//! Crate-level error types.
//!
//! [`MarketwireError`] unifies every error source (configuration, wire
//! framing, websocket transport, JSON, the validation collaborator)
//! behind a single enum so callers can match on the variant they care
//! about while still using the `?` operator for easy propagation.
//!
//! Only a few variants are fatal to a running stream: transport and
//! session failures leave the socket in an unknown state and propagate,
//! while per-frame [`DataParsing`](MarketwireError::DataParsing) errors
//! are recovered locally by the connection layer.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MarketwireError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum MarketwireError {
    /// Bad input detected before any I/O (symbols, timeframe, history
    /// length, aggregation target). Never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Transport-level failure: connect, TLS handshake, mid-stream
    /// close, or idle timeout. Fatal to the current stream; the caller
    /// may reconnect.
    #[error("connection error: {0}")]
    Connection(String),

    /// A websocket operation (connect, send, receive) failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// Negotiation or command-send failure while nominally connected.
    #[error("session error: {0}")]
    Session(String),

    /// One malformed frame segment. Recovered locally; the stream
    /// continues with the next segment.
    #[error("data parsing error: {0}")]
    DataParsing(String),

    /// Every requested symbol was rejected by the validation
    /// collaborator. Raised before streaming starts.
    #[error("symbol validation error: {0}")]
    SymbolValidation(String),

    /// The streaming API was used out of order (e.g. `next_event`
    /// before `connect`).
    #[error("streaming error: {0}")]
    Streaming(String),

    /// An export sink rejected a write. Reported to the caller without
    /// interrupting the live stream.
    #[error("export error: {0}")]
    Export(String),

    /// An operation exceeded its deadline.
    #[error("timeout: {0}")]
    Timeout(String),

    /// The remote service is rate limiting this client.
    #[error("rate limited: {0}")]
    RateLimit(String),

    /// The auth token was rejected.
    #[error("authentication error: {0}")]
    Authentication(String),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The symbol-validation HTTP request failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
