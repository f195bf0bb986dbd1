//! Async client library for real-time market data over a framed
//! WebSocket chart protocol.
//!
//! Provides the wire codec, session negotiation, message dispatch into
//! typed events (OHLCV bars, quote ticks, trade prints, indicator
//! samples), timeframe re-aggregation, and a pull-based streaming
//! façade ([`Streamer`]).

pub mod aggregate;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod export;
pub mod models;
pub mod protocol;
pub mod session;
pub mod streamer;
pub mod timeframe;
pub mod validate;

pub use dispatch::{ControlMessage, FeedEvent};
pub use error::{MarketwireError, Result};
pub use models::{IndicatorSpec, StreamConfig, Symbol};
pub use streamer::Streamer;
