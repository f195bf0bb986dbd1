//! Shared domain models for the streaming client.
//!
//! Contains the symbol and configuration types plus the typed events
//! produced by the dispatcher (bars, quote ticks, trades, indicator
//! samples) and the live stream statistics.

pub mod indicator;
pub mod ohlcv;
pub mod quote;
pub mod trade;

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::error::MarketwireError;

/// Quote fields requested via `quote_set_fields` during negotiation.
pub const QUOTE_FIELDS: &[&str] = &[
    "ch",
    "chp",
    "current_session",
    "description",
    "local_description",
    "language",
    "exchange",
    "fractional",
    "is_tradable",
    "lp",
    "lp_time",
    "minmov",
    "minmove2",
    "original_name",
    "pricescale",
    "pro_name",
    "short_name",
    "type",
    "update_mode",
    "volume",
    "currency_code",
    "rchp",
    "rtc",
];

/// A market symbol in canonical `EXCHANGE:TICKER` form.
///
/// Case-sensitive as supplied by the caller; both sides must be
/// non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    exchange: String,
    ticker: String,
}

impl Symbol {
    #[must_use]
    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    #[must_use]
    pub fn ticker(&self) -> &str {
        &self.ticker
    }
}

impl FromStr for Symbol {
    type Err = MarketwireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(2, ':');
        match (parts.next(), parts.next()) {
            (Some(exchange), Some(ticker)) if !exchange.is_empty() && !ticker.is_empty() => {
                Ok(Self {
                    exchange: exchange.to_string(),
                    ticker: ticker.to_string(),
                })
            }
            _ => Err(MarketwireError::Configuration(format!(
                "invalid symbol format '{s}': must be like 'BINANCE:BTCUSDT'"
            ))),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.exchange, self.ticker)
    }
}

/// An indicator study to attach to each symbol's chart series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorSpec {
    /// Remote study identifier, e.g. `"STD;RSI"`.
    pub id: String,
    /// Study script version.
    pub version: String,
}

/// Stream configuration supplied at construction and validated before
/// any I/O.
///
/// Symbols keep their insertion order; after validation the list may be
/// pruned to the valid subset, which is the only mutation a running
/// stream ever applies.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub symbols: Vec<Symbol>,
    /// Source timeframe in the wire grammar (`"1"`, `"1H"`, `"D"`, ...).
    pub timeframe: String,
    /// Number of historical bars requested per series.
    pub num_bars: u32,
    pub indicator: Option<IndicatorSpec>,
    /// Target timeframe for re-aggregation, from the converter table
    /// (`"5m"`, `"1h"`, ...). `None` streams bars as delivered.
    pub aggregate_to: Option<String>,
    pub export: Option<crate::export::ExportPolicy>,
}

impl StreamConfig {
    /// A minimal configuration streaming one-minute bars.
    #[must_use]
    pub fn new(symbols: Vec<Symbol>, timeframe: impl Into<String>, num_bars: u32) -> Self {
        Self {
            symbols,
            timeframe: timeframe.into(),
            num_bars,
            indicator: None,
            aggregate_to: None,
            export: None,
        }
    }
}

/// Connection state as seen by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connected,
}

/// Mutable stream counters, owned exclusively by the orchestrator and
/// read-only to callers via [`StatisticsSnapshot`].
#[derive(Debug, Default)]
pub struct StreamStatistics {
    total_responses: u64,
    started_at: Option<Instant>,
    status: ConnectionStatus,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::Disconnected
    }
}

impl StreamStatistics {
    pub(crate) fn mark_connected(&mut self) {
        self.started_at = Some(Instant::now());
        self.status = ConnectionStatus::Connected;
    }

    pub(crate) fn mark_disconnected(&mut self) {
        self.status = ConnectionStatus::Disconnected;
    }

    pub(crate) fn record_response(&mut self) {
        self.total_responses += 1;
    }

    /// Point-in-time view of the counters.
    #[must_use]
    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            total_responses: self.total_responses,
            session_duration: self.started_at.map(|t| t.elapsed()),
            connection_status: self.status,
        }
    }
}

/// Read-only statistics returned to callers.
///
/// `session_duration` is `None` before the first successful connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatisticsSnapshot {
    pub total_responses: u64,
    pub session_duration: Option<Duration>,
    pub connection_status: ConnectionStatus,
}
