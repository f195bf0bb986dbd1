//! Top-level streaming façade.
//!
//! [`Streamer`] wires the pieces together: it validates configuration
//! before any I/O, drives session negotiation over the connection
//! manager, classifies incoming frames, optionally re-buckets bars into
//! a coarser timeframe, forwards bar batches to an export sink, and
//! keeps live statistics plus a latest-bar cache per symbol.
//!
//! One logical stream per instance: a single task owns the socket and
//! the decode/dispatch loop, so no internal locking is needed.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use serde_json::json;
use tracing::{error, info, warn};

use crate::Result;
use crate::aggregate::OhlcvConverter;
use crate::config;
use crate::connection::{ConnectionManager, default_headers};
use crate::dispatch::{self, FeedEvent};
use crate::error::MarketwireError;
use crate::export::{ExportRecord, ExportSink};
use crate::models::ohlcv::OhlcvBar;
use crate::models::{QUOTE_FIELDS, StatisticsSnapshot, StreamConfig, StreamStatistics, Symbol};
use crate::session::{Session, SessionRegistry};
use crate::timeframe;
use crate::validate::SymbolValidator;

/// Async-first real-time data streamer.
///
/// ```no_run
/// use marketwire::{StreamConfig, Streamer};
///
/// # async fn run() -> marketwire::Result<()> {
/// let config = StreamConfig::new(
///     vec!["BINANCE:BTCUSDT".parse()?],
///     "1",
///     50,
/// );
/// let mut streamer = Streamer::with_http_validator(config)?;
/// streamer.connect().await?;
/// while let Ok(event) = streamer.next_event().await {
///     println!("{event:?}");
/// }
/// streamer.disconnect().await;
/// # Ok(())
/// # }
/// ```
pub struct Streamer {
    config: StreamConfig,
    websocket_url: String,
    auth_token: String,
    validator: Box<dyn SymbolValidator>,
    sink: Option<Box<dyn ExportSink>>,
    connection: ConnectionManager,
    registry: SessionRegistry,
    session: Option<Session>,
    converter: Option<OhlcvConverter>,
    statistics: StreamStatistics,
    latest: HashMap<Symbol, OhlcvBar>,
    pending_events: VecDeque<FeedEvent>,
    connected: bool,
}

impl fmt::Debug for Streamer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Streamer")
            .field("config", &self.config)
            .field("websocket_url", &self.websocket_url)
            .field("session", &self.session)
            .field("connected", &self.connected)
            .finish_non_exhaustive()
    }
}

impl Streamer {
    /// Validates the configuration and builds a streamer with the given
    /// symbol validator. No I/O happens until [`connect`](Self::connect).
    ///
    /// # Errors
    ///
    /// Returns [`MarketwireError::Configuration`] for an empty symbol
    /// list, a timeframe outside the accepted grammar, a zero history
    /// length, or an unsupported aggregation target.
    pub fn new(config: StreamConfig, validator: Box<dyn SymbolValidator>) -> Result<Self> {
        if config.symbols.is_empty() {
            return Err(MarketwireError::Configuration(
                "at least one symbol is required".into(),
            ));
        }
        timeframe::validate(&config.timeframe)?;
        if config.num_bars == 0 {
            return Err(MarketwireError::Configuration(
                "history length must be positive".into(),
            ));
        }
        let converter = config
            .aggregate_to
            .as_deref()
            .map(OhlcvConverter::new)
            .transpose()?;

        let app = config::fetch_config();
        Ok(Self {
            config,
            websocket_url: app.websocket_url,
            auth_token: app.auth_token,
            validator,
            sink: None,
            connection: ConnectionManager::new(),
            registry: SessionRegistry::new(),
            session: None,
            converter,
            statistics: StreamStatistics::default(),
            latest: HashMap::new(),
            pending_events: VecDeque::new(),
            connected: false,
        })
    }

    /// Builds a streamer backed by the default HTTP symbol validator.
    ///
    /// # Errors
    ///
    /// Configuration errors as for [`new`](Self::new), plus
    /// [`MarketwireError::Http`] if the validator's client cannot be
    /// built.
    pub fn with_http_validator(config: StreamConfig) -> Result<Self> {
        let validator = crate::validate::HttpSymbolValidator::new()?;
        Self::new(config, Box::new(validator))
    }

    /// Overrides the websocket endpoint.
    #[must_use]
    pub fn with_websocket_url(mut self, url: impl Into<String>) -> Self {
        self.websocket_url = url.into();
        self
    }

    /// Overrides the auth token sent during negotiation.
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = token.into();
        self
    }

    /// Plugs in an export sink for decoded bar batches.
    #[must_use]
    pub fn with_export_sink(mut self, sink: Box<dyn ExportSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// The effective configuration; symbols may have been pruned to the
    /// validated subset after [`connect`](Self::connect).
    #[must_use]
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// The current session, if connected.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Validates symbols, opens the socket, and negotiates the
    /// subscription sessions.
    ///
    /// Validation runs first: if every symbol is rejected this returns
    /// [`MarketwireError::SymbolValidation`] without attempting any
    /// socket connection; a partially valid batch proceeds with the
    /// valid subset and logs the rest as dropped.
    ///
    /// # Errors
    ///
    /// [`MarketwireError::SymbolValidation`] when no symbol survives,
    /// [`MarketwireError::Connection`] when the socket cannot be opened,
    /// [`MarketwireError::Session`] when negotiation fails.
    pub async fn connect(&mut self) -> Result<()> {
        info!(count = self.config.symbols.len(), "Validating symbols");
        let valid = self.validator.validate(&self.config.symbols).await?;
        if valid.is_empty() {
            return Err(MarketwireError::SymbolValidation(
                "all requested symbols failed validation".into(),
            ));
        }
        if valid.len() < self.config.symbols.len() {
            for symbol in &self.config.symbols {
                if !valid.contains(symbol) {
                    warn!(%symbol, "Dropping symbol rejected by validation");
                }
            }
            self.config.symbols = valid;
        }

        self.connection
            .connect(&self.websocket_url, &default_headers())
            .await?;

        self.pending_events.clear();
        self.registry.clear();
        let session = self.registry.new_session();
        if let Err(e) = self.negotiate(&session).await {
            // Negotiation left the socket in an unknown state.
            self.connection.disconnect().await;
            return Err(e);
        }

        info!(
            quote_session = %session.quote_session,
            chart_session = %session.chart_session,
            "Session initialized"
        );
        self.session = Some(session);
        self.statistics.mark_connected();
        self.connected = true;

        Ok(())
    }

    /// Sends the full negotiation sequence for the validated symbols.
    async fn negotiate(&mut self, session: &Session) -> Result<()> {
        let qs = session.quote_session.as_str();
        let cs = session.chart_session.as_str();

        self.connection
            .send("set_auth_token", &[json!(self.auth_token)])
            .await?;
        self.connection
            .send("set_locale", &[json!("en"), json!("US")])
            .await?;
        self.connection
            .send("chart_create_session", &[json!(cs), json!("")])
            .await?;
        self.connection
            .send("quote_create_session", &[json!(qs)])
            .await?;

        let mut fields = vec![json!(qs)];
        fields.extend(QUOTE_FIELDS.iter().map(|f| json!(f)));
        self.connection.send("quote_set_fields", &fields).await?;

        for symbol in self.config.symbols.clone() {
            let handle = self.registry.bind_symbol(&symbol);
            let resolve = json!({"adjustment": "splits", "symbol": symbol.to_string()}).to_string();

            self.connection
                .send(
                    "quote_add_symbols",
                    &[json!(qs), json!(format!("={resolve}"))],
                )
                .await?;
            self.connection
                .send(
                    "resolve_symbol",
                    &[json!(cs), json!(handle.symbol_id), json!(format!("={resolve}"))],
                )
                .await?;
            self.connection
                .send(
                    "create_series",
                    &[
                        json!(cs),
                        json!(handle.series_id),
                        json!(handle.turnaround),
                        json!(handle.symbol_id),
                        json!(self.config.timeframe),
                        json!(self.config.num_bars),
                        json!(""),
                    ],
                )
                .await?;
            self.connection
                .send(
                    "quote_fast_symbols",
                    &[json!(qs), json!(symbol.to_string())],
                )
                .await?;

            if let Some(indicator) = self.config.indicator.clone() {
                let study = self.registry.bind_study(&symbol, &indicator);
                self.connection
                    .send(
                        "create_study",
                        &[
                            json!(cs),
                            json!(study.study_id),
                            json!(study.study_id),
                            json!(handle.series_id),
                            json!(indicator.id),
                            json!(indicator.version),
                            json!({}),
                        ],
                    )
                    .await?;
            }
        }

        self.connection
            .send("quote_hibernate_all", &[json!(qs)])
            .await?;

        Ok(())
    }

    /// Pulls the next typed event from the live stream.
    ///
    /// Unknown frames are consumed silently; heartbeats never reach this
    /// level. A frame multiplexing several series yields its events one
    /// per call, in container order. Bar batches are re-bucketed through
    /// the configured aggregation target and forwarded to the export
    /// sink before being yielded; each batch is re-bucketed on its own,
    /// so a live bucket's totals cover only the bars delivered in that
    /// batch, not a running total for the bucket. A fatal transport
    /// error ends the stream and marks the streamer disconnected.
    ///
    /// # Errors
    ///
    /// [`MarketwireError::Streaming`] before a successful connect;
    /// [`MarketwireError::Connection`] when the transport fails.
    pub async fn next_event(&mut self) -> Result<FeedEvent> {
        if !self.connected {
            return Err(MarketwireError::Streaming("Not connected".into()));
        }

        loop {
            while let Some(event) = self.pending_events.pop_front() {
                match event {
                    FeedEvent::Unknown => {}
                    FeedEvent::Ohlcv { symbol, bars } => {
                        self.statistics.record_response();
                        let bars = match &self.converter {
                            Some(converter) => converter.convert(&bars)?,
                            None => bars,
                        };
                        if let Some(last) = bars.last() {
                            self.latest.insert(symbol.clone(), last.clone());
                        }
                        self.forward_to_sink(&symbol, &bars).await;
                        return Ok(FeedEvent::Ohlcv { symbol, bars });
                    }
                    event => {
                        self.statistics.record_response();
                        return Ok(event);
                    }
                }
            }

            let frame = match self.connection.next_frame().await {
                Ok(frame) => frame,
                Err(e) => {
                    self.connected = false;
                    self.statistics.mark_disconnected();
                    return Err(e);
                }
            };
            self.pending_events
                .extend(dispatch::dispatch(&frame, &self.registry));
        }
    }

    /// Hands a bar batch to the export sink, if one is configured.
    ///
    /// Sink failures are reported in the log and never interrupt the
    /// live stream.
    async fn forward_to_sink(&self, symbol: &Symbol, bars: &[OhlcvBar]) {
        let (Some(sink), Some(policy)) = (self.sink.as_ref(), self.config.export.as_ref()) else {
            return;
        };

        let timeframe = self
            .config
            .aggregate_to
            .as_deref()
            .unwrap_or(&self.config.timeframe);
        let records: Vec<ExportRecord> = bars
            .iter()
            .map(|bar| ExportRecord::from_bar(symbol, timeframe, bar))
            .collect();

        if let Err(e) = sink
            .write(&records, &policy.destination, policy.format)
            .await
        {
            error!(%symbol, "Export failed: {e}");
        }
    }

    /// Tears down the connection and clears session state. Safe to call
    /// multiple times.
    pub async fn disconnect(&mut self) {
        self.connection.disconnect().await;
        self.pending_events.clear();
        self.registry.clear();
        self.session = None;
        self.connected = false;
        self.statistics.mark_disconnected();
    }

    /// Point-in-time stream statistics.
    #[must_use]
    pub fn statistics(&self) -> StatisticsSnapshot {
        self.statistics.snapshot()
    }

    /// The most recent bar seen for a symbol, if any data has arrived.
    #[must_use]
    pub fn latest_bar(&self, symbol: &Symbol) -> Option<&OhlcvBar> {
        self.latest.get(symbol)
    }
}
