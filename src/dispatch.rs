//! Classification of raw frames into typed domain events.
//!
//! The wire format is undocumented and evolves, so the dispatcher is
//! deliberately forgiving: recognized methods get a validating parse,
//! everything else becomes [`FeedEvent::Unknown`] at debug level, and a
//! malformed entry inside an otherwise good frame is skipped rather
//! than failing the frame. Nothing in this module returns an error to
//! the stream.

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::Symbol;
use crate::models::indicator::IndicatorSample;
use crate::models::ohlcv::OhlcvBar;
use crate::models::quote::QuoteTick;
use crate::models::trade::TradeEvent;
use crate::protocol::RawFrame;
use crate::session::SessionRegistry;

/// A typed event surfaced by the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// One or more bars from a chart series.
    Ohlcv { symbol: Symbol, bars: Vec<OhlcvBar> },
    /// A quote update carrying change statistics.
    Quote(QuoteTick),
    /// A bare trade print (price/volume only).
    Trade(TradeEvent),
    /// A sample from an attached indicator study.
    Indicator(IndicatorSample),
    /// A protocol control message carrying no market data.
    Control(ControlMessage),
    /// Anything unrecognized or unparseable; dropped by the stream.
    Unknown,
}

/// Control messages the dispatcher surfaces for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    /// The quote session for a symbol is fully initialized.
    QuoteCompleted { symbol: String },
}

/// Routes a decoded frame to the parser for its method.
///
/// A single frame can multiplex containers for several bound series, so
/// the result is a list: one event per container that carried data.
/// Unrecognized or unparseable frames yield a single
/// [`FeedEvent::Unknown`].
#[must_use]
pub fn dispatch(frame: &RawFrame, registry: &SessionRegistry) -> Vec<FeedEvent> {
    match frame.method.as_str() {
        "timescale_update" | "du" => parse_series_update(&frame.params, registry),
        "qsd" => vec![parse_quote_data(&frame.params)],
        "quote_completed" => vec![parse_quote_completed(&frame.params)],
        other => {
            debug!(method = other, "Dropping unrecognized frame");
            vec![FeedEvent::Unknown]
        }
    }
}

/// Parses a `timescale_update`/`du` payload.
///
/// `params[1]` is a map keyed by internal series or study ids. A series
/// container holds `{"s": [{"i": index, "v": [ts, o, h, l, c, vol]}]}`;
/// a study container holds `{"st": {field: value}}`. Every bound
/// container contributes its own event; containers keyed by an id the
/// registry does not know are skipped.
fn parse_series_update(params: &[Value], registry: &SessionRegistry) -> Vec<FeedEvent> {
    let Some(containers) = params.get(1).and_then(Value::as_object) else {
        debug!("Series update without container map");
        return vec![FeedEvent::Unknown];
    };

    let mut events = Vec::new();
    for (key, container) in containers {
        if let Some(symbol) = registry.symbol_for_series(key) {
            let bars = parse_bars(container);
            if bars.is_empty() {
                continue;
            }
            events.push(FeedEvent::Ohlcv {
                symbol: symbol.clone(),
                bars,
            });
            continue;
        }

        if let Some((symbol, indicator)) = registry.study_for_id(key) {
            if let Some(values) = container.get("st").and_then(Value::as_object) {
                let values: std::collections::BTreeMap<String, Decimal> = values
                    .iter()
                    .filter_map(|(name, value)| Some((name.clone(), to_decimal(value)?)))
                    .collect();
                if values.is_empty() {
                    continue;
                }
                events.push(FeedEvent::Indicator(IndicatorSample {
                    symbol: symbol.to_string(),
                    indicator_id: indicator.id.clone(),
                    indicator_version: indicator.version.clone(),
                    values,
                }));
            }
        }
    }

    if events.is_empty() {
        return vec![FeedEvent::Unknown];
    }
    events
}

/// Extracts bars from a series container's `s` list.
///
/// Entries whose `v` array has fewer than six values carry insufficient
/// data and are skipped; their siblings still produce bars.
fn parse_bars(container: &Value) -> Vec<OhlcvBar> {
    let Some(entries) = container.get("s").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut bars = Vec::with_capacity(entries.len());
    for entry in entries {
        let values = match entry.get("v").and_then(Value::as_array) {
            Some(v) if v.len() >= 6 => v,
            Some(v) => {
                warn!(len = v.len(), "Skipping bar entry with insufficient values");
                continue;
            }
            None => continue,
        };

        let parsed = (|| {
            Some(OhlcvBar {
                index: entry.get("i").and_then(Value::as_i64).unwrap_or(0),
                timestamp: to_epoch(&values[0])?,
                open: to_decimal(&values[1])?,
                high: to_decimal(&values[2])?,
                low: to_decimal(&values[3])?,
                close: to_decimal(&values[4])?,
                volume: to_decimal(&values[5])?,
            })
        })();

        match parsed {
            Some(bar) => bars.push(bar),
            None => warn!("Skipping bar entry with non-numeric values"),
        }
    }

    bars
}

/// Parses a `qsd` payload: `params[1]` is `{"n": symbol, "v": fields}`.
///
/// A value map carrying only the trade-print fields (`lp`, `volume`,
/// `lp_time`) classifies as a trade; one with change statistics is a
/// full quote. Missing optional fields stay absent, never zero.
fn parse_quote_data(params: &[Value]) -> FeedEvent {
    let Some(payload) = params.get(1).and_then(Value::as_object) else {
        debug!("Quote frame without payload map");
        return FeedEvent::Unknown;
    };
    let Some(symbol) = payload.get("n").and_then(Value::as_str) else {
        debug!("Quote frame without symbol name");
        return FeedEvent::Unknown;
    };
    let Some(fields) = payload.get("v").and_then(Value::as_object) else {
        debug!(symbol, "Quote frame without value map");
        return FeedEvent::Unknown;
    };

    let Some(price) = fields.get("lp").and_then(to_decimal) else {
        debug!(symbol, "Quote frame without last price");
        return FeedEvent::Unknown;
    };
    let change = fields.get("ch").and_then(to_decimal);
    let change_percent = fields.get("chp").and_then(to_decimal);
    let volume = fields.get("volume").and_then(to_decimal);
    let timestamp = fields.get("lp_time").and_then(to_epoch);

    if change.is_none() && change_percent.is_none() {
        return FeedEvent::Trade(TradeEvent {
            symbol: symbol.to_string(),
            price,
            volume,
            timestamp,
        });
    }

    FeedEvent::Quote(QuoteTick {
        symbol: symbol.to_string(),
        price,
        change,
        change_percent,
        volume,
        timestamp,
    })
}

fn parse_quote_completed(params: &[Value]) -> FeedEvent {
    let symbol = params
        .get(1)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    debug!(symbol, "Quote session completed");
    FeedEvent::Control(ControlMessage::QuoteCompleted { symbol })
}

/// Converts a JSON number (or numeric string) to a `Decimal`.
fn to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(Decimal::from(i));
            }
            n.as_f64().and_then(|f| Decimal::try_from(f).ok())
        }
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn to_epoch(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
}
