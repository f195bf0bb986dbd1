//! OHLCV bar model.

use rust_decimal::Decimal;
use serde::Serialize;

/// One OHLCV candle.
///
/// Invariants under normal operation: `low <= open, close <= high` and
/// `volume >= 0`. Timestamps are non-decreasing within one symbol's
/// stream; out-of-order bars are accepted as delivered and only the
/// aggregator re-orders, inside its own bucketing pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OhlcvBar {
    /// Position within the series as assigned by the producer.
    pub index: i64,
    /// Bar open time, epoch seconds.
    pub timestamp: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}
