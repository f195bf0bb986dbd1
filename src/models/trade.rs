//! Trade print model.

use rust_decimal::Decimal;
use serde::Serialize;

/// A bare trade print: a price update carrying no change statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeEvent {
    /// Symbol as named on the wire, `EXCHANGE:TICKER`.
    pub symbol: String,
    pub price: Decimal,
    pub volume: Option<Decimal>,
    /// Trade time, epoch seconds, when the wire carried one.
    pub timestamp: Option<i64>,
}
