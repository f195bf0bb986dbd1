//! Quote tick model.

use rust_decimal::Decimal;
use serde::Serialize;

/// A last-price update from the quote session.
///
/// Optional fields are absent when the wire omitted them, never
/// defaulted to zero, so "unknown" stays distinguishable from "zero".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteTick {
    /// Symbol as named on the wire, `EXCHANGE:TICKER`.
    pub symbol: String,
    /// Last traded price (`lp`).
    pub price: Decimal,
    /// Absolute change since the previous close (`ch`).
    pub change: Option<Decimal>,
    /// Percent change since the previous close (`chp`).
    pub change_percent: Option<Decimal>,
    pub volume: Option<Decimal>,
    /// Last trade time, epoch seconds (`lp_time`).
    pub timestamp: Option<i64>,
}
