//! Indicator study sample model.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

/// One sample from an indicator study attached to a chart series.
///
/// Values are keyed by the study's field names; fields the study did
/// not emit in this sample are simply missing from the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSample {
    /// Symbol the study is attached to, `EXCHANGE:TICKER`.
    pub symbol: String,
    /// Remote study identifier, e.g. `"STD;RSI"`.
    pub indicator_id: String,
    pub indicator_version: String,
    pub values: BTreeMap<String, Decimal>,
}
