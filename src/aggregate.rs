//! Deterministic re-bucketing of OHLCV bars into a coarser timeframe.
//!
//! The converter groups bars by `floor(timestamp / bucket_seconds)` and
//! folds each bucket into one bar: first open, last close, max high,
//! min low, summed volume. Converting to the source timeframe is the
//! identity transform up to re-indexing.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::Result;
use crate::error::MarketwireError;
use crate::models::ohlcv::OhlcvBar;

/// Supported conversion targets and their minute equivalents.
///
/// The month entry uses 30 days; the bucketing rule is the same for
/// every entry, only the width differs.
const TIMEFRAMES: &[(&str, u64)] = &[
    ("1m", 1),
    ("5m", 5),
    ("15m", 15),
    ("30m", 30),
    ("1h", 60),
    ("2h", 120),
    ("4h", 240),
    ("1d", 1440),
    ("1w", 10080),
    ("1M", 43200),
];

/// Converts bar sequences to a fixed coarser timeframe.
#[derive(Debug, Clone)]
pub struct OhlcvConverter {
    target_timeframe: String,
    bucket_seconds: i64,
}

impl OhlcvConverter {
    /// Resolves the target against the supported table.
    ///
    /// # Errors
    ///
    /// Returns [`MarketwireError::Configuration`] when the target is not
    /// in the table; this fails at construction, never at use.
    pub fn new(target_timeframe: &str) -> Result<Self> {
        let minutes = TIMEFRAMES
            .iter()
            .find(|(name, _)| *name == target_timeframe)
            .map(|(_, minutes)| *minutes)
            .ok_or_else(|| {
                let supported: Vec<&str> = TIMEFRAMES.iter().map(|(name, _)| *name).collect();
                MarketwireError::Configuration(format!(
                    "invalid timeframe '{target_timeframe}'. Supported: {}",
                    supported.join(", ")
                ))
            })?;

        Ok(Self {
            target_timeframe: target_timeframe.to_string(),
            bucket_seconds: (minutes * 60) as i64,
        })
    }

    /// The timeframe this converter aggregates to.
    #[must_use]
    pub fn target_timeframe(&self) -> &str {
        &self.target_timeframe
    }

    /// Re-buckets `bars` into the target timeframe.
    ///
    /// Input is stable-sorted by timestamp first, so ties keep their
    /// arrival order; output is one bar per non-empty bucket, ascending
    /// by bucket key, with freshly assigned sequential indices.
    ///
    /// # Errors
    ///
    /// Returns [`MarketwireError::Configuration`] for empty input:
    /// aggregation is only meaningful over at least one bar.
    pub fn convert(&self, bars: &[OhlcvBar]) -> Result<Vec<OhlcvBar>> {
        if bars.is_empty() {
            return Err(MarketwireError::Configuration(
                "cannot convert empty data".into(),
            ));
        }

        let mut sorted: Vec<&OhlcvBar> = bars.iter().collect();
        sorted.sort_by_key(|bar| bar.timestamp);

        let mut buckets: BTreeMap<i64, Vec<&OhlcvBar>> = BTreeMap::new();
        for bar in sorted {
            let key = bar.timestamp.div_euclid(self.bucket_seconds) * self.bucket_seconds;
            buckets.entry(key).or_default().push(bar);
        }

        let converted = buckets
            .into_iter()
            .enumerate()
            .map(|(index, (bucket_start, group))| OhlcvBar {
                index: index as i64,
                timestamp: bucket_start,
                open: group[0].open,
                close: group[group.len() - 1].close,
                high: group.iter().map(|bar| bar.high).max().unwrap_or_default(),
                low: group.iter().map(|bar| bar.low).min().unwrap_or_default(),
                volume: group.iter().map(|bar| bar.volume).sum::<Decimal>(),
            })
            .collect();

        Ok(converted)
    }
}
