//! Export sink collaborator.
//!
//! The streaming core does not write files itself; it flattens bars
//! into [`ExportRecord`]s and hands them to whatever [`ExportSink`] the
//! caller plugged in. Sink failures surface as
//! [`Export`](crate::MarketwireError::Export) errors and are logged by
//! the orchestrator without interrupting the live stream.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::Result;
use crate::error::MarketwireError;
use crate::models::Symbol;
use crate::models::ohlcv::OhlcvBar;

/// Output formats a sink may support.
///
/// An unsupported format is a caller error at the sink, not a core
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Parquet,
}

impl ExportFormat {
    /// File extension for this format, without the dot.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Parquet => "parquet",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = MarketwireError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "parquet" => Ok(Self::Parquet),
            other => Err(MarketwireError::Configuration(format!(
                "unsupported export format '{other}': expected json, csv, or parquet"
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Where and how the orchestrator forwards bar batches.
#[derive(Debug, Clone)]
pub struct ExportPolicy {
    pub destination: PathBuf,
    pub format: ExportFormat,
}

/// One flattened bar ready for an export backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRecord {
    pub symbol: String,
    pub timeframe: String,
    pub timestamp: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl ExportRecord {
    /// Flattens a bar with its symbol and timeframe context.
    #[must_use]
    pub fn from_bar(symbol: &Symbol, timeframe: &str, bar: &OhlcvBar) -> Self {
        Self {
            symbol: symbol.to_string(),
            timeframe: timeframe.to_string(),
            timestamp: bar.timestamp,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }
}

/// A pluggable export backend (JSON/CSV/Parquet writers live outside
/// this crate).
#[async_trait]
pub trait ExportSink: Send + Sync {
    /// Writes a batch of records to the destination in the given
    /// format.
    ///
    /// # Errors
    ///
    /// Returns [`MarketwireError::Export`] when the write fails or the
    /// sink does not support the format.
    async fn write(
        &self,
        records: &[ExportRecord],
        destination: &Path,
        format: ExportFormat,
    ) -> Result<()>;
}
