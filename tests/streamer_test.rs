//! Orchestrator tests that run without a live endpoint.

mod common;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal_macros::dec;

use marketwire::export::{ExportFormat, ExportRecord, ExportSink};
use marketwire::models::ohlcv::OhlcvBar;
use marketwire::models::{ConnectionStatus, StreamConfig};
use marketwire::{MarketwireError, Streamer};

use common::{StubValidator, symbol};

/// Loopback port 9 (discard) refuses connections immediately, so
/// connect attempts fail fast without touching the network.
const UNREACHABLE_URL: &str = "ws://127.0.0.1:9";

fn config(symbols: &[&str]) -> StreamConfig {
    StreamConfig::new(symbols.iter().map(|s| symbol(s)).collect(), "1", 50)
}

#[test]
fn rejects_empty_symbol_list() {
    let err = Streamer::new(config(&[]), Box::new(StubValidator::rejecting_all())).unwrap_err();
    assert!(matches!(err, MarketwireError::Configuration(_)));
}

#[test]
fn rejects_invalid_timeframe() {
    let mut cfg = config(&["BINANCE:BTCUSDT"]);
    cfg.timeframe = "169H".into();
    let err = Streamer::new(cfg, Box::new(StubValidator::rejecting_all())).unwrap_err();
    assert!(matches!(err, MarketwireError::Configuration(_)));
}

#[test]
fn rejects_zero_history_length() {
    let mut cfg = config(&["BINANCE:BTCUSDT"]);
    cfg.num_bars = 0;
    let err = Streamer::new(cfg, Box::new(StubValidator::rejecting_all())).unwrap_err();
    assert!(matches!(err, MarketwireError::Configuration(_)));
}

#[test]
fn rejects_unsupported_aggregation_target() {
    let mut cfg = config(&["BINANCE:BTCUSDT"]);
    cfg.aggregate_to = Some("7m".into());
    let err = Streamer::new(cfg, Box::new(StubValidator::rejecting_all())).unwrap_err();
    assert!(matches!(err, MarketwireError::Configuration(_)));
}

#[tokio::test]
async fn connect_fails_before_any_socket_io_when_all_symbols_invalid() {
    let mut streamer = Streamer::new(
        config(&["BINANCE:BTCUSDT", "BINANCE:ETHUSDT"]),
        Box::new(StubValidator::rejecting_all()),
    )
    .unwrap()
    .with_websocket_url(UNREACHABLE_URL);

    let err = streamer.connect().await.unwrap_err();
    assert!(matches!(err, MarketwireError::SymbolValidation(_)));
    assert!(!streamer.is_connected());
    assert!(streamer.session().is_none());
}

#[tokio::test]
async fn partial_validation_prunes_symbols_before_connecting() {
    let btc = symbol("BINANCE:BTCUSDT");
    let mut streamer = Streamer::new(
        config(&["BINANCE:BTCUSDT", "FAKE:NOPE"]),
        Box::new(StubValidator::accepting(vec![btc.clone()])),
    )
    .unwrap()
    .with_websocket_url(UNREACHABLE_URL);

    // The socket connect itself fails, but validation already ran.
    let err = streamer.connect().await.unwrap_err();
    assert!(matches!(err, MarketwireError::Connection(_)));
    assert_eq!(streamer.config().symbols, vec![btc]);
}

#[tokio::test]
async fn next_event_before_connect_is_a_streaming_error() {
    let mut streamer = Streamer::new(
        config(&["BINANCE:BTCUSDT"]),
        Box::new(StubValidator::rejecting_all()),
    )
    .unwrap();

    let err = streamer.next_event().await.unwrap_err();
    assert!(matches!(err, MarketwireError::Streaming(_)));
}

#[tokio::test]
async fn disconnect_without_connect_is_harmless() {
    let mut streamer = Streamer::new(
        config(&["BINANCE:BTCUSDT"]),
        Box::new(StubValidator::rejecting_all()),
    )
    .unwrap();

    streamer.disconnect().await;
    streamer.disconnect().await;
    assert!(!streamer.is_connected());
}

/// Sink that stores written batches in memory.
#[derive(Default)]
struct MemorySink {
    writes: Mutex<Vec<(PathBuf, ExportFormat, Vec<ExportRecord>)>>,
}

#[async_trait]
impl ExportSink for MemorySink {
    async fn write(
        &self,
        records: &[ExportRecord],
        destination: &Path,
        format: ExportFormat,
    ) -> marketwire::Result<()> {
        self.writes
            .lock()
            .expect("sink mutex poisoned")
            .push((destination.to_path_buf(), format, records.to_vec()));
        Ok(())
    }
}

#[tokio::test]
async fn export_records_flow_through_a_sink() {
    let btc = symbol("BINANCE:BTCUSDT");
    let bar = OhlcvBar {
        index: 0,
        timestamp: 1_642_694_400,
        open: dec!(50000),
        high: dec!(50100),
        low: dec!(49900),
        close: dec!(50050),
        volume: dec!(1000),
    };
    let records = vec![ExportRecord::from_bar(&btc, "5m", &bar)];

    let sink = MemorySink::default();
    sink.write(&records, Path::new("out/bars"), ExportFormat::Csv)
        .await
        .unwrap();

    let writes = sink.writes.lock().unwrap();
    assert_eq!(writes.len(), 1);
    let (destination, format, stored) = &writes[0];
    assert_eq!(destination, Path::new("out/bars"));
    assert_eq!(*format, ExportFormat::Csv);
    assert_eq!(stored[0].symbol, "BINANCE:BTCUSDT");
    assert_eq!(stored[0].timeframe, "5m");
    assert_eq!(stored[0].close, dec!(50050));
}

#[test]
fn debug_output_covers_state_without_collaborators() {
    let streamer = Streamer::new(
        config(&["BINANCE:BTCUSDT"]),
        Box::new(StubValidator::rejecting_all()),
    )
    .unwrap();

    let rendered = format!("{streamer:?}");
    assert!(rendered.contains("Streamer"));
    assert!(rendered.contains("connected: false"));
    assert!(rendered.contains("BTCUSDT"));
}

#[test]
fn fresh_streamer_reports_empty_statistics() {
    let streamer = Streamer::new(
        config(&["BINANCE:BTCUSDT"]),
        Box::new(StubValidator::rejecting_all()),
    )
    .unwrap();

    let stats = streamer.statistics();
    assert_eq!(stats.total_responses, 0);
    assert!(stats.session_duration.is_none());
    assert_eq!(stats.connection_status, ConnectionStatus::Disconnected);
    assert!(streamer.latest_bar(&symbol("BINANCE:BTCUSDT")).is_none());
}
