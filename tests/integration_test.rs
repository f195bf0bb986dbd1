//! Live endpoint integration tests.
//!
//! These connect to the real chart endpoint and require network access.
//! Run with: `cargo test --features integration-tests`

#![cfg(feature = "integration-tests")]

mod common;

use std::time::Duration;

use marketwire::models::{ConnectionStatus, StreamConfig};
use marketwire::{FeedEvent, Streamer};

use common::symbol;

#[tokio::test]
async fn connect_and_receive_bars() {
    let config = StreamConfig::new(vec![symbol("BINANCE:BTCUSDT")], "1", 10);
    let mut streamer = Streamer::with_http_validator(config).expect("streamer must build");

    streamer.connect().await.expect("failed to connect");
    assert!(streamer.is_connected());

    let mut saw_bars = false;
    let deadline = tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            match streamer.next_event().await {
                Ok(FeedEvent::Ohlcv { symbol, bars }) => {
                    assert_eq!(symbol.to_string(), "BINANCE:BTCUSDT");
                    assert!(!bars.is_empty());
                    saw_bars = true;
                    break;
                }
                Ok(_) => {}
                Err(e) => panic!("stream failed before first bar batch: {e}"),
            }
        }
    });
    deadline.await.expect("timed out waiting for bars");
    assert!(saw_bars);

    let stats = streamer.statistics();
    assert!(stats.total_responses >= 1);
    assert_eq!(stats.connection_status, ConnectionStatus::Connected);

    streamer.disconnect().await;
    assert!(!streamer.is_connected());
}

#[tokio::test]
async fn invalid_symbol_is_rejected_by_validation() {
    let config = StreamConfig::new(vec![symbol("FAKEEX:DOESNOTEXIST")], "1", 10);
    let mut streamer = Streamer::with_http_validator(config).expect("streamer must build");

    assert!(streamer.connect().await.is_err());
    assert!(!streamer.is_connected());
}
