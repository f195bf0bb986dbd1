use marketwire::models::StreamConfig;
use marketwire::{FeedEvent, MarketwireError, Streamer, Symbol};

#[tokio::main]
async fn main() -> Result<(), MarketwireError> {
    // Initialize tracing subscriber for logging output.
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1).peekable();
    let symbols: Vec<Symbol> = if args.peek().is_some() {
        args.map(|arg| arg.parse()).collect::<Result<_, _>>()?
    } else {
        vec!["BINANCE:BTCUSDT".parse()?]
    };

    let config = StreamConfig::new(symbols, "1", 50);
    let mut streamer = Streamer::with_http_validator(config)?;
    streamer.connect().await?;

    loop {
        match streamer.next_event().await {
            Ok(FeedEvent::Ohlcv { symbol, bars }) => {
                for bar in &bars {
                    println!(
                        "{symbol} {} o={} h={} l={} c={} v={}",
                        bar.timestamp, bar.open, bar.high, bar.low, bar.close, bar.volume
                    );
                }
            }
            Ok(FeedEvent::Quote(tick)) => {
                println!("{} quote lp={}", tick.symbol, tick.price);
            }
            Ok(FeedEvent::Trade(trade)) => {
                println!("{} trade lp={}", trade.symbol, trade.price);
            }
            Ok(FeedEvent::Indicator(sample)) => {
                println!("{} {} {:?}", sample.symbol, sample.indicator_id, sample.values);
            }
            Ok(FeedEvent::Control(_)) | Ok(FeedEvent::Unknown) => {}
            Err(e) => {
                let stats = streamer.statistics();
                eprintln!(
                    "stream ended after {} responses: {e}",
                    stats.total_responses
                );
                break;
            }
        }
    }

    streamer.disconnect().await;
    Ok(())
}
