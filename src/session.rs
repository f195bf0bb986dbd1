//! Session identifier issuance and series/study bookkeeping.
//!
//! The remote scopes every subscription under a pair of server-side
//! contexts: a quote session (`qs_…`) and a chart session (`cs_…`).
//! Within the chart session each symbol gets its own series identifiers
//! so incoming data frames can be mapped back to the symbol that
//! originated them. Identifiers are random alphanumeric tokens, fresh
//! per connection and never reused across reconnects.

use std::collections::HashMap;

use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::models::{IndicatorSpec, Symbol};

/// Token length for quote/chart session ids.
const SESSION_TOKEN_LEN: usize = 12;

/// Token length for the connection id.
const CONNECTION_TOKEN_LEN: usize = 16;

/// The per-connection session context.
///
/// Created once per connect, destroyed on disconnect. The tokens are
/// collision-resistant over a process lifetime but carry no
/// cryptographic guarantee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub quote_session: String,
    pub chart_session: String,
    pub connection_id: String,
}

/// Series identifiers bound to one symbol within a chart session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesHandle {
    /// Symbol-resolution node (`sds_sym_<n>`), used by `resolve_symbol`.
    pub symbol_id: String,
    /// Data series node (`sds_<n>`), the key incoming frames carry.
    pub series_id: String,
    /// Turnaround tag (`s<n>`) attached to `create_series`.
    pub turnaround: String,
}

/// Study identifiers bound to one symbol's indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyHandle {
    /// Study node (`st<n>`), the key incoming study frames carry.
    pub study_id: String,
    pub indicator: IndicatorSpec,
}

/// Issues session tokens and tracks which wire identifier belongs to
/// which symbol.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    next_series: usize,
    next_study: usize,
    series: HashMap<String, Symbol>,
    studies: HashMap<String, (Symbol, IndicatorSpec)>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Produces a fresh session with independent random tokens.
    #[must_use]
    pub fn new_session(&self) -> Session {
        Session {
            quote_session: format!("qs_{}", generate_token(SESSION_TOKEN_LEN)),
            chart_session: format!("cs_{}", generate_token(SESSION_TOKEN_LEN)),
            connection_id: generate_token(CONNECTION_TOKEN_LEN),
        }
    }

    /// Assigns stable series identifiers to a symbol and records the
    /// series-id → symbol mapping for the dispatcher.
    ///
    /// Each symbol gets distinct identifiers; multiple symbols share the
    /// session ids but never a series id.
    pub fn bind_symbol(&mut self, symbol: &Symbol) -> SeriesHandle {
        self.next_series += 1;
        let n = self.next_series;
        let handle = SeriesHandle {
            symbol_id: format!("sds_sym_{n}"),
            series_id: format!("sds_{n}"),
            turnaround: format!("s{n}"),
        };
        self.series.insert(handle.series_id.clone(), symbol.clone());
        handle
    }

    /// Assigns a study identifier for an indicator attached to a symbol.
    pub fn bind_study(&mut self, symbol: &Symbol, indicator: &IndicatorSpec) -> StudyHandle {
        self.next_study += 1;
        let handle = StudyHandle {
            study_id: format!("st{}", self.next_study),
            indicator: indicator.clone(),
        };
        self.studies
            .insert(handle.study_id.clone(), (symbol.clone(), indicator.clone()));
        handle
    }

    /// Maps an incoming series id back to its symbol.
    #[must_use]
    pub fn symbol_for_series(&self, series_id: &str) -> Option<&Symbol> {
        self.series.get(series_id)
    }

    /// Maps an incoming study id back to its symbol and indicator.
    #[must_use]
    pub fn study_for_id(&self, study_id: &str) -> Option<&(Symbol, IndicatorSpec)> {
        self.studies.get(study_id)
    }

    /// Forgets all bindings. Called on disconnect so a reconnect starts
    /// from a clean slate.
    pub fn clear(&mut self) {
        self.next_series = 0;
        self.next_study = 0;
        self.series.clear();
        self.studies.clear();
    }
}

/// Generates a random alphanumeric token of the given length.
fn generate_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn symbol(s: &str) -> Symbol {
        s.parse().unwrap()
    }

    #[test]
    fn session_tokens_have_expected_shape() {
        let session = SessionRegistry::new().new_session();

        assert!(session.quote_session.starts_with("qs_"));
        assert!(session.chart_session.starts_with("cs_"));
        assert_eq!(session.quote_session.len(), 3 + SESSION_TOKEN_LEN);
        assert_eq!(session.chart_session.len(), 3 + SESSION_TOKEN_LEN);
        assert_eq!(session.connection_id.len(), CONNECTION_TOKEN_LEN);
        assert!(session.connection_id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn repeated_sessions_do_not_collide() {
        let registry = SessionRegistry::new();
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let session = registry.new_session();
            assert!(seen.insert(session.quote_session));
            assert!(seen.insert(session.chart_session));
            assert!(seen.insert(session.connection_id));
        }
    }

    #[test]
    fn each_symbol_gets_distinct_series_ids() {
        let mut registry = SessionRegistry::new();
        let btc = registry.bind_symbol(&symbol("BINANCE:BTCUSDT"));
        let eth = registry.bind_symbol(&symbol("BINANCE:ETHUSDT"));

        assert_ne!(btc.series_id, eth.series_id);
        assert_ne!(btc.symbol_id, eth.symbol_id);
        assert_ne!(btc.turnaround, eth.turnaround);
    }

    #[test]
    fn series_id_maps_back_to_symbol() {
        let mut registry = SessionRegistry::new();
        let aapl = symbol("NASDAQ:AAPL");
        let handle = registry.bind_symbol(&aapl);

        assert_eq!(registry.symbol_for_series(&handle.series_id), Some(&aapl));
        assert_eq!(registry.symbol_for_series("sds_99"), None);
    }

    #[test]
    fn study_id_maps_back_to_symbol_and_indicator() {
        let mut registry = SessionRegistry::new();
        let btc = symbol("BINANCE:BTCUSDT");
        let rsi = IndicatorSpec {
            id: "STD;RSI".into(),
            version: "1".into(),
        };
        let handle = registry.bind_study(&btc, &rsi);

        let (sym, indicator) = registry.study_for_id(&handle.study_id).unwrap();
        assert_eq!(sym, &btc);
        assert_eq!(indicator.id, "STD;RSI");
    }

    #[test]
    fn clear_forgets_bindings() {
        let mut registry = SessionRegistry::new();
        let handle = registry.bind_symbol(&symbol("BINANCE:BTCUSDT"));
        registry.clear();

        assert!(registry.symbol_for_series(&handle.series_id).is_none());
    }
}
