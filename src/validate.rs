//! Symbol-validation collaborator.
//!
//! Before negotiating any subscription the orchestrator asks a
//! validator which of the requested symbols actually exist. The check
//! is an HTTP lookup against the provider's scanner endpoint, but the
//! port is a trait so tests (and alternative deployments) can supply
//! their own answer.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::Result;
use crate::error::MarketwireError;
use crate::models::Symbol;

/// Default symbol-existence endpoint. `{exchange}` and `{ticker}` are
/// substituted per symbol.
const DEFAULT_VALIDATE_URL: &str =
    "https://scanner.tradingview.com/symbol?symbol={exchange}%3A{ticker}&fields=market&no_404=false";

/// Per-request timeout for validation lookups.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Attempts per symbol before giving up on it.
const MAX_ATTEMPTS: u32 = 3;

/// Initial backoff between attempts; doubles per retry.
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Answers which of a batch of symbols exist upstream.
///
/// Implementations must be idempotent and safe to call with a mixed
/// valid/invalid batch; the result is the valid subset in input order.
#[async_trait]
pub trait SymbolValidator: Send + Sync {
    async fn validate(&self, symbols: &[Symbol]) -> Result<Vec<Symbol>>;
}

/// Validator backed by a retrying HTTP GET per symbol.
///
/// A symbol whose lookup still fails after bounded retries is excluded
/// from the result rather than failing the batch.
pub struct HttpSymbolValidator {
    client: reqwest::Client,
    url_template: String,
}

impl HttpSymbolValidator {
    /// Builds a validator against the default endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`MarketwireError::Http`] if the HTTP client cannot be
    /// constructed.
    pub fn new() -> Result<Self> {
        Self::with_url(DEFAULT_VALIDATE_URL)
    }

    /// Builds a validator against a custom endpoint template with
    /// `{exchange}` and `{ticker}` placeholders.
    ///
    /// # Errors
    ///
    /// Returns [`MarketwireError::Http`] if the HTTP client cannot be
    /// constructed.
    pub fn with_url(url_template: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url_template: url_template.to_string(),
        })
    }

    async fn check_symbol(&self, symbol: &Symbol) -> bool {
        let url = self
            .url_template
            .replace("{exchange}", symbol.exchange())
            .replace("{ticker}", symbol.ticker());

        let mut backoff = INITIAL_BACKOFF;
        for attempt in 1..=MAX_ATTEMPTS {
            match self.client.get(&url).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(%symbol, "Symbol validated");
                    return true;
                }
                Ok(response) if response.status().is_client_error() => {
                    // The endpoint answers 404 for unknown symbols;
                    // retrying cannot change that.
                    warn!(%symbol, status = %response.status(), "Symbol rejected");
                    return false;
                }
                Ok(response) => {
                    warn!(%symbol, status = %response.status(), attempt, "Validation request failed");
                }
                Err(e) => {
                    warn!(%symbol, attempt, "Validation request error: {e}");
                }
            }
            if attempt < MAX_ATTEMPTS {
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
        }

        warn!(%symbol, "Giving up on symbol after {MAX_ATTEMPTS} attempts");
        false
    }
}

#[async_trait]
impl SymbolValidator for HttpSymbolValidator {
    async fn validate(&self, symbols: &[Symbol]) -> Result<Vec<Symbol>> {
        if symbols.is_empty() {
            return Err(MarketwireError::SymbolValidation(
                "no symbols to validate".into(),
            ));
        }

        let mut valid = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            if self.check_symbol(symbol).await {
                valid.push(symbol.clone());
            }
        }

        Ok(valid)
    }
}
