//! Shared test utilities.

use async_trait::async_trait;

use marketwire::models::Symbol;
use marketwire::validate::SymbolValidator;

/// Parses a symbol, panicking on bad test input.
pub fn symbol(s: &str) -> Symbol {
    s.parse().expect("test symbol must parse")
}

/// Validator that accepts exactly the symbols it was built with.
pub struct StubValidator {
    accepted: Vec<Symbol>,
}

impl StubValidator {
    pub fn accepting(accepted: Vec<Symbol>) -> Self {
        Self { accepted }
    }

    pub fn rejecting_all() -> Self {
        Self { accepted: Vec::new() }
    }
}

#[async_trait]
impl SymbolValidator for StubValidator {
    async fn validate(&self, symbols: &[Symbol]) -> marketwire::Result<Vec<Symbol>> {
        Ok(symbols
            .iter()
            .filter(|s| self.accepted.contains(s))
            .cloned()
            .collect())
    }
}
