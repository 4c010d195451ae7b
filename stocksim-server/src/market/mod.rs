//! Market data: watchlist, price sources and quoting
//!
//! A [`PriceSource`] answers "what does this symbol trade at right now".
//! [`Market`] pairs one source with the [`Watchlist`] and applies the
//! rounding and sanity rules every caller relies on.

mod fixed;
mod watchlist;
mod yahoo;

pub use fixed::FixedPriceSource;
pub use watchlist::Watchlist;
pub use yahoo::{YahooFinanceClient, YahooSettings};

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Price source errors
#[derive(Debug, Error)]
pub enum MarketError {
    /// Source answered but had no usable price for the symbol
    #[error("No price available for {0}")]
    Unavailable(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Something that can quote a symbol
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Short identifier for logs and `/status`
    fn name(&self) -> &'static str;

    /// Latest traded price for `symbol`
    async fn latest_price(&self, symbol: &str) -> Result<f64, MarketError>;
}

/// Round a price or percentage to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Availability of a watchlist quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    Available,
    Unavailable,
    Error,
}

/// One row of `/stocks`
#[derive(Debug, Clone, Serialize)]
pub struct StockQuote {
    pub symbol: String,
    pub current_price: Option<f64>,
    pub status: QuoteStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Watchlist plus the source that prices it
pub struct Market {
    watchlist: Watchlist,
    source: Arc<dyn PriceSource>,
}

impl Market {
    pub fn new(watchlist: Watchlist, source: Arc<dyn PriceSource>) -> Self {
        Self { watchlist, source }
    }

    pub fn watchlist(&self) -> &Watchlist {
        &self.watchlist
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Checked price lookup: rounded to 2 decimals, non-positive rejected
    pub async fn quote(&self, symbol: &str) -> Result<f64, MarketError> {
        let price = self.source.latest_price(symbol).await?;
        if !price.is_finite() || price <= 0.0 {
            return Err(MarketError::Unavailable(symbol.to_string()));
        }
        Ok(round2(price))
    }

    /// Price or `None`; failures are logged, never propagated
    pub async fn live_price(&self, symbol: &str) -> Option<f64> {
        match self.quote(symbol).await {
            Ok(price) => Some(price),
            Err(MarketError::Unavailable(_)) => {
                tracing::debug!(symbol = %symbol, "No price available");
                None
            }
            Err(e) => {
                warn!(symbol = %symbol, "Error fetching price: {}", e);
                None
            }
        }
    }

    /// Quote every watchlist symbol concurrently, preserving watchlist order
    pub async fn quote_watchlist(&self) -> Vec<StockQuote> {
        let lookups = self.watchlist.iter().map(|symbol| async move {
            match self.quote(symbol).await {
                Ok(price) => StockQuote {
                    symbol: symbol.to_string(),
                    current_price: Some(price),
                    status: QuoteStatus::Available,
                    error: None,
                },
                Err(MarketError::Unavailable(_)) => StockQuote {
                    symbol: symbol.to_string(),
                    current_price: None,
                    status: QuoteStatus::Unavailable,
                    error: None,
                },
                Err(e) => {
                    warn!(symbol = %symbol, "Error processing quote: {}", e);
                    StockQuote {
                        symbol: symbol.to_string(),
                        current_price: None,
                        status: QuoteStatus::Error,
                        error: Some(e.to_string()),
                    }
                }
            }
        });
        join_all(lookups).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSource;

    #[async_trait]
    impl PriceSource for FailingSource {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn latest_price(&self, symbol: &str) -> Result<f64, MarketError> {
            if symbol == "TCS.NS" {
                Err(MarketError::Network("connection refused".to_string()))
            } else {
                Err(MarketError::Unavailable(symbol.to_string()))
            }
        }
    }

    fn fixed_market() -> Market {
        let source = FixedPriceSource::new();
        source.set_price("TCS.NS", 3512.456);
        source.set_price("INFY.NS", 0.0);
        Market::new(
            Watchlist::new(["TCS.NS", "INFY.NS", "RELIANCE.NS"]),
            Arc::new(source),
        )
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(3512.456), 3512.46);
        assert_eq!(round2(-5.004), -5.0);
        assert_eq!(round2(10.0), 10.0);
    }

    #[tokio::test]
    async fn test_live_price_rounds_and_rejects_non_positive() {
        let market = fixed_market();
        assert_eq!(market.live_price("TCS.NS").await, Some(3512.46));
        assert_eq!(market.live_price("INFY.NS").await, None);
        assert_eq!(market.live_price("RELIANCE.NS").await, None);
    }

    #[tokio::test]
    async fn test_quote_watchlist_statuses_in_order() {
        let quotes = fixed_market().quote_watchlist().await;
        let symbols: Vec<_> = quotes.iter().map(|q| q.symbol.as_str()).collect();
        assert_eq!(symbols, ["TCS.NS", "INFY.NS", "RELIANCE.NS"]);
        assert_eq!(quotes[0].status, QuoteStatus::Available);
        assert_eq!(quotes[0].current_price, Some(3512.46));
        assert_eq!(quotes[1].status, QuoteStatus::Unavailable);
        assert_eq!(quotes[2].current_price, None);
    }

    #[tokio::test]
    async fn test_source_errors_reported_per_symbol() {
        let market = Market::new(
            Watchlist::new(["TCS.NS", "INFY.NS"]),
            Arc::new(FailingSource),
        );
        let quotes = market.quote_watchlist().await;
        assert_eq!(quotes[0].status, QuoteStatus::Error);
        assert!(quotes[0].error.as_deref().unwrap().contains("connection refused"));
        assert_eq!(quotes[1].status, QuoteStatus::Unavailable);
        assert!(quotes[1].error.is_none());
    }
}
