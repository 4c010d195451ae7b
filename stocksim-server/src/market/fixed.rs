//! Fixed-price source for offline runs and tests

use super::{MarketError, PriceSource, Watchlist};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// Serves prices from an in-process table
///
/// Prices can be changed at runtime with [`FixedPriceSource::set_price`],
/// which is how tests drive the monitor through price movements.
#[derive(Debug, Default)]
pub struct FixedPriceSource {
    prices: RwLock<HashMap<String, f64>>,
}

impl FixedPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_prices<I, S>(prices: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let source = Self::new();
        for (symbol, price) in prices {
            source.set_price(symbol.as_ref(), price);
        }
        source
    }

    pub fn set_price(&self, symbol: &str, price: f64) {
        if let Ok(mut prices) = self.prices.write() {
            prices.insert(Watchlist::normalize(symbol), price);
        }
    }

    pub fn remove_price(&self, symbol: &str) {
        if let Ok(mut prices) = self.prices.write() {
            prices.remove(&Watchlist::normalize(symbol));
        }
    }
}

#[async_trait]
impl PriceSource for FixedPriceSource {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn latest_price(&self, symbol: &str) -> Result<f64, MarketError> {
        let prices = self
            .prices
            .read()
            .map_err(|_| MarketError::Parse("price table poisoned".to_string()))?;
        prices
            .get(&Watchlist::normalize(symbol))
            .copied()
            .ok_or_else(|| MarketError::Unavailable(symbol.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_remove() {
        let source = FixedPriceSource::from_prices([("tcs.ns", 100.0)]);
        assert_eq!(source.latest_price("TCS.NS").await.unwrap(), 100.0);

        source.set_price("TCS.NS", 105.5);
        assert_eq!(source.latest_price("tcs.ns").await.unwrap(), 105.5);

        source.remove_price("TCS.NS");
        assert!(matches!(
            source.latest_price("TCS.NS").await,
            Err(MarketError::Unavailable(_))
        ));
    }
}
