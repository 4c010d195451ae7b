//! Yahoo Finance chart API client
//!
//! Quotes come from `/v8/finance/chart/{symbol}?interval=1m&range=1d`.
//! Price resolution order, first positive value wins:
//! 1. `meta.regularMarketPrice`
//! 2. last non-null `indicators.quote[0].close`
//! 3. `meta.chartPreviousClose`

use super::{MarketError, PriceSource};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const USER_AGENT: &str = concat!("stocksim/", env!("CARGO_PKG_VERSION"));

/// Client tuning, normally taken from the `[market]` config section
#[derive(Debug, Clone)]
pub struct YahooSettings {
    pub base_url: String,
    pub timeout: Duration,
    pub min_request_interval: Duration,
}

impl Default for YahooSettings {
    fn default() -> Self {
        Self {
            base_url: stocksim_common::config::DEFAULT_YAHOO_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            min_request_interval: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Chart {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChartResult {
    #[serde(default)]
    pub meta: Option<ChartMeta>,
    #[serde(default)]
    pub indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChartMeta {
    #[serde(default)]
    pub regular_market_price: Option<f64>,
    #[serde(default)]
    pub chart_previous_close: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteSeries>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuoteSeries {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|p| p.is_finite() && *p > 0.0)
}

/// Pick the best available price out of a chart response
pub(crate) fn extract_price(response: &ChartResponse) -> Option<f64> {
    let result = response.chart.result.as_ref()?.first()?;
    let meta = result.meta.as_ref();

    positive(meta.and_then(|m| m.regular_market_price))
        .or_else(|| {
            let closes = &result.indicators.as_ref()?.quote.first()?.close;
            positive(closes.iter().rev().flatten().next().copied())
        })
        .or_else(|| positive(meta.and_then(|m| m.chart_previous_close)))
}

/// Minimum spacing between outgoing requests
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval,
        }
    }

    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// Yahoo Finance quote client
pub struct YahooFinanceClient {
    http_client: reqwest::Client,
    base_url: String,
    rate_limiter: Arc<RateLimiter>,
}

impl YahooFinanceClient {
    pub fn new(settings: YahooSettings) -> Result<Self, MarketError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| MarketError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            rate_limiter: Arc::new(RateLimiter::new(settings.min_request_interval)),
        })
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!("{}/v8/finance/chart/{}", self.base_url, symbol)
    }
}

#[async_trait]
impl PriceSource for YahooFinanceClient {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn latest_price(&self, symbol: &str) -> Result<f64, MarketError> {
        self.rate_limiter.wait().await;

        let url = self.chart_url(symbol);
        tracing::debug!(symbol = %symbol, url = %url, "Querying Yahoo Finance");

        let response = self
            .http_client
            .get(&url)
            .query(&[("interval", "1m"), ("range", "1d")])
            .send()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(MarketError::Unavailable(symbol.to_string()));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(MarketError::Api(status.as_u16(), error_text));
        }

        let chart: ChartResponse = response
            .json()
            .await
            .map_err(|e| MarketError::Parse(e.to_string()))?;

        if let Some(err) = &chart.chart.error {
            tracing::debug!(
                symbol = %symbol,
                code = ?err.code,
                "Chart API reported error: {}",
                err.description.as_deref().unwrap_or("")
            );
        }

        extract_price(&chart).ok_or_else(|| MarketError::Unavailable(symbol.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ChartResponse {
        serde_json::from_str(json).expect("valid chart json")
    }

    #[test]
    fn test_regular_market_price_preferred() {
        let response = parse(
            r#"{"chart":{"result":[{"meta":{"regularMarketPrice":2950.4,"chartPreviousClose":2900.0},
                "indicators":{"quote":[{"close":[2940.0,2945.5]}]}}],"error":null}}"#,
        );
        assert_eq!(extract_price(&response), Some(2950.4));
    }

    #[test]
    fn test_falls_back_to_last_non_null_close() {
        let response = parse(
            r#"{"chart":{"result":[{"meta":{"chartPreviousClose":2900.0},
                "indicators":{"quote":[{"close":[2940.0,2945.5,null,null]}]}}],"error":null}}"#,
        );
        assert_eq!(extract_price(&response), Some(2945.5));
    }

    #[test]
    fn test_falls_back_to_previous_close() {
        let response = parse(
            r#"{"chart":{"result":[{"meta":{"regularMarketPrice":0.0,"chartPreviousClose":1610.25},
                "indicators":{"quote":[{"close":[null]}]}}],"error":null}}"#,
        );
        assert_eq!(extract_price(&response), Some(1610.25));
    }

    #[test]
    fn test_error_payload_has_no_price() {
        let response = parse(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#,
        );
        assert_eq!(extract_price(&response), None);
    }

    #[test]
    fn test_chart_url() {
        let client = YahooFinanceClient::new(YahooSettings {
            base_url: "http://localhost:9999/".to_string(),
            ..YahooSettings::default()
        })
        .unwrap();
        assert_eq!(
            client.chart_url("TCS.NS"),
            "http://localhost:9999/v8/finance/chart/TCS.NS"
        );
    }

    #[tokio::test]
    async fn test_rate_limiter_spaces_requests() {
        let limiter = RateLimiter::new(Duration::from_millis(50));
        let start = Instant::now();
        limiter.wait().await;
        limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
