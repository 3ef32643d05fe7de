//! Quote adapter for the Yahoo-style `v8/finance/chart` endpoint.

use crate::domain::errors::MarketDataError;
use crate::domain::market::instrument::{PriceUpdate, UNKNOWN_VOLUME};
use crate::domain::market::quote::{PricePoint, QuoteSnapshot};
use crate::domain::market::symbol::{NormalizedSymbol, normalize_symbol};
use crate::domain::ports::QuoteService;
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, build_url};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, trace};

#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartBody,
}

#[derive(Debug, Deserialize)]
pub struct ChartBody {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    pub code: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
    pub timestamp: Option<Vec<i64>>,
    pub indicators: Option<Indicators>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub regular_market_price: Option<f64>,
    pub chart_previous_close: Option<f64>,
    pub previous_close: Option<f64>,
    pub regular_market_day_high: Option<f64>,
    pub regular_market_day_low: Option<f64>,
    pub regular_market_volume: Option<u64>,
    pub regular_market_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteIndicator>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteIndicator {
    pub close: Option<Vec<Option<f64>>>,
}

pub struct YahooQuoteService {
    client: ClientWithMiddleware,
    base_url: String,
}

impl YahooQuoteService {
    pub fn new(base_url: impl Into<String>, timeout: Duration, max_retries: u32) -> Self {
        Self {
            client: HttpClientFactory::create_client(timeout, max_retries),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl QuoteService for YahooQuoteService {
    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteSnapshot, MarketDataError> {
        let requested =
            normalize_symbol(symbol).ok_or_else(|| MarketDataError::quote(symbol, "empty symbol"))?;
        let unavailable = |reason: String| MarketDataError::quote(&requested.symbol, reason);

        let url = build_url(
            &self.base_url,
            &["v8", "finance", "chart", &requested.symbol],
            &[("interval", "1d"), ("range", "1mo")],
        )
        .map_err(|e| unavailable(format!("{:#}", e)))?;

        trace!("YahooQuoteService: GET {}", url);
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| unavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        let body: Option<ChartResponse> = response.json().await.ok();

        if !status.is_success() {
            let detail = body
                .and_then(|b| b.chart.error)
                .and_then(|e| e.description.or(e.code))
                .unwrap_or_default();
            return Err(unavailable(format!("status {} {}", status, detail).trim().to_string()));
        }

        let body = body.ok_or_else(|| unavailable("malformed response body".to_string()))?;
        let snapshot = normalize_chart(&requested, body)?;
        debug!(
            "YahooQuoteService: {} @ {} ({} series points)",
            snapshot.symbol,
            snapshot.update.price,
            snapshot.series.len()
        );
        Ok(snapshot)
    }
}

/// Turn a chart response into a snapshot.
///
/// Missing high/low fall back to the current price and missing volume to
/// `"unknown"`. A missing result, price, or previous close fails the lookup.
pub fn normalize_chart(
    requested: &NormalizedSymbol,
    response: ChartResponse,
) -> Result<QuoteSnapshot, MarketDataError> {
    let unavailable = |reason: &str| MarketDataError::quote(&requested.symbol, reason);

    let result = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| unavailable("no result payload"))?;
    let meta = &result.meta;

    let price = meta
        .regular_market_price
        .and_then(to_decimal)
        .ok_or_else(|| unavailable("missing current price"))?;

    let previous_close = select_previous_close(meta).ok_or_else(|| unavailable("missing previous close"))?;

    let day_high = positive(meta.regular_market_day_high).unwrap_or(price);
    let day_low = positive(meta.regular_market_day_low).unwrap_or(price);
    let volume = meta
        .regular_market_volume
        .map(|v| v.to_string())
        .unwrap_or_else(|| UNKNOWN_VOLUME.to_string());
    let as_of = meta
        .regular_market_time
        .and_then(|t| DateTime::from_timestamp(t, 0))
        .unwrap_or_else(Utc::now);

    let series = extract_series(&result);

    Ok(QuoteSnapshot {
        symbol: requested.symbol.clone(),
        market: requested.market,
        update: PriceUpdate {
            price,
            previous_close,
            day_high,
            day_low,
            volume,
            as_of,
        },
        series,
    })
}

/// `chartPreviousClose`, else `previousClose`. A zero in the first field
/// defers to the second; a zero in both is passed through and treated as
/// stale downstream.
fn select_previous_close(meta: &ChartMeta) -> Option<Decimal> {
    positive(meta.chart_previous_close)
        .or_else(|| positive(meta.previous_close))
        .or_else(|| meta.chart_previous_close.or(meta.previous_close).and_then(to_decimal))
}

fn extract_series(result: &ChartResult) -> Vec<PricePoint> {
    let (Some(timestamps), Some(closes)) = (
        result.timestamp.as_ref(),
        result
            .indicators
            .as_ref()
            .and_then(|i| i.quote.first())
            .and_then(|q| q.close.as_ref()),
    ) else {
        return Vec::new();
    };

    timestamps
        .iter()
        .zip(closes.iter())
        .filter_map(|(ts, close)| {
            Some(PricePoint {
                timestamp: DateTime::from_timestamp(*ts, 0)?,
                close: close.and_then(to_decimal)?,
            })
        })
        .collect()
}

fn positive(value: Option<f64>) -> Option<Decimal> {
    value
        .filter(|v| *v > 0.0)
        .and_then(to_decimal)
}

fn to_decimal(value: f64) -> Option<Decimal> {
    Decimal::from_f64(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::symbol::Market;
    use rust_decimal_macros::dec;

    fn parse(json: &str) -> ChartResponse {
        serde_json::from_str(json).expect("valid chart json")
    }

    fn aapl() -> NormalizedSymbol {
        normalize_symbol("AAPL").unwrap()
    }

    #[test]
    fn test_full_response() {
        let body = parse(
            r#"{"chart":{"result":[{
                "meta":{"regularMarketPrice":189.5,"chartPreviousClose":187.0,
                        "regularMarketDayHigh":190.25,"regularMarketDayLow":186.5,
                        "regularMarketVolume":51234000,"regularMarketTime":1767279600},
                "timestamp":[1767020400,1767106800,1767193200],
                "indicators":{"quote":[{"close":[186.0,null,187.0]}]}
            }],"error":null}}"#,
        );

        let snapshot = normalize_chart(&aapl(), body).unwrap();
        assert_eq!(snapshot.market, Market::Foreign);
        assert_eq!(snapshot.update.price, dec!(189.5));
        assert_eq!(snapshot.update.previous_close, dec!(187));
        assert_eq!(snapshot.update.day_high, dec!(190.25));
        assert_eq!(snapshot.update.volume, "51234000");
        assert_eq!(snapshot.series.len(), 2);
        assert_eq!(snapshot.series[1].close, dec!(187));

        let instrument = snapshot.to_instrument();
        assert_eq!(instrument.change, Some(dec!(2.5)));
        assert_eq!(instrument.change_percent, Some(dec!(1.34)));
    }

    #[test]
    fn test_missing_optional_fields_fall_back() {
        let body = parse(
            r#"{"chart":{"result":[{"meta":{"regularMarketPrice":71000,"previousClose":70000}}]}}"#,
        );
        let samsung = normalize_symbol("005930").unwrap();

        let snapshot = normalize_chart(&samsung, body).unwrap();
        assert_eq!(snapshot.symbol, "005930.KS");
        assert_eq!(snapshot.market, Market::Domestic);
        assert_eq!(snapshot.update.previous_close, dec!(70000));
        assert_eq!(snapshot.update.day_high, dec!(71000));
        assert_eq!(snapshot.update.day_low, dec!(71000));
        assert_eq!(snapshot.update.volume, UNKNOWN_VOLUME);
        assert!(snapshot.series.is_empty());
    }

    #[test]
    fn test_zero_chart_previous_close_defers_to_previous_close() {
        let body = parse(
            r#"{"chart":{"result":[{"meta":{"regularMarketPrice":10,"chartPreviousClose":0,"previousClose":8}}]}}"#,
        );
        let snapshot = normalize_chart(&aapl(), body).unwrap();
        assert_eq!(snapshot.update.previous_close, dec!(8));
    }

    #[test]
    fn test_missing_previous_close_is_unavailable() {
        let body = parse(r#"{"chart":{"result":[{"meta":{"regularMarketPrice":10}}]}}"#);
        let err = normalize_chart(&aapl(), body).unwrap_err();
        assert!(matches!(err, MarketDataError::QuoteUnavailable { ref symbol, .. } if symbol == "AAPL"));
    }

    #[test]
    fn test_missing_result_is_unavailable() {
        let body = parse(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#,
        );
        assert!(normalize_chart(&aapl(), body).is_err());
    }
}
