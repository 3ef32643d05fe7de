//! Rate adapter for the ExchangeRate-API `latest` endpoint.

use crate::domain::errors::MarketDataError;
use crate::domain::market::rates::{RateTable, normalize_currency};
use crate::domain::ports::RateService;
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, build_url};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error};

#[derive(Debug, Deserialize)]
pub struct LatestRatesResponse {
    pub result: Option<String>,
    pub base_code: Option<String>,
    pub conversion_rates: Option<HashMap<String, Decimal>>,
    #[serde(rename = "error-type")]
    pub error_type: Option<String>,
}

pub struct ExchangeRateApiService {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
}

impl ExchangeRateApiService {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            // Rate lookups never retry.
            client: HttpClientFactory::create_client(timeout, 0),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl RateService for ExchangeRateApiService {
    async fn fetch_rates(&self, base: &str) -> Result<RateTable, MarketDataError> {
        let base = normalize_currency(base).map_err(|e| MarketDataError::rate(base, e.to_string()))?;
        let unavailable = |reason: String| MarketDataError::rate(&base, reason);

        if self.api_key.is_empty() {
            return Err(unavailable("API key not configured".to_string()));
        }

        let url = build_url::<&str, &str>(&self.base_url, &[&self.api_key, "latest", &base], &[])
            .map_err(|e| unavailable(format!("{:#}", e)))?;

        let response = self.client.get(url.as_str()).send().await.map_err(|e| {
            error!("ExchangeRateApiService: request for {} failed: {}", base, e);
            unavailable(format!("request failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("status {}", status)));
        }

        let body: LatestRatesResponse = response
            .json()
            .await
            .map_err(|e| unavailable(format!("malformed body: {}", e)))?;

        let table = normalize_rates(&base, body)?;
        debug!(
            "ExchangeRateApiService: {} rates against {}",
            table.rates.len(),
            table.base
        );
        Ok(table)
    }
}

/// Build a table from a `latest` response. The body must carry
/// `conversion_rates`; an explicit `"result": "error"` is also a failure.
pub fn normalize_rates(base: &str, body: LatestRatesResponse) -> Result<RateTable, MarketDataError> {
    if body.result.as_deref() == Some("error") {
        let reason = body.error_type.unwrap_or_else(|| "provider error".to_string());
        return Err(MarketDataError::rate(base, reason));
    }

    let rates = body
        .conversion_rates
        .ok_or_else(|| MarketDataError::rate(base, "response has no conversion_rates"))?;

    let table_base = body.base_code.unwrap_or_else(|| base.to_string());
    Ok(RateTable::new(table_base, rates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_normalize_rates() {
        let body: LatestRatesResponse = serde_json::from_str(
            r#"{"result":"success","base_code":"USD",
                "conversion_rates":{"USD":1,"KRW":1350.0,"EUR":0.92}}"#,
        )
        .unwrap();

        let table = normalize_rates("USD", body).unwrap();
        assert_eq!(table.base, "USD");
        assert_eq!(table.rate("KRW"), Some(dec!(1350)));
        assert_eq!(table.rate("EUR"), Some(dec!(0.92)));
    }

    #[test]
    fn test_missing_rates_field_is_unavailable() {
        let body: LatestRatesResponse =
            serde_json::from_str(r#"{"result":"success","base_code":"USD"}"#).unwrap();
        let err = normalize_rates("USD", body).unwrap_err();
        assert!(matches!(err, MarketDataError::RateUnavailable { .. }));
    }

    #[test]
    fn test_provider_error_is_unavailable() {
        let body: LatestRatesResponse =
            serde_json::from_str(r#"{"result":"error","error-type":"invalid-key"}"#).unwrap();
        let err = normalize_rates("USD", body).unwrap_err();
        assert!(err.to_string().contains("invalid-key"));
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_request() {
        let service = ExchangeRateApiService::new("http://127.0.0.1:9", "", Duration::from_secs(1));
        let err = service.fetch_rates("usd").await.unwrap_err();
        assert_eq!(err, MarketDataError::rate("USD", "API key not configured"));
    }
}
