use rust_decimal_macros::dec;
use serde_json::json;
use std::time::Duration;
use tickwatch::domain::errors::MarketDataError;
use tickwatch::domain::market::symbol::Market;
use tickwatch::domain::ports::{QuoteService, RateService};
use tickwatch::infrastructure::exchange_rate::ExchangeRateApiService;
use tickwatch::infrastructure::yahoo::YahooQuoteService;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

fn quotes(server: &MockServer) -> YahooQuoteService {
    YahooQuoteService::new(server.uri(), TIMEOUT, 0)
}

fn rates(server: &MockServer) -> ExchangeRateApiService {
    ExchangeRateApiService::new(server.uri(), "test-key", TIMEOUT)
}

fn reason(err: &MarketDataError) -> &str {
    match err {
        MarketDataError::QuoteUnavailable { reason, .. } => reason,
        MarketDataError::RateUnavailable { reason, .. } => reason,
    }
}

#[tokio::test]
async fn test_quote_request_path_and_parsing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/005930.KS"))
        .and(query_param("interval", "1d"))
        .and(query_param("range", "1mo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chart": {
                "result": [{
                    "meta": {
                        "regularMarketPrice": 71000,
                        "chartPreviousClose": 70200,
                        "regularMarketDayHigh": 71500,
                        "regularMarketDayLow": 70100,
                        "regularMarketVolume": 12000000
                    }
                }],
                "error": null
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = quotes(&server).fetch_quote(" 005930 ").await.unwrap();
    assert_eq!(snapshot.symbol, "005930.KS");
    assert_eq!(snapshot.market, Market::Domestic);
    assert_eq!(snapshot.update.price, dec!(71000));
    assert_eq!(snapshot.update.previous_close, dec!(70200));
    assert_eq!(snapshot.update.volume, "12000000");
}

#[tokio::test]
async fn test_quote_not_found_carries_provider_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/ZZZZ"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
            }
        })))
        .mount(&server)
        .await;

    let err = quotes(&server).fetch_quote("zzzz").await.unwrap_err();
    assert!(matches!(err, MarketDataError::QuoteUnavailable { ref symbol, .. } if symbol == "ZZZZ"));
    assert!(reason(&err).contains("404"));
    assert!(reason(&err).contains("No data found"));
}

#[tokio::test]
async fn test_quote_server_error_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .expect(1)
        .mount(&server)
        .await;

    let err = quotes(&server).fetch_quote("AAPL").await.unwrap_err();
    assert!(matches!(err, MarketDataError::QuoteUnavailable { .. }));
    assert!(reason(&err).contains("503"));
}

#[tokio::test]
async fn test_quote_malformed_body_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"))
        .mount(&server)
        .await;

    let err = quotes(&server).fetch_quote("AAPL").await.unwrap_err();
    assert_eq!(
        err,
        MarketDataError::quote("AAPL", "malformed response body")
    );
}

#[tokio::test]
async fn test_quote_transport_failure_is_unavailable() {
    // Nothing listens on the discard port
    let service = YahooQuoteService::new("http://127.0.0.1:9", Duration::from_secs(2), 0);
    let err = service.fetch_quote("AAPL").await.unwrap_err();
    assert!(reason(&err).starts_with("request failed"));
}

#[tokio::test]
async fn test_rates_request_path_and_parsing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/test-key/latest/USD"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "success",
            "base_code": "USD",
            "conversion_rates": {"USD": 1, "KRW": 1350.0, "EUR": 0.92}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let table = rates(&server).fetch_rates("usd").await.unwrap();
    assert_eq!(table.base, "USD");
    assert_eq!(table.rate("KRW"), Some(dec!(1350)));
    assert_eq!(table.rate("EUR"), Some(dec!(0.92)));
}

#[tokio::test]
async fn test_rates_server_error_is_unavailable_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let err = rates(&server).fetch_rates("USD").await.unwrap_err();
    assert!(matches!(err, MarketDataError::RateUnavailable { ref base, .. } if base == "USD"));
    assert!(reason(&err).contains("503"));
}

#[tokio::test]
async fn test_rates_provider_error_body_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "error",
            "error-type": "invalid-key"
        })))
        .mount(&server)
        .await;

    let err = rates(&server).fetch_rates("USD").await.unwrap_err();
    assert_eq!(err, MarketDataError::rate("USD", "invalid-key"));
}

#[tokio::test]
async fn test_rates_malformed_body_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = rates(&server).fetch_rates("USD").await.unwrap_err();
    assert!(reason(&err).starts_with("malformed body"));
}
