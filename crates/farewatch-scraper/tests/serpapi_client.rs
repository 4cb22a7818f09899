//! Integration tests for `SerpApiClient`.
//!
//! Uses `wiremock` to stand in for the SerpApi endpoint so no real network
//! traffic is made. Covers the happy path, the query parameters sent, and the
//! three ways the API reports failure.

use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use farewatch_core::FlightQuery;
use farewatch_scraper::{FetchOutcome, PriceSource, ScraperError, SerpApiClient};

fn test_client(server: &MockServer) -> SerpApiClient {
    SerpApiClient::new(Some("test-key".to_string()), 5)
        .expect("failed to build test SerpApiClient")
        .with_base_url(server.uri())
}

fn query() -> FlightQuery {
    FlightQuery {
        origin: "DIY".to_string(),
        destination: "IST".to_string(),
        date_label: "2026-02-04".to_string(),
        url: None,
    }
}

fn offer(price: i64, airline: &str) -> serde_json::Value {
    json!({
        "flights": [{
            "airline": airline,
            "departure_airport": {"id": "DIY", "time": "2026-02-04 08:00"},
            "arrival_airport": {"id": "IST", "time": "2026-02-04 10:15"}
        }],
        "total_duration": 135,
        "price": price
    })
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_sends_expected_parameters_and_maps_offers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("engine", "google_flights"))
        .and(query_param("departure_id", "DIY"))
        .and(query_param("arrival_id", "IST"))
        .and(query_param("outbound_date", "2026-02-04"))
        .and(query_param("currency", "TRY"))
        .and(query_param("hl", "tr"))
        .and(query_param("type", "2"))
        .and(query_param("api_key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "best_flights": [offer(1750, "Turkish Airlines")],
            "other_flights": [offer(2400, "Pegasus")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = test_client(&server).fetch(&query()).await;

    let FetchOutcome::Found(observations) = outcome else {
        panic!("expected Found, got: {outcome:?}");
    };
    assert_eq!(observations.len(), 2);
    assert_eq!(observations[0].price, Decimal::from(1750));
    assert_eq!(observations[0].raw_text, "1750 TL");
    assert_eq!(observations[0].source_tag, "serpapi");
    assert_eq!(observations[1].price, Decimal::from(2400));

    let details = observations[0].details.as_ref().expect("details present");
    assert_eq!(details.airline, "Turkish Airlines");
    assert_eq!(details.duration, "2h 15m");
}

#[tokio::test]
async fn response_without_flights_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "search_metadata": {"status": "Success"}
        })))
        .mount(&server)
        .await;

    let outcome = test_client(&server).fetch(&query()).await;
    assert!(
        matches!(outcome, FetchOutcome::Empty),
        "expected Empty, got: {outcome:?}"
    );
}

#[tokio::test]
async fn fractional_price_is_kept_not_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "best_flights": [
                {"flights": [], "price": 1649.5},
                {"flights": [], "price": "n/a"}
            ],
            "other_flights": [offer(2310, "Pegasus")]
        })))
        .mount(&server)
        .await;

    let observations = test_client(&server).fetch(&query()).await.into_observations();
    let prices: Vec<Decimal> = observations.iter().map(|o| o.price).collect();
    assert_eq!(prices, [Decimal::new(16495, 1), Decimal::from(2310)]);
    assert_eq!(observations[0].raw_text, "1649.5 TL");
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn transport_error_does_not_leak_api_key() {
    let client = SerpApiClient::new(Some("SECRETKEY123".to_string()), 2)
        .expect("failed to build test SerpApiClient")
        .with_base_url("http://127.0.0.1:1");

    let err = client
        .search("SECRETKEY123", &query())
        .await
        .expect_err("closed port should fail");

    assert!(matches!(err, ScraperError::Http(_)), "expected Http, got: {err:?}");
    assert!(!err.to_string().contains("SECRETKEY123"), "key in Display: {err}");
    assert!(!format!("{err:?}").contains("SECRETKEY123"), "key in Debug: {err:?}");
}

#[tokio::test]
async fn error_field_with_200_is_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"error": "Your account has run out of searches."})),
        )
        .mount(&server)
        .await;

    let result = test_client(&server)
        .search("test-key", &query())
        .await;
    assert!(
        matches!(result, Err(ScraperError::Api(ref msg)) if msg.contains("run out")),
        "expected Api error, got: {result:?}"
    );
}

#[tokio::test]
async fn unauthorized_with_error_body_is_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid API key."})))
        .mount(&server)
        .await;

    let outcome = test_client(&server).fetch(&query()).await;
    assert!(
        matches!(outcome, FetchOutcome::Failed(ScraperError::Api(_))),
        "expected Failed(Api), got: {outcome:?}"
    );
}

#[tokio::test]
async fn server_error_without_body_is_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = test_client(&server)
        .search("test-key", &query())
        .await;
    match result {
        Err(ScraperError::UnexpectedStatus { status, url }) => {
            assert_eq!(status, 503);
            assert!(!url.contains("test-key"), "api key leaked into error: {url}");
        }
        other => panic!("expected UnexpectedStatus, got: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let result = test_client(&server)
        .search("test-key", &query())
        .await;
    assert!(
        matches!(result, Err(ScraperError::Deserialize { .. })),
        "expected Deserialize error, got: {result:?}"
    );
}
