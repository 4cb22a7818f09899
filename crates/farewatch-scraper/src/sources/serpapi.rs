//! Google Flights results via SerpApi.

use std::time::Duration;

use farewatch_core::{FlightDetails, FlightQuery, Observation};
use reqwest::Client;
use rust_decimal::Decimal;

use crate::error::ScraperError;
use crate::sources::{FetchOutcome, PriceSource};
use crate::types::{SerpApiOffer, SerpApiResponse};

pub const SERPAPI_BASE_URL: &str = "https://serpapi.com";

pub const SERPAPI_TAG: &str = "serpapi";
pub const DEMO_TAG: &str = "demo";

/// HTTP client for the SerpApi `google_flights` engine.
///
/// Without an API key no request is made and a single placeholder
/// observation is returned, so the rest of the pipeline can be exercised.
pub struct SerpApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl SerpApiClient {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: Option<String>, timeout_secs: u64) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: SERPAPI_BASE_URL.to_string(),
            api_key: api_key.filter(|key| !key.is_empty()),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Queries one-way economy fares in TRY for `query`.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Api`]: the response carried an `error` field.
    /// - [`ScraperError::UnexpectedStatus`]: non-2xx status without an `error` field.
    /// - [`ScraperError::Http`]: network or TLS failure.
    /// - [`ScraperError::Deserialize`]: the body does not match the expected shape.
    pub async fn search(
        &self,
        api_key: &str,
        query: &FlightQuery,
    ) -> Result<Vec<Observation>, ScraperError> {
        let url = format!("{}/search.json", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("engine", "google_flights"),
                ("departure_id", query.origin.as_str()),
                ("arrival_id", query.destination.as_str()),
                ("outbound_date", query.date_label.as_str()),
                ("currency", "TRY"),
                ("hl", "tr"),
                ("type", "2"),
                ("api_key", api_key),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        let parsed = serde_json::from_str::<SerpApiResponse>(&body);
        if let Ok(SerpApiResponse {
            error: Some(message),
            ..
        }) = &parsed
        {
            return Err(ScraperError::Api(message.clone()));
        }

        if !status.is_success() {
            // `url` excludes the query string, which carries the key.
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let parsed = parsed.map_err(|e| ScraperError::Deserialize {
            context: format!("google_flights results for {}", query.date_label),
            source: e,
        })?;

        Ok(map_offers(&parsed, &query.date_label))
    }
}

impl PriceSource for SerpApiClient {
    fn name(&self) -> &'static str {
        "api"
    }

    async fn fetch(&self, query: &FlightQuery) -> FetchOutcome {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!(
                date = %query.date_label,
                "no SerpApi key configured; returning demo price"
            );
            return FetchOutcome::Found(vec![demo_observation(&query.date_label)]);
        };

        FetchOutcome::from_result(query, self.search(api_key, query).await)
    }
}

/// Maps `best_flights` then `other_flights` into observations, skipping
/// offers without a positive price.
#[must_use]
pub fn map_offers(response: &SerpApiResponse, date_label: &str) -> Vec<Observation> {
    response
        .best_flights
        .iter()
        .chain(&response.other_flights)
        .filter_map(|offer| map_offer(offer, date_label))
        .collect()
}

fn map_offer(offer: &SerpApiOffer, date_label: &str) -> Option<Observation> {
    let price = offer.price.filter(|p| *p > Decimal::ZERO)?;

    let first = offer.flights.first();
    let last = offer.flights.last();
    let details = FlightDetails {
        airline: first
            .and_then(|leg| leg.airline.clone())
            .unwrap_or_else(|| "Unknown".to_string()),
        departure_time: first
            .and_then(|leg| leg.departure_airport.as_ref())
            .and_then(|airport| airport.time.clone())
            .unwrap_or_default(),
        arrival_time: last
            .and_then(|leg| leg.arrival_airport.as_ref())
            .and_then(|airport| airport.time.clone())
            .unwrap_or_default(),
        duration: offer.total_duration.map(format_duration).unwrap_or_default(),
    };

    Some(
        Observation::new(price, format!("{price} TL"), date_label, SERPAPI_TAG)
            .with_details(details),
    )
}

/// Placeholder sighting used when no API key is configured.
#[must_use]
pub fn demo_observation(date_label: &str) -> Observation {
    Observation::new(Decimal::from(1850), "1850 TL", date_label, DEMO_TAG).with_details(
        FlightDetails {
            airline: "Turkish Airlines".to_string(),
            departure_time: "08:00".to_string(),
            arrival_time: "10:15".to_string(),
            duration: "2h 15m".to_string(),
        },
    )
}

/// `135` → `"2h 15m"`.
fn format_duration(minutes: u32) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}
