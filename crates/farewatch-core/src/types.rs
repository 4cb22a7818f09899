use chrono::{DateTime, Local, SecondsFormat};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Itinerary details reported by sources that know more than a bare price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightDetails {
    pub airline: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub duration: String,
}

/// A single parsed price sighting for one travel date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub price: Decimal,
    /// The text the price was read from, e.g. `"1.850,00 TL"`.
    pub raw_text: String,
    pub date_label: String,
    /// Where the sighting came from: a CSS selector, `"serpapi"`, `"demo"`, ...
    pub source_tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<FlightDetails>,
}

impl Observation {
    #[must_use]
    pub fn new(
        price: Decimal,
        raw_text: impl Into<String>,
        date_label: impl Into<String>,
        source_tag: impl Into<String>,
    ) -> Self {
        Self {
            price,
            raw_text: raw_text.into(),
            date_label: date_label.into(),
            source_tag: source_tag.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: FlightDetails) -> Self {
        self.details = Some(details);
        self
    }
}

/// A persisted snapshot of every observation for a date at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceHistoryEntry {
    pub date: String,
    /// ISO-8601 local timestamp of the check.
    pub timestamp: String,
    pub min_price: Decimal,
    pub prices: Vec<Observation>,
}

impl PriceHistoryEntry {
    /// Builds an entry from a non-empty set of observations.
    ///
    /// Returns `None` when `prices` is empty; empty checks are never recorded.
    #[must_use]
    pub fn from_observations(
        date: &str,
        checked_at: DateTime<Local>,
        prices: Vec<Observation>,
    ) -> Option<Self> {
        let min_price = prices.iter().map(|o| o.price).min()?;
        Some(Self {
            date: date.to_owned(),
            timestamp: checked_at.to_rfc3339_opts(SecondsFormat::Secs, false),
            min_price,
            prices,
        })
    }
}

/// Threshold evaluation for one date in one cycle. Drives notification
/// rendering and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertResult {
    pub date: String,
    /// Observations at or below the threshold, in input order.
    pub low_prices: Vec<Observation>,
    /// Minimum over all observations, not only the low ones.
    pub min_price: Decimal,
    pub alert: bool,
}

/// One per-date unit of work handed to a price source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightQuery {
    /// IATA code, e.g. `"DIY"`.
    pub origin: String,
    pub destination: String,
    pub date_label: String,
    /// Page to load for page-based sources. API sources ignore it.
    pub url: Option<String>,
}
