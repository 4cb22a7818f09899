//! SerpApi `google_flights` response types.
//!
//! Only the fields the monitor reads are modelled; everything else in the
//! payload is ignored by serde.
//!
//! ### `price`
//! Usually an integer in the requested currency. Occasionally absent on
//! itineraries the engine could not price. A value that is not a number
//! (or numeric string) reads as `None`, so one odd offer never fails the
//! whole response.
//!
//! ### `flights`
//! One entry per leg. The first leg carries the marketing airline and the
//! departure time; the last leg carries the arrival time. Times are local
//! strings like `"2026-02-04 08:00"`.
//!
//! ### `total_duration`
//! Whole minutes across all legs and layovers.
//!
//! ### `error`
//! A top-level string present instead of results when the key is invalid,
//! the quota is exhausted, or the query is rejected. It can arrive with HTTP
//! 200, so it is checked independently of the status code.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

/// Top-level response from `GET /search.json?engine=google_flights`.
#[derive(Debug, Default, Deserialize)]
pub struct SerpApiResponse {
    #[serde(default)]
    pub best_flights: Vec<SerpApiOffer>,

    #[serde(default)]
    pub other_flights: Vec<SerpApiOffer>,

    #[serde(default)]
    pub error: Option<String>,
}

/// One priced itinerary.
#[derive(Debug, Deserialize)]
pub struct SerpApiOffer {
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<Decimal>,

    #[serde(default)]
    pub flights: Vec<SerpApiLeg>,

    #[serde(default)]
    pub total_duration: Option<u32>,
}

/// A single flight leg of an itinerary.
#[derive(Debug, Deserialize)]
pub struct SerpApiLeg {
    #[serde(default)]
    pub airline: Option<String>,

    #[serde(default)]
    pub departure_airport: Option<SerpApiAirport>,

    #[serde(default)]
    pub arrival_airport: Option<SerpApiAirport>,
}

#[derive(Debug, Deserialize)]
pub struct SerpApiAirport {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub time: Option<String>,
}

fn lenient_price<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => parse_decimal(&n.to_string()),
        Some(serde_json::Value::String(s)) => parse_decimal(s.trim()),
        _ => None,
    })
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}
