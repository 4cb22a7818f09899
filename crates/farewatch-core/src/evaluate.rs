//! Threshold evaluation: splits a date's observations into alerting and
//! non-alerting prices.

use rust_decimal::Decimal;

use crate::types::{AlertResult, Observation};

/// Evaluates one date's observations against `threshold`.
///
/// `low_prices` holds every observation with `price <= threshold`, in input
/// order and without de-duplication. `min_price` is taken over all
/// observations. Returns `None` when `observations` is empty.
#[must_use]
pub fn evaluate(date: &str, observations: &[Observation], threshold: Decimal) -> Option<AlertResult> {
    let min_price = observations.iter().map(|o| o.price).min()?;
    let low_prices: Vec<Observation> = observations
        .iter()
        .filter(|o| o.price <= threshold)
        .cloned()
        .collect();

    Some(AlertResult {
        date: date.to_owned(),
        alert: !low_prices.is_empty(),
        low_prices,
        min_price,
    })
}

/// Cheapest price seen across a cycle's results.
#[must_use]
pub fn lowest_overall(results: &[AlertResult]) -> Option<Decimal> {
    results.iter().map(|r| r.min_price).min()
}
