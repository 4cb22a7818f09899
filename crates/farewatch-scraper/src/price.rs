//! Price extraction from free-form fare text such as `"1.850,00 TL"`.
//!
//! Fares use the Turkish convention: `.` groups thousands and `,` marks the
//! decimal part. Already-normalized strings (`"1850.5"`) are accepted too, so
//! re-extracting a formatted [`Decimal`] yields the same value.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::LazyLock;

use farewatch_core::Observation;
use regex::Regex;
use rust_decimal::Decimal;

static NUMBER_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d.,]*").expect("valid regex"));

static CURRENCY_AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"₺\s*\d[\d.,]*|\d[\d.,]*\s*(?:TL|₺)").expect("valid regex")
});

/// Inclusive price range used to reject scraped noise like result-count badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBounds {
    pub min: Decimal,
    pub max: Decimal,
}

impl PriceBounds {
    /// `100 ..= 50000`, the plausible range for a domestic one-way fare.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            min: Decimal::from(100),
            max: Decimal::from(50_000),
        }
    }

    #[must_use]
    pub fn contains(&self, price: Decimal) -> bool {
        price >= self.min && price <= self.max
    }
}

/// Extracts a positive price from `text`.
///
/// Strips `TL`/`₺` and whitespace, takes the first numeric run, and resolves
/// separators. Returns `None` for empty input, input without digits,
/// ambiguous separators (`"1,2,3"`, `"12.34.56"`), or non-positive values.
/// The result is rounded to two decimal places.
#[must_use]
pub fn extract_price(text: &str) -> Option<Decimal> {
    let cleaned: String = text
        .replace("TL", "")
        .replace('₺', "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let run = NUMBER_RUN_RE
        .find(&cleaned)?
        .as_str()
        .trim_end_matches(['.', ',']);
    let normalized = normalize_separators(run)?;
    let value = Decimal::from_str(&normalized).ok()?.round_dp(2).normalize();

    (value > Decimal::ZERO).then_some(value)
}

/// Like [`extract_price`], but also requires the value to fall within `bounds`.
#[must_use]
pub fn extract_price_in_range(text: &str, bounds: &PriceBounds) -> Option<Decimal> {
    extract_price(text).filter(|price| bounds.contains(*price))
}

/// `true` if `text` carries a lira marker (`TL` or `₺`).
#[must_use]
pub fn contains_currency_marker(text: &str) -> bool {
    text.contains("TL") || text.contains('₺')
}

/// Finds every currency-tagged amount in `text`, in document order.
///
/// Matches `"1.850 TL"`, `"1.850,00₺"` and `"₺ 1.850"`; returns the raw
/// matched substrings for [`extract_price`].
#[must_use]
pub fn scan_currency_amounts(text: &str) -> Vec<String> {
    CURRENCY_AMOUNT_RE
        .find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

/// Keeps the first observation for each distinct price, preserving order.
#[must_use]
pub fn dedupe_by_price(observations: Vec<Observation>) -> Vec<Observation> {
    let mut seen = HashSet::new();
    observations
        .into_iter()
        .filter(|o| seen.insert(o.price))
        .collect()
}

/// Rewrites a numeric run into `Decimal::from_str` syntax.
///
/// With a `,` present, every `.` must group exactly three digits. Without one,
/// a lone `.` followed by one or two digits is a decimal point; otherwise
/// every `.` must group three digits.
fn normalize_separators(run: &str) -> Option<String> {
    if run.matches(',').count() > 1 {
        return None;
    }

    let (integer, fraction) = match run.split_once(',') {
        Some((integer, fraction)) => {
            if fraction.is_empty() || fraction.contains('.') {
                return None;
            }
            (integer, Some(fraction))
        }
        None => (run, None),
    };

    let groups: Vec<&str> = integer.split('.').collect();
    if groups.iter().any(|g| g.is_empty()) {
        return None;
    }

    if groups.len() == 1 {
        return Some(match fraction {
            Some(f) => format!("{integer}.{f}"),
            None => integer.to_string(),
        });
    }

    if groups[1..].iter().all(|g| g.len() == 3) {
        let digits = groups.concat();
        return Some(match fraction {
            Some(f) => format!("{digits}.{f}"),
            None => digits,
        });
    }

    if fraction.is_none() && groups.len() == 2 && groups[1].len() <= 2 {
        return Some(format!("{}.{}", groups[0], groups[1]));
    }

    None
}

#[cfg(test)]
#[path = "price_test.rs"]
mod tests;
