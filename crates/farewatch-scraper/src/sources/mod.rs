//! Interchangeable price sources.
//!
//! Every source answers one [`FlightQuery`] with a [`FetchOutcome`]. Sources
//! never return an error and never panic: failures are folded into
//! [`FetchOutcome::Failed`] and logged here, so the run loop only has to
//! decide what to do with the observations.

pub mod dom;
pub mod search_flow;
pub mod serpapi;

use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;

use farewatch_core::{FlightQuery, Observation};
use regex::Regex;

use crate::error::ScraperError;
use crate::price::{
    contains_currency_marker, dedupe_by_price, extract_price, extract_price_in_range,
    scan_currency_amounts, PriceBounds,
};
use crate::webdriver::WebDriverSession;

/// Any element matching this means the results list has rendered.
pub(crate) const CONTENT_READY_SELECTOR: &str =
    "[class*='flight'], [class*='Flight'], [class*='card']";

/// Price selectors, tried in order.
pub(crate) const PRICE_SELECTORS: [&str; 7] = [
    "[class*='price']",
    "[class*='Price']",
    "[class*='amount']",
    "[class*='fare']",
    "[class*='Fare']",
    "span[class*='TL']",
    "div[class*='TL']",
];

static SCRIPT_STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|noscript)[^>]*>.*?</(script|style|noscript)>")
        .expect("valid regex")
});

/// A source of fare observations for one date.
pub trait PriceSource {
    /// Short label used in logs and the startup message.
    fn name(&self) -> &'static str;

    /// Fetches every price observable for `query`.
    fn fetch(&self, query: &FlightQuery) -> impl Future<Output = FetchOutcome>;
}

/// Result of a single per-date fetch.
#[derive(Debug)]
pub enum FetchOutcome {
    /// At least one price was observed.
    Found(Vec<Observation>),
    /// The source answered, but no price could be extracted.
    Empty,
    /// The source could not be queried.
    Failed(ScraperError),
}

impl FetchOutcome {
    #[must_use]
    pub fn from_observations(observations: Vec<Observation>) -> Self {
        if observations.is_empty() {
            Self::Empty
        } else {
            Self::Found(observations)
        }
    }

    /// Folds a scrape result into an outcome, logging the unhappy paths.
    ///
    /// A wait that timed out means the page loaded without results, so it is
    /// treated as [`FetchOutcome::Empty`] rather than a failure.
    #[must_use]
    pub fn from_result(query: &FlightQuery, result: Result<Vec<Observation>, ScraperError>) -> Self {
        match result {
            Ok(observations) => {
                let outcome = Self::from_observations(observations);
                if let Self::Found(ref found) = outcome {
                    tracing::info!(date = %query.date_label, count = found.len(), "prices found");
                } else {
                    tracing::warn!(date = %query.date_label, "no prices found");
                }
                outcome
            }
            Err(ScraperError::Timeout { what, secs }) => {
                tracing::warn!(
                    date = %query.date_label,
                    waited_secs = secs,
                    waiting_for = %what,
                    "page never showed results"
                );
                Self::Empty
            }
            Err(e) => {
                tracing::error!(date = %query.date_label, error = %e, "price fetch failed");
                Self::Failed(e)
            }
        }
    }

    /// Collapses the outcome into a (possibly empty) list of observations.
    #[must_use]
    pub fn into_observations(self) -> Vec<Observation> {
        match self {
            Self::Found(observations) => observations,
            Self::Empty | Self::Failed(_) => Vec::new(),
        }
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Delays applied while driving a browser page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTiming {
    /// Unconditional sleep after navigation, for client-side rendering.
    pub settle: Duration,
    /// Maximum wait for the results list to appear.
    pub element_wait: Duration,
    /// Interval between element lookups while waiting.
    pub poll: Duration,
}

impl Default for PageTiming {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(10),
            element_wait: Duration::from_secs(20),
            poll: Duration::from_millis(500),
        }
    }
}

impl PageTiming {
    /// No settling and a single lookup; for tests against a stub driver.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            settle: Duration::ZERO,
            element_wait: Duration::ZERO,
            poll: Duration::ZERO,
        }
    }
}

/// Runs every [`PRICE_SELECTORS`] entry against the current page.
///
/// Only element texts carrying a currency marker are parsed. A selector that
/// errors is skipped. With `bounds`, out-of-range values are dropped. The
/// selector, prefixed by `tag_prefix`, becomes the observation's source tag.
pub(crate) async fn scan_price_selectors(
    session: &WebDriverSession<'_>,
    date_label: &str,
    bounds: Option<&PriceBounds>,
    tag_prefix: &str,
) -> Vec<Observation> {
    let mut observations = Vec::new();

    for selector in PRICE_SELECTORS {
        let elements = match session.find_elements(selector).await {
            Ok(elements) => elements,
            Err(e) => {
                tracing::debug!(selector, error = %e, "price selector failed; skipping");
                continue;
            }
        };

        for element in &elements {
            let Ok(text) = session.element_text(element).await else {
                continue;
            };
            let text = text.trim();
            if !contains_currency_marker(text) {
                continue;
            }

            let price = match bounds {
                Some(bounds) => extract_price_in_range(text, bounds),
                None => extract_price(text),
            };
            if let Some(price) = price {
                observations.push(Observation::new(
                    price,
                    text,
                    date_label,
                    format!("{tag_prefix}{selector}"),
                ));
            }
        }
    }

    dedupe_by_price(observations)
}

/// Scans rendered page text for currency-tagged amounts within strict bounds.
pub(crate) fn scan_page_text(text: &str, date_label: &str, source_tag: &str) -> Vec<Observation> {
    let bounds = PriceBounds::strict();
    let observations = scan_currency_amounts(text)
        .into_iter()
        .filter_map(|raw| {
            extract_price_in_range(&raw, &bounds)
                .map(|price| Observation::new(price, raw, date_label, source_tag))
        })
        .collect();
    dedupe_by_price(observations)
}

/// Reduces an HTML document to its visible text: scripts and styles are
/// dropped, tags removed, common entities decoded, whitespace collapsed.
pub(crate) fn visible_text(html: &str) -> String {
    let without_scripts = SCRIPT_STYLE_RE.replace_all(html, " ");

    let mut out = String::with_capacity(without_scripts.len());
    let mut in_tag = false;
    for ch in without_scripts.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }

    let decoded = out
        .replace("&nbsp;", " ")
        .replace("&#8378;", "₺")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::*;

    fn query() -> FlightQuery {
        FlightQuery {
            origin: "DIY".to_string(),
            destination: "IST".to_string(),
            date_label: "2026-02-04".to_string(),
            url: None,
        }
    }

    #[test]
    fn empty_observations_become_empty_outcome() {
        assert!(matches!(
            FetchOutcome::from_observations(Vec::new()),
            FetchOutcome::Empty
        ));
    }

    #[test]
    fn timeout_is_empty_not_failed() {
        let outcome = FetchOutcome::from_result(
            &query(),
            Err(ScraperError::Timeout {
                what: "results".to_string(),
                secs: 20,
            }),
        );
        assert!(matches!(outcome, FetchOutcome::Empty));
        assert!(!outcome.is_failed());
    }

    #[test]
    fn other_errors_are_failed_and_collapse_to_nothing() {
        let outcome = FetchOutcome::from_result(&query(), Err(ScraperError::Api("quota".into())));
        assert!(outcome.is_failed());
        assert!(outcome.into_observations().is_empty());
    }

    #[test]
    fn visible_text_drops_scripts_and_decodes_entities() {
        let html = r#"<html><head><style>.p{color:red}</style>
            <script>var price = "9.999 TL";</script></head>
            <body><div class="x">Ekonomi&nbsp;<b>1.850</b>&nbsp;TL</div>
            <p>Tom &amp; Jerry</p></body></html>"#;
        let text = visible_text(html);
        assert!(!text.contains("9.999"));
        assert!(!text.contains("color"));
        assert!(text.contains("Ekonomi 1.850 TL"));
        assert!(text.contains("Tom & Jerry"));
    }

    #[test]
    fn page_text_scan_applies_strict_bounds_and_dedupes() {
        let text = "3 TL indirim · 1.850 TL · 2.100,00 TL · 1.850,00 TL · 99.999 TL";
        let found = scan_page_text(text, "2026-02-04", "search:body-scan");
        let prices: Vec<Decimal> = found.iter().map(|o| o.price).collect();
        assert_eq!(
            prices,
            [Decimal::from(1850), Decimal::from_str("2100").unwrap()]
        );
        assert!(found.iter().all(|o| o.source_tag == "search:body-scan"));
    }
}
