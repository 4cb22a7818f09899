//! Search-form scraper: drives the airline homepage like a visitor would
//! (consent banner, origin, destination, submit) and reads prices from the
//! results, falling back to a text scan and finally to a static results URL.

use farewatch_core::{booking_url, FlightQuery, Observation};

use crate::error::ScraperError;
use crate::price::PriceBounds;
use crate::sources::{
    scan_page_text, scan_price_selectors, visible_text, FetchOutcome, PageTiming, PriceSource,
    CONTENT_READY_SELECTOR,
};
use crate::webdriver::{BrowserOptions, WebDriverClient, WebDriverSession, ENTER_KEY};

pub const DEFAULT_HOME_URL: &str = "https://www.turkishairlines.com/tr-tr/";

/// Button texts that accept or dismiss a cookie/consent dialog.
const CONSENT_PHRASES: [&str; 5] = ["kabul", "accept", "tamam", "anladım", "onayla"];

/// Buttons inspected when looking for a consent dialog.
const MAX_CONSENT_BUTTONS: usize = 40;

const ORIGIN_SELECTORS: [&str; 5] = [
    "input#fromPort",
    "input[name*='origin']",
    "input[id*='origin']",
    "input[placeholder*='Nereden']",
    "input[aria-label*='Nereden']",
];

const DESTINATION_SELECTORS: [&str; 5] = [
    "input#toPort",
    "input[name*='destination']",
    "input[id*='destination']",
    "input[placeholder*='Nereye']",
    "input[aria-label*='Nereye']",
];

const SUBMIT_SELECTORS: [&str; 4] = [
    "button[type='submit']",
    "button[id*='search']",
    "button[class*='search']",
    "a[class*='search']",
];

const BODY_SCAN_TAG: &str = "search:body-scan";
const FALLBACK_URL_TAG: &str = "search:fallback-url";

pub struct SearchFlowScraper {
    driver: WebDriverClient,
    browser: BrowserOptions,
    timing: PageTiming,
    home_url: String,
}

impl SearchFlowScraper {
    #[must_use]
    pub fn new(driver: WebDriverClient) -> Self {
        Self {
            driver,
            browser: BrowserOptions::default(),
            timing: PageTiming::default(),
            home_url: DEFAULT_HOME_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_timing(mut self, timing: PageTiming) -> Self {
        self.timing = timing;
        self
    }

    #[must_use]
    pub fn with_browser(mut self, browser: BrowserOptions) -> Self {
        self.browser = browser;
        self
    }

    #[must_use]
    pub fn with_home_url(mut self, home_url: impl Into<String>) -> Self {
        self.home_url = home_url.into();
        self
    }

    async fn scrape(
        &self,
        session: &WebDriverSession<'_>,
        query: &FlightQuery,
    ) -> Result<Vec<Observation>, ScraperError> {
        match self.search(session, query).await {
            Ok(found) if !found.is_empty() => return Ok(found),
            Ok(_) => tracing::info!(
                date = %query.date_label,
                "search flow yielded no prices; trying fallback URL"
            ),
            Err(e) => tracing::warn!(
                date = %query.date_label,
                error = %e,
                "search flow failed; trying fallback URL"
            ),
        }

        self.static_fallback(session, query).await
    }

    /// Homepage form submission followed by the structured scan, then the
    /// full-text scan.
    async fn search(
        &self,
        session: &WebDriverSession<'_>,
        query: &FlightQuery,
    ) -> Result<Vec<Observation>, ScraperError> {
        session.goto(&self.home_url).await?;
        tokio::time::sleep(self.timing.settle).await;

        dismiss_consent(session).await;
        fill_first(session, &ORIGIN_SELECTORS, &query.origin, "origin field").await?;
        fill_first(session, &DESTINATION_SELECTORS, &query.destination, "destination field")
            .await?;
        click_first(session, &SUBMIT_SELECTORS, "search button").await?;
        tokio::time::sleep(self.timing.settle).await;

        if let Err(e) = session
            .wait_for(CONTENT_READY_SELECTOR, self.timing.element_wait, self.timing.poll)
            .await
        {
            tracing::debug!(error = %e, "results list did not appear; scanning anyway");
        }

        let strict = PriceBounds::strict();
        let structured =
            scan_price_selectors(session, &query.date_label, Some(&strict), "search:").await;
        if !structured.is_empty() {
            return Ok(structured);
        }

        tracing::debug!(date = %query.date_label, "no structured prices; scanning page text");
        let html = session.page_source().await?;
        Ok(scan_page_text(&visible_text(&html), &query.date_label, BODY_SCAN_TAG))
    }

    async fn static_fallback(
        &self,
        session: &WebDriverSession<'_>,
        query: &FlightQuery,
    ) -> Result<Vec<Observation>, ScraperError> {
        let url = query.url.clone().unwrap_or_else(|| {
            booking_url(&query.origin, &query.destination, &query.date_label)
        });

        session.goto(&url).await?;
        tokio::time::sleep(self.timing.settle).await;
        let html = session.page_source().await?;
        Ok(scan_page_text(&visible_text(&html), &query.date_label, FALLBACK_URL_TAG))
    }
}

impl PriceSource for SearchFlowScraper {
    fn name(&self) -> &'static str {
        "search"
    }

    async fn fetch(&self, query: &FlightQuery) -> FetchOutcome {
        let session = match self.driver.new_session(&self.browser).await {
            Ok(session) => session,
            Err(e) => return FetchOutcome::from_result(query, Err(e)),
        };

        let result = self.scrape(&session, query).await;
        session.close_logged().await;
        FetchOutcome::from_result(query, result)
    }
}

/// Clicks the first button whose text contains a consent phrase.
/// Returns whether one was clicked; a page without a dialog is normal.
async fn dismiss_consent(session: &WebDriverSession<'_>) -> bool {
    let Ok(buttons) = session.find_elements("button").await else {
        return false;
    };

    for button in buttons.iter().take(MAX_CONSENT_BUTTONS) {
        let Ok(text) = session.element_text(button).await else {
            continue;
        };
        let text = text.to_lowercase();
        if CONSENT_PHRASES.iter().any(|phrase| text.contains(phrase))
            && session.click(button).await.is_ok()
        {
            tracing::debug!(button = %text.trim(), "consent dialog dismissed");
            return true;
        }
    }
    false
}

/// Types `value` (then Enter, to pick the autocomplete entry) into the first
/// candidate element that accepts input.
async fn fill_first(
    session: &WebDriverSession<'_>,
    candidates: &[&str],
    value: &str,
    step: &str,
) -> Result<(), ScraperError> {
    for selector in candidates {
        let Ok(elements) = session.find_elements(selector).await else {
            continue;
        };
        let Some(element) = elements.first() else {
            continue;
        };

        // Focus first; some inputs only accept keys once activated.
        let _ = session.click(element).await;
        match session
            .send_keys(element, &format!("{value}{ENTER_KEY}"))
            .await
        {
            Ok(()) => {
                tracing::debug!(step, selector, "filled");
                return Ok(());
            }
            Err(e) => tracing::debug!(step, selector, error = %e, "candidate rejected input"),
        }
    }

    Err(ScraperError::NoMatchingElement {
        step: step.to_string(),
    })
}

/// Clicks the first candidate element that accepts the click.
async fn click_first(
    session: &WebDriverSession<'_>,
    candidates: &[&str],
    step: &str,
) -> Result<(), ScraperError> {
    for selector in candidates {
        let Ok(elements) = session.find_elements(selector).await else {
            continue;
        };
        let Some(element) = elements.first() else {
            continue;
        };

        match session.click(element).await {
            Ok(()) => {
                tracing::debug!(step, selector, "clicked");
                return Ok(());
            }
            Err(e) => tracing::debug!(step, selector, error = %e, "candidate rejected click"),
        }
    }

    Err(ScraperError::NoMatchingElement {
        step: step.to_string(),
    })
}
