//! Results-page scraper: loads the booking results page for a date in a
//! headless browser and reads prices off the rendered DOM.

use std::path::PathBuf;

use farewatch_core::{booking_url, FlightQuery, Observation};

use crate::error::ScraperError;
use crate::sources::{scan_price_selectors, FetchOutcome, PageTiming, PriceSource, CONTENT_READY_SELECTOR};
use crate::webdriver::{BrowserOptions, WebDriverClient, WebDriverSession};

pub struct DomScraper {
    driver: WebDriverClient,
    browser: BrowserOptions,
    timing: PageTiming,
    debug_dump_dir: Option<PathBuf>,
}

impl DomScraper {
    #[must_use]
    pub fn new(driver: WebDriverClient) -> Self {
        Self {
            driver,
            browser: BrowserOptions::default(),
            timing: PageTiming::default(),
            debug_dump_dir: None,
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

    /// When set, the page source of a page with no prices is written to
    /// `page_source_{date}.html` inside `dir`.
    #[must_use]
    pub fn with_debug_dump_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.debug_dump_dir = Some(dir.into());
        self
    }

    async fn scrape(
        &self,
        session: &WebDriverSession<'_>,
        query: &FlightQuery,
    ) -> Result<Vec<Observation>, ScraperError> {
        let url = query.url.clone().unwrap_or_else(|| {
            booking_url(&query.origin, &query.destination, &query.date_label)
        });

        tracing::debug!(date = %query.date_label, %url, "loading results page");
        session.goto(&url).await?;
        tokio::time::sleep(self.timing.settle).await;
        session
            .wait_for(CONTENT_READY_SELECTOR, self.timing.element_wait, self.timing.poll)
            .await?;

        let observations = scan_price_selectors(session, &query.date_label, None, "").await;
        if observations.is_empty() {
            self.dump_page_source(session, &query.date_label).await;
        }
        Ok(observations)
    }

    async fn dump_page_source(&self, session: &WebDriverSession<'_>, date_label: &str) {
        let Some(dir) = &self.debug_dump_dir else {
            return;
        };

        let source = match session.page_source().await {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!(error = %e, "could not read page source for debug dump");
                return;
            }
        };

        let path = dir.join(format!("page_source_{}.html", date_label.replace('/', "-")));
        match tokio::fs::write(&path, source).await {
            Ok(()) => tracing::info!(path = %path.display(), "page source saved for debugging"),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to save page source"),
        }
    }
}

impl PriceSource for DomScraper {
    fn name(&self) -> &'static str {
        "dom"
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
