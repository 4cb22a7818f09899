pub mod error;
pub mod price;
pub mod sources;
pub mod types;
pub mod webdriver;

pub use error::ScraperError;
pub use price::{
    contains_currency_marker, dedupe_by_price, extract_price, extract_price_in_range,
    scan_currency_amounts, PriceBounds,
};
pub use sources::dom::DomScraper;
pub use sources::search_flow::SearchFlowScraper;
pub use sources::serpapi::SerpApiClient;
pub use sources::{FetchOutcome, PageTiming, PriceSource};
pub use webdriver::{BrowserOptions, ElementRef, WebDriverClient, WebDriverSession};
