use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    /// Transport failure. The request URL is stripped; it can carry an API key.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The WebDriver server answered a command with a protocol error.
    #[error("webdriver command {command} failed: {error}: {message}")]
    WebDriver {
        command: String,
        error: String,
        message: String,
    },

    #[error("timed out after {secs}s waiting for {what}")]
    Timeout { what: String, secs: u64 },

    #[error("flights API error: {0}")]
    Api(String),

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Every selector candidate for a search-form step was tried without success.
    #[error("no selector candidate matched for {step}")]
    NoMatchingElement { step: String },
}

impl From<reqwest::Error> for ScraperError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.without_url())
    }
}
