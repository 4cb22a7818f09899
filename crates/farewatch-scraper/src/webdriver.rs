//! Minimal W3C WebDriver client for driving a headless browser
//! (e.g. `chromedriver`) over its HTTP protocol.
//!
//! Only the commands the price sources need are implemented: session
//! lifecycle, navigation, element lookup by CSS selector, element text,
//! click, key input, and page source.

use std::time::Duration;

use reqwest::{Client, Method};
use serde_json::{json, Value};

use crate::error::ScraperError;

/// JSON key the W3C protocol uses for element references.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// WebDriver code point for the Enter key.
pub const ENTER_KEY: char = '\u{E007}';

pub(crate) const BROWSER_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Launch options for the browser behind a WebDriver session.
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    pub user_agent: String,
    pub window_size: (u32, u32),
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: BROWSER_UA.to_string(),
            window_size: (1920, 1080),
        }
    }
}

impl BrowserOptions {
    fn chrome_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.headless {
            args.push("--headless".to_string());
        }
        args.push("--no-sandbox".to_string());
        args.push("--disable-dev-shm-usage".to_string());
        args.push("--disable-gpu".to_string());
        args.push(format!(
            "--window-size={},{}",
            self.window_size.0, self.window_size.1
        ));
        args.push(format!("--user-agent={}", self.user_agent));
        args
    }

    fn capabilities(&self) -> Value {
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": self.chrome_args() }
                }
            }
        })
    }
}

/// Opaque handle to an element inside a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef(String);

impl ElementRef {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.0
    }
}

/// HTTP connection to a WebDriver server.
pub struct WebDriverClient {
    client: Client,
    base_url: String,
}

impl WebDriverClient {
    /// Creates a client for the WebDriver server at `base_url`
    /// (e.g. `http://localhost:9515`).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Starts a new browser session. The caller must [`WebDriverSession::close`]
    /// it on every exit path.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::WebDriver`] if the server refuses the session,
    /// or [`ScraperError::Http`] if it cannot be reached.
    pub async fn new_session(
        &self,
        options: &BrowserOptions,
    ) -> Result<WebDriverSession<'_>, ScraperError> {
        let url = format!("{}/session", self.base_url);
        let value = self
            .send(Method::POST, &url, Some(options.capabilities()), "new session")
            .await?;

        let id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| ScraperError::WebDriver {
                command: "new session".to_string(),
                error: "invalid response".to_string(),
                message: "response carried no sessionId".to_string(),
            })?
            .to_string();

        tracing::debug!(session = %id, "webdriver session started");
        Ok(WebDriverSession { driver: self, id })
    }

    /// Sends one command and unwraps the protocol's `{"value": ...}` envelope.
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
        command: &str,
    ) -> Result<Value, ScraperError> {
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        let envelope: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| ScraperError::Deserialize {
                context: format!("webdriver {command}"),
                source: e,
            })?
        };
        let value = envelope.get("value").cloned().unwrap_or(Value::Null);

        if !status.is_success() {
            let field = |name: &str| {
                value
                    .get(name)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            let error = field("error");
            return Err(ScraperError::WebDriver {
                command: command.to_string(),
                error: if error.is_empty() {
                    format!("HTTP {}", status.as_u16())
                } else {
                    error
                },
                message: field("message"),
            });
        }

        Ok(value)
    }
}

/// A live browser session. Borrowed from its [`WebDriverClient`].
pub struct WebDriverSession<'a> {
    driver: &'a WebDriverClient,
    id: String,
}

impl WebDriverSession<'_> {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    fn url(&self, path: &str) -> String {
        format!("{}/session/{}/{path}", self.driver.base_url, self.id)
    }

    /// Navigates to `url` and waits for the browser's load event.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::WebDriver`] on navigation failure.
    pub async fn goto(&self, url: &str) -> Result<(), ScraperError> {
        self.driver
            .send(Method::POST, &self.url("url"), Some(json!({ "url": url })), "navigate")
            .await?;
        Ok(())
    }

    /// Returns every element matching `css`; an empty list is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::WebDriver`] if the selector is rejected.
    pub async fn find_elements(&self, css: &str) -> Result<Vec<ElementRef>, ScraperError> {
        let value = self
            .driver
            .send(
                Method::POST,
                &self.url("elements"),
                Some(json!({ "using": "css selector", "value": css })),
                "find elements",
            )
            .await?;

        Ok(value
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.get(ELEMENT_KEY).and_then(Value::as_str))
                    .map(|id| ElementRef(id.to_string()))
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Rendered text of an element.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::WebDriver`] if the element has gone stale.
    pub async fn element_text(&self, element: &ElementRef) -> Result<String, ScraperError> {
        let value = self
            .driver
            .send(
                Method::GET,
                &self.url(&format!("element/{}/text", element.id())),
                None,
                "element text",
            )
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// # Errors
    ///
    /// Returns [`ScraperError::WebDriver`] if the element cannot be clicked.
    pub async fn click(&self, element: &ElementRef) -> Result<(), ScraperError> {
        self.driver
            .send(
                Method::POST,
                &self.url(&format!("element/{}/click", element.id())),
                Some(json!({})),
                "element click",
            )
            .await?;
        Ok(())
    }

    /// Types `text` into an element. Include [`ENTER_KEY`] to submit.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::WebDriver`] if the element does not accept input.
    pub async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<(), ScraperError> {
        self.driver
            .send(
                Method::POST,
                &self.url(&format!("element/{}/value", element.id())),
                Some(json!({ "text": text })),
                "element send keys",
            )
            .await?;
        Ok(())
    }

    /// Serialized DOM of the current page.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::WebDriver`] if the source cannot be read.
    pub async fn page_source(&self) -> Result<String, ScraperError> {
        let value = self
            .driver
            .send(Method::GET, &self.url("source"), None, "page source")
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// Polls until at least one element matches `css`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Timeout`] when nothing matched within `timeout`,
    /// or the first lookup error.
    pub async fn wait_for(
        &self,
        css: &str,
        timeout: Duration,
        poll: Duration,
    ) -> Result<(), ScraperError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if !self.find_elements(css).await?.is_empty() {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ScraperError::Timeout {
                    what: format!("elements matching {css}"),
                    secs: timeout.as_secs(),
                });
            }
            tokio::time::sleep(poll).await;
        }
    }

    /// Ends the session and shuts the browser down.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::WebDriver`] if the server rejects the delete.
    pub async fn close(self) -> Result<(), ScraperError> {
        let url = format!("{}/session/{}", self.driver.base_url, self.id);
        self.driver
            .send(Method::DELETE, &url, None, "delete session")
            .await?;
        tracing::debug!(session = %self.id, "webdriver session closed");
        Ok(())
    }

    /// [`close`](Self::close), logging instead of returning a failure.
    pub async fn close_logged(self) {
        let id = self.id.clone();
        if let Err(e) = self.close().await {
            tracing::warn!(session = %id, error = %e, "failed to close webdriver session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_capabilities_include_chrome_args() {
        let caps = BrowserOptions::default().capabilities();
        let args = caps["capabilities"]["alwaysMatch"]["goog:chromeOptions"]["args"]
            .as_array()
            .unwrap();
        let args: Vec<&str> = args.iter().filter_map(Value::as_str).collect();
        assert!(args.contains(&"--headless"));
        assert!(args.contains(&"--no-sandbox"));
        assert!(args.contains(&"--window-size=1920,1080"));
        assert!(args.iter().any(|a| a.starts_with("--user-agent=Mozilla/5.0")));
    }

    #[test]
    fn headful_capabilities_omit_headless_flag() {
        let options = BrowserOptions {
            headless: false,
            ..BrowserOptions::default()
        };
        assert!(!options.chrome_args().contains(&"--headless".to_string()));
    }
}
