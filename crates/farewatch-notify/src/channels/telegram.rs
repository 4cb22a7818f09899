use std::time::Duration;

use reqwest::Client;

use crate::NotifyError;

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Sends messages to one chat through the Telegram Bot API.
pub struct TelegramChannel {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramChannel {
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(bot_token: &str, chat_id: &str, timeout_secs: u64) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            api_base: TELEGRAM_API_BASE.to_string(),
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
        })
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Posts `text` with `parse_mode=HTML`; the caller is responsible for
    /// escaping any dynamic content.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::TelegramStatus`] on a non-2xx answer, or
    /// [`NotifyError::Http`] if the API cannot be reached.
    pub async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let params = [
            ("chat_id", self.chat_id.as_str()),
            ("text", text),
            ("parse_mode", "HTML"),
        ];

        let response = self.client.post(&url).form(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::TelegramStatus {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(chat_id = %self.chat_id, "telegram message sent");
        Ok(())
    }
}
