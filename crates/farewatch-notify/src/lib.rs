pub mod channels;
mod notifier;
pub mod reminder;
pub mod render;
pub mod status;

pub use channels::email::EmailChannel;
pub use channels::telegram::{TelegramChannel, TELEGRAM_API_BASE};
pub use notifier::Notifier;
pub use render::{escape_html, render_alerts, AlertMessage, RenderOptions};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    /// Transport failure. The request URL is stripped; the Telegram path
    /// carries the bot token.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("Telegram API returned HTTP {status}: {body}")]
    TelegramStatus { status: u16, body: String },

    #[error("invalid email address \"{address}\": {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("failed to build email: {0}")]
    EmailBuild(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

impl From<reqwest::Error> for NotifyError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.without_url())
    }
}
