use farewatch_core::AppConfig;

use crate::channels::email::EmailChannel;
use crate::channels::telegram::TelegramChannel;
use crate::render::{escape_html, AlertMessage};
use crate::NotifyError;

/// Fans a message out to every configured channel.
///
/// Delivery failures never propagate: each channel's error is logged and the
/// next channel is still tried.
pub struct Notifier {
    email: Option<EmailChannel>,
    telegram: Option<TelegramChannel>,
}

impl Notifier {
    #[must_use]
    pub fn new(email: Option<EmailChannel>, telegram: Option<TelegramChannel>) -> Self {
        Self { email, telegram }
    }

    /// Builds the enabled channels from configuration. Enabled channels with
    /// missing credentials are left out with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if a channel's client cannot be constructed or
    /// an email address does not parse.
    pub fn from_config(config: &AppConfig) -> Result<Self, NotifyError> {
        let telegram = if config.telegram.enabled {
            match config.telegram.credentials() {
                Some((token, chat_id)) => Some(TelegramChannel::new(
                    token,
                    chat_id,
                    config.request_timeout_secs,
                )?),
                None => {
                    tracing::warn!("telegram enabled but bot token or chat id missing; skipping");
                    None
                }
            }
        } else {
            None
        };

        let email = if config.email.enabled {
            if config.email.is_complete() {
                Some(EmailChannel::new(&config.email, config.request_timeout_secs)?)
            } else {
                tracing::warn!("email enabled but sender, password or recipient missing; skipping");
                None
            }
        } else {
            None
        };

        if email.is_none() && telegram.is_none() {
            tracing::warn!("no notification channel configured; alerts will only be logged");
        }

        Ok(Self::new(email, telegram))
    }

    #[must_use]
    pub fn has_channels(&self) -> bool {
        self.email.is_some() || self.telegram.is_some()
    }

    /// Sends an alert by email, then Telegram. Returns how many channels
    /// accepted it.
    pub async fn notify(&self, message: &AlertMessage) -> usize {
        let mut delivered = 0;

        if let Some(email) = &self.email {
            match email.send(&message.subject, &message.html, &message.text).await {
                Ok(()) => {
                    tracing::info!("email notification sent");
                    delivered += 1;
                }
                Err(e) => tracing::error!(error = %e, "email notification failed"),
            }
        }

        if let Some(telegram) = &self.telegram {
            match telegram.send(&escape_html(&message.text)).await {
                Ok(()) => {
                    tracing::info!("telegram notification sent");
                    delivered += 1;
                }
                Err(e) => tracing::error!(error = %e, "telegram notification failed"),
            }
        }

        delivered
    }

    /// Sends a Telegram-formatted status message (startup, shutdown,
    /// reminder). Returns whether it was delivered.
    pub async fn send_status(&self, text: &str) -> bool {
        let Some(telegram) = &self.telegram else {
            tracing::debug!("no telegram channel; status message not sent");
            return false;
        };

        match telegram.send(text).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "telegram status message failed");
                false
            }
        }
    }
}
