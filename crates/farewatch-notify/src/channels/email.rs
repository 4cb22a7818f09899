use std::time::Duration;

use farewatch_core::EmailConfig;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::NotifyError;

/// Sends mail through an authenticated STARTTLS relay.
pub struct EmailChannel {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailChannel {
    /// Builds the transport and validates both addresses. No connection is
    /// opened until the first send.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Address`] for an unparseable sender or
    /// recipient, or [`NotifyError::Smtp`] if the relay host is invalid.
    pub fn new(config: &EmailConfig, timeout_secs: u64) -> Result<Self, NotifyError> {
        let from = parse_mailbox(&config.sender_email)?;
        let to = parse_mailbox(&config.recipient_email)?;

        let credentials = Credentials::new(
            config.sender_email.clone(),
            config.sender_password.clone(),
        );
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .timeout(Some(Duration::from_secs(timeout_secs)))
            .build();

        Ok(Self { mailer, from, to })
    }

    /// Sends a `multipart/alternative` message with plain-text and HTML parts.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::EmailBuild`] if the message cannot be assembled,
    /// or [`NotifyError::Smtp`] if the relay rejects it.
    pub async fn send(&self, subject: &str, html: &str, text: &str) -> Result<(), NotifyError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html.to_string()),
                    ),
            )?;

        self.mailer.send(message).await?;
        tracing::debug!(to = %self.to, "email sent");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse().map_err(|e| NotifyError::Address {
        address: address.to_string(),
        source: e,
    })
}
