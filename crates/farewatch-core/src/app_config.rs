use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::FlightQuery;
use crate::ConfigError;

pub(crate) const DEFAULT_DATES: [&str; 4] = ["2026-02-04", "2026-02-05", "2026-02-06", "2026-02-07"];

/// Which price source drives each cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Load the configured result page in a browser session and scan its DOM.
    Dom,
    /// Drive the airline homepage search form in a browser session.
    #[serde(rename = "search")]
    SearchFlow,
    /// Query the Google Flights API through `SerpApi`.
    #[default]
    Api,
    /// Send booking links only; nothing is scraped.
    Reminder,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Dom => write!(f, "dom"),
            SourceKind::SearchFlow => write!(f, "search"),
            SourceKind::Api => write!(f, "api"),
            SourceKind::Reminder => write!(f, "reminder"),
        }
    }
}

impl FromStr for SourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dom" => Ok(SourceKind::Dom),
            "search" | "search-flow" => Ok(SourceKind::SearchFlow),
            "api" | "serpapi" => Ok(SourceKind::Api),
            "reminder" => Ok(SourceKind::Reminder),
            other => Err(ConfigError::UnknownSource(other.to_string())),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub enabled: bool,
    pub bot_token: String,
    pub chat_id: String,
}

impl TelegramConfig {
    /// Returns `(bot_token, chat_id)` when both are non-empty.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        if self.bot_token.is_empty() || self.chat_id.is_empty() {
            None
        } else {
            Some((&self.bot_token, &self.chat_id))
        }
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("enabled", &self.enabled)
            .field("bot_token", &"[redacted]")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub enabled: bool,
    pub sender_email: String,
    pub sender_password: String,
    pub recipient_email: String,
    pub smtp_host: String,
    pub smtp_port: u16,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sender_email: String::new(),
            sender_password: String::new(),
            recipient_email: String::new(),
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
        }
    }
}

impl EmailConfig {
    /// `true` when sender, password, and recipient are all set.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.sender_email.is_empty()
            && !self.sender_password.is_empty()
            && !self.recipient_email.is_empty()
    }
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("enabled", &self.enabled)
            .field("sender_email", &self.sender_email)
            .field("sender_password", &"[redacted]")
            .field("recipient_email", &self.recipient_email)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .finish()
    }
}

/// A travel date paired with the result page that lists its fares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightTarget {
    pub date: String,
    pub url: String,
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub price_threshold: Decimal,
    pub check_interval_minutes: u64,
    pub origin: String,
    pub destination: String,
    pub dates: Vec<String>,
    /// Explicit per-date result pages. When empty, [`AppConfig::queries`]
    /// falls back to `dates`.
    pub flights: Vec<FlightTarget>,
    pub serpapi_key: Option<String>,
    pub source: SourceKind,
    pub telegram: TelegramConfig,
    pub email: EmailConfig,
    pub history_path: PathBuf,
    pub webdriver_url: String,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub inter_date_delay_secs: u64,
    pub retry_delay_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            price_threshold: Decimal::from(2000),
            check_interval_minutes: 60,
            origin: "DIY".to_string(),
            destination: "IST".to_string(),
            dates: DEFAULT_DATES.iter().map(|d| (*d).to_string()).collect(),
            flights: Vec::new(),
            serpapi_key: None,
            source: SourceKind::default(),
            telegram: TelegramConfig::default(),
            email: EmailConfig::default(),
            history_path: PathBuf::from("price_history.json"),
            webdriver_url: "http://localhost:9515".to_string(),
            log_level: "info".to_string(),
            request_timeout_secs: 30,
            inter_date_delay_secs: 5,
            retry_delay_secs: 300,
        }
    }
}

impl AppConfig {
    /// One query per configured flight page, or per date when no pages are
    /// configured. Blank dates are dropped.
    #[must_use]
    pub fn queries(&self) -> Vec<FlightQuery> {
        if self.flights.is_empty() {
            self.dates
                .iter()
                .map(|d| d.trim())
                .filter(|d| !d.is_empty())
                .map(|date| FlightQuery {
                    origin: self.origin.clone(),
                    destination: self.destination.clone(),
                    date_label: date.to_string(),
                    url: None,
                })
                .collect()
        } else {
            self.flights
                .iter()
                .map(|f| FlightQuery {
                    origin: self.origin.clone(),
                    destination: self.destination.clone(),
                    date_label: f.date.trim().to_string(),
                    url: Some(f.url.clone()),
                })
                .collect()
        }
    }

    /// The `SerpApi` key, treating an empty string as unset.
    #[must_use]
    pub fn serpapi_key(&self) -> Option<&str> {
        self.serpapi_key.as_deref().filter(|k| !k.is_empty())
    }

    #[must_use]
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_minutes.saturating_mul(60))
    }

    #[must_use]
    pub fn inter_date_delay(&self) -> Duration {
        Duration::from_secs(self.inter_date_delay_secs)
    }

    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("price_threshold", &self.price_threshold)
            .field("check_interval_minutes", &self.check_interval_minutes)
            .field("origin", &self.origin)
            .field("destination", &self.destination)
            .field("dates", &self.dates)
            .field("flights", &self.flights)
            .field(
                "serpapi_key",
                &self.serpapi_key.as_ref().map(|_| "[redacted]"),
            )
            .field("source", &self.source)
            .field("telegram", &self.telegram)
            .field("email", &self.email)
            .field("history_path", &self.history_path)
            .field("webdriver_url", &self.webdriver_url)
            .field("log_level", &self.log_level)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("inter_date_delay_secs", &self.inter_date_delay_secs)
            .field("retry_delay_secs", &self.retry_delay_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_kind_parses_aliases() {
        assert_eq!("dom".parse::<SourceKind>().unwrap(), SourceKind::Dom);
        assert_eq!("Search".parse::<SourceKind>().unwrap(), SourceKind::SearchFlow);
        assert_eq!("serpapi".parse::<SourceKind>().unwrap(), SourceKind::Api);
        assert_eq!("reminder".parse::<SourceKind>().unwrap(), SourceKind::Reminder);
    }

    #[test]
    fn source_kind_rejects_unknown() {
        let err = "selenium".parse::<SourceKind>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSource(ref s) if s == "selenium"));
    }

    #[test]
    fn source_kind_display_round_trips_through_from_str() {
        for kind in [
            SourceKind::Dom,
            SourceKind::SearchFlow,
            SourceKind::Api,
            SourceKind::Reminder,
        ] {
            assert_eq!(kind.to_string().parse::<SourceKind>().unwrap(), kind);
        }
    }

    #[test]
    fn queries_fall_back_to_dates_and_skip_blanks() {
        let cfg = AppConfig {
            dates: vec![" 2026-02-04".into(), String::new(), "2026-02-05 ".into()],
            ..AppConfig::default()
        };
        let queries = cfg.queries();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].date_label, "2026-02-04");
        assert_eq!(queries[1].date_label, "2026-02-05");
        assert!(queries.iter().all(|q| q.url.is_none() && q.origin == "DIY"));
    }

    #[test]
    fn queries_prefer_flight_pages() {
        let cfg = AppConfig {
            flights: vec![FlightTarget {
                date: "04.02.2026".into(),
                url: "https://example.com/availability".into(),
            }],
            ..AppConfig::default()
        };
        let queries = cfg.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].date_label, "04.02.2026");
        assert_eq!(
            queries[0].url.as_deref(),
            Some("https://example.com/availability")
        );
    }

    #[test]
    fn empty_serpapi_key_is_unset() {
        let cfg = AppConfig {
            serpapi_key: Some(String::new()),
            ..AppConfig::default()
        };
        assert!(cfg.serpapi_key().is_none());
    }

    #[test]
    fn debug_redacts_secrets() {
        let cfg = AppConfig {
            serpapi_key: Some("serp-secret".into()),
            telegram: TelegramConfig {
                enabled: true,
                bot_token: "123:tg-secret".into(),
                chat_id: "42".into(),
            },
            email: EmailConfig {
                sender_password: "mail-secret".into(),
                ..EmailConfig::default()
            },
            ..AppConfig::default()
        };
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("serp-secret"));
        assert!(!rendered.contains("tg-secret"));
        assert!(!rendered.contains("mail-secret"));
    }
}
