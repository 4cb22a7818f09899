//! Alert message rendering: one subject plus an HTML body (email) and a
//! plain-text body (email alternative part and Telegram).

use std::fmt::Write as _;

use chrono::{DateTime, Local};
use farewatch_core::{AlertResult, Observation};
use rust_decimal::Decimal;

/// A rendered alert, ready for any channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// How the low prices of each date are listed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Shown in the subject and intro when set.
    pub threshold: Option<Decimal>,
    /// Sort ascending and keep at most this many per date. `None` keeps
    /// every low price in observation order.
    pub limit: Option<usize>,
}

impl RenderOptions {
    /// Every low price, in observation order.
    #[must_use]
    pub fn in_order() -> Self {
        Self::default()
    }

    /// The `n` cheapest low prices per date, cheapest first.
    #[must_use]
    pub fn lowest(n: usize) -> Self {
        Self {
            threshold: None,
            limit: Some(n),
        }
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: Decimal) -> Self {
        self.threshold = Some(threshold);
        self
    }

    fn select<'a>(&self, prices: &'a [Observation]) -> Vec<&'a Observation> {
        let mut selected: Vec<&Observation> = prices.iter().collect();
        if let Some(limit) = self.limit {
            selected.sort_by_key(|o| o.price);
            selected.truncate(limit);
        }
        selected
    }
}

/// Renders every alerting date (results with `alert == false` are skipped)
/// in input order.
#[must_use]
pub fn render_alerts(
    alerts: &[AlertResult],
    options: &RenderOptions,
    checked_at: &DateTime<Local>,
) -> AlertMessage {
    let alerting: Vec<&AlertResult> = alerts.iter().filter(|a| a.alert).collect();
    let count = alerting.len();
    let dates = if count == 1 { "date" } else { "dates" };

    let subject = match options.threshold {
        Some(threshold) => {
            format!("✈️ Flight price alert: {count} {dates} at or below {threshold} TL")
        }
        None => format!("✈️ Flight price alert: {count} {dates} below threshold"),
    };

    let mut html = String::from("<h2>✈️ Flight Price Alert!</h2>\n");
    let mut text = String::from("✈️ Flight Price Alert!\n\n");

    if let Some(threshold) = options.threshold {
        let _ = writeln!(
            html,
            "<p>Prices at or below your threshold of {threshold} TL:</p>"
        );
        let _ = writeln!(text, "Prices at or below your threshold of {threshold} TL:\n");
    }

    for alert in alerting {
        let _ = writeln!(html, "<h3>📅 {}</h3>\n<ul>", escape_html(&alert.date));
        let _ = writeln!(text, "📅 {}", alert.date);

        for observation in options.select(&alert.low_prices) {
            let line = price_line(observation);
            let _ = writeln!(html, "<li>{}</li>", escape_html(&line));
            let _ = writeln!(text, "  {line}");
        }

        html.push_str("</ul>\n");
        text.push('\n');
    }

    let checked = checked_at.format("%Y-%m-%d %H:%M:%S");
    let _ = write!(html, "<p><small>Checked at: {checked}</small></p>");
    let _ = write!(text, "Checked at: {checked}");

    AlertMessage {
        subject,
        html,
        text,
    }
}

/// `💰 1.850 TL - Pegasus (06:30 → 08:40)`, or just the price when the
/// source reported no itinerary details.
fn price_line(observation: &Observation) -> String {
    match &observation.details {
        Some(details) => format!(
            "💰 {} - {} ({} → {})",
            observation.raw_text,
            details.airline,
            clock_time(&details.departure_time),
            clock_time(&details.arrival_time),
        ),
        None => format!("💰 {}", observation.raw_text),
    }
}

/// `"2026-02-04 08:00"` → `"08:00"`; bare times pass through.
fn clock_time(timestamp: &str) -> &str {
    timestamp.rsplit(' ').next().unwrap_or(timestamp)
}

/// Escapes `&`, `<` and `>` for HTML bodies and Telegram's HTML parse mode.
#[must_use]
pub fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
