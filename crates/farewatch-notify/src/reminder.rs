//! Booking-link reminders: instead of scraping, send the user a link per
//! date so they can check prices themselves.

use std::fmt::Write as _;

use chrono::{DateTime, Local};
use farewatch_core::AppConfig;

use crate::render::escape_html;

pub use farewatch_core::{booking_url, display_date};

/// Renders the Telegram (HTML parse mode) reminder for every configured date.
///
/// Dates configured with an explicit page URL link to that page; the rest
/// link to the generated booking search.
#[must_use]
pub fn render_reminder(config: &AppConfig, checked_at: &DateTime<Local>) -> String {
    let mut message = String::from("🛫 <b>Flight Price Check Reminder</b>\n\n");
    let _ = writeln!(
        message,
        "📍 Route: <b>{} → {}</b>",
        escape_html(&config.origin),
        escape_html(&config.destination)
    );
    let _ = writeln!(message, "💰 Your target: <b>{} TL</b>\n", config.price_threshold);
    message.push_str("🔗 <b>Check prices now:</b>\n\n");

    for query in config.queries() {
        let url = query.url.clone().unwrap_or_else(|| {
            booking_url(&query.origin, &query.destination, &query.date_label)
        });
        let _ = writeln!(
            message,
            "📅 {}\n{}\n",
            escape_html(&display_date(&query.date_label)),
            escape_html(&url)
        );
    }

    message.push_str("━━━━━━━━━━━━━━━\n");
    let _ = writeln!(
        message,
        "⏰ Next check in {} minutes",
        config.check_interval_minutes
    );
    let _ = write!(message, "🕐 Checked: {}", checked_at.format("%H:%M"));
    message
}
