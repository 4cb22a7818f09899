//! Lifecycle messages sent when the monitor starts and stops.

use std::fmt::Write as _;

use farewatch_core::{display_date, AppConfig, SourceKind};

use crate::render::escape_html;

/// Telegram (HTML parse mode) announcement sent before the first cycle.
#[must_use]
pub fn render_startup(config: &AppConfig) -> String {
    let dates: Vec<String> = config
        .queries()
        .iter()
        .map(|q| display_date(&q.date_label))
        .collect();

    let mut message = String::from("🚀 <b>Flight Monitor Started!</b>\n\n");
    let _ = writeln!(
        message,
        "✈️ Route: {} → {}",
        escape_html(&config.origin),
        escape_html(&config.destination)
    );
    let _ = writeln!(message, "📅 Dates: {}", escape_html(&dates.join(", ")));
    let _ = writeln!(message, "💰 Target: {} TL", config.price_threshold);
    let _ = writeln!(message, "🔎 Source: {}", config.source);
    let _ = write!(
        message,
        "⏰ Check interval: {} minutes",
        config.check_interval_minutes
    );

    if config.source == SourceKind::Reminder {
        message.push_str("\n\nYou'll receive booking links to check prices manually.");
    }
    message
}

/// Telegram message sent once the loop has stopped.
#[must_use]
pub fn render_shutdown(cycles_completed: u64) -> String {
    format!("👋 <b>Flight Monitor Stopped</b>\n\nCompleted checks: {cycles_completed}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_summarizes_configuration() {
        let config = AppConfig {
            dates: vec!["2026-02-04".to_string(), "2026-02-05".to_string()],
            ..AppConfig::default()
        };

        let message = render_startup(&config);

        assert!(message.starts_with("🚀 <b>Flight Monitor Started!</b>"));
        assert!(message.contains("Route: DIY → IST"));
        assert!(message.contains("Dates: 04.02.2026, 05.02.2026"));
        assert!(message.contains("Target: 2000 TL"));
        assert!(message.contains("Source: api"));
        assert!(message.contains("Check interval: 60 minutes"));
        assert!(!message.contains("booking links"));
    }

    #[test]
    fn reminder_mode_startup_mentions_links() {
        let config = AppConfig {
            source: SourceKind::Reminder,
            ..AppConfig::default()
        };
        assert!(render_startup(&config).contains("booking links"));
    }

    #[test]
    fn shutdown_reports_cycles() {
        assert!(render_shutdown(3).ends_with("Completed checks: 3"));
    }
}
