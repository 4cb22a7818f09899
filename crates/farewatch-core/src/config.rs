use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::app_config::{AppConfig, EmailConfig, SourceKind, TelegramConfig, DEFAULT_DATES};
use crate::ConfigError;

/// Config file consulted when no notification-related env var is set.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Any of these set to a non-empty value switches configuration over to the
/// environment.
const ENV_TRIGGERS: [&str; 3] = ["TELEGRAM_BOT_TOKEN", "EMAIL_ENABLED", "SERPAPI_KEY"];

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    Environment,
    File(PathBuf),
    /// Neither env vars nor a config file were found.
    Defaults,
}

/// Load application configuration.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
/// Environment variables win when any of `TELEGRAM_BOT_TOKEN`, `EMAIL_ENABLED`
/// or `SERPAPI_KEY` is non-empty; otherwise `path` is read if it exists;
/// otherwise every setting takes its default.
///
/// # Errors
///
/// Returns `ConfigError` if an env var holds an unparseable value or the config
/// file cannot be read or parsed.
pub fn load_app_config(path: &Path) -> Result<(AppConfig, ConfigOrigin), ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env(path)
}

/// Same as [`load_app_config`] but does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if an env var holds an unparseable value or the config
/// file cannot be read or parsed.
pub fn load_app_config_from_env(path: &Path) -> Result<(AppConfig, ConfigOrigin), ConfigError> {
    resolve_app_config(|key| std::env::var(key), path)
}

/// Parse a config file, choosing YAML for `.yaml`/`.yml` and JSON otherwise.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or does not parse.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ConfigFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        serde_yaml::from_str(&content).map_err(|e| ConfigError::ConfigFileYaml {
            path: path.display().to_string(),
            source: e,
        })
    } else {
        serde_json::from_str(&content).map_err(|e| ConfigError::ConfigFileJson {
            path: path.display().to_string(),
            source: e,
        })
    }
}

fn resolve_app_config<F>(lookup: F, path: &Path) -> Result<(AppConfig, ConfigOrigin), ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    if ENV_TRIGGERS
        .iter()
        .any(|var| lookup(var).is_ok_and(|value| !value.is_empty()))
    {
        tracing::info!("loading configuration from environment variables");
        return build_app_config(lookup).map(|cfg| (cfg, ConfigOrigin::Environment));
    }

    if path.exists() {
        tracing::info!(path = %path.display(), "loading configuration from file");
        return load_config_file(path).map(|cfg| (cfg, ConfigOrigin::File(path.to_path_buf())));
    }

    tracing::warn!(
        path = %path.display(),
        "config file not found and no environment variables set; using defaults"
    );
    Ok((AppConfig::default(), ConfigOrigin::Defaults))
}

/// Build configuration from env vars using the provided lookup function, so
/// tests can drive it from a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let non_empty = |var: &str| -> Option<String> { lookup(var).ok().filter(|v| !v.is_empty()) };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u16 = |var: &str, default: &str| -> Result<u16, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u16>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let threshold_raw = or_default("PRICE_THRESHOLD", "2000");
    let price_threshold = Decimal::from_str(threshold_raw.trim())
        .map_err(|e| invalid("PRICE_THRESHOLD", e.to_string()))?;

    let check_interval_minutes = parse_u64("CHECK_INTERVAL", "60")?;

    let dates = or_default("DATES", &DEFAULT_DATES.join(","))
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect();

    let source = match non_empty("FAREWATCH_SOURCE") {
        Some(raw) => SourceKind::from_str(&raw)?,
        None => SourceKind::default(),
    };

    let bot_token = or_default("TELEGRAM_BOT_TOKEN", "");
    let telegram = TelegramConfig {
        enabled: !bot_token.is_empty(),
        bot_token,
        chat_id: or_default("TELEGRAM_CHAT_ID", ""),
    };

    let email_defaults = EmailConfig::default();
    let email = EmailConfig {
        enabled: or_default("EMAIL_ENABLED", "false").eq_ignore_ascii_case("true"),
        sender_email: or_default("EMAIL_SENDER", ""),
        sender_password: or_default("EMAIL_PASSWORD", ""),
        recipient_email: or_default("EMAIL_RECIPIENT", ""),
        smtp_host: or_default("SMTP_HOST", &email_defaults.smtp_host),
        smtp_port: parse_u16("SMTP_PORT", &email_defaults.smtp_port.to_string())?,
    };

    let defaults = AppConfig::default();

    Ok(AppConfig {
        price_threshold,
        check_interval_minutes,
        origin: or_default("ORIGIN", &defaults.origin),
        destination: or_default("DESTINATION", &defaults.destination),
        dates,
        flights: Vec::new(),
        serpapi_key: non_empty("SERPAPI_KEY"),
        source,
        telegram,
        email,
        history_path: PathBuf::from(or_default(
            "FAREWATCH_HISTORY_PATH",
            &defaults.history_path.display().to_string(),
        )),
        webdriver_url: or_default("FAREWATCH_WEBDRIVER_URL", &defaults.webdriver_url),
        log_level: or_default("FAREWATCH_LOG_LEVEL", &defaults.log_level),
        request_timeout_secs: parse_u64("FAREWATCH_REQUEST_TIMEOUT_SECS", "30")?,
        inter_date_delay_secs: parse_u64("FAREWATCH_INTER_DATE_DELAY_SECS", "5")?,
        retry_delay_secs: parse_u64("FAREWATCH_RETRY_DELAY_SECS", "300")?,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
