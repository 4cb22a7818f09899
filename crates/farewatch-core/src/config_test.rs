use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with a Telegram token set so env mode is selected.
fn telegram_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("TELEGRAM_BOT_TOKEN", "123:abc");
    m.insert("TELEGRAM_CHAT_ID", "42");
    m
}

fn temp_path(extension: &str) -> PathBuf {
    std::env::temp_dir().join(format!("farewatch-config-{}.{extension}", uuid::Uuid::new_v4()))
}

fn missing_path() -> PathBuf {
    temp_path("json")
}

#[test]
fn env_mode_uses_defaults_for_unset_vars() {
    let map = telegram_env();
    let (cfg, origin) = resolve_app_config(lookup_from_map(&map), &missing_path()).unwrap();
    assert_eq!(origin, ConfigOrigin::Environment);
    assert_eq!(cfg.price_threshold, Decimal::from(2000));
    assert_eq!(cfg.check_interval_minutes, 60);
    assert_eq!(cfg.origin, "DIY");
    assert_eq!(cfg.destination, "IST");
    assert_eq!(
        cfg.dates,
        ["2026-02-04", "2026-02-05", "2026-02-06", "2026-02-07"]
    );
    assert_eq!(cfg.source, SourceKind::Api);
    assert!(cfg.telegram.enabled);
    assert_eq!(cfg.telegram.credentials(), Some(("123:abc", "42")));
    assert!(!cfg.email.enabled);
    assert_eq!(cfg.email.smtp_host, "smtp.gmail.com");
    assert_eq!(cfg.email.smtp_port, 587);
    assert!(cfg.serpapi_key.is_none());
    assert_eq!(cfg.retry_delay_secs, 300);
    assert_eq!(cfg.inter_date_delay_secs, 5);
}

#[test]
fn env_mode_reads_overrides() {
    let mut map = telegram_env();
    map.insert("PRICE_THRESHOLD", "1750.50");
    map.insert("CHECK_INTERVAL", "30");
    map.insert("ORIGIN", "ESB");
    map.insert("DESTINATION", "AYT");
    map.insert("DATES", "2026-03-01, 2026-03-02,,");
    map.insert("FAREWATCH_SOURCE", "reminder");
    map.insert("EMAIL_ENABLED", "TRUE");
    map.insert("EMAIL_SENDER", "me@example.com");
    map.insert("SMTP_PORT", "465");
    let (cfg, _) = resolve_app_config(lookup_from_map(&map), &missing_path()).unwrap();
    assert_eq!(cfg.price_threshold, Decimal::new(175_050, 2));
    assert_eq!(cfg.check_interval_minutes, 30);
    assert_eq!(cfg.origin, "ESB");
    assert_eq!(cfg.destination, "AYT");
    assert_eq!(cfg.dates, ["2026-03-01", "2026-03-02"]);
    assert_eq!(cfg.source, SourceKind::Reminder);
    assert!(cfg.email.enabled);
    assert_eq!(cfg.email.sender_email, "me@example.com");
    assert_eq!(cfg.email.smtp_port, 465);
}

#[test]
fn serpapi_key_alone_selects_env_mode() {
    let mut map = HashMap::new();
    map.insert("SERPAPI_KEY", "serp");
    let (cfg, origin) = resolve_app_config(lookup_from_map(&map), &missing_path()).unwrap();
    assert_eq!(origin, ConfigOrigin::Environment);
    assert_eq!(cfg.serpapi_key(), Some("serp"));
    assert!(!cfg.telegram.enabled);
}

#[test]
fn empty_telegram_token_disables_channel() {
    let mut map = HashMap::new();
    map.insert("TELEGRAM_BOT_TOKEN", "");
    let (cfg, origin) = resolve_app_config(lookup_from_map(&map), &missing_path()).unwrap();
    assert_eq!(origin, ConfigOrigin::Environment);
    assert!(!cfg.telegram.enabled);
}

#[test]
fn invalid_threshold_is_rejected() {
    let mut map = telegram_env();
    map.insert("PRICE_THRESHOLD", "cheap");
    let result = resolve_app_config(lookup_from_map(&map), &missing_path());
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRICE_THRESHOLD"),
        "expected InvalidEnvVar(PRICE_THRESHOLD), got: {result:?}"
    );
}

#[test]
fn invalid_check_interval_is_rejected() {
    let mut map = telegram_env();
    map.insert("CHECK_INTERVAL", "hourly");
    let result = resolve_app_config(lookup_from_map(&map), &missing_path());
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "CHECK_INTERVAL"),
        "expected InvalidEnvVar(CHECK_INTERVAL), got: {result:?}"
    );
}

#[test]
fn unknown_source_is_rejected() {
    let mut map = telegram_env();
    map.insert("FAREWATCH_SOURCE", "carrier-pigeon");
    let result = resolve_app_config(lookup_from_map(&map), &missing_path());
    assert!(matches!(result, Err(ConfigError::UnknownSource(_))));
}

#[test]
fn no_env_and_no_file_falls_back_to_defaults() {
    let map: HashMap<&str, &str> = HashMap::new();
    let (cfg, origin) = resolve_app_config(lookup_from_map(&map), &missing_path()).unwrap();
    assert_eq!(origin, ConfigOrigin::Defaults);
    assert_eq!(cfg.price_threshold, Decimal::from(2000));
    assert!(!cfg.telegram.enabled);
    assert!(!cfg.email.enabled);
}

#[test]
fn json_file_is_used_when_env_is_silent() {
    let path = temp_path("json");
    std::fs::write(
        &path,
        r#"{
            "price_threshold": 1800,
            "check_interval_minutes": 15,
            "flights": [
                {"date": "04.02.2026", "url": "https://example.com/a"},
                {"date": "05.02.2026", "url": "https://example.com/b"}
            ],
            "telegram": {"enabled": true, "bot_token": "t", "chat_id": "c"},
            "email": {"enabled": false}
        }"#,
    )
    .unwrap();

    let map: HashMap<&str, &str> = HashMap::new();
    let (cfg, origin) = resolve_app_config(lookup_from_map(&map), &path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(origin, ConfigOrigin::File(path.clone()));
    assert_eq!(cfg.price_threshold, Decimal::from(1800));
    assert_eq!(cfg.check_interval_minutes, 15);
    assert_eq!(cfg.queries().len(), 2);
    assert!(cfg.telegram.enabled);
    assert_eq!(cfg.email.smtp_host, "smtp.gmail.com");
    assert_eq!(cfg.origin, "DIY");
}

#[test]
fn env_trigger_beats_existing_file() {
    let path = temp_path("json");
    std::fs::write(&path, r#"{"price_threshold": 100}"#).unwrap();

    let map = telegram_env();
    let (cfg, origin) = resolve_app_config(lookup_from_map(&map), &path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(origin, ConfigOrigin::Environment);
    assert_eq!(cfg.price_threshold, Decimal::from(2000));
}

#[test]
fn empty_env_trigger_does_not_override_file() {
    let path = temp_path("json");
    std::fs::write(&path, r#"{"price_threshold": "1500", "origin": "ESB"}"#).unwrap();

    let mut map = HashMap::new();
    map.insert("TELEGRAM_BOT_TOKEN", "");
    map.insert("SERPAPI_KEY", "");
    let (cfg, origin) = resolve_app_config(lookup_from_map(&map), &path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(origin, ConfigOrigin::File(path.clone()));
    assert_eq!(cfg.price_threshold, Decimal::from(1500));
    assert_eq!(cfg.origin, "ESB");
}

#[test]
fn yaml_file_is_parsed_by_extension() {
    let path = temp_path("yaml");
    std::fs::write(
        &path,
        "price_threshold: 1500\nsource: search\ndates:\n  - 2026-02-10\n",
    )
    .unwrap();

    let cfg = load_config_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(cfg.price_threshold, Decimal::from(1500));
    assert_eq!(cfg.source, SourceKind::SearchFlow);
    assert_eq!(cfg.dates, ["2026-02-10"]);
}

#[test]
fn malformed_json_file_is_an_error() {
    let path = temp_path("json");
    std::fs::write(&path, "{ not json").unwrap();

    let result = load_config_file(&path);
    std::fs::remove_file(&path).ok();

    assert!(matches!(result, Err(ConfigError::ConfigFileJson { .. })));
}
