use std::{
    collections::HashMap,
    time::{SystemTime, UNIX_EPOCH},
};

use super::*;

fn temp_settings_file(contents: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock after epoch")
        .as_nanos();
    let path = std::env::temp_dir().join(format!("appointments-settings-{stamp}.toml"));
    fs::write(&path, contents).expect("write settings file");
    path
}

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_point_at_local_backend() {
    let settings = ClientSettings::default();

    assert_eq!(settings.api_base_url, "http://127.0.0.1:8000/api/");
    assert_eq!(settings.auth_token, None);
    assert_eq!(settings.request_timeout(), Duration::from_secs(15));
    assert_eq!(
        settings.catalog_retry(),
        RetryPolicy {
            attempts: 1,
            delay: Duration::from_millis(500),
        }
    );
    assert_eq!(settings.log_filter, "info");
}

#[test]
fn partial_file_keeps_remaining_defaults() {
    let path = temp_settings_file(
        r#"
api_base_url = "https://salon.example/api"
catalog_retry_attempts = 3
"#,
    );

    let settings = read_settings_file(&path).expect("settings parse");
    let _ = fs::remove_file(&path);

    assert_eq!(settings.api_base_url, "https://salon.example/api");
    assert_eq!(settings.catalog_retry().attempts, 3);
    assert_eq!(settings.request_timeout_secs, 15);
    assert_eq!(settings.log_filter, "info");
}

#[test]
fn env_overrides_win_over_file_values() {
    let mut settings = ClientSettings {
        api_base_url: "https://from-file.example/api/".into(),
        ..ClientSettings::default()
    };

    apply_env_overrides(
        &mut settings,
        env(&[
            ("APP__API_BASE_URL", "https://from-env.example/api/"),
            ("APP__AUTH_TOKEN", "secret"),
            ("APP__REQUEST_TIMEOUT_SECS", "30"),
            ("APP__LOG_FILTER", "booking_client=debug"),
        ]),
    );

    assert_eq!(settings.api_base_url, "https://from-env.example/api/");
    assert_eq!(settings.auth_token.as_deref(), Some("secret"));
    assert_eq!(settings.request_timeout_secs, 30);
    assert_eq!(settings.log_filter, "booking_client=debug");
}

#[test]
fn unparsable_numeric_overrides_are_ignored() {
    let mut settings = ClientSettings::default();

    apply_env_overrides(
        &mut settings,
        env(&[
            ("APP__REQUEST_TIMEOUT_SECS", "soon"),
            ("APP__CATALOG_RETRY_ATTEMPTS", "-2"),
            ("APP__CATALOG_RETRY_DELAY_MS", "250"),
        ]),
    );

    assert_eq!(settings.request_timeout_secs, 15);
    assert_eq!(settings.catalog_retry_attempts, 1);
    assert_eq!(settings.catalog_retry_delay_ms, 250);
}

#[test]
fn zero_retry_attempts_still_try_once() {
    let settings = ClientSettings {
        catalog_retry_attempts: 0,
        ..ClientSettings::default()
    };

    assert_eq!(settings.catalog_retry().attempts, 1);
}

#[test]
fn malformed_file_reports_parse_error() {
    let path = temp_settings_file("request_timeout_secs = \"fifteen\"\n");

    let result = read_settings_file(&path);
    let _ = fs::remove_file(&path);

    assert!(matches!(result, Err(SettingsError::Parse { .. })));
}

#[test]
fn missing_explicit_file_reports_read_error() {
    let path = std::env::temp_dir().join("appointments-settings-does-not-exist.toml");

    let result = load_settings(Some(&path));

    assert!(matches!(result, Err(SettingsError::Read { .. })));
}
