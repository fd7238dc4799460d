use std::collections::HashMap;

use switchyard_core::config::{dirs_path, Settings};

#[test]
fn test_settings_defaults() {
    let settings = Settings::default();
    assert_eq!(settings.environment, "default");
    assert_eq!(settings.fetch_interval, 10);
    assert_eq!(settings.metrics_interval, 60);
    assert_eq!(settings.connect_timeout, 10);
    assert!(!settings.synchronous_fetch);
    assert!(settings.headers.is_empty());
}

#[test]
fn test_settings_empty_toml_uses_serde_defaults() {
    let settings: Settings = toml::from_str("").unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_dirs_path_contains_switchyard() {
    assert!(dirs_path().ends_with(".switchyard"));
}

#[test]
fn test_settings_parse_from_toml() {
    let toml = r#"
api-url = "https://flags.example.com/api"
app-name = "checkout"
environment = "production"
project = "web"
name-prefix = "checkout."
fetch-interval = 0
disable-metrics = true
synchronous-fetch = true

[headers]
Authorization = "*:production.abc"
X-Team = "payments"
"#;
    let settings: Settings = toml::from_str(toml).unwrap();
    assert_eq!(settings.api_url.as_deref(), Some("https://flags.example.com/api"));
    assert_eq!(settings.app_name.as_deref(), Some("checkout"));
    assert_eq!(settings.environment, "production");
    assert_eq!(settings.name_prefix.as_deref(), Some("checkout."));
    assert_eq!(settings.fetch_interval, 0);
    assert!(settings.disable_metrics);
    assert!(settings.synchronous_fetch);
    assert_eq!(settings.metrics_interval, 60);
    assert_eq!(settings.api_token(), Some("*:production.abc"));
    assert_eq!(settings.headers["X-Team"], "payments");
}

#[test]
fn test_load_from_missing_file_returns_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load_from(&dir.path().join("nope.toml")).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_load_from_invalid_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "fetch-interval = \"often\"").unwrap();
    let err = Settings::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse"));
}

#[test]
fn test_env_overrides() {
    let env: HashMap<&str, &str> = [
        ("UNLEASH_API_URL", "http://localhost:4242/api"),
        ("UNLEASH_API_TOKEN", "secret"),
        ("UNLEASH_APP_NAME", "from-env"),
        ("UNLEASH_BOOTSTRAP_FILE", ""),
    ]
    .into_iter()
    .collect();
    let settings = Settings {
        app_name: Some("from-file".into()),
        ..Settings::default()
    }
    .with_env_from(|k| env.get(k).map(|v| v.to_string()));

    assert_eq!(settings.api_url.as_deref(), Some("http://localhost:4242/api"));
    assert_eq!(settings.app_name.as_deref(), Some("from-env"));
    assert_eq!(settings.api_token(), Some("secret"));
    assert!(settings.bootstrap_file.is_none(), "blank values are ignored");
}
