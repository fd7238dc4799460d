use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use switchyard_util::errors::SwitchyardError;

pub const ENV_API_URL: &str = "UNLEASH_API_URL";
pub const ENV_API_TOKEN: &str = "UNLEASH_API_TOKEN";
pub const ENV_APP_NAME: &str = "UNLEASH_APP_NAME";
pub const ENV_BOOTSTRAP_FILE: &str = "UNLEASH_BOOTSTRAP_FILE";

/// Header the API token is sent in.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Client settings loaded from `~/.switchyard/config.toml`.
///
/// Every field has a serde default so a partial (or absent) file works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub instance_id: Option<String>,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub name_prefix: Option<String>,
    #[serde(default)]
    pub backup_file: Option<String>,
    #[serde(default)]
    pub bootstrap_file: Option<String>,
    /// Seconds between toggle fetches. `0` fetches once.
    #[serde(default = "default_fetch_interval")]
    pub fetch_interval: u64,
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval: u64,
    #[serde(default)]
    pub disable_polling: bool,
    #[serde(default)]
    pub disable_metrics: bool,
    #[serde(default)]
    pub synchronous_fetch: bool,
    #[serde(default = "default_timeout")]
    pub connect_timeout: u64,
    #[serde(default = "default_timeout")]
    pub read_timeout: u64,
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: None,
            app_name: None,
            instance_id: None,
            environment: default_environment(),
            project: None,
            name_prefix: None,
            backup_file: None,
            bootstrap_file: None,
            fetch_interval: default_fetch_interval(),
            metrics_interval: default_metrics_interval(),
            disable_polling: false,
            disable_metrics: false,
            synchronous_fetch: false,
            connect_timeout: default_timeout(),
            read_timeout: default_timeout(),
            proxy: None,
            headers: BTreeMap::new(),
        }
    }
}

fn default_environment() -> String {
    "default".to_string()
}

fn default_fetch_interval() -> u64 {
    10
}

fn default_metrics_interval() -> u64 {
    60
}

fn default_timeout() -> u64 {
    10
}

impl Settings {
    /// Load settings from `~/.switchyard/config.toml`, or return defaults if the file doesn't exist.
    pub fn load() -> miette::Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load settings from an explicit path; a missing file yields defaults.
    pub fn load_from(path: &Path) -> miette::Result<Self> {
        if !path.is_file() {
            tracing::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            SwitchyardError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&content).map_err(|e| {
            SwitchyardError::config(format!("Failed to parse {}: {e}", path.display())).into()
        })
    }

    /// Returns the default path to the settings file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// Apply `UNLEASH_*` overrides from the process environment.
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Apply `UNLEASH_*` overrides using `lookup` in place of the process environment.
    pub fn with_env_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = get(ENV_API_URL) {
            self.api_url = Some(url);
        }
        if let Some(token) = get(ENV_API_TOKEN) {
            self.headers.insert(AUTHORIZATION_HEADER.to_string(), token);
        }
        if let Some(app) = get(ENV_APP_NAME) {
            self.app_name = Some(app);
        }
        if let Some(file) = get(ENV_BOOTSTRAP_FILE) {
            self.bootstrap_file = Some(file);
        }
        self
    }

    /// The API token, if one is configured through the `Authorization` header.
    pub fn api_token(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(AUTHORIZATION_HEADER))
            .map(|(_, v)| v.as_str())
    }
}

/// Returns the path to the Switchyard data directory (`~/.switchyard/`).
pub fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".switchyard")
}
