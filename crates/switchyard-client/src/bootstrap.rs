//! Initial toggle state used when no backup exists.

use std::path::PathBuf;

use switchyard_core::config::ENV_BOOTSTRAP_FILE;

/// Supplies a toggle collection as JSON text.
pub trait BootstrapProvider: Send + Sync {
    fn read(&self) -> Option<String>;
}

/// Reads bootstrap JSON from a file.
#[derive(Debug, Clone)]
pub struct FileBootstrapProvider {
    path: PathBuf,
}

impl FileBootstrapProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Use the path in `UNLEASH_BOOTSTRAP_FILE`, if set.
    pub fn from_env() -> Option<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    pub fn from_env_with<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(ENV_BOOTSTRAP_FILE)
            .filter(|p| !p.trim().is_empty())
            .map(Self::new)
    }
}

impl BootstrapProvider for FileBootstrapProvider {
    fn read(&self) -> Option<String> {
        let path = &self.path;
        match std::fs::read_to_string(path) {
            Ok(content) => Some(content),
            Err(e) => {
                tracing::warn!("Could not read bootstrap file {}: {e}", path.display());
                None
            }
        }
    }
}

/// Bootstrap from an in-memory JSON string.
#[derive(Debug, Clone)]
pub struct StaticBootstrapProvider {
    json: String,
}

impl StaticBootstrapProvider {
    pub fn new(json: impl Into<String>) -> Self {
        Self { json: json.into() }
    }
}

impl BootstrapProvider for StaticBootstrapProvider {
    fn read(&self) -> Option<String> {
        Some(self.json.clone())
    }
}
