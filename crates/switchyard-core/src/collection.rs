use serde::{Deserialize, Serialize};
use switchyard_util::errors::SwitchyardError;

use crate::feature::{FeatureToggle, Segment};
use crate::serde_util::null_as_default;

fn default_version() -> u32 {
    2
}

/// The full toggle payload in the `/client/features` format. The same shape
/// is used for backup and bootstrap files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub features: Vec<FeatureToggle>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub segments: Vec<Segment>,
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self {
            version: default_version(),
            features: Vec::new(),
            segments: Vec::new(),
        }
    }
}

impl FeatureCollection {
    pub fn new(features: Vec<FeatureToggle>, segments: Vec<Segment>) -> Self {
        Self {
            version: default_version(),
            features,
            segments,
        }
    }

    /// Parse a collection from JSON text.
    pub fn from_json(json: &str) -> Result<Self, SwitchyardError> {
        serde_json::from_str(json)
            .map_err(|e| SwitchyardError::parse(format!("invalid toggle collection: {e}")))
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, SwitchyardError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SwitchyardError::parse(format!("could not serialize toggles: {e}")))
    }

    pub fn toggle(&self, name: &str) -> Option<&FeatureToggle> {
        self.features.iter().find(|t| t.name == name)
    }

    pub fn segment(&self, id: i64) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }

    pub fn toggle_names(&self) -> Vec<String> {
        self.features.iter().map(|t| t.name.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
