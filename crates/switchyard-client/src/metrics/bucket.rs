use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Usage counts for one toggle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToggleCount {
    pub yes: u64,
    pub no: u64,
    pub variants: HashMap<String, u64>,
}

/// Usage counts collected between two metric sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsBucket {
    pub start: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<DateTime<Utc>>,
    pub toggles: HashMap<String, ToggleCount>,
}

impl Default for MetricsBucket {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsBucket {
    pub fn new() -> Self {
        Self {
            start: Utc::now(),
            stop: None,
            toggles: HashMap::new(),
        }
    }

    pub fn register_count(&mut self, name: &str, enabled: bool) {
        let count = self.toggles.entry(name.to_string()).or_default();
        if enabled {
            count.yes += 1;
        } else {
            count.no += 1;
        }
    }

    pub fn register_variant(&mut self, name: &str, variant: &str) {
        *self
            .toggles
            .entry(name.to_string())
            .or_default()
            .variants
            .entry(variant.to_string())
            .or_default() += 1;
    }

    pub fn end(&mut self) {
        self.stop = Some(Utc::now());
    }

    pub fn is_empty(&self) -> bool {
        self.toggles.is_empty()
    }
}
