use serde::{Deserialize, Serialize};

use crate::serde_util::null_as_default;

/// Name of the variant returned when no variant applies.
pub const DISABLED_VARIANT: &str = "disabled";

/// An opaque value attached to a variant, e.g. `{ "type": "json", "value": "{...}" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(rename = "type")]
    pub payload_type: String,
    #[serde(default)]
    pub value: String,
}

impl Payload {
    pub fn new(payload_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            payload_type: payload_type.into(),
            value: value.into(),
        }
    }
}

/// Forces a variant for contexts whose field matches one of `values`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantOverride {
    pub context_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub values: Vec<String>,
}

/// A weighted variant as defined on a toggle or strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantDefinition {
    pub name: String,
    #[serde(default)]
    pub weight: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stickiness: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overrides: Vec<VariantOverride>,
}

impl VariantDefinition {
    pub fn new(name: impl Into<String>, weight: i32) -> Self {
        Self {
            name: name.into(),
            weight,
            weight_type: None,
            stickiness: None,
            payload: None,
            overrides: Vec::new(),
        }
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_stickiness(mut self, stickiness: impl Into<String>) -> Self {
        self.stickiness = Some(stickiness.into());
        self
    }

    pub fn with_override<I, S>(mut self, context_name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.overrides.push(VariantOverride {
            context_name: context_name.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Resolve this definition into the variant handed to callers.
    pub fn to_variant(&self, feature_enabled: bool) -> Variant {
        Variant {
            name: self.name.clone(),
            payload: self.payload.clone(),
            enabled: true,
            feature_enabled,
        }
    }
}

/// The variant chosen for a toggle evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    pub enabled: bool,
    #[serde(default, alias = "feature_enabled")]
    pub feature_enabled: bool,
}

impl Variant {
    pub fn new(name: impl Into<String>, payload: Option<Payload>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            payload,
            enabled,
            feature_enabled: false,
        }
    }

    /// The "no variant" answer: name `disabled`, not enabled.
    pub fn disabled() -> Self {
        Self::new(DISABLED_VARIANT, None, false)
    }

    pub fn with_feature_enabled(mut self, feature_enabled: bool) -> Self {
        self.feature_enabled = feature_enabled;
        self
    }
}

impl Default for Variant {
    fn default() -> Self {
        Self::disabled()
    }
}
