use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::serde_util::{null_as_default, parameters_as_strings};
use crate::variant::{Variant, VariantDefinition};

/// A single toggle as served by `/client/features`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureToggle {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub toggle_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub stale: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub impression_data: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub strategies: Vec<ActivationStrategy>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub variants: Vec<VariantDefinition>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dependencies: Vec<FeatureDependency>,
}

impl FeatureToggle {
    /// A bare toggle with no strategies.
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            toggle_type: None,
            project: None,
            enabled,
            stale: false,
            impression_data: false,
            strategies: Vec::new(),
            variants: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_strategy(mut self, strategy: ActivationStrategy) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn with_variants(mut self, variants: Vec<VariantDefinition>) -> Self {
        self.variants = variants;
        self
    }

    pub fn with_dependency(mut self, dependency: FeatureDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn has_dependencies(&self) -> bool {
        !self.dependencies.is_empty()
    }
}

/// One entry in a toggle's strategy list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationStrategy {
    pub name: String,
    #[serde(default, deserialize_with = "parameters_as_strings")]
    pub parameters: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub constraints: Vec<Constraint>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub segments: Vec<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub variants: Vec<VariantDefinition>,
}

impl ActivationStrategy {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn segment(mut self, id: i64) -> Self {
        self.segments.push(id);
        self
    }

    pub fn variants(mut self, variants: Vec<VariantDefinition>) -> Self {
        self.variants = variants;
        self
    }
}

/// A predicate over one context field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    pub context_name: String,
    pub operator: Operator,
    #[serde(default, deserialize_with = "null_as_default")]
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub inverted: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub case_insensitive: bool,
}

impl Constraint {
    pub fn new<I, S>(context_name: impl Into<String>, operator: Operator, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            context_name: context_name.into(),
            operator,
            values: values.into_iter().map(Into::into).collect(),
            value: None,
            inverted: false,
            case_insensitive: false,
        }
    }

    /// A constraint compared against a single value (numeric, date and semver operators).
    pub fn single(context_name: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::new(context_name, operator, Vec::<String>::new())
        }
    }

    pub fn inverted(mut self) -> Self {
        self.inverted = true;
        self
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }
}

/// Constraint operators. Anything the server sends that this client does
/// not know is kept as [`Operator::Unknown`] and never matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    In,
    NotIn,
    StrContains,
    StrStartsWith,
    StrEndsWith,
    NumEq,
    NumGt,
    NumGte,
    NumLt,
    NumLte,
    DateAfter,
    DateBefore,
    SemverEq,
    SemverGt,
    SemverLt,
    Unknown(String),
}

impl Operator {
    pub fn as_str(&self) -> &str {
        match self {
            Operator::In => "IN",
            Operator::NotIn => "NOT_IN",
            Operator::StrContains => "STR_CONTAINS",
            Operator::StrStartsWith => "STR_STARTS_WITH",
            Operator::StrEndsWith => "STR_ENDS_WITH",
            Operator::NumEq => "NUM_EQ",
            Operator::NumGt => "NUM_GT",
            Operator::NumGte => "NUM_GTE",
            Operator::NumLt => "NUM_LT",
            Operator::NumLte => "NUM_LTE",
            Operator::DateAfter => "DATE_AFTER",
            Operator::DateBefore => "DATE_BEFORE",
            Operator::SemverEq => "SEMVER_EQ",
            Operator::SemverGt => "SEMVER_GT",
            Operator::SemverLt => "SEMVER_LT",
            Operator::Unknown(raw) => raw,
        }
    }
}

impl From<String> for Operator {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "IN" => Operator::In,
            "NOT_IN" => Operator::NotIn,
            "STR_CONTAINS" => Operator::StrContains,
            "STR_STARTS_WITH" => Operator::StrStartsWith,
            "STR_ENDS_WITH" => Operator::StrEndsWith,
            "NUM_EQ" => Operator::NumEq,
            "NUM_GT" => Operator::NumGt,
            "NUM_GTE" => Operator::NumGte,
            "NUM_LT" => Operator::NumLt,
            "NUM_LTE" => Operator::NumLte,
            "DATE_AFTER" => Operator::DateAfter,
            "DATE_BEFORE" => Operator::DateBefore,
            "SEMVER_EQ" => Operator::SemverEq,
            "SEMVER_GT" => Operator::SemverGt,
            "SEMVER_LT" => Operator::SemverLt,
            _ => Operator::Unknown(raw),
        }
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        match op {
            Operator::Unknown(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, reusable list of constraints referenced by id from strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub constraints: Vec<Constraint>,
}

/// A parent toggle this toggle depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDependency {
    pub feature: String,
    /// `None` means the parent must be enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<String>>,
}

impl FeatureDependency {
    pub fn new(feature: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            enabled: None,
            variants: None,
        }
    }

    /// Whether the parent is required to be enabled (the default) or disabled.
    pub fn requires_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

/// The outcome of evaluating one toggle, as returned by bulk evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedToggle {
    pub name: String,
    pub enabled: bool,
    pub variant: Variant,
}

/// Metadata about a known toggle, without its rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDefinition {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub toggle_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

impl From<&FeatureToggle> for FeatureDefinition {
    fn from(toggle: &FeatureToggle) -> Self {
        Self {
            name: toggle.name.clone(),
            toggle_type: toggle.toggle_type.clone(),
            project: toggle.project.clone(),
        }
    }
}
