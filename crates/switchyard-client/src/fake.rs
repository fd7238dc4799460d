use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use switchyard_core::context::Context;
use switchyard_core::feature::{EvaluatedToggle, FeatureDefinition};
use switchyard_core::variant::Variant;

use crate::toggles::FeatureToggles;

type Matcher = Arc<dyn Fn(&Context) -> bool + Send + Sync>;

#[derive(Default)]
struct FakeState {
    enable_all: bool,
    disable_all: bool,
    excluded: HashMap<String, bool>,
    features: HashMap<String, Vec<Matcher>>,
    variants: HashMap<String, Variant>,
}

impl FakeState {
    fn clear_toggles(&mut self) {
        self.excluded.clear();
        self.features.clear();
    }
}

/// An in-memory [`FeatureToggles`] for tests. Nothing is fetched and
/// nothing is counted.
#[derive(Default)]
pub struct FakeClient {
    state: Mutex<FakeState>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn enable_all(&self) {
        let mut s = self.state();
        s.disable_all = false;
        s.enable_all = true;
        s.clear_toggles();
    }

    pub fn enable_all_except(&self, names: &[&str]) {
        self.enable_all();
        let mut s = self.state();
        for name in names {
            s.excluded.insert(name.to_string(), false);
        }
    }

    pub fn disable_all(&self) {
        let mut s = self.state();
        s.enable_all = false;
        s.disable_all = true;
        s.clear_toggles();
    }

    pub fn disable_all_except(&self, names: &[&str]) {
        self.disable_all();
        let mut s = self.state();
        for name in names {
            s.excluded.insert(name.to_string(), true);
        }
    }

    pub fn reset_all(&self) {
        let mut s = self.state();
        *s = FakeState::default();
    }

    pub fn enable(&self, names: &[&str]) {
        let mut s = self.state();
        for name in names {
            s.features.insert(name.to_string(), vec![Arc::new(|_: &Context| true) as Matcher]);
        }
    }

    pub fn disable(&self, names: &[&str]) {
        let mut s = self.state();
        for name in names {
            s.features.insert(name.to_string(), vec![Arc::new(|_: &Context| false) as Matcher]);
        }
    }

    pub fn reset(&self, names: &[&str]) {
        let mut s = self.state();
        for name in names {
            s.features.remove(*name);
        }
    }

    /// Enable `names` for contexts matching `predicate`. Repeated calls add
    /// more predicates; any match enables the toggle.
    pub fn conditionally_enable<F>(&self, predicate: F, names: &[&str])
    where
        F: Fn(&Context) -> bool + Send + Sync + 'static,
    {
        let matcher: Matcher = Arc::new(predicate);
        let mut s = self.state();
        for name in names {
            s.features
                .entry(name.to_string())
                .or_default()
                .push(Arc::clone(&matcher));
        }
    }

    pub fn set_variant(&self, name: &str, variant: Variant) {
        self.state().variants.insert(name.to_string(), variant);
    }
}

impl FeatureToggles for FakeClient {
    fn is_enabled_with(&self, name: &str, context: &Context, fallback: &dyn Fn(&str, &Context) -> bool) -> bool {
        let matchers = {
            let s = self.state();
            if s.enable_all {
                return s.excluded.get(name).copied().unwrap_or(true);
            }
            if s.disable_all {
                return s.excluded.get(name).copied().unwrap_or(false);
            }
            s.features.get(name).cloned()
        };
        match matchers {
            Some(matchers) => matchers.iter().any(|m| m(context)),
            None => fallback(name, context),
        }
    }

    fn variant_or(&self, name: &str, _context: &Context, default: Variant) -> Variant {
        if !self.is_enabled(name, &Context::default()) {
            return default;
        }
        self.state().variants.get(name).cloned().unwrap_or(default)
    }

    fn toggle_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state().features.keys().cloned().collect();
        names.sort();
        names
    }

    fn definition(&self, name: &str) -> Option<FeatureDefinition> {
        self.state().features.contains_key(name).then(|| FeatureDefinition {
            name: name.to_string(),
            toggle_type: Some("experiment".to_string()),
            project: Some("default".to_string()),
        })
    }

    fn evaluate_all(&self, context: &Context) -> Vec<EvaluatedToggle> {
        self.toggle_names()
            .into_iter()
            .map(|name| EvaluatedToggle {
                enabled: self.is_enabled(&name, context),
                variant: self.variant(&name, context),
                name,
            })
            .collect()
    }
}
