use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use switchyard_core::collection::FeatureCollection;
use switchyard_core::context::Context;
use switchyard_core::feature::{
    ActivationStrategy, EvaluatedToggle, FeatureDefinition, FeatureToggle, Segment,
};
use switchyard_core::variant::Variant;

use crate::constraint;
use crate::strategy::{builtin_strategies, Strategy, GROUP_ID};
use crate::variant::select_variant;

/// An immutable snapshot of the toggles the engine evaluates against.
#[derive(Debug, Default)]
pub struct EngineState {
    order: Vec<String>,
    toggles: HashMap<String, FeatureToggle>,
    segments: HashMap<i64, Segment>,
}

impl EngineState {
    pub fn from_collection(collection: FeatureCollection) -> Self {
        let order = collection.toggle_names();
        let toggles = collection
            .features
            .into_iter()
            .map(|t| (t.name.clone(), t))
            .collect();
        let segments = collection
            .segments
            .into_iter()
            .map(|s| (s.id, s))
            .collect();
        Self {
            order,
            toggles,
            segments,
        }
    }

    pub fn toggle(&self, name: &str) -> Option<&FeatureToggle> {
        self.toggles.get(name)
    }

    /// Toggles in the order the server listed them.
    pub fn toggles(&self) -> impl Iterator<Item = &FeatureToggle> {
        self.order.iter().filter_map(|name| self.toggles.get(name))
    }

    pub fn is_empty(&self) -> bool {
        self.toggles.is_empty()
    }
}

/// Result of running a toggle's rules: whether it is on, and the variant
/// chosen by the strategy that turned it on, if that strategy has variants.
struct Resolution {
    enabled: bool,
    strategy_variant: Option<Variant>,
}

impl Resolution {
    fn off() -> Self {
        Self {
            enabled: false,
            strategy_variant: None,
        }
    }
}

/// Evaluates toggles locally.
///
/// State is replaced wholesale by [`Engine::take_state`]; readers hold an
/// `Arc` to the snapshot they started with.
pub struct Engine {
    state: RwLock<Arc<EngineState>>,
    has_state: AtomicBool,
    strategies: HashMap<String, Arc<dyn Strategy>>,
    fallback: Option<Arc<dyn Strategy>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_strategies(Vec::new(), None)
    }

    /// An engine with extra strategies (overriding built-ins of the same
    /// name) and an optional strategy used for names nobody registered.
    pub fn with_strategies(custom: Vec<Arc<dyn Strategy>>, fallback: Option<Arc<dyn Strategy>>) -> Self {
        let strategies = builtin_strategies()
            .into_iter()
            .chain(custom)
            .map(|s| (s.name().to_string(), s))
            .collect();
        Self {
            state: RwLock::new(Arc::new(EngineState::default())),
            has_state: AtomicBool::new(false),
            strategies,
            fallback,
        }
    }

    /// Names of every strategy this engine can evaluate, sorted.
    pub fn strategy_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.strategies.keys().cloned().collect();
        names.sort();
        names
    }

    /// Replace the toggle state.
    pub fn take_state(&self, collection: FeatureCollection) {
        let next = Arc::new(EngineState::from_collection(collection));
        tracing::debug!("Engine now holds {} toggles", next.toggles.len());
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next;
        self.has_state.store(true, Ordering::Release);
    }

    /// The current snapshot.
    pub fn state(&self) -> Arc<EngineState> {
        Arc::clone(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Whether state has ever been loaded (an empty collection counts).
    pub fn has_state(&self) -> bool {
        self.has_state.load(Ordering::Acquire)
    }

    /// `None` when the toggle is unknown.
    pub fn is_enabled(&self, name: &str, context: &Context) -> Option<bool> {
        let state = self.state();
        let toggle = state.toggle(name)?;
        Some(self.resolve(&state, toggle, context).enabled)
    }

    /// `None` when the toggle is unknown.
    pub fn get_variant(&self, name: &str, context: &Context) -> Option<Variant> {
        let state = self.state();
        let toggle = state.toggle(name)?;
        Some(self.variant_for(&state, toggle, context))
    }

    /// Evaluate every known toggle.
    pub fn evaluate_all(&self, context: &Context) -> Vec<EvaluatedToggle> {
        let state = self.state();
        state
            .toggles()
            .map(|toggle| {
                let variant = self.variant_for(&state, toggle, context);
                EvaluatedToggle {
                    name: toggle.name.clone(),
                    enabled: variant.feature_enabled,
                    variant,
                }
            })
            .collect()
    }

    pub fn should_emit_impression(&self, name: &str) -> bool {
        self.state()
            .toggle(name)
            .map(|t| t.impression_data)
            .unwrap_or(false)
    }

    pub fn toggle_names(&self) -> Vec<String> {
        self.state().order.clone()
    }

    pub fn definition(&self, name: &str) -> Option<FeatureDefinition> {
        self.state().toggle(name).map(FeatureDefinition::from)
    }

    pub fn definitions(&self) -> Vec<FeatureDefinition> {
        self.state().toggles().map(FeatureDefinition::from).collect()
    }

    fn variant_for(&self, state: &EngineState, toggle: &FeatureToggle, context: &Context) -> Variant {
        let resolution = self.resolve(state, toggle, context);
        if !resolution.enabled {
            return Variant::disabled();
        }
        if let Some(variant) = resolution.strategy_variant {
            return variant;
        }
        select_variant(&toggle.name, &toggle.variants, context)
            .map(|def| def.to_variant(true))
            .unwrap_or_else(|| Variant::disabled().with_feature_enabled(true))
    }

    fn resolve(&self, state: &EngineState, toggle: &FeatureToggle, context: &Context) -> Resolution {
        if !toggle.enabled || !self.dependencies_satisfied(state, toggle, context) {
            return Resolution::off();
        }
        if toggle.strategies.is_empty() {
            return Resolution {
                enabled: true,
                strategy_variant: None,
            };
        }
        for strategy in &toggle.strategies {
            if self.strategy_enabled(state, strategy, context) {
                let group = strategy
                    .parameters
                    .get(GROUP_ID)
                    .map(String::as_str)
                    .unwrap_or(&toggle.name);
                let strategy_variant =
                    select_variant(group, &strategy.variants, context).map(|def| def.to_variant(true));
                return Resolution {
                    enabled: true,
                    strategy_variant,
                };
            }
        }
        Resolution::off()
    }

    fn strategy_enabled(&self, state: &EngineState, strategy: &ActivationStrategy, context: &Context) -> bool {
        let Some(implementation) = self
            .strategies
            .get(&strategy.name)
            .or(self.fallback.as_ref())
        else {
            tracing::debug!("Unknown strategy {}", strategy.name);
            return false;
        };

        if !constraint::all_hold(&strategy.constraints, context) {
            return false;
        }
        for id in &strategy.segments {
            match state.segments.get(id) {
                Some(segment) => {
                    if !constraint::all_hold(&segment.constraints, context) {
                        return false;
                    }
                }
                None => {
                    tracing::debug!("Strategy {} references missing segment {id}", strategy.name);
                    return false;
                }
            }
        }
        implementation.is_enabled(&strategy.parameters, context)
    }

    fn dependencies_satisfied(&self, state: &EngineState, toggle: &FeatureToggle, context: &Context) -> bool {
        toggle.dependencies.iter().all(|dep| {
            let Some(parent) = state.toggle(&dep.feature) else {
                tracing::debug!("{} depends on unknown toggle {}", toggle.name, dep.feature);
                return false;
            };
            if parent.has_dependencies() {
                tracing::warn!(
                    "{} depends on {}, which has dependencies of its own; only one level is supported",
                    toggle.name,
                    parent.name
                );
                return false;
            }
            if !dep.requires_enabled() {
                return !self.resolve(state, parent, context).enabled;
            }
            match &dep.variants {
                Some(allowed) if !allowed.is_empty() => {
                    let variant = self.variant_for(state, parent, context);
                    variant.feature_enabled && allowed.contains(&variant.name)
                }
                _ => self.resolve(state, parent, context).enabled,
            }
        })
    }
}
