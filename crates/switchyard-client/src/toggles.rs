use switchyard_core::context::Context;
use switchyard_core::feature::{EvaluatedToggle, FeatureDefinition};
use switchyard_core::variant::Variant;

/// The application-facing toggle API, shared by [`crate::Client`] and
/// [`crate::FakeClient`].
pub trait FeatureToggles: Send + Sync {
    /// Evaluate `name`, calling `fallback` when the toggle is unknown.
    fn is_enabled_with(&self, name: &str, context: &Context, fallback: &dyn Fn(&str, &Context) -> bool) -> bool;

    /// Variant for `name`, or `default` when the toggle is unknown.
    fn variant_or(&self, name: &str, context: &Context, default: Variant) -> Variant;

    fn toggle_names(&self) -> Vec<String>;

    fn definition(&self, name: &str) -> Option<FeatureDefinition>;

    /// Evaluate every known toggle without recording metrics.
    fn evaluate_all(&self, context: &Context) -> Vec<EvaluatedToggle>;

    fn count(&self, _name: &str, _enabled: bool) {}

    fn count_variant(&self, _name: &str, _variant: &str) {}

    /// Stop background work.
    fn shutdown(&self) {}

    fn is_enabled(&self, name: &str, context: &Context) -> bool {
        self.is_enabled_or(name, context, false)
    }

    fn is_enabled_or(&self, name: &str, context: &Context, default: bool) -> bool {
        self.is_enabled_with(name, context, &|_, _| default)
    }

    fn variant(&self, name: &str, context: &Context) -> Variant {
        self.variant_or(name, context, Variant::disabled())
    }
}
