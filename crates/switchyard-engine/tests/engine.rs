use std::collections::HashMap;
use std::sync::Arc;

use switchyard_core::collection::FeatureCollection;
use switchyard_core::context::Context;
use switchyard_core::feature::{
    ActivationStrategy, Constraint, FeatureDependency, FeatureToggle, Operator, Segment,
};
use switchyard_core::variant::{Payload, VariantDefinition};
use switchyard_engine::{Engine, Strategy};

fn user(id: &str) -> Context {
    Context::builder().user_id(id).build()
}

fn engine_with(features: Vec<FeatureToggle>, segments: Vec<Segment>) -> Engine {
    let engine = Engine::new();
    engine.take_state(FeatureCollection::new(features, segments));
    engine
}

#[test]
fn test_unknown_toggle_is_none() {
    let engine = engine_with(vec![], vec![]);
    assert_eq!(engine.is_enabled("missing", &Context::default()), None);
    assert_eq!(engine.get_variant("missing", &Context::default()), None);
}

#[test]
fn test_has_state_after_first_load() {
    let engine = Engine::new();
    assert!(!engine.has_state());
    engine.take_state(FeatureCollection::default());
    assert!(engine.has_state());
}

#[test]
fn test_enabled_without_strategies() {
    let engine = engine_with(
        vec![FeatureToggle::new("on", true), FeatureToggle::new("off", false)],
        vec![],
    );
    assert_eq!(engine.is_enabled("on", &Context::default()), Some(true));
    assert_eq!(engine.is_enabled("off", &Context::default()), Some(false));
}

#[test]
fn test_disabled_toggle_ignores_strategies() {
    let toggle = FeatureToggle::new("t", false).with_strategy(ActivationStrategy::new("default"));
    let engine = engine_with(vec![toggle], vec![]);
    assert_eq!(engine.is_enabled("t", &Context::default()), Some(false));
}

#[test]
fn test_any_strategy_enables() {
    let toggle = FeatureToggle::new("t", true)
        .with_strategy(ActivationStrategy::new("userWithId").param("userIds", "1"))
        .with_strategy(ActivationStrategy::new("userWithId").param("userIds", "2"));
    let engine = engine_with(vec![toggle], vec![]);
    assert_eq!(engine.is_enabled("t", &user("2")), Some(true));
    assert_eq!(engine.is_enabled("t", &user("3")), Some(false));
}

#[test]
fn test_unknown_strategy_is_off_without_fallback() {
    let toggle = FeatureToggle::new("t", true).with_strategy(ActivationStrategy::new("fancy"));
    let engine = engine_with(vec![toggle], vec![]);
    assert_eq!(engine.is_enabled("t", &Context::default()), Some(false));
}

struct AlwaysOn(&'static str);

impl Strategy for AlwaysOn {
    fn name(&self) -> &str {
        self.0
    }

    fn is_enabled(&self, _parameters: &HashMap<String, String>, _context: &Context) -> bool {
        true
    }
}

#[test]
fn test_custom_and_fallback_strategies() {
    let toggles = vec![
        FeatureToggle::new("custom", true).with_strategy(ActivationStrategy::new("fancy")),
        FeatureToggle::new("other", true).with_strategy(ActivationStrategy::new("whatever")),
    ];
    let custom = Engine::with_strategies(vec![Arc::new(AlwaysOn("fancy"))], None);
    custom.take_state(FeatureCollection::new(toggles.clone(), vec![]));
    assert_eq!(custom.is_enabled("custom", &Context::default()), Some(true));
    assert_eq!(custom.is_enabled("other", &Context::default()), Some(false));

    let fallback = Engine::with_strategies(vec![], Some(Arc::new(AlwaysOn("fallback"))));
    fallback.take_state(FeatureCollection::new(toggles, vec![]));
    assert_eq!(fallback.is_enabled("other", &Context::default()), Some(true));
}

#[test]
fn test_constraints_gate_strategy() {
    let toggle = FeatureToggle::new("t", true).with_strategy(
        ActivationStrategy::new("default")
            .constraint(Constraint::new("environment", Operator::In, ["prod"])),
    );
    let engine = engine_with(vec![toggle], vec![]);
    let prod = Context::builder().environment("prod").build();
    assert_eq!(engine.is_enabled("t", &prod), Some(true));
    assert_eq!(engine.is_enabled("t", &Context::default()), Some(false));
}

#[test]
fn test_segments_apply_and_missing_segment_disables() {
    let segment = Segment {
        id: 7,
        name: Some("eu".into()),
        constraints: vec![Constraint::new("region", Operator::In, ["eu"])],
    };
    let toggles = vec![
        FeatureToggle::new("seg", true).with_strategy(ActivationStrategy::new("default").segment(7)),
        FeatureToggle::new("dangling", true)
            .with_strategy(ActivationStrategy::new("default").segment(99)),
    ];
    let engine = engine_with(toggles, vec![segment]);
    let eu = Context::builder().property("region", "eu").build();
    let us = Context::builder().property("region", "us").build();
    assert_eq!(engine.is_enabled("seg", &eu), Some(true));
    assert_eq!(engine.is_enabled("seg", &us), Some(false));
    assert_eq!(engine.is_enabled("dangling", &eu), Some(false));
}

fn ab_variants() -> Vec<VariantDefinition> {
    vec![
        VariantDefinition::new("a", 500),
        VariantDefinition::new("b", 500).with_payload(Payload::new("string", "bee")),
    ]
}

#[test]
fn test_toggle_level_variants() {
    let toggle = FeatureToggle::new("variants.toggle", true).with_variants(ab_variants());
    let engine = engine_with(vec![toggle], vec![]);

    // buckets out of 1000: user 1 -> 383, user 3 -> 927
    let a = engine.get_variant("variants.toggle", &user("1")).unwrap();
    assert_eq!(a.name, "a");
    assert!(a.enabled);
    assert!(a.feature_enabled);

    let b = engine.get_variant("variants.toggle", &user("3")).unwrap();
    assert_eq!(b.name, "b");
    assert_eq!(b.payload, Some(Payload::new("string", "bee")));
}

#[test]
fn test_strategy_variants_take_precedence() {
    let toggle = FeatureToggle::new("t", true)
        .with_strategy(
            ActivationStrategy::new("default")
                .param("groupId", "custom-group")
                .variants(vec![
                    VariantDefinition::new("x", 500),
                    VariantDefinition::new("y", 500),
                ]),
        )
        .with_variants(ab_variants());
    let engine = engine_with(vec![toggle], vec![]);
    // buckets in custom-group: user 2 -> 96, user 4 -> 940
    assert_eq!(engine.get_variant("t", &user("2")).unwrap().name, "x");
    assert_eq!(engine.get_variant("t", &user("4")).unwrap().name, "y");
}

#[test]
fn test_variant_for_disabled_and_variantless_toggles() {
    let engine = engine_with(
        vec![
            FeatureToggle::new("off", false).with_variants(ab_variants()),
            FeatureToggle::new("plain", true),
        ],
        vec![],
    );
    let off = engine.get_variant("off", &user("1")).unwrap();
    assert_eq!(off.name, "disabled");
    assert!(!off.feature_enabled);

    let plain = engine.get_variant("plain", &user("1")).unwrap();
    assert_eq!(plain.name, "disabled");
    assert!(!plain.enabled);
    assert!(plain.feature_enabled);
}

#[test]
fn test_dependencies() {
    let toggles = vec![
        FeatureToggle::new("parent", true).with_variants(ab_variants()),
        FeatureToggle::new("off-parent", false),
        FeatureToggle::new("child", true).with_dependency(FeatureDependency::new("parent")),
        FeatureToggle::new("needs-off", true).with_dependency(FeatureDependency {
            enabled: Some(false),
            ..FeatureDependency::new("off-parent")
        }),
        FeatureToggle::new("needs-a", true).with_dependency(FeatureDependency {
            variants: Some(vec!["a".into()]),
            ..FeatureDependency::new("parent")
        }),
        FeatureToggle::new("orphan", true).with_dependency(FeatureDependency::new("nobody")),
        FeatureToggle::new("grandchild", true).with_dependency(FeatureDependency::new("child")),
    ];
    let engine = engine_with(toggles, vec![]);
    let ctx = user("1");
    assert_eq!(engine.is_enabled("child", &ctx), Some(true));
    assert_eq!(engine.is_enabled("needs-off", &ctx), Some(true));
    assert_eq!(engine.is_enabled("needs-a", &ctx), Some(true));
    assert_eq!(engine.is_enabled("needs-a", &user("3")), Some(false));
    assert_eq!(engine.is_enabled("orphan", &ctx), Some(false));
    assert_eq!(engine.is_enabled("grandchild", &ctx), Some(false));
}

#[test]
fn test_metadata_queries() {
    let mut toggle = FeatureToggle::new("second", true);
    toggle.impression_data = true;
    toggle.project = Some("web".into());
    let engine = engine_with(vec![FeatureToggle::new("first", true), toggle], vec![]);

    assert_eq!(engine.toggle_names(), vec!["first", "second"]);
    assert!(engine.should_emit_impression("second"));
    assert!(!engine.should_emit_impression("first"));
    assert!(!engine.should_emit_impression("unknown"));
    assert_eq!(engine.definition("second").unwrap().project.as_deref(), Some("web"));
    assert_eq!(engine.definitions().len(), 2);
}

#[test]
fn test_evaluate_all() {
    let engine = engine_with(
        vec![FeatureToggle::new("on", true), FeatureToggle::new("off", false)],
        vec![],
    );
    let all = engine.evaluate_all(&Context::default());
    assert_eq!(all.len(), 2);
    assert!(all[0].enabled);
    assert!(!all[1].enabled);
}

#[test]
fn test_take_state_replaces_previous() {
    let engine = engine_with(vec![FeatureToggle::new("old", true)], vec![]);
    engine.take_state(FeatureCollection::new(vec![FeatureToggle::new("new", true)], vec![]));
    assert_eq!(engine.is_enabled("old", &Context::default()), None);
    assert_eq!(engine.is_enabled("new", &Context::default()), Some(true));
}
