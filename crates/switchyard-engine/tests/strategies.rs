use std::collections::HashMap;

use switchyard_core::context::Context;
use switchyard_engine::strategy::{
    builtin_strategies, ApplicationHostnameStrategy, DefaultStrategy, FlexibleRolloutStrategy,
    GradualRolloutRandomStrategy, GradualRolloutSessionIdStrategy, GradualRolloutUserIdStrategy,
    RemoteAddressStrategy, UserWithIdStrategy,
};
use switchyard_engine::Strategy;

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn user(id: &str) -> Context {
    Context::builder().user_id(id).build()
}

#[test]
fn test_builtin_names() {
    let mut names: Vec<String> = builtin_strategies()
        .iter()
        .map(|s| s.name().to_string())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "applicationHostname",
            "default",
            "flexibleRollout",
            "gradualRolloutRandom",
            "gradualRolloutSessionId",
            "gradualRolloutUserId",
            "remoteAddress",
            "userWithId",
        ]
    );
}

#[test]
fn test_default_is_always_on() {
    assert!(DefaultStrategy.is_enabled(&HashMap::new(), &Context::default()));
}

#[test]
fn test_user_with_id_list() {
    let p = params(&[("userIds", "123, 456,789")]);
    assert!(UserWithIdStrategy.is_enabled(&p, &user("456")));
    assert!(UserWithIdStrategy.is_enabled(&p, &user("789")));
    assert!(!UserWithIdStrategy.is_enabled(&p, &user("12")));
    assert!(!UserWithIdStrategy.is_enabled(&p, &Context::default()));
}

#[test]
fn test_user_with_id_keeps_surrounding_whitespace() {
    let p = params(&[("userIds", "u1 ,u2,  u3")]);
    assert!(!UserWithIdStrategy.is_enabled(&p, &user("u1")));
    assert!(UserWithIdStrategy.is_enabled(&p, &user("u2")));
    assert!(!UserWithIdStrategy.is_enabled(&p, &user("u3")));
    assert!(UserWithIdStrategy.is_enabled(&p, &user(" u3")));
    assert!(UserWithIdStrategy.is_enabled(&p, &user("u1 ")));

    let p = params(&[("userIds", "a,  b")]);
    assert!(UserWithIdStrategy.is_enabled(&p, &user("a")));
    assert!(!UserWithIdStrategy.is_enabled(&p, &user("b")));
}

#[test]
fn test_gradual_user_id_bucket_boundary() {
    // "gr1:123" lands in bucket 73
    let on = params(&[("percentage", "73"), ("groupId", "gr1")]);
    let off = params(&[("percentage", "72"), ("groupId", "gr1")]);
    assert!(GradualRolloutUserIdStrategy.is_enabled(&on, &user("123")));
    assert!(!GradualRolloutUserIdStrategy.is_enabled(&off, &user("123")));
    assert!(!GradualRolloutUserIdStrategy.is_enabled(&on, &Context::default()));
}

#[test]
fn test_gradual_session_id_bucket_boundary() {
    let ctx = Context::builder().session_id("999").build();
    let on = params(&[("percentage", "25"), ("groupId", "groupX")]);
    let off = params(&[("percentage", "24"), ("groupId", "groupX")]);
    assert!(GradualRolloutSessionIdStrategy.is_enabled(&on, &ctx));
    assert!(!GradualRolloutSessionIdStrategy.is_enabled(&off, &ctx));
}

#[test]
fn test_gradual_zero_percent_is_off() {
    let p = params(&[("percentage", "0"), ("groupId", "gr1")]);
    assert!(!GradualRolloutUserIdStrategy.is_enabled(&p, &user("123")));
}

#[test]
fn test_gradual_random_extremes() {
    let all = params(&[("percentage", "100")]);
    let none = params(&[("percentage", "0")]);
    for _ in 0..50 {
        assert!(GradualRolloutRandomStrategy.is_enabled(&all, &Context::default()));
        assert!(!GradualRolloutRandomStrategy.is_enabled(&none, &Context::default()));
    }
}

#[test]
fn test_flexible_rollout_user_stickiness() {
    let p = params(&[("rollout", "73"), ("stickiness", "userId"), ("groupId", "gr1")]);
    assert!(FlexibleRolloutStrategy.is_enabled(&p, &user("123")));
    assert!(!FlexibleRolloutStrategy.is_enabled(&p, &Context::default()));
}

#[test]
fn test_flexible_rollout_default_stickiness_prefers_user() {
    let p = params(&[("rollout", "50"), ("groupId", "rollout")]);
    // buckets: user 1 -> 32, user 3 -> 53
    assert!(FlexibleRolloutStrategy.is_enabled(&p, &user("1")));
    assert!(!FlexibleRolloutStrategy.is_enabled(&p, &user("3")));
}

#[test]
fn test_flexible_rollout_custom_stickiness() {
    let p = params(&[("rollout", "100"), ("stickiness", "tenant"), ("groupId", "g")]);
    let with_tenant = Context::builder().property("tenant", "acme").build();
    assert!(FlexibleRolloutStrategy.is_enabled(&p, &with_tenant));
    assert!(!FlexibleRolloutStrategy.is_enabled(&p, &Context::default()));
}

#[test]
fn test_flexible_rollout_full_and_empty() {
    let full = params(&[("rollout", "100")]);
    let empty = params(&[("rollout", "0")]);
    assert!(FlexibleRolloutStrategy.is_enabled(&full, &Context::default()));
    assert!(!FlexibleRolloutStrategy.is_enabled(&empty, &user("1")));
}

#[test]
fn test_remote_address_list_and_ranges() {
    let p = params(&[("IPs", "10.0.0.1, 192.168.0.0/16, bogus, 2001:db8::/32")]);
    let from = |ip: &str| Context::builder().remote_address(ip).build();
    assert!(RemoteAddressStrategy.is_enabled(&p, &from("10.0.0.1")));
    assert!(RemoteAddressStrategy.is_enabled(&p, &from("192.168.44.2")));
    assert!(RemoteAddressStrategy.is_enabled(&p, &from("2001:db8::10")));
    assert!(!RemoteAddressStrategy.is_enabled(&p, &from("10.0.0.2")));
    assert!(!RemoteAddressStrategy.is_enabled(&p, &Context::default()));
}

#[test]
fn test_application_hostname() {
    let strategy = ApplicationHostnameStrategy::with_hostname("Web-01");
    assert!(strategy.is_enabled(&params(&[("hostNames", "db-01, WEB-01")]), &Context::default()));
    assert!(!strategy.is_enabled(&params(&[("hostNames", "db-01")]), &Context::default()));
    assert!(!strategy.is_enabled(&HashMap::new(), &Context::default()));
}
