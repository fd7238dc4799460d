use std::borrow::Cow;

use switchyard_core::context::Context;
use switchyard_core::variant::VariantDefinition;

use crate::hash::{normalized_number, VARIANT_SEED};
use crate::strategy::random_identifier;

fn override_field<'a>(context: &'a Context, name: &str) -> Option<&'a str> {
    match name {
        "userId" => context.user_id.as_deref(),
        "sessionId" => context.session_id.as_deref(),
        "remoteAddress" => context.remote_address.as_deref(),
        other => context.properties.get(other).map(String::as_str),
    }
}

fn find_override<'v>(variants: &'v [VariantDefinition], context: &Context) -> Option<&'v VariantDefinition> {
    variants.iter().find(|variant| {
        variant.overrides.iter().any(|o| {
            let value = override_field(context, &o.context_name).unwrap_or("");
            o.values.iter().any(|v| v == value)
        })
    })
}

fn stickiness_seed<'c>(variants: &[VariantDefinition], context: &'c Context) -> Cow<'c, str> {
    let custom = variants
        .iter()
        .filter_map(|v| v.stickiness.as_deref())
        .find(|s| *s != "default");
    match custom {
        Some(field) => context
            .by_name(field)
            .unwrap_or_else(|| Cow::Owned(random_identifier())),
        None => context
            .user_id
            .as_deref()
            .or(context.session_id.as_deref())
            .or(context.remote_address.as_deref())
            .map(Cow::Borrowed)
            .unwrap_or_else(|| Cow::Owned(random_identifier())),
    }
}

/// Pick a variant for `context` from `variants`, bucketing within `group_id`.
///
/// Returns `None` when the total weight is zero or exceeds `u32::MAX`, or no
/// bucket is reached.
pub fn select_variant<'v>(
    group_id: &str,
    variants: &'v [VariantDefinition],
    context: &Context,
) -> Option<&'v VariantDefinition> {
    let total: i64 = variants.iter().map(|v| i64::from(v.weight)).sum();
    if total <= 0 {
        return None;
    }
    if let Some(forced) = find_override(variants, context) {
        return Some(forced);
    }
    let normalizer = u32::try_from(total).ok()?;
    let seed = stickiness_seed(variants, context);
    let target = i64::from(normalized_number(&seed, group_id, normalizer, VARIANT_SEED));

    let mut counter = 0i64;
    for variant in variants.iter().filter(|v| v.weight != 0) {
        counter += i64::from(variant.weight);
        if counter >= target {
            return Some(variant);
        }
    }
    None
}
