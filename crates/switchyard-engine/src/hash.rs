use std::io::Cursor;

/// Seed used when bucketing for strategies.
pub const STRATEGY_SEED: u32 = 0;

/// Seed used when picking a variant, so variant buckets are independent of
/// rollout buckets for the same identifier.
pub const VARIANT_SEED: u32 = 86_028_157;

/// Map `identifier` within `group_id` onto `1..=normalizer`.
///
/// Hashes `"{group_id}:{identifier}"` with 32-bit x86 murmur3.
pub fn normalized_number(identifier: &str, group_id: &str, normalizer: u32, seed: u32) -> u32 {
    let key = format!("{group_id}:{identifier}");
    let hash = murmur3::murmur3_32(&mut Cursor::new(key.as_bytes()), seed).unwrap_or_default();
    hash % normalizer.max(1) + 1
}

/// Shorthand for the strategy bucket in `1..=100`.
pub fn normalized_percent(identifier: &str, group_id: &str) -> u32 {
    normalized_number(identifier, group_id, 100, STRATEGY_SEED)
}

/// Parse a rollout percentage parameter. Anything that is not a plain
/// non-negative integer counts as 0.
pub fn percentage(value: Option<&str>) -> u32 {
    match value {
        Some(v) if !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()) => v.parse().unwrap_or(0),
        _ => 0,
    }
}
