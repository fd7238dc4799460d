use std::collections::HashMap;

use rand::Rng;
use switchyard_core::context::Context;

use super::{Strategy, GROUP_ID};
use crate::hash::{normalized_percent, percentage};

const PERCENTAGE: &str = "percentage";

fn in_rollout(id: Option<&str>, parameters: &HashMap<String, String>) -> bool {
    let Some(id) = id else {
        return false;
    };
    let pct = percentage(parameters.get(PERCENTAGE).map(String::as_str));
    let group = parameters.get(GROUP_ID).map(String::as_str).unwrap_or("");
    pct > 0 && normalized_percent(id, group) <= pct
}

/// On for a random `percentage` of evaluations.
pub struct GradualRolloutRandomStrategy;

impl Strategy for GradualRolloutRandomStrategy {
    fn name(&self) -> &str {
        "gradualRolloutRandom"
    }

    fn is_enabled(&self, parameters: &HashMap<String, String>, _context: &Context) -> bool {
        let pct = percentage(parameters.get(PERCENTAGE).map(String::as_str));
        let roll = rand::thread_rng().gen_range(1..=100);
        pct >= roll
    }
}

/// Sticky rollout by session id.
pub struct GradualRolloutSessionIdStrategy;

impl Strategy for GradualRolloutSessionIdStrategy {
    fn name(&self) -> &str {
        "gradualRolloutSessionId"
    }

    fn is_enabled(&self, parameters: &HashMap<String, String>, context: &Context) -> bool {
        in_rollout(context.session_id.as_deref(), parameters)
    }
}

/// Sticky rollout by user id.
pub struct GradualRolloutUserIdStrategy;

impl Strategy for GradualRolloutUserIdStrategy {
    fn name(&self) -> &str {
        "gradualRolloutUserId"
    }

    fn is_enabled(&self, parameters: &HashMap<String, String>, context: &Context) -> bool {
        in_rollout(context.user_id.as_deref(), parameters)
    }
}
