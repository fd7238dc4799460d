use std::borrow::Cow;
use std::collections::HashMap;

use switchyard_core::context::Context;

use super::{random_identifier, Strategy, GROUP_ID};
use crate::hash::{normalized_percent, percentage};

const ROLLOUT: &str = "rollout";
const STICKINESS: &str = "stickiness";

/// Percentage rollout with configurable stickiness.
pub struct FlexibleRolloutStrategy;

impl FlexibleRolloutStrategy {
    fn resolve_stickiness<'a>(stickiness: &str, context: &'a Context) -> Option<Cow<'a, str>> {
        match stickiness {
            "default" => Some(
                context
                    .user_id
                    .as_deref()
                    .or(context.session_id.as_deref())
                    .map(Cow::Borrowed)
                    .unwrap_or_else(|| Cow::Owned(random_identifier())),
            ),
            "random" => Some(Cow::Owned(random_identifier())),
            "userId" => context.user_id.as_deref().map(Cow::Borrowed),
            "sessionId" => context.session_id.as_deref().map(Cow::Borrowed),
            other => context.by_name(other),
        }
    }
}

impl Strategy for FlexibleRolloutStrategy {
    fn name(&self) -> &str {
        "flexibleRollout"
    }

    fn is_enabled(&self, parameters: &HashMap<String, String>, context: &Context) -> bool {
        let stickiness = parameters.get(STICKINESS).map(String::as_str).unwrap_or("default");
        let Some(id) = Self::resolve_stickiness(stickiness, context) else {
            return false;
        };
        let pct = percentage(parameters.get(ROLLOUT).map(String::as_str));
        let group = parameters.get(GROUP_ID).map(String::as_str).unwrap_or("");
        pct > 0 && normalized_percent(&id, group) <= pct
    }
}
