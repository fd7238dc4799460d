//! Activation strategies.
//!
//! A strategy decides, from its parameters and the evaluation context,
//! whether a toggle is on. Constraints are checked by the engine before a
//! strategy is consulted, so implementations only look at their parameters.

use std::collections::HashMap;
use std::sync::Arc;

use switchyard_core::context::Context;

mod default;
mod flexible;
mod gradual;
pub mod hostname;
mod remote_address;
mod user_with_id;

pub use default::DefaultStrategy;
pub use flexible::FlexibleRolloutStrategy;
pub use gradual::{GradualRolloutRandomStrategy, GradualRolloutSessionIdStrategy, GradualRolloutUserIdStrategy};
pub use hostname::ApplicationHostnameStrategy;
pub use remote_address::RemoteAddressStrategy;
pub use user_with_id::UserWithIdStrategy;

/// Parameter carrying the bucketing group for rollout strategies.
pub const GROUP_ID: &str = "groupId";

pub trait Strategy: Send + Sync {
    /// The name toggles refer to this strategy by.
    fn name(&self) -> &str;

    fn is_enabled(&self, parameters: &HashMap<String, String>, context: &Context) -> bool;
}

/// All strategies this client understands out of the box.
pub fn builtin_strategies() -> Vec<Arc<dyn Strategy>> {
    vec![
        Arc::new(DefaultStrategy),
        Arc::new(ApplicationHostnameStrategy::new()),
        Arc::new(GradualRolloutRandomStrategy),
        Arc::new(GradualRolloutSessionIdStrategy),
        Arc::new(GradualRolloutUserIdStrategy),
        Arc::new(RemoteAddressStrategy),
        Arc::new(UserWithIdStrategy),
        Arc::new(FlexibleRolloutStrategy),
    ]
}

/// Split a comma-separated parameter, trimming whitespace and dropping empties.
pub(crate) fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// A random identifier for strategies that fall back to random bucketing.
pub(crate) fn random_identifier() -> String {
    use rand::Rng;
    rand::thread_rng().gen_range(0..100_000).to_string()
}
