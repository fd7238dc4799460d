use std::collections::HashMap;

use switchyard_core::context::Context;

use super::Strategy;

/// On for everyone.
pub struct DefaultStrategy;

impl Strategy for DefaultStrategy {
    fn name(&self) -> &str {
        "default"
    }

    fn is_enabled(&self, _parameters: &HashMap<String, String>, _context: &Context) -> bool {
        true
    }
}
