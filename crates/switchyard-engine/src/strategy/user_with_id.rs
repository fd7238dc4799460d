use std::collections::HashMap;

use switchyard_core::context::Context;

use super::Strategy;

const PARAM: &str = "userIds";

/// On for an explicit list of users.
pub struct UserWithIdStrategy;

impl Strategy for UserWithIdStrategy {
    fn name(&self) -> &str {
        "userWithId"
    }

    fn is_enabled(&self, parameters: &HashMap<String, String>, context: &Context) -> bool {
        let (Some(ids), Some(user)) = (parameters.get(PARAM), context.user_id.as_deref()) else {
            return false;
        };
        user_ids(ids).any(|id| id == user)
    }
}

/// Split on `,`, dropping at most one whitespace character after each comma.
fn user_ids(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(',')
        .enumerate()
        .map(|(i, id)| match i {
            0 => id,
            _ => id.strip_prefix(char::is_whitespace).unwrap_or(id),
        })
}

