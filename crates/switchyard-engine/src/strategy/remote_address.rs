use std::collections::HashMap;

use switchyard_core::context::Context;

use super::{split_list, Strategy};
use crate::ip::IpMatcher;

const PARAM: &str = "IPs";

/// On when the caller's address is in one of the listed addresses or ranges.
pub struct RemoteAddressStrategy;

impl Strategy for RemoteAddressStrategy {
    fn name(&self) -> &str {
        "remoteAddress"
    }

    fn is_enabled(&self, parameters: &HashMap<String, String>, context: &Context) -> bool {
        let (Some(ips), Some(address)) = (parameters.get(PARAM), context.remote_address.as_deref()) else {
            return false;
        };
        split_list(ips)
            .filter_map(IpMatcher::parse)
            .any(|m| m.matches(address))
    }
}
