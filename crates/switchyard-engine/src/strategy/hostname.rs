use std::collections::HashMap;

use switchyard_core::context::Context;

use super::{split_list, Strategy};

const PARAM: &str = "hostNames";

/// Best-effort name of the machine we run on: `HOSTNAME`, then
/// `/etc/hostname`, else `"undefined"`.
pub fn local_hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.trim().is_empty())
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
        })
        .unwrap_or_else(|| "undefined".to_string())
}

/// On when the local hostname is listed in `hostNames`.
pub struct ApplicationHostnameStrategy {
    hostname: String,
}

impl ApplicationHostnameStrategy {
    pub fn new() -> Self {
        Self::with_hostname(local_hostname())
    }

    pub fn with_hostname(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into().to_lowercase(),
        }
    }
}

impl Default for ApplicationHostnameStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for ApplicationHostnameStrategy {
    fn name(&self) -> &str {
        "applicationHostname"
    }

    fn is_enabled(&self, parameters: &HashMap<String, String>, _context: &Context) -> bool {
        parameters
            .get(PARAM)
            .map(|hosts| split_list(hosts).any(|h| h.to_lowercase() == self.hostname))
            .unwrap_or(false)
    }
}
