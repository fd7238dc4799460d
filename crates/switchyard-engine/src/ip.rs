use std::net::IpAddr;

/// Matches an address against a single address or a CIDR range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpMatcher {
    network: IpAddr,
    prefix: u8,
}

impl IpMatcher {
    /// Parse `10.0.0.1`, `10.0.0.0/8` or `2001:db8::/32`. Returns `None` for
    /// malformed entries.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (addr, prefix) = match raw.split_once('/') {
            Some((addr, bits)) => (addr, Some(bits.parse::<u8>().ok()?)),
            None => (raw, None),
        };
        let network: IpAddr = addr.parse().ok()?;
        let max = match network {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        let prefix = prefix.unwrap_or(max);
        if prefix > max {
            return None;
        }
        Some(Self { network, prefix })
    }

    pub fn matches(&self, address: &str) -> bool {
        let Ok(candidate) = address.trim().parse::<IpAddr>() else {
            return false;
        };
        match (self.network, candidate) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                prefix_eq(&net.octets(), &ip.octets(), self.prefix)
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                prefix_eq(&net.octets(), &ip.octets(), self.prefix)
            }
            _ => false,
        }
    }
}

fn prefix_eq(a: &[u8], b: &[u8], prefix: u8) -> bool {
    let full = usize::from(prefix / 8);
    if a[..full] != b[..full] {
        return false;
    }
    let rest = prefix % 8;
    if rest == 0 {
        return true;
    }
    let mask = 0xffu8 << (8 - rest);
    (a[full] & mask) == (b[full] & mask)
}
