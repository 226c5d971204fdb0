//! Built-in trusted network ranges and CIDR parsing.
//!
//! The default tables cover loopback, the private networks commonly used
//! between an edge proxy and its origin, and the published Cloudflare edge
//! ranges. [`default_ranges`] returns a fresh [`RangeSet`] on every call;
//! nothing here is shared mutable state.
//!
//! Operator-supplied CIDRs go through [`parse_ranges`], which refuses the
//! whole list if any entry is malformed.

use std::net::IpAddr;

use ipnet::IpNet;

use crate::error::Error;

pub const DEFAULT_IPV4_CIDRS: &[&str] = &[
    "127.0.0.1/32",
    "10.16.0.0/20",
    "172.16.0.0/12",
    "192.168.0.0/16",
    "173.245.48.0/20",
    "103.21.244.0/22",
    "103.22.200.0/22",
    "103.31.4.0/22",
    "141.101.64.0/18",
    "108.162.192.0/18",
    "190.93.240.0/20",
    "188.114.96.0/20",
    "197.234.240.0/22",
    "198.41.128.0/17",
    "162.158.0.0/15",
    "104.16.0.0/13",
    "104.24.0.0/14",
    "172.64.0.0/13",
    "131.0.72.0/22",
];

pub const DEFAULT_IPV6_CIDRS: &[&str] = &[
    "2400:cb00::/32",
    "2606:4700::/32",
    "2803:f800::/32",
    "2405:b500::/32",
    "2405:8100::/32",
    "2a06:98c0::/29",
    "2c0f:f248::/32",
];

/// An ordered, immutable list of trusted networks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeSet(Vec<IpNet>);

impl RangeSet {
    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// True when any range in the set contains `ip`.
    #[must_use]
    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.0.iter().any(|net| net.contains(ip))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IpNet> {
        self.0.iter()
    }

    #[must_use]
    pub fn ipv4_count(&self) -> usize {
        self.0.iter().filter(|n| matches!(n, IpNet::V4(_))).count()
    }

    #[must_use]
    pub fn ipv6_count(&self) -> usize {
        self.0.iter().filter(|n| matches!(n, IpNet::V6(_))).count()
    }

    /// Concatenate two sets, `self` first.
    #[must_use]
    pub fn chain(mut self, other: Self) -> Self {
        self.0.extend(other.0);
        self
    }
}

impl From<Vec<IpNet>> for RangeSet {
    fn from(nets: Vec<IpNet>) -> Self {
        Self(nets)
    }
}

impl<'a> IntoIterator for &'a RangeSet {
    type Item = &'a IpNet;
    type IntoIter = std::slice::Iter<'a, IpNet>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// The literal tables are checked by `default_tables_parse_completely`.
fn from_literals(cidrs: &[&str]) -> RangeSet {
    RangeSet(
        cidrs
            .iter()
            .filter_map(|cidr| cidr.parse::<IpNet>().ok())
            .collect(),
    )
}

#[must_use]
pub fn default_ipv4_ranges() -> RangeSet {
    from_literals(DEFAULT_IPV4_CIDRS)
}

#[must_use]
pub fn default_ipv6_ranges() -> RangeSet {
    from_literals(DEFAULT_IPV6_CIDRS)
}

/// All built-in ranges, IPv4 first, then IPv6.
#[must_use]
pub fn default_ranges() -> RangeSet {
    default_ipv4_ranges().chain(default_ipv6_ranges())
}

/// Parse operator-supplied CIDR strings, preserving order.
///
/// Fails on the first malformed entry; a partially parsed list is never
/// returned.
pub fn parse_ranges<S: AsRef<str>>(cidrs: &[S]) -> Result<RangeSet, Error> {
    cidrs
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let value = raw.as_ref().trim();
            value
                .parse::<IpNet>()
                .map_err(|source| Error::InvalidTrustedProxy {
                    index,
                    value: value.to_string(),
                    source,
                })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(RangeSet)
}
