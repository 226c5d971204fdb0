//! Per-request trust decision for the directly connected peer.
//!
//! A [`TrustEvaluator`] owns the resolved [`RangeSet`] for one middleware
//! installation. It is built once, never mutated, and shared across
//! requests behind an `Arc`; [`TrustEvaluator::evaluate`] is a pure
//! function of the peer endpoint string.

use std::net::{IpAddr, SocketAddr};

use crate::config::model::TrustConfig;
use crate::error::Error;
use crate::ranges::{self, RangeSet};

/// Outcome of one trust check.
///
/// `trusted` implies `address_valid`, and `peer_address` is present exactly
/// when the address was valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    address_valid: bool,
    trusted: bool,
    peer_address: Option<IpAddr>,
}

impl Verdict {
    #[must_use]
    pub const fn invalid() -> Self {
        Self {
            address_valid: false,
            trusted: false,
            peer_address: None,
        }
    }

    #[must_use]
    pub const fn trusted(peer: IpAddr) -> Self {
        Self {
            address_valid: true,
            trusted: true,
            peer_address: Some(peer),
        }
    }

    #[must_use]
    pub const fn untrusted(peer: IpAddr) -> Self {
        Self {
            address_valid: true,
            trusted: false,
            peer_address: Some(peer),
        }
    }

    #[must_use]
    pub const fn address_valid(&self) -> bool {
        self.address_valid
    }

    #[must_use]
    pub const fn is_trusted(&self) -> bool {
        self.trusted
    }

    #[must_use]
    pub const fn peer_address(&self) -> Option<IpAddr> {
        self.peer_address
    }
}

#[derive(Debug, Clone)]
pub struct TrustEvaluator {
    ranges: RangeSet,
}

impl TrustEvaluator {
    /// Resolve the trusted range list: built-in defaults first (when
    /// `include_default` is set), then the operator's CIDRs in order.
    ///
    /// Any malformed CIDR fails construction.
    pub fn new<S: AsRef<str>>(include_default: bool, trusted_proxies: &[S]) -> Result<Self, Error> {
        let mut ranges = if include_default {
            ranges::default_ranges()
        } else {
            RangeSet::empty()
        };

        if !trusted_proxies.is_empty() {
            ranges = ranges.chain(ranges::parse_ranges(trusted_proxies)?);
        }

        if ranges.is_empty() {
            tracing::warn!("trusted range list is empty, no peer will be treated as a proxy");
        } else {
            tracing::debug!(
                ranges = ranges.len(),
                ipv4 = ranges.ipv4_count(),
                ipv6 = ranges.ipv6_count(),
                include_default,
                "trusted ranges resolved"
            );
        }

        Ok(Self { ranges })
    }

    pub fn from_config(config: &TrustConfig) -> Result<Self, Error> {
        Self::new(config.include_default, config.trusted_proxies.as_slice())
    }

    #[must_use]
    pub const fn from_ranges(ranges: RangeSet) -> Self {
        Self { ranges }
    }

    #[must_use]
    pub const fn ranges(&self) -> &RangeSet {
        &self.ranges
    }

    /// Classify a raw peer endpoint (`host` or `host:port`).
    #[must_use]
    pub fn evaluate(&self, remote_addr: &str) -> Verdict {
        match parse_peer(remote_addr) {
            Some(ip) => self.evaluate_ip(ip),
            None => Verdict::invalid(),
        }
    }

    /// Classify an already-parsed peer address.
    ///
    /// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`, as reported by
    /// dual-stack sockets) are matched and reported as plain IPv4.
    #[must_use]
    pub fn evaluate_ip(&self, ip: IpAddr) -> Verdict {
        let ip = ip.to_canonical();
        if self.ranges.contains(&ip) {
            Verdict::trusted(ip)
        } else {
            Verdict::untrusted(ip)
        }
    }
}

/// Extract the peer IP from a transport endpoint string.
///
/// Full socket addresses (`1.2.3.4:80`, `[::1]:443`) and bare IP literals
/// parse directly. Anything else falls back to the text before the first
/// colon, the `host:port` convention.
fn parse_peer(remote_addr: &str) -> Option<IpAddr> {
    if let Ok(sock) = remote_addr.parse::<SocketAddr>() {
        return Some(sock.ip());
    }
    if let Ok(ip) = remote_addr.parse::<IpAddr>() {
        return Some(ip);
    }
    let host = remote_addr.split(':').next().unwrap_or(remote_addr);
    host.parse::<IpAddr>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranges::{DEFAULT_IPV4_CIDRS, DEFAULT_IPV6_CIDRS};

    fn with_defaults() -> TrustEvaluator {
        TrustEvaluator::new::<&str>(true, &[]).unwrap()
    }

    #[test]
    fn every_default_literal_is_trusted() {
        let evaluator = with_defaults();
        for cidr in DEFAULT_IPV4_CIDRS.iter().chain(DEFAULT_IPV6_CIDRS) {
            let (addr, _) = cidr.split_once('/').unwrap();
            let verdict = evaluator.evaluate(addr);
            assert!(verdict.address_valid(), "{addr} should parse");
            assert!(verdict.is_trusted(), "{addr} should be trusted");
            assert_eq!(verdict.peer_address(), Some(addr.parse().unwrap()));
        }
    }

    #[test]
    fn empty_trust_set_trusts_nobody() {
        let evaluator = TrustEvaluator::new::<&str>(false, &[]).unwrap();
        assert!(evaluator.ranges().is_empty());
        for peer in ["127.0.0.1:80", "8.8.8.8", "[2606:4700::1]:443"] {
            let verdict = evaluator.evaluate(peer);
            assert!(verdict.address_valid());
            assert!(!verdict.is_trusted());
        }
    }

    #[test]
    fn invalid_host_is_the_only_failure() {
        let verdict = with_defaults().evaluate("not-an-ip:1234");
        assert_eq!(verdict, Verdict::invalid());
        assert!(!verdict.is_trusted());
        assert_eq!(verdict.peer_address(), None);

        assert!(!with_defaults().evaluate("").address_valid());
    }

    #[test]
    fn bad_operator_cidr_fails_construction() {
        let result = TrustEvaluator::new(true, &["203.0.113.0/24", "not-a-cidr"]);
        assert!(matches!(
            result,
            Err(Error::InvalidTrustedProxy { index: 1, .. })
        ));
    }

    #[test]
    fn operator_ranges_follow_defaults() {
        let evaluator = TrustEvaluator::new(true, &["203.0.113.0/24"]).unwrap();
        assert_eq!(evaluator.ranges().len(), 27);
        assert_eq!(
            evaluator.ranges().iter().last().map(ToString::to_string),
            Some("203.0.113.0/24".to_string())
        );
        assert!(evaluator.evaluate("203.0.113.9:1000").is_trusted());
    }

    #[test]
    fn operator_ranges_alone() {
        let evaluator = TrustEvaluator::new(false, &["203.0.113.0/24"]).unwrap();
        assert!(evaluator.evaluate("203.0.113.9:1000").is_trusted());
        assert!(!evaluator.evaluate("127.0.0.1:1000").is_trusted());
    }

    #[test]
    fn order_of_operator_ranges_does_not_matter() {
        let forward = ["203.0.113.0/24", "2001:db8::/32", "198.51.100.0/28"];
        let mut reversed = forward;
        reversed.reverse();
        let a = TrustEvaluator::new(false, &forward).unwrap();
        let b = TrustEvaluator::new(false, &reversed).unwrap();
        for peer in [
            "203.0.113.200:1",
            "198.51.100.15:2",
            "198.51.100.16:3",
            "[2001:db8::42]:4",
            "2001:db9::1",
            "1.1.1.1",
        ] {
            assert_eq!(a.evaluate(peer), b.evaluate(peer), "{peer}");
        }
    }

    #[test]
    fn evaluate_is_idempotent() {
        let evaluator = with_defaults();
        for peer in ["127.0.0.1:52342", "8.8.4.4:443", "garbage"] {
            assert_eq!(evaluator.evaluate(peer), evaluator.evaluate(peer));
        }
    }

    #[test]
    fn untrusted_peer_keeps_its_address() {
        let verdict = with_defaults().evaluate("8.8.4.4:443");
        assert_eq!(verdict, Verdict::untrusted("8.8.4.4".parse().unwrap()));
    }

    #[test]
    fn peer_string_forms() {
        assert_eq!(parse_peer("127.0.0.1:52342"), Some("127.0.0.1".parse().unwrap()));
        assert_eq!(parse_peer("127.0.0.1"), Some("127.0.0.1".parse().unwrap()));
        assert_eq!(parse_peer("[::1]:443"), Some("::1".parse().unwrap()));
        assert_eq!(parse_peer("2606:4700::6810:1"), Some("2606:4700::6810:1".parse().unwrap()));
        assert_eq!(parse_peer("localhost:80"), None);
        assert_eq!(parse_peer("[::1]"), None);
    }

    #[test]
    fn ipv4_mapped_peers_match_ipv4_ranges() {
        let evaluator = with_defaults();

        let verdict = evaluator.evaluate("[::ffff:127.0.0.1]:52342");
        assert_eq!(verdict, Verdict::trusted("127.0.0.1".parse().unwrap()));

        let mapped: IpAddr = "::ffff:173.245.48.10".parse().unwrap();
        let verdict = evaluator.evaluate_ip(mapped);
        assert_eq!(verdict, Verdict::trusted("173.245.48.10".parse().unwrap()));

        let verdict = evaluator.evaluate("::ffff:8.8.4.4");
        assert_eq!(verdict, Verdict::untrusted("8.8.4.4".parse().unwrap()));
    }

    #[test]
    fn from_ranges_uses_the_given_set_as_is() {
        let set = RangeSet::from(vec!["198.51.100.0/24".parse().unwrap()]);
        let evaluator = TrustEvaluator::from_ranges(set.clone());
        assert_eq!(evaluator.ranges(), &set);
        assert!(evaluator.evaluate("198.51.100.1:80").is_trusted());
        assert!(!evaluator.evaluate("127.0.0.1:80").is_trusted());
    }

    #[test]
    fn evaluator_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TrustEvaluator>();
    }
}
