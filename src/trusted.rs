/* src/trusted.rs */

use ipnetwork::IpNetwork;
use std::net::IpAddr;
use std::sync::{Arc, LazyLock};

use crate::error::{ClientIpError, Result};

/// Ranges trusted when no explicit proxy list is configured.
///
/// Besides loopback, private and link-local ranges this includes the `0.0.0.0/0` and
/// `::/0` wildcards, so out of the box every peer is treated as a proxy and forwarding
/// headers are always honoured. Deployments reachable by untrusted clients must narrow
/// this with [`ClientIpResolver::set_trusted_proxies`](crate::ClientIpResolver::set_trusted_proxies).
pub const DEFAULT_TRUSTED_PROXIES: &[&str] = &[
    "0.0.0.0/0",
    "127.0.0.1/8",    // loopback
    "10.0.0.0/8",     // RFC 1918 24-bit block
    "172.16.0.0/12",  // RFC 1918 20-bit block
    "192.168.0.0/16", // RFC 1918 16-bit block
    "169.254.0.0/16", // link-local, RFC 3927
    "::/0",
    "::1/128",   // loopback
    "fc00::/7",  // unique local, RFC 4193
    "fe80::/10", // link-local
];

static DEFAULT_SET: LazyLock<Arc<TrustedProxies>> = LazyLock::new(|| {
    Arc::new(TrustedProxies {
        networks: DEFAULT_TRUSTED_PROXIES
            .iter()
            .filter_map(|cidr| cidr.parse::<IpNetwork>().ok())
            .collect(),
    })
});

/// An immutable set of network ranges whose peers are allowed to forward client addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedProxies {
    networks: Vec<IpNetwork>,
}

impl TrustedProxies {
    /// Parse a list of bare IP addresses and CIDR ranges.
    ///
    /// A bare IPv4 address becomes a `/32` network and a bare IPv6 address a `/128`
    /// network. The first invalid entry fails the whole list.
    ///
    /// ```rust
    /// use clientip::TrustedProxies;
    ///
    /// let proxies = TrustedProxies::parse(["10.0.0.0/8", "2001:db8::1"]).unwrap();
    /// assert!(proxies.contains("10.1.2.3".parse().unwrap()));
    /// assert!(!proxies.contains("11.0.0.0".parse().unwrap()));
    /// ```
    pub fn parse<I, S>(proxies: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let networks = proxies
            .into_iter()
            .map(|proxy| parse_network(proxy.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { networks })
    }

    /// The built-in permissive set, see [`DEFAULT_TRUSTED_PROXIES`].
    pub fn defaults() -> Arc<Self> {
        Arc::clone(&DEFAULT_SET)
    }

    /// A set that trusts no peer at all.
    pub fn none() -> Self {
        Self {
            networks: Vec::new(),
        }
    }

    /// Check whether `ip` falls inside any trusted range.
    ///
    /// IPv4-mapped IPv6 addresses are matched as the IPv4 address they carry.
    pub fn contains(&self, ip: IpAddr) -> bool {
        let ip = ip.to_canonical();
        self.networks.iter().any(|network| network.contains(ip))
    }

    /// The configured ranges, in configuration order.
    pub fn networks(&self) -> &[IpNetwork] {
        &self.networks
    }

    /// Number of configured ranges.
    pub fn len(&self) -> usize {
        self.networks.len()
    }

    /// Whether no range is configured, i.e. no peer is trusted.
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

fn parse_network(proxy: &str) -> Result<IpNetwork> {
    let proxy = proxy.trim();
    let invalid = || ClientIpError::InvalidProxy(proxy.to_string());

    if proxy.contains('/') {
        return proxy.parse::<IpNetwork>().map_err(|_| invalid());
    }

    let ip = proxy.parse::<IpAddr>().map_err(|_| invalid())?;
    Ok(IpNetwork::from(ip.to_canonical()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_bare_ipv4_is_exact_match() {
        let proxies = TrustedProxies::parse(["192.0.2.10"]).unwrap();
        assert_eq!(proxies.networks()[0].prefix(), 32);
        assert!(proxies.contains(ip("192.0.2.10")));
        assert!(!proxies.contains(ip("192.0.2.11")));
        assert!(!proxies.contains(ip("192.0.2.138")));
        assert!(!proxies.contains(ip("64.0.2.10")));
    }

    #[test]
    fn test_bare_ipv6_is_exact_match() {
        let proxies = TrustedProxies::parse(["2001:db8::1"]).unwrap();
        assert_eq!(proxies.networks()[0].prefix(), 128);
        assert!(proxies.contains(ip("2001:db8::1")));
        assert!(!proxies.contains(ip("2001:db8::3")));
        assert!(!proxies.contains(ip("2001:db8::")));
    }

    #[test]
    fn test_cidr_membership() {
        let proxies = TrustedProxies::parse(["10.0.0.0/8"]).unwrap();
        assert!(proxies.contains(ip("10.1.2.3")));
        assert!(!proxies.contains(ip("11.0.0.0")));
    }

    #[test]
    fn test_family_scoping() {
        let proxies = TrustedProxies::parse(["10.0.0.0/8", "fd00::/8"]).unwrap();
        assert!(proxies.contains(ip("fd12::1")));
        assert!(!proxies.contains(ip("fe80::1")));
        assert!(!proxies.contains(ip("::a00:1")));
    }

    #[test]
    fn test_ipv4_mapped_ipv6() {
        let proxies = TrustedProxies::parse(["10.0.0.0/8", "::ffff:192.0.2.1"]).unwrap();
        assert!(proxies.contains(ip("::ffff:10.0.0.1")));
        assert!(proxies.contains(ip("192.0.2.1")));
        assert_eq!(proxies.networks()[1].prefix(), 32);
    }

    #[test]
    fn test_invalid_entries() {
        for bad in ["not-an-ip", "10.0.0.0/33", "1.2.3", "10.0.0.0/x", ""] {
            assert!(
                matches!(TrustedProxies::parse([bad]), Err(ClientIpError::InvalidProxy(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_invalid_entry_fails_whole_list() {
        let err = TrustedProxies::parse(["10.0.0.0/8", "bogus", "127.0.0.1"]).unwrap_err();
        assert_eq!(err, ClientIpError::InvalidProxy("bogus".to_string()));
    }

    #[test]
    fn test_empty_trusts_nothing() {
        let proxies = TrustedProxies::parse(Vec::<String>::new()).unwrap();
        assert!(proxies.is_empty());
        assert!(!proxies.contains(ip("127.0.0.1")));
        assert!(!TrustedProxies::none().contains(ip("::1")));
    }

    #[test]
    fn test_defaults_trust_everyone() {
        let defaults = TrustedProxies::defaults();
        assert_eq!(defaults.len(), DEFAULT_TRUSTED_PROXIES.len());
        for addr in ["127.0.0.1", "10.9.8.7", "203.0.113.9", "::1", "2001:db8::5", "fe80::1"] {
            assert!(defaults.contains(ip(addr)), "{addr} should be trusted");
        }
    }

    #[test]
    fn test_defaults_are_shared() {
        assert!(Arc::ptr_eq(
            &TrustedProxies::defaults(),
            &TrustedProxies::defaults()
        ));
    }
}
