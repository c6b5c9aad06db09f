/* src/resolver.rs */

use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::hash::BuildHasher;
use std::net::IpAddr;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, trace, warn};

use crate::error::Result;
use crate::forwarded::parse_forwarded_header;
use crate::header::{CHAIN_HEADERS, FORWARDED};
use crate::trusted::TrustedProxies;

/// Type alias for header maps. Keys are matched case-insensitively.
pub type HeaderMap = HashMap<String, String>;

/// Case-insensitive access to request header values.
pub trait HeaderSource {
    /// The first value of header `name`, if present and valid UTF-8.
    fn header(&self, name: &str) -> Option<&str>;
}

impl<S: BuildHasher> HeaderSource for HashMap<String, String, S> {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name)
            .or_else(|| {
                self.iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .map(String::as_str)
    }
}

impl<H: HeaderSource + ?Sized> HeaderSource for &H {
    fn header(&self, name: &str) -> Option<&str> {
        (**self).header(name)
    }
}

#[cfg(feature = "axum")]
impl HeaderSource for axum::http::HeaderMap {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|value| value.to_str().ok())
    }
}

/// Plain configuration for building a [`ClientIpResolver`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResolverConfig {
    /// Trusted proxy addresses and CIDR ranges. `None` or empty selects the defaults.
    pub trusted_proxies: Option<Vec<String>>,
    /// Headers whose value is taken verbatim as the client IP, in order of preference.
    pub headers: Vec<String>,
}

/// Resolves the originating client IP of a request behind reverse proxies.
///
/// The trusted proxy set sits behind an atomic pointer and can be replaced at any time
/// through a shared reference; in-flight resolutions keep the snapshot they started with.
#[derive(Debug)]
pub struct ClientIpResolver {
    trusted: ArcSwap<TrustedProxies>,
    headers: Vec<String>,
}

impl Default for ClientIpResolver {
    fn default() -> Self {
        Self {
            trusted: ArcSwap::new(TrustedProxies::defaults()),
            headers: Vec::new(),
        }
    }
}

impl ClientIpResolver {
    /// Create a resolver with the default trusted proxies and no explicit headers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a resolver from a [`ResolverConfig`].
    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        let resolver = Self::new().with_headers(config.headers.clone());
        match &config.trusted_proxies {
            Some(proxies) => resolver.with_trusted_proxies(proxies),
            None => Ok(resolver),
        }
    }

    /// Set the trusted proxies. An empty list keeps the default set.
    pub fn with_trusted_proxies<I, S>(self, proxies: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let proxies = TrustedProxies::parse(proxies)?;
        if !proxies.is_empty() {
            self.trusted.store(Arc::new(proxies));
        }
        Ok(self)
    }

    /// Append a header whose value is taken verbatim as the client IP.
    pub fn with_header(mut self, name: impl Into<String>) -> Self {
        self.headers.push(name.into());
        self
    }

    /// Replace the explicit headers, in order of preference.
    pub fn with_headers(mut self, headers: Vec<String>) -> Self {
        self.headers = headers;
        self
    }

    /// The explicit headers consulted before any trust logic.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Replace the trusted proxy set.
    ///
    /// The whole list is validated before anything is swapped in; on error the previous
    /// set stays active. Unlike construction, an empty list trusts no peer at all.
    pub fn set_trusted_proxies<I, S>(&self, proxies: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let proxies = TrustedProxies::parse(proxies).inspect_err(|err| {
            warn!(error = %err, "Rejected trusted proxy configuration");
        })?;
        info!(networks = proxies.len(), "Trusted proxies replaced");
        self.trusted.store(Arc::new(proxies));
        Ok(())
    }

    /// A snapshot of the current trusted proxy set.
    pub fn trusted_proxies(&self) -> Arc<TrustedProxies> {
        self.trusted.load_full()
    }

    /// Check whether `ip` is currently a trusted proxy.
    pub fn is_trusted_proxy(&self, ip: IpAddr) -> bool {
        self.trusted.load().contains(ip)
    }

    /// Resolve the client IP, or `None` when it cannot be determined.
    ///
    /// `remote_addr` is the connection's peer in `host:port` form with IPv6 hosts
    /// bracketed. `extra_headers` are consulted after the resolver's own explicit headers.
    pub fn resolve<H>(&self, headers: &H, remote_addr: &str, extra_headers: &[&str]) -> Option<String>
    where
        H: HeaderSource + ?Sized,
    {
        let explicit = self
            .headers
            .iter()
            .map(String::as_str)
            .chain(extra_headers.iter().copied());
        for name in explicit {
            if let Some(value) = headers.header(name).filter(|value| !value.is_empty()) {
                trace!(header = name, value, "Client IP taken from explicit header");
                return Some(value.to_string());
            }
        }

        let Some(peer) = parse_peer_ip(remote_addr) else {
            debug!(remote_addr, "Unparseable peer address");
            return None;
        };

        let trusted = self.trusted.load();
        if !trusted.contains(peer) {
            trace!(%peer, "Peer is not a trusted proxy, ignoring forwarding headers");
            return Some(peer.to_string());
        }

        for name in CHAIN_HEADERS {
            if let Some(ip) = headers.header(name).and_then(|value| walk_list(&trusted, value)) {
                trace!(header = name, %peer, client = %ip, "Client IP taken from proxy chain");
                return Some(ip);
            }
        }

        if let Some(ip) = headers
            .header(FORWARDED)
            .and_then(|value| walk_forwarded(&trusted, value))
        {
            trace!(header = FORWARDED, %peer, client = %ip, "Client IP taken from proxy chain");
            return Some(ip);
        }

        Some(peer.to_string())
    }

    /// Resolve the client IP, returning an empty string when it cannot be determined.
    pub fn client_ip<H>(&self, headers: &H, remote_addr: &str, extra_headers: &[&str]) -> String
    where
        H: HeaderSource + ?Sized,
    {
        self.resolve(headers, remote_addr, extra_headers)
            .unwrap_or_default()
    }
}

/// Walk a comma-separated address list right to left.
fn walk_list(trusted: &TrustedProxies, value: &str) -> Option<String> {
    let hops: Vec<&str> = value.split(',').map(str::trim).collect();
    let (idx, _) = walk_chain(trusted, &hops, |hop| hop.parse().ok())?;
    Some(hops[idx].to_string())
}

fn walk_forwarded(trusted: &TrustedProxies, value: &str) -> Option<String> {
    let elements = parse_forwarded_header(value)
        .inspect_err(|err| debug!(error = %err, value, "Ignoring unusable Forwarded header"))
        .ok()?;
    let (idx, _) = walk_chain(trusted, &elements, |element| element.for_ip())?;
    // the `for` text as sent, quotes and brackets already stripped
    elements[idx].forwarded_for.clone()
}

/// Scan `hops` from the last entry to the first and return the first address that is not
/// a trusted proxy, or the leftmost one if all are. Stops at the first unparseable hop.
fn walk_chain<T>(
    trusted: &TrustedProxies,
    hops: &[T],
    ip_of: impl Fn(&T) -> Option<IpAddr>,
) -> Option<(usize, IpAddr)> {
    for (idx, hop) in hops.iter().enumerate().rev() {
        let ip = ip_of(hop)?;
        if idx == 0 || !trusted.contains(ip) {
            return Some((idx, ip));
        }
    }
    None
}

fn parse_peer_ip(remote_addr: &str) -> Option<IpAddr> {
    let (host, _port) = split_host_port(remote_addr.trim())?;
    host.parse::<IpAddr>().ok().map(|ip| ip.to_canonical())
}

fn split_host_port(addr: &str) -> Option<(&str, &str)> {
    if let Some(rest) = addr.strip_prefix('[') {
        let (host, rest) = rest.split_once(']')?;
        return Some((host, rest.strip_prefix(':')?));
    }

    let (host, port) = addr.rsplit_once(':')?;
    // an unbracketed IPv6 host is ambiguous
    if host.contains(':') {
        return None;
    }
    Some((host, port))
}

static DEFAULT_RESOLVER: LazyLock<ClientIpResolver> = LazyLock::new(ClientIpResolver::new);

/// The process-wide resolver used by the free functions in this crate.
pub fn default_resolver() -> &'static ClientIpResolver {
    &DEFAULT_RESOLVER
}

/// Resolve the client IP with the process-wide default resolver.
///
/// Returns an empty string when the client IP cannot be determined.
///
/// # Arguments
///
/// * `headers` - Request headers (case-insensitive lookup)
/// * `remote_addr` - Connection peer address in `host:port` form
/// * `extra_headers` - Additional headers whose value is taken verbatim, in order of preference
///
/// # Examples
///
/// ```rust
/// use clientip::{HeaderMap, client_ip};
///
/// let mut headers = HeaderMap::new();
/// headers.insert("x-forwarded-for".to_string(), "203.0.113.7, 10.0.0.2".to_string());
///
/// // every address is trusted by default, so the leftmost hop wins
/// assert_eq!(client_ip(&headers, "10.0.0.1:443", &[]), "203.0.113.7");
/// ```
pub fn client_ip<H>(headers: &H, remote_addr: &str, extra_headers: &[&str]) -> String
where
    H: HeaderSource + ?Sized,
{
    DEFAULT_RESOLVER.client_ip(headers, remote_addr, extra_headers)
}

/// Replace the trusted proxies of the process-wide default resolver.
pub fn set_trusted_proxies<I, S>(proxies: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    DEFAULT_RESOLVER.set_trusted_proxies(proxies)
}

/// Check `ip` against the trusted proxies of the process-wide default resolver.
pub fn is_trusted_proxy(ip: IpAddr) -> bool {
    DEFAULT_RESOLVER.is_trusted_proxy(ip)
}
