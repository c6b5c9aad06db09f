/* src/lib.rs */

//! # Client IP Resolver
//!
//! Determine the originating client IP of an HTTP request that passed through reverse
//! proxies, trusting forwarding headers only when the connecting peer is a known proxy.
//!
//! ## Resolution order
//!
//! 1. Explicit headers configured on the resolver, then those passed per call. The first
//!    non-empty value is returned verbatim.
//! 2. The peer address. If it is not a trusted proxy it is the client.
//! 3. `X-Forwarded-For`, then `X-Real-IP`, walked right to left until an address that is
//!    not a trusted proxy (or the leftmost one) is found.
//! 4. The `for` values of the RFC 7239 `Forwarded` header, walked the same way.
//! 5. The peer address.
//!
//! ## Features
//!
//! - Trusted proxy set of IP addresses and CIDR ranges, swappable at runtime without locking readers
//! - Process-wide default resolver plus independently configured instances
//! - Strict RFC 7239 `Forwarded` parser
//! - Optional Axum middleware and extractor integration via the `axum` feature
//! - Optional `serde` support for [`ResolverConfig`]
//!
//! ## Examples
//!
//! ### Basic Usage
//!
//! ```rust
//! use clientip::{ClientIpResolver, HeaderMap};
//!
//! let resolver = ClientIpResolver::new()
//!     .with_trusted_proxies(["127.0.0.1"])
//!     .unwrap();
//!
//! let mut headers = HeaderMap::new();
//! headers.insert("X-Forwarded-For".to_string(), "123.123.0.1, 123.123.0.2".to_string());
//!
//! // A trusted peer: the rightmost untrusted hop is the client.
//! assert_eq!(resolver.client_ip(&headers, "127.0.0.1:8080", &[]), "123.123.0.2");
//!
//! // An untrusted peer: forwarding headers are ignored.
//! assert_eq!(resolver.client_ip(&headers, "198.51.100.4:8080", &[]), "198.51.100.4");
//! ```
//!
//! ### Explicit Headers
//!
//! ```rust
//! use clientip::{ClientIpResolver, HeaderMap, header};
//!
//! let resolver = ClientIpResolver::new().with_header(header::X_APPENGINE_REMOTE_ADDR);
//!
//! let mut headers = HeaderMap::new();
//! headers.insert("x-appengine-remote-addr".to_string(), "9.9.9.9".to_string());
//!
//! assert_eq!(resolver.client_ip(&headers, "203.0.113.1:443", &[]), "9.9.9.9");
//! ```

pub mod error;
pub mod forwarded;
pub mod header;
pub mod resolver;
pub mod trusted;

#[cfg(feature = "axum")]
pub mod middleware;

pub use error::{ClientIpError, Result};
pub use forwarded::{ForwardedElement, parse_forwarded_header};
pub use resolver::{
    ClientIpResolver, HeaderMap, HeaderSource, ResolverConfig, client_ip, default_resolver,
    is_trusted_proxy, set_trusted_proxies,
};
pub use trusted::{DEFAULT_TRUSTED_PROXIES, TrustedProxies};

#[cfg(feature = "axum")]
pub use middleware::{ClientIp, ClientIpLayer, ClientIpService};

/// Re-export commonly used types
pub use ipnetwork::IpNetwork;
pub use std::net::IpAddr;
