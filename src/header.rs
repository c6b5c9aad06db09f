/* src/header.rs */

//! Well-known header names carrying client addresses.
//!
//! Only [`X_FORWARDED_FOR`], [`X_REAL_IP`] and [`FORWARDED`] take part in the
//! trusted-chain walk. The others are meant for the explicit header list of a
//! [`ClientIpResolver`](crate::ClientIpResolver), where their value is taken verbatim.

/// RFC 7239 `Forwarded`.
pub const FORWARDED: &str = "Forwarded";

/// De-facto standard proxy chain header.
pub const X_FORWARDED_FOR: &str = "X-Forwarded-For";

/// Set by Nginx, Apache HTTP Server and similar.
pub const X_REAL_IP: &str = "X-Real-IP";

/// Used by Amazon EC2, Heroku and others.
pub const X_CLIENT_IP: &str = "X-Client-IP";

/// Cloudflare.
pub const CF_CONNECTING_IP: &str = "CF-Connecting-IP";

/// Fastly CDN, and Firebase hosting when forwarding to a cloud function.
pub const FASTLY_CLIENT_IP: &str = "Fastly-Client-Ip";

/// Akamai, and Cloudflare on the enterprise plan.
pub const TRUE_CLIENT_IP: &str = "True-Client-Ip";

/// Google App Engine.
pub const X_APPENGINE_REMOTE_ADDR: &str = "X-Appengine-Remote-Addr";

/// Fly.io.
pub const FLY_CLIENT_IP: &str = "Fly-Client-IP";

/// Chain headers walked when the peer is trusted, in priority order.
pub(crate) const CHAIN_HEADERS: [&str; 2] = [X_FORWARDED_FOR, X_REAL_IP];
