/* src/middleware.rs */

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request},
    http::request::Parts,
    response::Response,
};
use futures_util::future::BoxFuture;
use std::{
    convert::Infallible,
    fmt,
    net::{IpAddr, SocketAddr},
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};

use crate::resolver::ClientIpResolver;

/// Extension that holds the resolved client IP.
///
/// The value comes verbatim from an explicit header when one is configured, so it is
/// not guaranteed to be a valid IP address. An empty value means "unknown".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl ClientIp {
    /// The resolved value as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The resolved value parsed as an IP address.
    pub fn ip(&self) -> Option<IpAddr> {
        self.0.parse().ok()
    }

    /// Whether the client IP could not be determined.
    pub fn is_unknown(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ClientIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Layer resolving the client IP of each request.
///
/// The peer address comes from `ConnectInfo<SocketAddr>`, so the app must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()`. The resolver is shared, and
/// replacing its trusted proxies affects subsequent requests immediately.
///
/// # Examples
///
/// ```rust,no_run
/// use axum::{Router, routing::get};
/// use clientip::{ClientIp, ClientIpLayer, ClientIpResolver};
/// use std::sync::Arc;
///
/// async fn handler(ip: ClientIp) -> String {
///     ip.to_string()
/// }
///
/// let resolver = Arc::new(
///     ClientIpResolver::new()
///         .with_trusted_proxies(["10.0.0.0/8"])
///         .unwrap(),
/// );
/// let app: Router = Router::new()
///     .route("/", get(handler))
///     .layer(ClientIpLayer::with_resolver(resolver));
/// ```
#[derive(Debug, Clone)]
pub struct ClientIpLayer {
    resolver: Arc<ClientIpResolver>,
    extra_headers: Vec<String>,
}

impl Default for ClientIpLayer {
    fn default() -> Self {
        Self::with_resolver(Arc::new(ClientIpResolver::new()))
    }
}

impl ClientIpLayer {
    /// Create a layer with a resolver using the default trusted proxies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a layer backed by a shared resolver.
    pub fn with_resolver(resolver: Arc<ClientIpResolver>) -> Self {
        Self {
            resolver,
            extra_headers: Vec::new(),
        }
    }

    /// Consult `name` after the resolver's own explicit headers.
    pub fn with_extra_header(mut self, name: impl Into<String>) -> Self {
        self.extra_headers.push(name.into());
        self
    }

    /// The resolver used by this layer.
    pub fn resolver(&self) -> &Arc<ClientIpResolver> {
        &self.resolver
    }
}

impl<S> Layer<S> for ClientIpLayer {
    type Service = ClientIpService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ClientIpService {
            inner,
            resolver: Arc::clone(&self.resolver),
            extra_headers: self.extra_headers.clone(),
        }
    }
}

/// Service that resolves client IPs.
#[derive(Debug, Clone)]
pub struct ClientIpService<S> {
    inner: S,
    resolver: Arc<ClientIpResolver>,
    extra_headers: Vec<String>,
}

impl<S> Service<Request> for ClientIpService<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let remote_addr = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string())
            .unwrap_or_default();

        let extra: Vec<&str> = self.extra_headers.iter().map(String::as_str).collect();
        let ip = self.resolver.client_ip(req.headers(), &remote_addr, &extra);
        req.extensions_mut().insert(ClientIp(ip));

        let future = self.inner.call(req);
        Box::pin(async move { future.await })
    }
}

/// Axum extractor for the client IP.
///
/// Once [`ClientIpLayer`] has run its result is returned as is, including an empty
/// (unknown) value. Without the layer this falls back to the connection IP, and to an
/// empty value when no connection info is available either.
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(client_ip) = parts.extensions.get::<ClientIp>() {
            return Ok(client_ip.clone());
        }

        let fallback = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_canonical().to_string())
            .unwrap_or_default();
        Ok(ClientIp(fallback))
    }
}
