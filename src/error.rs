/* src/error.rs */

use thiserror::Error;

/// Result type alias for operations that may fail with `ClientIpError`.
pub type Result<T> = std::result::Result<T, ClientIpError>;

/// Errors raised while configuring trusted proxies or parsing a `Forwarded` header.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientIpError {
    /// A trusted proxy entry is neither an IP address nor a CIDR range.
    #[error("Invalid trusted proxy `{0}`: expected an IP address or CIDR range")]
    InvalidProxy(String),

    /// The `Forwarded` header value contains no elements.
    #[error("Empty Forwarded header")]
    EmptyForwarded,

    /// A `Forwarded` parameter has an empty name.
    #[error("Malformed Forwarded pair `{0}`")]
    MalformedForwardedPair(String),

    /// A `Forwarded` parameter name other than `for`, `by`, `host` or `proto`.
    #[error("Unknown Forwarded header key: {0}")]
    UnknownForwardedKey(String),
}

impl ClientIpError {
    /// Whether this error comes from parsing a `Forwarded` header rather than configuration.
    pub fn is_format_error(&self) -> bool {
        !matches!(self, Self::InvalidProxy(_))
    }
}
