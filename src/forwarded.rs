/* src/forwarded.rs */

//! Parser for the RFC 7239 `Forwarded` header.
//!
//! Every comma starts a new element, so `for=a, for=b;proto=http` yields two elements
//! in header order (leftmost is the hop closest to the client). Quotes are only removed
//! from values after splitting, so a quote can never swallow a later element.

use std::net::IpAddr;

use crate::error::{ClientIpError, Result};

/// One comma-separated element of a `Forwarded` header.
///
/// Values have surrounding quotes removed, then surrounding brackets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardedElement {
    /// The `for` parameter: the node that made the request to the proxy.
    pub forwarded_for: Option<String>,
    /// The `by` parameter: the interface where the request came in to the proxy.
    pub by: Option<String>,
    /// The `host` parameter: the original `Host` request header.
    pub host: Option<String>,
    /// The `proto` parameter: the protocol used by the original request.
    pub proto: Option<String>,
}

impl ForwardedElement {
    /// The `for` parameter parsed as a bare IP address.
    ///
    /// Returns `None` for missing, `unknown`, obfuscated (`_hidden`) or port-carrying nodes.
    pub fn for_ip(&self) -> Option<IpAddr> {
        self.forwarded_for.as_deref()?.parse().ok()
    }
}

/// Parse a `Forwarded` header value into its elements, in header order.
///
/// Parameter names are matched case-insensitively; anything other than `for`, `by`,
/// `host` and `proto` fails the whole value. An element without parameters yields a
/// [`ForwardedElement`] with every field unset.
///
/// ```rust
/// use clientip::parse_forwarded_header;
///
/// let elements = parse_forwarded_header(r#"for="[2001:db8:cafe::17]", for=unknown"#).unwrap();
/// assert_eq!(elements[0].forwarded_for.as_deref(), Some("2001:db8:cafe::17"));
/// assert_eq!(elements[1].forwarded_for.as_deref(), Some("unknown"));
/// ```
pub fn parse_forwarded_header(value: &str) -> Result<Vec<ForwardedElement>> {
    if value.trim().is_empty() {
        return Err(ClientIpError::EmptyForwarded);
    }

    value.split(',').map(parse_element).collect()
}

fn parse_element(element: &str) -> Result<ForwardedElement> {
    let mut parsed = ForwardedElement::default();

    for pair in element.split(';').map(str::trim).filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = key.trim();
        if key.is_empty() {
            return Err(ClientIpError::MalformedForwardedPair(pair.to_string()));
        }

        let slot = match key.to_ascii_lowercase().as_str() {
            "for" => &mut parsed.forwarded_for,
            "by" => &mut parsed.by,
            "host" => &mut parsed.host,
            "proto" => &mut parsed.proto,
            _ => return Err(ClientIpError::UnknownForwardedKey(key.to_string())),
        };

        let value = strip_brackets(&unquote(value.trim()));
        if !value.is_empty() {
            *slot = Some(value);
        }
    }

    Ok(parsed)
}

fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return value.to_string();
    };

    // quoted-pair: a backslash escapes the next character
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.extend(chars.next()),
            c => out.push(c),
        }
    }
    out
}

fn strip_brackets(value: &str) -> String {
    value
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(value)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(
        forwarded_for: Option<&str>,
        by: Option<&str>,
        host: Option<&str>,
        proto: Option<&str>,
    ) -> ForwardedElement {
        ForwardedElement {
            forwarded_for: forwarded_for.map(str::to_string),
            by: by.map(str::to_string),
            host: host.map(str::to_string),
            proto: proto.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_multiple_elements() {
        let parsed = parse_forwarded_header(
            "for=192.0.2.43, for=198.51.100.17;by=203.0.113.60;proto=http;host=example.com",
        )
        .unwrap();

        assert_eq!(
            parsed,
            vec![
                element(Some("192.0.2.43"), None, None, None),
                element(
                    Some("198.51.100.17"),
                    Some("203.0.113.60"),
                    Some("example.com"),
                    Some("http"),
                ),
            ]
        );
    }

    #[test]
    fn test_parse_quoted_ipv6_and_unknown() {
        let parsed = parse_forwarded_header(r#"for="[2001:db8:cafe::17]", for=unknown"#).unwrap();

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].forwarded_for.as_deref(), Some("2001:db8:cafe::17"));
        assert_eq!(parsed[1].forwarded_for.as_deref(), Some("unknown"));
        assert_eq!(parsed[0].for_ip(), Some("2001:db8:cafe::17".parse().unwrap()));
        assert_eq!(parsed[1].for_ip(), None);
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let parsed = parse_forwarded_header("For=192.0.2.60;PROTO=https;By=203.0.113.43").unwrap();
        assert_eq!(
            parsed,
            vec![element(Some("192.0.2.60"), Some("203.0.113.43"), None, Some("https"))]
        );
    }

    #[test]
    fn test_unknown_key_fails() {
        assert_eq!(
            parse_forwarded_header("for=192.0.2.43;bogus=1"),
            Err(ClientIpError::UnknownForwardedKey("bogus".to_string()))
        );
        assert!(parse_forwarded_header("for=192.0.2.43, bogus=1").is_err());
    }

    #[test]
    fn test_empty_input_fails() {
        assert_eq!(parse_forwarded_header(""), Err(ClientIpError::EmptyForwarded));
        assert_eq!(parse_forwarded_header("  "), Err(ClientIpError::EmptyForwarded));
    }

    #[test]
    fn test_malformed_pairs() {
        assert!(matches!(
            parse_forwarded_header("=192.0.2.1"),
            Err(ClientIpError::MalformedForwardedPair(_))
        ));
        assert_eq!(
            parse_forwarded_header("for;proto="),
            Ok(vec![ForwardedElement::default()])
        );
    }

    #[test]
    fn test_empty_elements_are_kept() {
        let parsed = parse_forwarded_header("for=192.0.2.1,, for=203.0.113.9").unwrap();
        assert_eq!(
            parsed,
            vec![
                element(Some("192.0.2.1"), None, None, None),
                ForwardedElement::default(),
                element(Some("203.0.113.9"), None, None, None),
            ]
        );
    }

    #[test]
    fn test_unbalanced_quote_does_not_swallow_elements() {
        let parsed = parse_forwarded_header(r#"for="x, for=203.0.113.9"#).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].forwarded_for.as_deref(), Some(r#""x"#));
        assert_eq!(parsed[1].for_ip(), Some("203.0.113.9".parse().unwrap()));
    }

    #[test]
    fn test_quoted_commas_still_split() {
        assert_eq!(
            parse_forwarded_header(r#"for=192.0.2.1;host="a,b""#),
            Err(ClientIpError::UnknownForwardedKey(r#"b""#.to_string()))
        );
    }

    #[test]
    fn test_quoted_pair_escape() {
        let parsed = parse_forwarded_header(r#"for=_hidden;host="ex\"ample""#).unwrap();
        assert_eq!(parsed[0].host.as_deref(), Some(r#"ex"ample"#));
    }

    #[test]
    fn test_for_ip_rejects_node_port() {
        let parsed =
            parse_forwarded_header(r#"for="192.0.2.43:4711", for="[2001:db8:cafe::17]:4711""#)
                .unwrap();
        assert_eq!(parsed[0].for_ip(), None);
        assert_eq!(parsed[1].forwarded_for.as_deref(), Some("[2001:db8:cafe::17]:4711"));
        assert_eq!(parsed[1].for_ip(), None);
    }

    #[test]
    fn test_element_without_for() {
        let parsed = parse_forwarded_header("proto=https;host=example.com").unwrap();
        assert_eq!(parsed[0].forwarded_for, None);
        assert_eq!(parsed[0].for_ip(), None);
    }
}
