// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! URL validation and normalization for analyze/detect requests.
//!
//! Pure string/URL parsing, no network access. Private and loopback
//! hosts are rejected so the fetcher can never be pointed at internal
//! infrastructure.

use std::net::{Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidUrl {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("missing hostname")]
    MissingHost,

    #[error("blocked host: {0} (private/loopback)")]
    PrivateHost(String),

    #[error("malformed URL: {0}")]
    Malformed(String),
}

/// Validate and normalize a candidate URL string.
///
/// Normalization: trim whitespace, lowercase the host (the parser does
/// this for domain hosts), strip the fragment. Fails when the scheme is
/// not http/https, the host is empty, or the host is a private,
/// loopback, link-local or unspecified address.
pub fn validate_url(input: &str) -> Result<Url, InvalidUrl> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InvalidUrl::Empty);
    }

    let mut parsed = Url::parse(trimmed).map_err(|e| InvalidUrl::Malformed(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(InvalidUrl::UnsupportedScheme(scheme.to_string())),
    }

    match parsed.host() {
        None => return Err(InvalidUrl::MissingHost),
        Some(Host::Domain(domain)) => {
            if domain.is_empty() {
                return Err(InvalidUrl::MissingHost);
            }
            if is_blocked_domain(domain) {
                return Err(InvalidUrl::PrivateHost(domain.to_string()));
            }
        }
        Some(Host::Ipv4(ip)) => {
            if is_private_or_reserved_v4(ip) {
                return Err(InvalidUrl::PrivateHost(ip.to_string()));
            }
        }
        Some(Host::Ipv6(ip)) => {
            if is_private_or_reserved_v6(ip) {
                return Err(InvalidUrl::PrivateHost(ip.to_string()));
            }
        }
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

fn is_blocked_domain(domain: &str) -> bool {
    let lower = domain.to_lowercase();
    lower == "localhost" || lower.ends_with(".localhost")
}

/// Loopback, RFC 1918 private ranges, link-local, broadcast, multicast
/// and unspecified addresses are all blocked.
fn is_private_or_reserved_v4(ip: Ipv4Addr) -> bool {
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_broadcast()
        || ip.is_multicast()
        || ip.is_unspecified()
        || ip.octets()[0] == 0
}

/// IPv6 loopback, link-local (fe80::/10), unique local (fc00::/7),
/// multicast and unspecified addresses are blocked.
fn is_private_or_reserved_v6(ip: Ipv6Addr) -> bool {
    ip.is_loopback()
        || ip.is_multicast()
        || ip.is_unspecified()
        || (ip.segments()[0] & 0xfe00) == 0xfc00
        || (ip.segments()[0] & 0xffc0) == 0xfe80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_public_urls() {
        for input in [
            "https://example.com/privacy",
            "http://example.org/terms?lang=en",
            "https://sub.example.co.uk/legal/privacy-policy",
        ] {
            let url = validate_url(input).unwrap();
            assert!(["http", "https"].contains(&url.scheme()));
            assert!(url.host_str().is_some());
        }
    }

    #[test]
    fn test_scheme_and_host_preserved() {
        let url = validate_url("https://Example.COM/Privacy").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("example.com"));
        assert_eq!(url.path(), "/Privacy");
    }

    #[test]
    fn test_fragment_stripped() {
        let url = validate_url("https://example.com/privacy#section-3").unwrap();
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(validate_url(""), Err(InvalidUrl::Empty));
        assert_eq!(validate_url("   "), Err(InvalidUrl::Empty));
    }

    #[test]
    fn test_bad_schemes() {
        for input in ["ftp://example.com/x", "file:///etc/passwd", "javascript:alert(1)"] {
            assert!(matches!(
                validate_url(input),
                Err(InvalidUrl::UnsupportedScheme(_)) | Err(InvalidUrl::Malformed(_))
            ));
        }
    }

    #[test]
    fn test_localhost_blocked() {
        assert!(matches!(
            validate_url("http://localhost:3000/admin"),
            Err(InvalidUrl::PrivateHost(_))
        ));
        assert!(matches!(
            validate_url("http://api.localhost/x"),
            Err(InvalidUrl::PrivateHost(_))
        ));
    }

    #[test]
    fn test_private_v4_blocked() {
        for input in [
            "http://127.0.0.1/",
            "http://10.0.0.1/internal",
            "http://172.16.0.1/",
            "http://172.31.255.255/",
            "http://192.168.1.1/router",
            "http://169.254.169.254/latest/meta-data",
            "http://0.0.0.0/",
        ] {
            assert!(
                matches!(validate_url(input), Err(InvalidUrl::PrivateHost(_))),
                "expected {} to be blocked",
                input
            );
        }
    }

    #[test]
    fn test_private_v6_blocked() {
        for input in ["http://[::1]/", "http://[fe80::1]/", "http://[fc00::1]/"] {
            assert!(
                matches!(validate_url(input), Err(InvalidUrl::PrivateHost(_))),
                "expected {} to be blocked",
                input
            );
        }
    }

    #[test]
    fn test_public_ip_allowed() {
        assert!(validate_url("http://93.184.216.34/").is_ok());
        assert!(validate_url("http://[2001:4860:4860::8888]/").is_ok());
    }

    #[test]
    fn test_missing_host() {
        assert!(matches!(
            validate_url("http:///path-only"),
            Err(InvalidUrl::MissingHost) | Err(InvalidUrl::Malformed(_))
        ));
    }
}
