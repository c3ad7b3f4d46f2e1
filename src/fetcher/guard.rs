use crate::fetcher::errors::ResolveError;
use regex::Regex;
use std::net::IpAddr;
use std::sync::LazyLock;
use tokio::net::lookup_host;
use url::Url;

static SCHEME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z\d+.-]*:").expect("Failed to compile scheme regex"));

/// Turn raw user input into a normalized http(s) URL.
///
/// A missing scheme defaults to https. Fragments are dropped so cache keys
/// stay stable across `#section` variants of the same page.
pub fn resolve(raw: &str) -> Result<Url, ResolveError> {
    let trimmed = raw.trim();
    let with_scheme = if SCHEME_REGEX.is_match(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let mut parsed = Url::parse(&with_scheme).map_err(|_| ResolveError::InvalidFormat)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ResolveError::UnsupportedScheme);
    }
    parsed.set_fragment(None);
    Ok(parsed)
}

/// SSRF guard. Must run before every hop of a redirect chain, not just the
/// first request.
///
/// Hostname rules reject obvious local names outright. Literal IPs are
/// checked against private ranges. Domain names are resolved and rejected if
/// any address is private; failure to resolve is itself a rejection (fail
/// closed). `allow_private` disables the guard so local tooling and
/// in-process test servers can be fetched; it is never set by the service
/// itself.
pub async fn assert_safe_target(url: &Url, allow_private: bool) -> Result<(), ResolveError> {
    let host = url.host_str().ok_or(ResolveError::InvalidFormat)?;
    if allow_private {
        return Ok(());
    }
    let host_lower = host.to_ascii_lowercase();

    if host_lower == "localhost"
        || host_lower.ends_with(".localhost")
        || host_lower.ends_with(".local")
    {
        return Err(ResolveError::LocalTarget);
    }

    let bare = host_lower.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = bare.parse::<IpAddr>() {
        if is_private_address(ip) {
            return Err(ResolveError::PrivateIp);
        }
        return Ok(());
    }

    let addrs: Vec<IpAddr> =
        lookup_host((host_lower.as_str(), url.port_or_known_default().unwrap_or(443)))
            .await
            .map_err(|_| ResolveError::Unresolvable)?
            .map(|addr| addr.ip())
            .collect();

    if addrs.is_empty() {
        return Err(ResolveError::Unresolvable);
    }

    if addrs.iter().any(|ip| is_private_address(*ip)) {
        return Err(ResolveError::PrivateResolution);
    }

    Ok(())
}

/// Loopback, RFC1918, link-local, CGNAT, and unspecified ranges, plus their
/// IPv6 equivalents. IPv4-mapped IPv6 addresses are checked as IPv4.
pub fn is_private_address(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, _, _] = v4.octets();
            a == 0
                || a == 10
                || a == 127
                || (a == 100 && (64..128).contains(&b))
                || (a == 169 && b == 254)
                || (a == 172 && (16..32).contains(&b))
                || (a == 192 && b == 168)
        }
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_private_address(IpAddr::V4(mapped));
            }
            let segments = v6.segments();
            v6.is_loopback()
                || v6.is_unspecified()
                || (segments[0] & 0xfe00) == 0xfc00
                || (segments[0] & 0xffc0) == 0xfe80
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_prepends_https_and_drops_fragment() {
        let url = resolve("example.com/page#section").unwrap();
        assert_eq!(url.as_str(), "https://example.com/page");
    }

    #[test]
    fn resolve_keeps_explicit_http() {
        let url = resolve("http://example.com").unwrap();
        assert_eq!(url.scheme(), "http");
    }

    #[test]
    fn resolve_rejects_other_schemes() {
        assert_eq!(resolve("ftp://example.com"), Err(ResolveError::UnsupportedScheme));
        assert_eq!(resolve("file:///etc/passwd"), Err(ResolveError::UnsupportedScheme));
    }

    #[test]
    fn resolve_rejects_garbage() {
        assert_eq!(resolve("http://"), Err(ResolveError::InvalidFormat));
    }

    #[tokio::test]
    async fn guard_rejects_local_hostnames() {
        for input in ["http://localhost/", "http://foo.localhost/", "http://internal.local/"] {
            let url = Url::parse(input).unwrap();
            assert_eq!(
                assert_safe_target(&url, false).await,
                Err(ResolveError::LocalTarget),
                "{input}"
            );
        }
    }

    #[tokio::test]
    async fn guard_rejects_private_literals() {
        for input in [
            "http://127.0.0.1/",
            "http://10.0.0.5/",
            "http://192.168.1.1/",
            "http://172.16.0.9/",
            "http://169.254.1.1/",
            "http://100.64.0.1/",
            "http://0.0.0.0/",
            "http://[::1]/",
            "http://[fc00::1]/",
            "http://[fe80::1]/",
            "http://[::ffff:10.0.0.1]/",
        ] {
            let url = Url::parse(input).unwrap();
            assert_eq!(
                assert_safe_target(&url, false).await,
                Err(ResolveError::PrivateIp),
                "{input}"
            );
        }
    }

    #[tokio::test]
    async fn guard_allows_private_literals_when_relaxed() {
        let url = Url::parse("http://127.0.0.1:9000/").unwrap();
        assert!(assert_safe_target(&url, true).await.is_ok());
    }

    #[test]
    fn public_addresses_are_not_private() {
        for input in ["1.1.1.1", "8.8.8.8", "93.184.216.34", "2606:2800:220:1:248:1893:25c8:1946"] {
            assert!(!is_private_address(input.parse().unwrap()), "{input}");
        }
    }
}
