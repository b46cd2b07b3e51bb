use axum::http::HeaderMap;
use std::net::SocketAddr;

/// Derives the voter's source address. Proxy-provided headers win over the
/// transport peer: first entry of `x-forwarded-for`, then `x-real-ip`, then
/// the socket address.
pub fn client_addr(headers: &HeaderMap, peer: SocketAddr) -> String {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').map(str::trim).find(|s| !s.is_empty()) {
            return normalize_addr(first);
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        if !real_ip.trim().is_empty() {
            return normalize_addr(real_ip);
        }
    }

    normalize_addr(&peer.ip().to_string())
}

/// One host must always store as one string: the IPv4-mapped IPv6 prefix is
/// stripped and IPv6 literals are lower-cased.
pub fn normalize_addr(addr: &str) -> String {
    let addr = addr.trim();

    if let Some(v4) = addr.strip_prefix("::ffff:") {
        return v4.to_string();
    }

    if addr.contains(':') {
        return addr.to_lowercase();
    }

    addr.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> SocketAddr {
        "10.0.0.9:55011".parse().unwrap()
    }

    #[test]
    fn forwarded_for_beats_every_other_source() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7"));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.4"));

        assert_eq!(client_addr(&headers, peer()), "203.0.113.7");
    }

    #[test]
    fn forwarded_for_takes_the_first_listed_address() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 70.41.3.18, 150.172.238.178"),
        );

        assert_eq!(client_addr(&headers, peer()), "203.0.113.7");
    }

    #[test]
    fn real_ip_is_the_second_choice() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.4"));

        assert_eq!(client_addr(&headers, peer()), "198.51.100.4");
    }

    #[test]
    fn peer_address_is_the_fallback() {
        assert_eq!(client_addr(&HeaderMap::new(), peer()), "10.0.0.9");
    }

    #[test]
    fn forwarded_entries_are_normalized_too() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("::ffff:192.168.1.1"),
        );

        assert_eq!(client_addr(&headers, peer()), "192.168.1.1");
    }

    #[test]
    fn mapped_ipv4_loses_its_prefix() {
        assert_eq!(normalize_addr("::ffff:192.168.1.1"), "192.168.1.1");
    }

    #[test]
    fn ipv6_literals_are_lower_cased() {
        assert_eq!(normalize_addr("2001:DB8::C0FF:EE"), "2001:db8::c0ff:ee");
    }

    #[test]
    fn plain_ipv4_passes_through() {
        assert_eq!(normalize_addr(" 192.168.1.1 "), "192.168.1.1");
    }
}
