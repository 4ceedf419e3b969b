use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};

use crate::AppState;

/// Network origin of the caller, used to key anonymous clients.
///
/// The TCP peer is authoritative. Forwarding headers are only read when the
/// peer is one of the configured trusted proxies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOrigin(pub String);

impl ClientOrigin {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn header_ip(headers: &HeaderMap, name: &str) -> Option<IpAddr> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// Nearest address in `x-forwarded-for` that is not itself a trusted proxy.
fn forwarded_client(headers: &HeaderMap, trusted: &[IpAddr]) -> Option<IpAddr> {
    let chain = headers.get("x-forwarded-for")?.to_str().ok()?;
    chain
        .rsplit(',')
        .filter_map(|hop| hop.trim().parse::<IpAddr>().ok())
        .find(|ip| !trusted.contains(ip))
}

fn origin_of(headers: &HeaderMap, peer: Option<IpAddr>, trusted: &[IpAddr]) -> String {
    let Some(peer) = peer else {
        return "unknown".to_string();
    };
    if !trusted.contains(&peer) {
        return peer.to_string();
    }

    header_ip(headers, "x-real-ip")
        .or_else(|| forwarded_client(headers, trusted))
        .unwrap_or(peer)
        .to_string()
}

impl FromRequestParts<AppState> for ClientOrigin {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        Ok(ClientOrigin(origin_of(
            &parts.headers,
            peer,
            &state.config.trusted_proxies,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const PROXY: IpAddr = IpAddr::V4(std::net::Ipv4Addr::new(10, 0, 0, 2));
    const CLIENT: IpAddr = IpAddr::V4(std::net::Ipv4Addr::new(203, 0, 113, 9));

    fn forwarded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn untrusted_peer_ignores_forwarding_headers() {
        let mut headers = forwarded("198.51.100.1");
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(origin_of(&headers, Some(CLIENT), &[PROXY]), "203.0.113.9");
        assert_eq!(origin_of(&headers, Some(CLIENT), &[]), "203.0.113.9");
    }

    #[test]
    fn trusted_proxy_real_ip_wins() {
        let mut headers = forwarded("198.51.100.1");
        headers.insert("x-real-ip", HeaderValue::from_static("203.0.113.9"));
        assert_eq!(origin_of(&headers, Some(PROXY), &[PROXY]), "203.0.113.9");
    }

    #[test]
    fn trusted_proxy_chain_skips_proxies_from_the_right() {
        let headers = forwarded("1.2.3.4, 203.0.113.9, 10.0.0.2");
        assert_eq!(origin_of(&headers, Some(PROXY), &[PROXY]), "203.0.113.9");
    }

    #[test]
    fn trusted_proxy_without_usable_header_is_the_origin() {
        let headers = forwarded("not-an-ip");
        assert_eq!(origin_of(&headers, Some(PROXY), &[PROXY]), "10.0.0.2");
    }

    #[test]
    fn missing_peer_is_unknown_even_with_headers() {
        assert_eq!(origin_of(&forwarded("198.51.100.1"), None, &[]), "unknown");
    }
}
