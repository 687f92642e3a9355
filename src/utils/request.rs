//! Request metadata helpers

use std::convert::Infallible;
use std::net::IpAddr;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::config::EnvironmentConfig;

/// Whether proxy forwarding headers are believed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProxyPolicy {
    pub trust_forwarded_headers: bool,
}

impl From<&EnvironmentConfig> for ProxyPolicy {
    fn from(config: &EnvironmentConfig) -> Self {
        Self {
            trust_forwarded_headers: config.trust_proxy,
        }
    }
}

/// Resolved client address, stored in the request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddr(pub String);

/// Client address for rate limiting and auditing.
///
/// Forwarding headers count only under a trusting `policy`; otherwise the
/// socket peer is used. Header values that are not IP addresses are ignored.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>, policy: ProxyPolicy) -> Option<String> {
    let forwarded = if policy.trust_forwarded_headers {
        forwarded_ip(headers)
    } else {
        None
    };

    forwarded.or(peer).map(|ip| ip.to_string())
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|value| value.to_str().ok()))
        .and_then(|ip| ip.trim().parse().ok())
}

pub fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Who sent the request, as recorded in the audit log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            ip: parts.extensions.get::<ClientAddr>().map(|ClientAddr(ip)| ip.clone()),
            user_agent: user_agent(&parts.headers),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};

    const TRUSTING: ProxyPolicy = ProxyPolicy {
        trust_forwarded_headers: true,
    };

    fn peer() -> Option<IpAddr> {
        "203.0.113.9".parse().ok()
    }

    fn forwarded_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" 10.1.2.3 , 172.16.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("192.168.1.1"));
        headers
    }

    #[test]
    fn forwarding_headers_are_ignored_by_default() {
        let ip = client_ip(&forwarded_headers(), peer(), ProxyPolicy::default());
        assert_eq!(ip.as_deref(), Some("203.0.113.9"));
        assert_eq!(client_ip(&forwarded_headers(), None, ProxyPolicy::default()), None);
    }

    #[test]
    fn trusted_proxy_uses_first_forwarded_address() {
        assert_eq!(client_ip(&forwarded_headers(), peer(), TRUSTING).as_deref(), Some("10.1.2.3"));

        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("192.168.1.1"));
        assert_eq!(client_ip(&headers, peer(), TRUSTING).as_deref(), Some("192.168.1.1"));
        assert_eq!(client_ip(&HeaderMap::new(), peer(), TRUSTING).as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn junk_forwarded_values_fall_back_to_the_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("<script>, 10.0.0.1"));
        assert_eq!(client_ip(&headers, peer(), TRUSTING).as_deref(), Some("203.0.113.9"));
    }

    #[tokio::test]
    async fn client_info_reads_the_resolved_address() {
        let request = Request::builder()
            .header(header::USER_AGENT, "bbm-dashboard/1.0")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        parts.extensions.insert(ClientAddr("198.51.100.4".into()));

        let info = ClientInfo::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(info.ip.as_deref(), Some("198.51.100.4"));
        assert_eq!(info.user_agent.as_deref(), Some("bbm-dashboard/1.0"));
    }
}
