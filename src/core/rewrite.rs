//! Outbound request construction.
//!
//! Only the URI, the `Host` header and the forwarding headers are touched. Every
//! other header and the body are handed to the backend as received.
use std::net::SocketAddr;

use hyper::{
    HeaderMap, Request, Uri,
    header::{self, HeaderValue},
};

use crate::{
    config::ServiceTarget,
    core::{
        context::{TRACK_ID_HEADER, inbound_track_id},
        error::{ConfigError, GatewayError},
    },
};

pub const FORWARDED_HOST_HEADER: &str = "x-forwarded-host";
pub const ORIGIN_HOST_HEADER: &str = "x-origin-host";
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// The only scheme supported toward backends.
pub const UPSTREAM_SCHEME: &str = "http";

#[derive(Debug, Clone)]
pub struct RequestRewriter {
    scheme: String,
    origin_host: HeaderValue,
}

impl RequestRewriter {
    /// `origin_host` is the gateway's own advertised `host:port`.
    pub fn new(scheme: &str, origin_host: &str) -> Result<Self, ConfigError> {
        if scheme != UPSTREAM_SCHEME {
            return Err(ConfigError::UnsupportedScheme(scheme.to_string()));
        }
        let origin_host = HeaderValue::from_str(origin_host)
            .map_err(|_| ConfigError::InvalidAddress(origin_host.to_string()))?;

        Ok(Self {
            scheme: scheme.to_string(),
            origin_host,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Point `req` at `target` + `target_path`, preserving the inbound query string.
    pub fn rewrite<B>(
        &self,
        mut req: Request<B>,
        target: &ServiceTarget,
        target_path: &str,
        track_id: &str,
        client_addr: Option<SocketAddr>,
    ) -> Result<Request<B>, GatewayError> {
        let original_uri = req.uri().clone();
        let authority = target.authority();
        let outbound = match original_uri.query() {
            Some(query) => format!("{}://{authority}{target_path}?{query}", self.scheme),
            None => format!("{}://{authority}{target_path}", self.scheme),
        };
        *req.uri_mut() = outbound
            .parse::<Uri>()
            .map_err(|e| GatewayError::Internal(format!("invalid outbound URI {outbound}: {e}")))?;

        let headers = req.headers_mut();

        // HTTP/2 callers carry the host in the URI authority instead of a header.
        let forwarded_host = headers.get(header::HOST).cloned().or_else(|| {
            original_uri
                .authority()
                .and_then(|a| HeaderValue::from_str(a.as_str()).ok())
        });
        if let Some(host) = forwarded_host {
            headers.insert(FORWARDED_HOST_HEADER, host);
        }
        headers.insert(ORIGIN_HOST_HEADER, self.origin_host.clone());

        // An empty caller id counts as absent, matching the id the access log records.
        if inbound_track_id(headers).is_none() {
            let value = HeaderValue::from_str(track_id)
                .map_err(|e| GatewayError::Internal(format!("invalid tracking id: {e}")))?;
            headers.insert(TRACK_ID_HEADER, value);
        }

        if let Some(addr) = client_addr {
            append_forwarded_for(headers, addr)?;
        }

        let host = HeaderValue::from_str(&authority)
            .map_err(|e| GatewayError::Internal(format!("invalid backend authority: {e}")))?;
        headers.insert(header::HOST, host);

        Ok(req)
    }
}

fn append_forwarded_for(headers: &mut HeaderMap, addr: SocketAddr) -> Result<(), GatewayError> {
    let ip = addr.ip().to_string();
    let chain = match headers
        .get(FORWARDED_FOR_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        Some(existing) if !existing.is_empty() => format!("{existing}, {ip}"),
        _ => ip,
    };
    let value = HeaderValue::from_str(&chain)
        .map_err(|e| GatewayError::Internal(format!("invalid forwarded-for chain: {e}")))?;
    headers.insert(FORWARDED_FOR_HEADER, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::Body as AxumBody;

    use super::*;

    fn rewriter() -> RequestRewriter {
        RequestRewriter::new("http", "gateway.local:8080").unwrap()
    }

    fn target() -> ServiceTarget {
        ServiceTarget::new("auth-go", 3000)
    }

    #[test]
    fn test_rewrites_uri_and_forwarding_headers() {
        let req = Request::builder()
            .method("POST")
            .uri("/auth/api/v1/login?next=%2Fhome")
            .header(header::HOST, "api.example.com")
            .header("x-custom", "kept")
            .body(AxumBody::empty())
            .unwrap();

        let out = rewriter()
            .rewrite(req, &target(), "/login", "generated1", None)
            .unwrap();

        assert_eq!(out.method(), "POST");
        assert_eq!(
            out.uri().to_string(),
            "http://auth-go:3000/login?next=%2Fhome"
        );
        let headers = out.headers();
        assert_eq!(headers.get(FORWARDED_HOST_HEADER).unwrap(), "api.example.com");
        assert_eq!(headers.get(ORIGIN_HOST_HEADER).unwrap(), "gateway.local:8080");
        assert_eq!(headers.get(TRACK_ID_HEADER).unwrap(), "generated1");
        assert_eq!(headers.get(header::HOST).unwrap(), "auth-go:3000");
        assert_eq!(headers.get("x-custom").unwrap(), "kept");
        assert!(headers.get(FORWARDED_FOR_HEADER).is_none());
    }

    #[test]
    fn test_caller_track_id_is_never_overwritten() {
        let req = Request::builder()
            .uri("/x")
            .header(TRACK_ID_HEADER, "from-caller")
            .body(AxumBody::empty())
            .unwrap();

        let out = rewriter()
            .rewrite(req, &target(), "/y", "generated1", None)
            .unwrap();
        let values: Vec<_> = out.headers().get_all(TRACK_ID_HEADER).iter().collect();
        assert_eq!(values, vec!["from-caller"]);
    }

    #[test]
    fn test_empty_track_id_is_replaced() {
        let req = Request::builder()
            .uri("/x")
            .header(TRACK_ID_HEADER, "")
            .body(AxumBody::empty())
            .unwrap();

        let out = rewriter()
            .rewrite(req, &target(), "/y", "generated1", None)
            .unwrap();
        let values: Vec<_> = out.headers().get_all(TRACK_ID_HEADER).iter().collect();
        assert_eq!(values, vec!["generated1"]);
    }

    #[test]
    fn test_forwarded_for_is_appended() {
        let addr: SocketAddr = "10.1.2.3:5555".parse().unwrap();

        let req = Request::builder()
            .uri("/x")
            .body(AxumBody::empty())
            .unwrap();
        let out = rewriter()
            .rewrite(req, &target(), "/y", "t", Some(addr))
            .unwrap();
        assert_eq!(out.headers().get(FORWARDED_FOR_HEADER).unwrap(), "10.1.2.3");

        let req = Request::builder()
            .uri("/x")
            .header(FORWARDED_FOR_HEADER, "192.168.0.9")
            .body(AxumBody::empty())
            .unwrap();
        let out = rewriter()
            .rewrite(req, &target(), "/y", "t", Some(addr))
            .unwrap();
        assert_eq!(
            out.headers().get(FORWARDED_FOR_HEADER).unwrap(),
            "192.168.0.9, 10.1.2.3"
        );
    }

    #[test]
    fn test_only_plain_http_upstreams() {
        assert!(matches!(
            RequestRewriter::new("https", "gw:1"),
            Err(ConfigError::UnsupportedScheme(_))
        ));
        assert_eq!(rewriter().scheme(), "http");
    }
}
