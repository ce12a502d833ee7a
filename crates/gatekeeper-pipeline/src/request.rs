use std::net::{IpAddr, SocketAddr};

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Method, Request};

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Caller address resolved once per request by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientAddr(pub Option<IpAddr>);

/// Resolves the caller address from the socket, or from the left-most
/// `X-Forwarded-For` entry when `trust_forwarded_for` is set.
pub fn resolve_client_addr<B>(request: &Request<B>, trust_forwarded_for: bool) -> Option<IpAddr> {
    if trust_forwarded_for {
        let forwarded = request
            .headers()
            .get(FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok());

        if forwarded.is_some() {
            return forwarded;
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

/// The parts of a request that bypass conditions may inspect.
#[derive(Debug, Clone, Copy)]
pub struct RequestView<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub headers: &'a HeaderMap,
    pub remote_addr: Option<IpAddr>,
}

impl<'a> RequestView<'a> {
    pub fn new(
        method: &'a Method,
        path: &'a str,
        headers: &'a HeaderMap,
        remote_addr: Option<IpAddr>,
    ) -> Self {
        Self {
            method,
            path,
            headers,
            remote_addr,
        }
    }

    /// Uses the [`ClientAddr`] extension when present, otherwise the socket address.
    pub fn from_request<B>(request: &'a Request<B>) -> Self {
        let remote_addr = match request.extensions().get::<ClientAddr>() {
            Some(ClientAddr(addr)) => *addr,
            None => resolve_client_addr(request, false),
        };

        Self::new(
            request.method(),
            request.uri().path(),
            request.headers(),
            remote_addr,
        )
    }
}
