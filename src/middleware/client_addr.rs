//! Client address resolution
//!
//! Runs ahead of rate limiting so that limits and audit entries key on the
//! same address.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};

use crate::utils::request::{client_ip, ClientAddr, ProxyPolicy};

/// Stores the [`ClientAddr`] of the caller in the request extensions
pub async fn client_addr_middleware(
    State(policy): State<ProxyPolicy>,
    mut request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    if let Some(ip) = client_ip(request.headers(), peer, policy) {
        request.extensions_mut().insert(ClientAddr(ip));
    }

    next.run(request).await
}
