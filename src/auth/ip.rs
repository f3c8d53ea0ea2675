//! Client IP extraction utilities.

use std::net::SocketAddr;

use axum::{extract::ConnectInfo, http::HeaderName};

/// Where to read the client IP from.
#[derive(Debug, Clone, Default)]
pub enum IpSource {
    /// Peer address of the TCP connection
    #[default]
    Socket,
    /// First address in a header set by a reverse proxy (e.g. `X-Forwarded-For`)
    Header(HeaderName),
}

impl IpSource {
    pub fn parse(header: Option<&str>) -> Result<Self, String> {
        match header {
            None => Ok(Self::Socket),
            Some(name) => HeaderName::from_bytes(name.trim().as_bytes())
                .map(Self::Header)
                .map_err(|e| format!("Invalid IP header name '{}': {}", name, e)),
        }
    }
}

/// Extract client IP address based on configuration.
///
/// A configured header must be present; it does NOT fall back to the socket address.
pub fn extract_client_ip<B>(
    request: &axum::extract::Request<B>,
    source: &IpSource,
) -> Result<String, &'static str> {
    match source {
        IpSource::Header(name) => {
            let value = request
                .headers()
                .get(name)
                .ok_or("IP header not present")?
                .to_str()
                .map_err(|_| "IP header contains invalid characters")?;
            value
                .split(',')
                .next()
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
                .map(str::to_string)
                .ok_or("IP header is empty")
        }
        IpSource::Socket => request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string())
            .ok_or("No client IP available"),
    }
}
