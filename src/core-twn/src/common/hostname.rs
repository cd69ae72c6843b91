use std::{net::SocketAddr, num::ParseIntError};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

/// Gets the host:port the API listens on from the env vars HOST and PORT.
/// Uses defaults `127.0.0.1:5000` if the env vars are unset.
pub fn get_bind_address() -> Result<SocketAddr, HostPortError> {
    bind_address(std::env::var("HOST").ok(), std::env::var("PORT").ok())
}

pub fn bind_address(host: Option<String>, port: Option<String>) -> Result<SocketAddr, HostPortError> {
    let host = host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = match port {
        Some(p) => p.trim().parse::<u16>()?,
        None => DEFAULT_PORT,
    };
    let address = format!("{}:{}", host, port).parse::<SocketAddr>()?;
    Ok(address)
}

/// Base URL workers use to reach the ingestion API.
/// `API_BASE_URL` wins; otherwise it's derived from HOST and PORT.
pub fn get_api_base_url() -> Result<String, HostPortError> {
    match std::env::var("API_BASE_URL") {
        Ok(url) if !url.trim().is_empty() => Ok(url.trim().trim_end_matches('/').to_string()),
        _ => Ok(base_url_for(get_bind_address()?)),
    }
}

/// `http://host:port` for a listening address. A wildcard listener is reached through loopback.
pub fn base_url_for(addr: SocketAddr) -> String {
    let host = if addr.ip().is_unspecified() {
        DEFAULT_HOST.to_string()
    } else {
        addr.ip().to_string()
    };
    format!("http://{}:{}", host, addr.port())
}

#[derive(Debug)]
pub enum HostPortError {
    InvalidPort(ParseIntError),
    InvalidHostname(std::net::AddrParseError),
}

impl std::error::Error for HostPortError {}

impl std::fmt::Display for HostPortError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostPortError::InvalidPort(err) => write!(f, "Invalid port: {}", err),
            HostPortError::InvalidHostname(err) => write!(f, "Invalid hostname: {}", err),
        }
    }
}

impl From<ParseIntError> for HostPortError {
    fn from(err: ParseIntError) -> Self {
        HostPortError::InvalidPort(err)
    }
}

impl From<std::net::AddrParseError> for HostPortError {
    fn from(err: std::net::AddrParseError) -> Self {
        HostPortError::InvalidHostname(err)
    }
}
