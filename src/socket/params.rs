//! Per-attempt connection parameters.

use std::net::SocketAddr;
use std::time::Duration;

/// Where a CONNECT tunnel should lead once the proxy is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelTarget {
    /// Logical destination host. Also the TLS server name when tunneling.
    pub host: String,
    pub port: u16,
    /// Value of the `Proxy-Authorization` header, if the proxy needs one.
    pub proxy_authorization: Option<String>,
}

impl TunnelTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: strip_brackets(host.into()),
            port,
            proxy_authorization: None,
        }
    }

    pub fn with_proxy_authorization(mut self, value: impl Into<String>) -> Self {
        self.proxy_authorization = Some(value.into());
        self
    }

    /// `host:port` as it appears in the CONNECT request line.
    pub fn authority(&self) -> String {
        authority(&self.host, self.port)
    }
}

/// Everything one connection attempt needs to know.
///
/// `host`/`port` name the peer that is dialed: the origin server for direct
/// connections, the proxy when `tunnel` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    /// Applies separately to DNS, TCP connect, CONNECT exchange and TLS
    /// handshake.
    pub timeout: Option<Duration>,
    /// Local address to bind before connecting.
    pub source_address: Option<SocketAddr>,
    pub tunnel: Option<TunnelTarget>,
}

impl ConnectParams {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: strip_brackets(host.into()),
            port,
            timeout: None,
            source_address: None,
            tunnel: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_source_address(mut self, addr: SocketAddr) -> Self {
        self.source_address = Some(addr);
        self
    }

    pub fn with_tunnel(mut self, tunnel: TunnelTarget) -> Self {
        self.tunnel = Some(tunnel);
        self
    }

    /// The logical host the caller wants to talk to: the tunnel target when
    /// tunneling, otherwise the dialed host. Never a resolved address.
    pub fn server_name(&self) -> &str {
        match &self.tunnel {
            Some(tunnel) => &tunnel.host,
            None => &self.host,
        }
    }

    /// `host:port` of the dialed peer.
    pub fn authority(&self) -> String {
        authority(&self.host, self.port)
    }
}

fn strip_brackets(host: String) -> String {
    if host.starts_with('[') && host.ends_with(']') {
        host[1..host.len() - 1].to_string()
    } else {
        host
    }
}

fn authority(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}
