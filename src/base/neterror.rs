use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced while resolving a host and establishing a connection to it.
///
/// Codes returned by [`NetError::as_i32`] follow Chromium's `net_error_list.h`
/// so failures can be compared against browser-side logs.
#[derive(Debug, Error, Clone)]
pub enum NetError {
    /// The upstream servers answered, but with zero address records.
    #[error("No address found for {domain}")]
    NoAddressFound { domain: String },

    /// The DNS query itself failed (timeout, SERVFAIL, NXDOMAIN, malformed
    /// response, unreachable server).
    #[error("Resolving {domain} failed: {source}")]
    NameResolutionFailed {
        domain: String,
        #[source]
        source: Arc<io::Error>,
    },

    /// TCP connection to the resolved address failed (refused, unreachable,
    /// timed out, or a fatal socket option error).
    #[error("Connection to {host}:{port} failed: {source}")]
    ConnectionFailedTo {
        host: String,
        port: u16,
        #[source]
        source: Arc<io::Error>,
    },

    /// The proxy did not establish the CONNECT tunnel.
    #[error("Tunnel through {proxy} to {target} failed: {reason}")]
    TunnelConnectionFailed {
        proxy: String,
        target: String,
        reason: String,
        /// Set when the exchange failed at the IO level (including timeouts).
        #[source]
        source: Option<Arc<io::Error>>,
    },

    /// The TLS handshake failed or did not finish in time.
    #[error("SSL handshake with {host} failed: {reason}")]
    SslHandshakeFailed {
        host: String,
        reason: String,
        #[source]
        source: Option<Arc<io::Error>>,
    },

    #[error("SSL protocol error")]
    SslProtocolError,
    #[error("Connection timed out")]
    ConnectionTimedOut,
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Unknown URL scheme")]
    UnknownUrlScheme,
    #[error("Invalid response")]
    InvalidResponse,
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

impl NetError {
    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::ConnectionFailedTo { .. } => -104,
            NetError::NoAddressFound { .. } => -105,
            NetError::SslHandshakeFailed { .. } => -107,
            NetError::SslProtocolError => -107,
            NetError::TunnelConnectionFailed { .. } => -111,
            NetError::ConnectionTimedOut => -118,
            NetError::NameResolutionFailed { .. } => -137,
            NetError::InvalidUrl => -300,
            NetError::UnknownUrlScheme => -302,
            NetError::InvalidResponse => -320,
            // Custom codes start at -1000 to stay clear of Chromium's ranges
            NetError::InvalidConfiguration(_) => -1000,
            NetError::Unknown(code) => *code,
        }
    }

    /// Build a [`NetError::NameResolutionFailed`] from any resolver error.
    pub fn dns_failed(domain: &str, source: io::Error) -> Self {
        NetError::NameResolutionFailed {
            domain: domain.to_string(),
            source: Arc::new(source),
        }
    }

    /// Build a [`NetError::ConnectionFailedTo`] for `host:port`.
    pub fn connection_failed_to(host: &str, port: u16, source: io::Error) -> Self {
        NetError::ConnectionFailedTo {
            host: host.to_string(),
            port,
            source: Arc::new(source),
        }
    }

    /// True for both resolution error kinds.
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            NetError::NoAddressFound { .. } | NetError::NameResolutionFailed { .. }
        )
    }

    /// True when the underlying cause was an elapsed timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            NetError::ConnectionTimedOut => true,
            NetError::NameResolutionFailed { source, .. }
            | NetError::ConnectionFailedTo { source, .. } => {
                source.kind() == io::ErrorKind::TimedOut
            }
            NetError::TunnelConnectionFailed { source, .. }
            | NetError::SslHandshakeFailed { source, .. } => source
                .as_ref()
                .is_some_and(|e| e.kind() == io::ErrorKind::TimedOut),
            _ => false,
        }
    }
}

impl From<i32> for NetError {
    fn from(code: i32) -> Self {
        match code {
            -107 => NetError::SslProtocolError,
            -118 => NetError::ConnectionTimedOut,
            -300 => NetError::InvalidUrl,
            -302 => NetError::UnknownUrlScheme,
            -320 => NetError::InvalidResponse,
            _ => NetError::Unknown(code),
        }
    }
}
