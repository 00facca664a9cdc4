use std::fmt;

/// The stage a connection attempt is in.
/// This roughly matches net/base/load_states.h
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// No attempt in progress.
    #[default]
    Idle,

    /// Querying the upstream DNS servers.
    ResolvingHost,

    /// Connecting to the resolved address (TCP handshake).
    Connecting,

    /// Exchanging CONNECT with the proxy.
    EstablishingProxyTunnel,

    /// Establishing an SSL connection.
    SslHandshake,
}

impl LoadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadState::Idle => "idle",
            LoadState::ResolvingHost => "resolving_host",
            LoadState::Connecting => "connecting",
            LoadState::EstablishingProxyTunnel => "establishing_proxy_tunnel",
            LoadState::SslHandshake => "ssl_handshake",
        }
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
