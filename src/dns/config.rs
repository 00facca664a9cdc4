//! Upstream DNS server configuration.
//!
//! A [`ResolverConfig`] names the servers every lookup is sent to. It is built
//! once, validated to be non-empty, and shared read-only by all connections.

use crate::base::neterror::NetError;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

/// Standard DNS port used when a server is given without one.
pub const DNS_PORT: u16 = 53;

/// Environment variable read by [`ResolverConfig::from_env`].
pub const SERVERS_ENV: &str = "FORCEDNS_SERVERS";

const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_ATTEMPTS: usize = 2;

/// Which address records a lookup asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStrategy {
    /// A records only.
    #[default]
    Ipv4Only,
    /// AAAA records only.
    Ipv6Only,
    /// A and AAAA queried together.
    Ipv4AndIpv6,
    /// A first, AAAA if there are none.
    Ipv4ThenIpv6,
    /// AAAA first, A if there are none.
    Ipv6ThenIpv4,
}

/// Ordered, non-empty list of upstream DNS servers plus query options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ResolverConfigFile", into = "ResolverConfigFile")]
pub struct ResolverConfig {
    servers: Vec<SocketAddr>,
    timeout: Duration,
    attempts: usize,
    lookup_strategy: LookupStrategy,
}

impl ResolverConfig {
    /// Create a config from explicit server socket addresses.
    ///
    /// Fails with [`NetError::InvalidConfiguration`] if `servers` is empty.
    pub fn new(servers: impl IntoIterator<Item = SocketAddr>) -> Result<Self, NetError> {
        let servers: Vec<SocketAddr> = servers.into_iter().collect();
        if servers.is_empty() {
            return Err(NetError::InvalidConfiguration(
                "at least one upstream DNS server is required".to_string(),
            ));
        }
        Ok(Self {
            servers,
            timeout: DEFAULT_QUERY_TIMEOUT,
            attempts: DEFAULT_ATTEMPTS,
            lookup_strategy: LookupStrategy::default(),
        })
    }

    /// Create a config from IP literals, each queried on port 53.
    pub fn from_ips(ips: &[IpAddr]) -> Result<Self, NetError> {
        Self::new(ips.iter().map(|ip| SocketAddr::new(*ip, DNS_PORT)))
    }

    /// Google Public DNS over IPv4 and IPv6.
    pub fn google() -> Self {
        Self {
            servers: vec![
                SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), DNS_PORT),
                SocketAddr::new(
                    IpAddr::V6(Ipv6Addr::new(0x2001, 0x4860, 0x4860, 0, 0, 0, 0, 0x8888)),
                    DNS_PORT,
                ),
                SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 4, 4)), DNS_PORT),
                SocketAddr::new(
                    IpAddr::V6(Ipv6Addr::new(0x2001, 0x4860, 0x4860, 0, 0, 0, 0, 0x8844)),
                    DNS_PORT,
                ),
            ],
            timeout: DEFAULT_QUERY_TIMEOUT,
            attempts: DEFAULT_ATTEMPTS,
            lookup_strategy: LookupStrategy::default(),
        }
    }

    /// Parse a comma-separated server list such as
    /// `"8.8.8.8, [2001:4860:4860::8888]:53, 127.0.0.1:5353"`.
    pub fn parse(list: &str) -> Result<Self, NetError> {
        let servers = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(parse_server)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(servers)
    }

    /// Read the server list from `FORCEDNS_SERVERS`.
    ///
    /// Falls back to [`ResolverConfig::google`] when the variable is unset.
    pub fn from_env() -> Result<Self, NetError> {
        match std::env::var(SERVERS_ENV) {
            Ok(list) => Self::parse(&list),
            Err(_) => Ok(Self::google()),
        }
    }

    /// Per-query timeout applied by the resolver to each server attempt.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Number of attempts per query across the server list.
    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    pub fn with_lookup_strategy(mut self, strategy: LookupStrategy) -> Self {
        self.lookup_strategy = strategy;
        self
    }

    pub fn servers(&self) -> &[SocketAddr] {
        &self.servers
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn lookup_strategy(&self) -> LookupStrategy {
        self.lookup_strategy
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::google()
    }
}

/// Parse `ip`, `ip:port` or `[ipv6]:port`.
fn parse_server(s: &str) -> Result<SocketAddr, NetError> {
    if let Ok(addr) = s.parse::<SocketAddr>() {
        return Ok(addr);
    }
    let bare = s.trim_start_matches('[').trim_end_matches(']');
    bare.parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, DNS_PORT))
        .map_err(|_| NetError::InvalidConfiguration(format!("invalid DNS server address: {s}")))
}

/// On-disk representation: servers as strings, timeout in milliseconds.
#[derive(Serialize, Deserialize)]
struct ResolverConfigFile {
    servers: Vec<String>,
    #[serde(default)]
    timeout_ms: Option<u64>,
    #[serde(default)]
    attempts: Option<usize>,
    #[serde(default)]
    lookup_strategy: LookupStrategy,
}

impl TryFrom<ResolverConfigFile> for ResolverConfig {
    type Error = NetError;

    fn try_from(file: ResolverConfigFile) -> Result<Self, Self::Error> {
        let servers = file
            .servers
            .iter()
            .map(|s| parse_server(s.trim()))
            .collect::<Result<Vec<_>, _>>()?;
        let mut config = Self::new(servers)?.with_lookup_strategy(file.lookup_strategy);
        if let Some(ms) = file.timeout_ms {
            config = config.with_timeout(Duration::from_millis(ms));
        }
        if let Some(attempts) = file.attempts {
            config = config.with_attempts(attempts);
        }
        Ok(config)
    }
}

impl From<ResolverConfig> for ResolverConfigFile {
    fn from(config: ResolverConfig) -> Self {
        Self {
            servers: config.servers.iter().map(|s| s.to_string()).collect(),
            timeout_ms: Some(config.timeout.as_millis() as u64),
            attempts: Some(config.attempts),
            lookup_strategy: config.lookup_strategy,
        }
    }
}
