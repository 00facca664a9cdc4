//! Async DNS resolver using hickory-dns against an explicit server list.
//!
//! The operating system's resolver configuration is never consulted: every
//! lookup goes to the servers named in the [`ResolverConfig`], over UDP with
//! TCP fallback on the configured port.
//!
//! Caching and the hosts file are disabled so each connection attempt
//! performs a fresh upstream query.

use super::{LookupStrategy, Name, Resolve, ResolverConfig, Resolving};
use crate::base::neterror::NetError;
use hickory_resolver::{
    config::{
        LookupIpStrategy, NameServerConfigGroup, ResolveHosts, ResolverConfig as UpstreamConfig,
        ResolverOpts,
    },
    name_server::TokioConnectionProvider,
    proto::{op::ResponseCode, ProtoErrorKind},
    ResolveError, ResolveErrorKind, TokioResolver,
};
use std::{io, sync::Arc};

/// Async DNS resolver backed by hickory-dns.
///
/// Each instance owns its own resolver built from the injected
/// [`ResolverConfig`]; clones share it.
///
/// # Example
///
/// ```rust,ignore
/// use forcedns::dns::{HickoryResolver, Name, Resolve, ResolverConfig};
///
/// let resolver = HickoryResolver::new(ResolverConfig::google());
/// let ip = resolver.resolve(Name::new("example.com")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct HickoryResolver {
    resolver: Arc<TokioResolver>,
    config: Arc<ResolverConfig>,
}

impl HickoryResolver {
    /// Creates a resolver that queries only `config`'s servers.
    pub fn new(config: ResolverConfig) -> Self {
        let mut name_servers = NameServerConfigGroup::new();
        for server in config.servers() {
            name_servers.merge(NameServerConfigGroup::from_ips_clear(
                &[server.ip()],
                server.port(),
                true,
            ));
        }

        let upstream = UpstreamConfig::from_parts(None, vec![], name_servers);
        let mut builder =
            TokioResolver::builder_with_config(upstream, TokioConnectionProvider::default());
        apply_options(builder.options_mut(), &config);

        tracing::debug!(
            servers = ?config.servers(),
            strategy = ?config.lookup_strategy(),
            "built upstream DNS resolver"
        );

        Self {
            resolver: Arc::new(builder.build()),
            config: Arc::new(config),
        }
    }

    /// The configuration this resolver queries with.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }
}

impl Default for HickoryResolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

fn apply_options(opts: &mut ResolverOpts, config: &ResolverConfig) {
    opts.timeout = config.timeout();
    opts.attempts = config.attempts();
    opts.cache_size = 0;
    // hickory reads /etc/hosts by default; only the upstream servers may answer.
    opts.use_hosts_file = ResolveHosts::Never;
    opts.ip_strategy = match config.lookup_strategy() {
        LookupStrategy::Ipv4Only => LookupIpStrategy::Ipv4Only,
        LookupStrategy::Ipv6Only => LookupIpStrategy::Ipv6Only,
        LookupStrategy::Ipv4AndIpv6 => LookupIpStrategy::Ipv4AndIpv6,
        LookupStrategy::Ipv4ThenIpv6 => LookupIpStrategy::Ipv4thenIpv6,
        LookupStrategy::Ipv6ThenIpv4 => LookupIpStrategy::Ipv6thenIpv4,
    };
}

/// NOERROR with an empty answer section. NXDOMAIN and server failures are
/// reported by hickory as "no records" too, but they are query failures.
fn is_empty_answer(err: &ResolveError) -> bool {
    match err.kind() {
        ResolveErrorKind::Proto(proto) => matches!(
            proto.kind(),
            ProtoErrorKind::NoRecordsFound { response_code, .. }
                if *response_code == ResponseCode::NoError
        ),
        _ => false,
    }
}

fn is_timeout(err: &ResolveError) -> bool {
    match err.kind() {
        ResolveErrorKind::Proto(proto) => matches!(proto.kind(), ProtoErrorKind::Timeout),
        _ => false,
    }
}

fn lookup_error(domain: &str, err: ResolveError) -> NetError {
    if is_empty_answer(&err) {
        return NetError::NoAddressFound {
            domain: domain.to_string(),
        };
    }
    let kind = if is_timeout(&err) {
        io::ErrorKind::TimedOut
    } else {
        io::ErrorKind::Other
    };
    NetError::dns_failed(domain, io::Error::new(kind, err))
}

impl Resolve for HickoryResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = self.resolver.clone();
        Box::pin(async move {
            if let Some(ip) = name.ip_literal() {
                return Ok(ip);
            }

            let domain = name.as_str();
            tracing::debug!(domain = %domain, "resolving via upstream servers");

            let lookup = resolver.lookup_ip(domain).await.map_err(|e| {
                tracing::debug!(domain = %domain, error = %e, "upstream lookup failed");
                lookup_error(domain, e)
            })?;

            let ip = lookup.iter().next().ok_or_else(|| NetError::NoAddressFound {
                domain: domain.to_string(),
            })?;

            tracing::debug!(domain = %domain, ip = %ip, "upstream resolution complete");
            Ok(ip)
        })
    }
}
