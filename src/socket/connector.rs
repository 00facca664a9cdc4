//! `tower::Service<Uri>` connector for `hyper_util::client::legacy::Client`.
//!
//! Every connection the client opens goes through the forced resolver:
//! `http` URIs use the [`PlainEstablisher`], `https` URIs the
//! [`TlsEstablisher`].
//!
//! # Example
//!
//! ```rust,ignore
//! use forcedns::socket::connector::ForcedDnsConnector;
//! use http_body_util::Empty;
//! use hyper_util::{client::legacy::Client, rt::TokioExecutor};
//!
//! let connector = ForcedDnsConnector::builder().build()?;
//! let client: Client<_, Empty<bytes::Bytes>> =
//!     Client::builder(TokioExecutor::new()).build(connector);
//! ```

use crate::base::neterror::NetError;
use crate::dns::{HickoryResolver, Resolve, ResolverConfig};
use crate::socket::client::SocketType;
use crate::socket::establisher::{
    ConnectionEstablisher, Establishing, PlainEstablisher, TlsEstablisher,
};
use crate::socket::params::ConnectParams;
use crate::socket::proxy::{ProxySettings, ProxyType};
use crate::socket::tls::{TlsConfig, TlsPolicy};
use http::Uri;
use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

/// Connector that resolves through explicit upstream DNS servers.
#[derive(Clone, Debug)]
pub struct ForcedDnsConnector {
    plain: PlainEstablisher,
    tls: TlsEstablisher,
    proxy: Option<ProxySettings>,
    timeout: Option<Duration>,
    source_address: Option<SocketAddr>,
}

impl ForcedDnsConnector {
    pub fn builder() -> ConnectorBuilder {
        ConnectorBuilder::default()
    }

    /// Translate a request URI into the parameters for one attempt.
    pub fn params_for(&self, uri: &Uri) -> Result<ConnectParams, NetError> {
        let host = uri.host().ok_or(NetError::InvalidUrl)?;
        let port = match uri.port_u16() {
            Some(port) => port,
            None => match uri.scheme_str() {
                Some("http") => 80,
                Some("https") => 443,
                _ => return Err(NetError::UnknownUrlScheme),
            },
        };

        let mut params = match &self.proxy {
            Some(proxy) => {
                let (proxy_host, proxy_port) = proxy.host_port().ok_or(NetError::InvalidUrl)?;
                ConnectParams::new(proxy_host, proxy_port).with_tunnel(proxy.tunnel_to(host, port))
            }
            None => ConnectParams::new(host, port),
        };
        params.timeout = self.timeout;
        params.source_address = self.source_address;
        Ok(params)
    }

    /// Open a connection for `uri`, dispatching on its scheme.
    pub fn connect(&self, uri: Uri) -> Establishing<SocketType> {
        let this = self.clone();
        Box::pin(async move {
            let params = this.params_for(&uri)?;
            match uri.scheme_str() {
                Some("http") => Ok(this.plain.establish(params).await?.into()),
                Some("https") => Ok(this.tls.establish(params).await?.into()),
                _ => Err(NetError::UnknownUrlScheme),
            }
        })
    }
}

impl tower_service::Service<Uri> for ForcedDnsConnector {
    type Response = SocketType;
    type Error = NetError;
    type Future = Establishing<SocketType>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, uri: Uri) -> Self::Future {
        self.connect(uri)
    }
}

/// Builder for [`ForcedDnsConnector`].
///
/// Defaults: Google Public DNS upstreams, [`TlsPolicy::insecure`], no proxy,
/// no timeout.
pub struct ConnectorBuilder {
    resolver: Option<Arc<dyn Resolve>>,
    resolver_config: ResolverConfig,
    tls_config: TlsConfig,
    tls_policy: TlsPolicy,
    proxy: Option<ProxySettings>,
    timeout: Option<Duration>,
    source_address: Option<SocketAddr>,
}

impl Default for ConnectorBuilder {
    fn default() -> Self {
        Self {
            resolver: None,
            resolver_config: ResolverConfig::default(),
            tls_config: TlsConfig::default(),
            tls_policy: TlsPolicy::insecure(),
            proxy: None,
            timeout: None,
            source_address: None,
        }
    }
}

impl ConnectorBuilder {
    /// Upstream DNS servers for the built-in hickory resolver.
    pub fn resolver_config(mut self, config: ResolverConfig) -> Self {
        self.resolver_config = config;
        self
    }

    /// Use a custom resolver instead of the built-in one.
    pub fn resolver(mut self, resolver: Arc<dyn Resolve>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn tls_config(mut self, config: TlsConfig) -> Self {
        self.tls_config = config;
        self
    }

    pub fn tls_policy(mut self, policy: TlsPolicy) -> Self {
        self.tls_policy = policy;
        self
    }

    /// Tunnel every connection through an HTTP proxy with CONNECT.
    pub fn proxy(mut self, proxy: ProxySettings) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Deadline for each stage of a connection attempt.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn source_address(mut self, addr: SocketAddr) -> Self {
        self.source_address = Some(addr);
        self
    }

    pub fn build(self) -> Result<ForcedDnsConnector, NetError> {
        if let Some(proxy) = &self.proxy {
            if proxy.proxy_type() != ProxyType::Http {
                return Err(NetError::InvalidConfiguration(format!(
                    "unsupported proxy scheme: {}",
                    proxy.url.scheme()
                )));
            }
        }

        let resolver = match self.resolver {
            Some(resolver) => resolver,
            None => Arc::new(HickoryResolver::new(self.resolver_config)),
        };

        Ok(ForcedDnsConnector {
            plain: PlainEstablisher::new(resolver.clone()),
            tls: TlsEstablisher::new(resolver, &self.tls_config, self.tls_policy)?,
            proxy: self.proxy,
            timeout: self.timeout,
            source_address: self.source_address,
        })
    }
}
