//! Connection establishers: the pluggable "open a socket for this request"
//! step, with the forced resolver threaded through.
//!
//! [`PlainEstablisher`] yields a TCP stream; [`TlsEstablisher`] wraps the same
//! stream in TLS, announcing the logical hostname as SNI.

use crate::base::loadstate::LoadState;
use crate::base::neterror::NetError;
use crate::dns::Resolve;
use crate::socket::connectjob::ConnectJob;
use crate::socket::params::ConnectParams;
use crate::socket::tls::{self, TlsConfig, TlsPolicy};
use boring::ssl::SslConnector;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_boring::SslStream;

/// Alias for the `Future` returned by [`ConnectionEstablisher::establish`].
pub type Establishing<S> = Pin<Box<dyn Future<Output = Result<S, NetError>> + Send>>;

/// Opens a ready-to-use socket for one connection attempt.
pub trait ConnectionEstablisher: Send + Sync {
    type Socket: Send + 'static;

    fn establish(&self, params: ConnectParams) -> Establishing<Self::Socket>;
}

/// Plain TCP: resolve, dial the resolved IP, TCP_NODELAY, optional tunnel.
#[derive(Clone)]
pub struct PlainEstablisher {
    resolver: Arc<dyn Resolve>,
}

impl PlainEstablisher {
    pub fn new(resolver: Arc<dyn Resolve>) -> Self {
        Self { resolver }
    }
}

impl ConnectionEstablisher for PlainEstablisher {
    type Socket = TcpStream;

    fn establish(&self, params: ConnectParams) -> Establishing<TcpStream> {
        let resolver = self.resolver.clone();
        Box::pin(async move { ConnectJob::new(&*resolver, &params).connect().await })
    }
}

/// TLS over the plain path. The handshake's server name is the tunnel host
/// when tunneling and the requested host otherwise.
#[derive(Clone)]
pub struct TlsEstablisher {
    resolver: Arc<dyn Resolve>,
    connector: SslConnector,
    policy: TlsPolicy,
}

impl TlsEstablisher {
    pub fn new(
        resolver: Arc<dyn Resolve>,
        config: &TlsConfig,
        policy: TlsPolicy,
    ) -> Result<Self, NetError> {
        if policy.is_insecure() {
            tracing::debug!("TLS certificate and hostname verification disabled");
        }
        Ok(Self {
            resolver,
            connector: config.build_connector(policy)?,
            policy,
        })
    }

    pub fn policy(&self) -> TlsPolicy {
        self.policy
    }
}

impl ConnectionEstablisher for TlsEstablisher {
    type Socket = SslStream<TcpStream>;

    fn establish(&self, params: ConnectParams) -> Establishing<SslStream<TcpStream>> {
        let this = self.clone();
        Box::pin(async move {
            let stream = ConnectJob::new(&*this.resolver, &params).connect().await?;

            let server_name = params.server_name();
            tracing::debug!(
                stage = %LoadState::SslHandshake,
                server_name = %server_name,
                "starting TLS handshake"
            );
            tls::handshake(
                &this.connector,
                this.policy,
                server_name,
                stream,
                params.timeout,
            )
            .await
        })
    }
}

impl std::fmt::Debug for PlainEstablisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlainEstablisher").finish_non_exhaustive()
    }
}

impl std::fmt::Debug for TlsEstablisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsEstablisher")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
