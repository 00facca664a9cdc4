use crate::base::context::{with_timeout, IoResultExt};
use crate::base::loadstate::LoadState;
use crate::base::neterror::NetError;
use crate::dns::{Name, Resolve};
use crate::socket::params::ConnectParams;
use crate::socket::proxy;
use std::io;
use std::net::{IpAddr, SocketAddr};
use tokio::net::{TcpSocket, TcpStream};

/// Manages the connection process: DNS -> TCP -> (CONNECT tunnel).
/// Roughly equivalent to net::TransportConnectJob.
///
/// The dialed address is always the one the injected resolver returned; the
/// hostname is never handed to the operating system.
pub struct ConnectJob<'a> {
    resolver: &'a dyn Resolve,
    params: &'a ConnectParams,
}

impl<'a> ConnectJob<'a> {
    pub fn new(resolver: &'a dyn Resolve, params: &'a ConnectParams) -> Self {
        Self { resolver, params }
    }

    /// Run every stage and return a socket ready for HTTP (or TLS) traffic.
    ///
    /// A socket created before a later stage fails is dropped, which closes it.
    pub async fn connect(&self) -> Result<TcpStream, NetError> {
        let params = self.params;

        let ip = self.resolve_host().await?;
        let addr = SocketAddr::new(ip, params.port);

        log_stage(LoadState::Connecting, params);
        let stream = with_timeout(params.timeout, dial(addr, params.source_address))
            .await
            .connection_context(&params.host, params.port)?;

        set_nodelay_best_effort(&stream).connection_context(&params.host, params.port)?;

        match &params.tunnel {
            Some(target) => {
                log_stage(LoadState::EstablishingProxyTunnel, params);
                proxy::establish_tunnel(stream, &params.authority(), target, params.timeout).await
            }
            None => Ok(stream),
        }
    }

    async fn resolve_host(&self) -> Result<IpAddr, NetError> {
        let params = self.params;
        log_stage(LoadState::ResolvingHost, params);

        let lookup = self.resolver.resolve(Name::new(params.host.as_str()));
        let ip = with_timeout(params.timeout, async { Ok(lookup.await) })
            .await
            .dns_context(&params.host)??;

        tracing::debug!(host = %params.host, ip = %ip, "host resolved");
        Ok(ip)
    }
}

fn log_stage(state: LoadState, params: &ConnectParams) {
    tracing::debug!(
        stage = %state,
        host = %params.host,
        port = params.port,
        "connect job stage"
    );
}

async fn dial(addr: SocketAddr, source: Option<SocketAddr>) -> io::Result<TcpStream> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    if let Some(source) = source {
        socket.bind(source)?;
    }
    socket.connect(addr).await
}

/// Enable TCP_NODELAY, tolerating platforms that lack the option.
pub(crate) fn set_nodelay_best_effort(stream: &TcpStream) -> io::Result<()> {
    match stream.set_nodelay(true) {
        Ok(()) => Ok(()),
        Err(e) if is_unsupported_sockopt(&e) => {
            tracing::debug!(error = %e, "TCP_NODELAY unsupported, continuing without it");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// ENOPROTOOPT on unix, WSAENOPROTOOPT on Windows, or a std-level
/// `Unsupported`.
pub(crate) fn is_unsupported_sockopt(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::Unsupported
        || (err.raw_os_error().is_some() && err.raw_os_error() == ENOPROTOOPT)
}

#[cfg(unix)]
const ENOPROTOOPT: Option<i32> = Some(libc::ENOPROTOOPT);
#[cfg(windows)]
const ENOPROTOOPT: Option<i32> = Some(10042);
#[cfg(not(any(unix, windows)))]
const ENOPROTOOPT: Option<i32> = None;
