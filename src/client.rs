//! HTTP Client with builder pattern.
//!
//! Wraps a `hyper-util` client whose every connection goes through
//! [`ForcedDnsConnector`], so hostnames are resolved by the configured
//! upstream DNS servers and never by the operating system.
//!
//! # Example
//!
//! ```rust,ignore
//! use forcedns::{Client, dns::ResolverConfig};
//!
//! let client = Client::builder()
//!     .resolver_config(ResolverConfig::google())
//!     .timeout(Duration::from_secs(10))
//!     .build()?;
//!
//! let resp = client.get("https://example.com").send().await?;
//! ```

use crate::base::neterror::NetError;
use crate::dns::{Resolve, ResolverConfig};
use crate::socket::connector::{ConnectorBuilder, ForcedDnsConnector};
use crate::socket::proxy::ProxySettings;
use crate::socket::tls::{TlsConfig, TlsPolicy};
use bytes::Bytes;
use http::{Method, Request, Response};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper_util::client::legacy::Client as HyperClient;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// HTTP Client for making requests.
///
/// Cheap to clone; clones share the connection pool and the resolver.
/// Use [`Client::builder()`] to configure and create a client.
#[derive(Clone, Debug)]
pub struct Client {
    inner: HyperClient<ForcedDnsConnector, Full<Bytes>>,
    timeout: Option<Duration>,
}

impl Client {
    /// Client with Google Public DNS upstreams and verification disabled.
    pub fn new() -> Result<Self, NetError> {
        Self::builder().build()
    }

    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Start building a GET request.
    pub fn get<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    /// Start building a POST request.
    pub fn post<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    /// Start building a HEAD request.
    pub fn head<U: AsRef<str>>(&self, url: U) -> RequestBuilder {
        self.request(Method::HEAD, url)
    }

    /// Start building a request with custom method.
    pub fn request<U: AsRef<str>>(&self, method: Method, url: U) -> RequestBuilder {
        RequestBuilder {
            client: self.clone(),
            method,
            url: url.as_ref().to_string(),
            headers: http::HeaderMap::new(),
            body: Bytes::new(),
            timeout: None,
        }
    }

    /// GET `url` and collect the whole response body.
    pub async fn get_bytes<U: AsRef<str>>(&self, url: U) -> Result<Bytes, NetError> {
        let response = self.get(url).send().await?;
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|_| NetError::InvalidResponse)?;
        Ok(body.to_bytes())
    }

    /// Send a fully built request.
    pub async fn execute(
        &self,
        request: Request<Full<Bytes>>,
    ) -> Result<Response<Incoming>, NetError> {
        self.execute_with_timeout(request, self.timeout).await
    }

    async fn execute_with_timeout(
        &self,
        request: Request<Full<Bytes>>,
        timeout: Option<Duration>,
    ) -> Result<Response<Incoming>, NetError> {
        let uri = request.uri().clone();
        tracing::debug!(method = %request.method(), uri = %uri, "sending request");

        let pending = self.inner.request(request);
        let result = match timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .map_err(|_| NetError::ConnectionTimedOut)?,
            None => pending.await,
        };

        result.map_err(|e| {
            let err = map_client_error(&uri, &e);
            tracing::warn!(uri = %uri, error = %err, "request failed");
            err
        })
    }
}

/// Recover the connector's [`NetError`] from hyper-util's wrapper.
fn map_client_error(uri: &http::Uri, err: &hyper_util::client::legacy::Error) -> NetError {
    let mut source: Option<&(dyn std::error::Error + 'static)> = std::error::Error::source(err);
    while let Some(cause) = source {
        if let Some(net) = cause.downcast_ref::<NetError>() {
            return net.clone();
        }
        source = std::error::Error::source(cause);
    }
    if err.is_connect() {
        connect_failure(uri, err)
    } else {
        NetError::InvalidResponse
    }
}

/// A connect error that carried no [`NetError`], attributed to the request's origin.
fn connect_failure(uri: &http::Uri, cause: &dyn std::error::Error) -> NetError {
    let host = uri
        .host()
        .unwrap_or_default()
        .trim_start_matches('[')
        .trim_end_matches(']');
    let port = uri.port_u16().unwrap_or(match uri.scheme_str() {
        Some("https") => 443,
        _ => 80,
    });
    NetError::connection_failed_to(host, port, std::io::Error::other(cause.to_string()))
}

/// Builder for creating a [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    connector: ConnectorBuilder,
    timeout: Option<Duration>,
    pool_idle_timeout: Option<Duration>,
    pool_max_idle_per_host: Option<usize>,
}

impl ClientBuilder {
    /// Upstream DNS servers used for every connection.
    pub fn resolver_config(mut self, config: ResolverConfig) -> Self {
        self.connector = self.connector.resolver_config(config);
        self
    }

    /// Replace the built-in resolver.
    pub fn resolver(mut self, resolver: Arc<dyn Resolve>) -> Self {
        self.connector = self.connector.resolver(resolver);
        self
    }

    /// Set TLS Client Hello options.
    pub fn tls_config(mut self, config: TlsConfig) -> Self {
        self.connector = self.connector.tls_config(config);
        self
    }

    /// Certificate and hostname checks. Defaults to [`TlsPolicy::insecure`].
    pub fn tls_policy(mut self, policy: TlsPolicy) -> Self {
        self.connector = self.connector.tls_policy(policy);
        self
    }

    /// Set proxy.
    pub fn proxy(mut self, proxy: ProxySettings) -> Self {
        self.connector = self.connector.proxy(proxy);
        self
    }

    /// Per-stage deadline while establishing a connection.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connector = self.connector.timeout(timeout);
        self
    }

    /// Bind outgoing sockets to this local address.
    pub fn source_address(mut self, addr: SocketAddr) -> Self {
        self.connector = self.connector.source_address(addr);
        self
    }

    /// Set request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = Some(max);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<Client, NetError> {
        let connector = self.connector.build()?;

        let mut builder = HyperClient::builder(TokioExecutor::new());
        builder.pool_timer(TokioTimer::new());
        if let Some(idle) = self.pool_idle_timeout {
            builder.pool_idle_timeout(idle);
        }
        if let Some(max) = self.pool_max_idle_per_host {
            builder.pool_max_idle_per_host(max);
        }

        Ok(Client {
            inner: builder.build(connector),
            timeout: self.timeout,
        })
    }
}

/// Builder for a single request.
pub struct RequestBuilder {
    client: Client,
    method: Method,
    url: String,
    headers: http::HeaderMap,
    body: Bytes,
    timeout: Option<Duration>,
}

impl RequestBuilder {
    /// Add a header.
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: http::header::IntoHeaderName,
        V: TryInto<http::HeaderValue>,
    {
        if let Ok(val) = value.try_into() {
            self.headers.insert(key, val);
        }
        self
    }

    /// Set request body.
    pub fn body<B: Into<Bytes>>(mut self, body: B) -> Self {
        self.body = body.into();
        self
    }

    /// Override the client's request timeout for this request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Send the request.
    pub async fn send(self) -> Result<Response<Incoming>, NetError> {
        let uri: http::Uri = self.url.parse().map_err(|_| NetError::InvalidUrl)?;
        if uri.host().is_none() {
            return Err(NetError::InvalidUrl);
        }

        let mut request = Request::builder()
            .method(self.method)
            .uri(uri)
            .body(Full::new(self.body))
            .map_err(|_| NetError::InvalidUrl)?;
        request.headers_mut().extend(self.headers);

        let timeout = self.timeout.or(self.client.timeout);
        self.client.execute_with_timeout(request, timeout).await
    }
}
