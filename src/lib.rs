//! # forcedns
//!
//! An HTTP/HTTPS client transport that resolves every hostname through an
//! explicit list of upstream DNS servers and connects straight to the
//! resolved address.
//!
//! The operating system's resolver (and anything layered on it, such as
//! `/etc/hosts` or a local caching daemon) is never consulted. TLS still
//! announces the logical hostname as SNI, so virtual-hosted HTTPS servers
//! answer as usual.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use forcedns::Client;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Client::new().unwrap();
//!     let body = client.get_bytes("https://example.com").await.unwrap();
//!     println!("{} bytes", body.len());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error codes, stage tracking, and IO helpers
//! - [`dns`] - Upstream server configuration and the resolver
//! - [`socket`] - Connect jobs, establishers, proxy tunnels, and TLS
//! - [`client`] - High-level request API over `hyper-util`
//!
//! ## Security
//!
//! The default [`TlsPolicy`](socket::tls::TlsPolicy) disables certificate and
//! hostname verification. Use [`TlsPolicy::strict`](socket::tls::TlsPolicy::strict)
//! wherever the peer must be authenticated.

pub mod base;
pub mod client;
pub mod dns;
pub mod socket;

pub use base::neterror::NetError;
pub use client::{Client, ClientBuilder, RequestBuilder};
pub use dns::{HickoryResolver, Resolve, ResolverConfig};
pub use socket::connector::{ConnectorBuilder, ForcedDnsConnector};
pub use socket::proxy::ProxySettings;
pub use socket::tls::{TlsConfig, TlsPolicy};
