//! Socket and connection management.
//!
//! Mirrors the connect half of Chromium's `net/socket/`, with DNS forced
//! through an injected [`Resolve`](crate::dns::Resolve):
//! - [`connectjob`]: DNS → TCP → (CONNECT tunnel) for one attempt
//! - [`establisher`]: plain and TLS establishers built on the connect job
//! - [`connector`]: scheme dispatch plugged into `hyper-util`
//! - [`proxy`]: HTTP proxy settings and the CONNECT exchange
//! - [`tls`]: TLS configuration with BoringSSL

pub mod client;
pub mod connectjob;
pub mod connector;
pub mod establisher;
pub mod params;
pub mod proxy;
pub mod tls;
