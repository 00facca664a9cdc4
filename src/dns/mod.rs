//! DNS Resolution Module
//!
//! Resolves hostnames through an explicit list of upstream DNS servers,
//! bypassing the operating system's resolver entirely.
//!
//! # Architecture
//!
//! This module mirrors Chromium's `HostResolver` concept, narrowed to what a
//! forced-DNS transport needs: the [`Resolve`] trait answers with exactly one
//! address, the first record the upstream returned. [`HickoryResolver`] is
//! the production implementation; tests and embedders can supply their own.
//!
//! # Example
//!
//! ```rust,ignore
//! use forcedns::dns::{HickoryResolver, Name, Resolve, ResolverConfig};
//!
//! let resolver = HickoryResolver::new(ResolverConfig::google());
//! let ip = resolver.resolve(Name::new("example.com")).await?;
//! println!("Resolved: {}", ip);
//! ```

mod config;
mod hickory;
mod resolve;

pub use config::{LookupStrategy, ResolverConfig, DNS_PORT, SERVERS_ENV};
pub use hickory::HickoryResolver;
pub use resolve::{Name, Resolve, Resolving};
