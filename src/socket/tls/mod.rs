//! TLS configuration and the client handshake.
//!
//! The connector is built once per transport from a [`TlsConfig`] and a
//! [`TlsPolicy`]; every handshake announces the logical hostname as SNI
//! while the socket itself points at the resolved address.

use crate::base::context::with_timeout;
use crate::base::neterror::NetError;
use boring::ssl::{SslConnector, SslConnectorBuilder, SslMethod, SslVerifyMode, SslVersion};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_boring::SslStream;

mod policy;

pub use self::policy::TlsPolicy;

/// Client Hello settings.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub min_version: Option<SslVersion>,
    pub max_version: Option<SslVersion>,
    pub cipher_list: Option<String>,
    pub alpn_protos: Vec<String>,
    pub curves: Vec<String>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            min_version: Some(SslVersion::TLS1_2),
            max_version: Some(SslVersion::TLS1_3),
            // Broad list so legacy servers in a bulk crawl still negotiate.
            cipher_list: Some(
                "ECDHE-ECDSA-AES128-GCM-SHA256:ECDHE-RSA-AES128-GCM-SHA256:\
                ECDHE-ECDSA-AES256-GCM-SHA384:ECDHE-RSA-AES256-GCM-SHA384:\
                ECDHE-ECDSA-CHACHA20-POLY1305:ECDHE-RSA-CHACHA20-POLY1305:\
                ECDHE-RSA-AES128-SHA:ECDHE-RSA-AES256-SHA:\
                AES128-GCM-SHA256:AES256-GCM-SHA384:AES128-SHA:AES256-SHA"
                    .to_string(),
            ),
            alpn_protos: vec!["http/1.1".to_string()],
            curves: vec!["X25519".to_string(), "P-256".to_string(), "P-384".to_string()],
        }
    }
}

impl TlsConfig {
    /// Apply this configuration and `policy` to an SSL connector builder.
    pub fn apply_to_builder(
        &self,
        builder: &mut SslConnectorBuilder,
        policy: TlsPolicy,
    ) -> Result<(), NetError> {
        if let Some(min) = self.min_version {
            builder
                .set_min_proto_version(Some(min))
                .map_err(|_| NetError::SslProtocolError)?;
        }
        if let Some(max) = self.max_version {
            builder
                .set_max_proto_version(Some(max))
                .map_err(|_| NetError::SslProtocolError)?;
        }

        if let Some(ciphers) = &self.cipher_list {
            builder
                .set_cipher_list(ciphers)
                .map_err(|_| NetError::SslProtocolError)?;
        }

        if !self.alpn_protos.is_empty() {
            let mut alpn_wire = Vec::new();
            for proto in &self.alpn_protos {
                if proto.is_empty() || proto.len() > 255 {
                    return Err(NetError::SslProtocolError);
                }
                alpn_wire.push(proto.len() as u8);
                alpn_wire.extend_from_slice(proto.as_bytes());
            }
            builder
                .set_alpn_protos(&alpn_wire)
                .map_err(|_| NetError::SslProtocolError)?;
        }

        if !self.curves.is_empty() {
            builder
                .set_curves_list(&self.curves.join(":"))
                .map_err(|_| NetError::SslProtocolError)?;
        }

        if policy.verify_certificate {
            builder.set_verify(SslVerifyMode::PEER);
        } else {
            builder.set_verify(SslVerifyMode::NONE);
        }

        Ok(())
    }

    /// Build a reusable connector for `policy`.
    pub fn build_connector(&self, policy: TlsPolicy) -> Result<SslConnector, NetError> {
        let mut builder =
            SslConnector::builder(SslMethod::tls()).map_err(|_| NetError::SslProtocolError)?;
        self.apply_to_builder(&mut builder, policy)?;
        Ok(builder.build())
    }

    /// Check if SNI should be set for this host.
    /// Per RFC 6066, SNI MUST NOT be set for raw IP addresses.
    pub fn should_set_sni(host: &str) -> bool {
        host.parse::<std::net::IpAddr>().is_err()
    }
}

/// Run the client handshake over an established TCP (or tunneled) stream.
///
/// `server_name` is the logical hostname; it is sent as SNI and, when the
/// policy asks for it, checked against the certificate.
pub async fn handshake(
    connector: &SslConnector,
    policy: TlsPolicy,
    server_name: &str,
    stream: TcpStream,
    timeout: Option<Duration>,
) -> Result<SslStream<TcpStream>, NetError> {
    let mut config = connector
        .configure()
        .map_err(|_| NetError::SslProtocolError)?;
    config.set_verify_hostname(policy.verify_hostname);
    if !TlsConfig::should_set_sni(server_name) {
        config.set_use_server_name_indication(false);
    }

    let connect = tokio_boring::connect(config, server_name, stream);
    let outcome = with_timeout(timeout, async { Ok(connect.await) }).await;
    let (reason, source) = match outcome {
        Ok(Ok(stream)) => return Ok(stream),
        Ok(Err(e)) => (e.to_string(), None),
        Err(e) => (e.to_string(), Some(Arc::new(e))),
    };

    tracing::warn!(server_name = %server_name, error = %reason, "TLS handshake failed");
    Err(NetError::SslHandshakeFailed {
        host: server_name.to_string(),
        reason,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_applies() {
        let config = TlsConfig::default();
        assert_eq!(config.alpn_protos, vec!["http/1.1".to_string()]);

        let mut builder = SslConnector::builder(SslMethod::tls()).unwrap();
        assert!(config
            .apply_to_builder(&mut builder, TlsPolicy::insecure())
            .is_ok());
    }

    #[test]
    fn test_invalid_alpn_rejected() {
        let config = TlsConfig {
            alpn_protos: vec![String::new()],
            ..TlsConfig::default()
        };
        let err = config.build_connector(TlsPolicy::insecure()).unwrap_err();
        assert!(matches!(err, NetError::SslProtocolError));
    }

    #[test]
    fn test_should_set_sni() {
        assert!(TlsConfig::should_set_sni("example.com"));
        assert!(!TlsConfig::should_set_sni("127.0.0.1"));
        assert!(!TlsConfig::should_set_sni("::1"));
    }

    #[test]
    fn test_policy_presets() {
        assert!(TlsPolicy::insecure().is_insecure());
        assert!(!TlsPolicy::strict().is_insecure());
        assert!(TlsPolicy::strict().verify_hostname);
    }
}
