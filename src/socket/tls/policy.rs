use serde::{Deserialize, Serialize};

/// Which parts of the server's identity a TLS handshake checks.
///
/// Bulk fetching through a forced resolver usually runs with
/// [`TlsPolicy::insecure`]: the handshake completes for any certificate the
/// peer presents. Callers that need real verification pass
/// [`TlsPolicy::strict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsPolicy {
    /// Check that the certificate names the requested host.
    pub verify_hostname: bool,
    /// Check the certificate chain against the trust store.
    pub verify_certificate: bool,
}

impl TlsPolicy {
    /// Accept any certificate for any host.
    pub const fn insecure() -> Self {
        Self {
            verify_hostname: false,
            verify_certificate: false,
        }
    }

    /// Verify both the chain and the hostname.
    pub const fn strict() -> Self {
        Self {
            verify_hostname: true,
            verify_certificate: true,
        }
    }

    pub fn is_insecure(&self) -> bool {
        !self.verify_hostname && !self.verify_certificate
    }
}
