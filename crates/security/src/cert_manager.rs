//! Certificate loading for the TLS policy.
//!
//! Loads PEM certificate chains and private keys, and reads the subject
//! Common Name used to cross-check the provider identity.

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;
use x509_parser::prelude::*;

use crate::error::{SecurityError, SecurityResult};

/// Loads the certificates and key a [`crate::TlsPolicy`] points at.
#[derive(Debug, Clone)]
pub struct CertificateManager {
    /// CA certificate used to verify peers
    ca_cert_path: PathBuf,
    /// This process's certificate
    cert_path: PathBuf,
    /// This process's private key
    key_path: PathBuf,
}

/// Everything needed for a mutual TLS config.
pub struct CertificateBundle {
    pub certs: Vec<CertificateDer<'static>>,
    pub key: PrivateKeyDer<'static>,
    pub ca_certs: Vec<CertificateDer<'static>>,
}

impl CertificateManager {
    pub fn new(ca_path: impl Into<PathBuf>, cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        Self {
            ca_cert_path: ca_path.into(),
            cert_path: cert_path.into(),
            key_path: key_path.into(),
        }
    }

    /// Load the certificate chain, private key and CA certificates.
    pub fn load_bundle(&self) -> SecurityResult<CertificateBundle> {
        debug!(
            cert = %self.cert_path.display(),
            key = %self.key_path.display(),
            ca = %self.ca_cert_path.display(),
            "Loading TLS certificates"
        );

        let certs = load_cert_chain(&self.cert_path)?;
        let key = load_private_key(&self.key_path)?;
        let ca_certs = load_cert_chain(&self.ca_cert_path)?;

        debug!("Loaded {} certificate(s) and {} CA certificate(s)", certs.len(), ca_certs.len());

        Ok(CertificateBundle { certs, key, ca_certs })
    }

    /// Common Name of the leaf certificate.
    pub fn common_name(&self) -> SecurityResult<String> {
        let certs = load_cert_chain(&self.cert_path)?;
        let leaf = certs
            .first()
            .ok_or_else(|| SecurityError::Certificate(format!("no certificate found in {}", self.cert_path.display())))?;

        common_name(leaf)
    }

    /// Whether the leaf certificate expires within `window`.
    pub fn expires_within(&self, window: Duration) -> SecurityResult<bool> {
        let certs = load_cert_chain(&self.cert_path)?;
        let leaf = certs
            .first()
            .ok_or_else(|| SecurityError::Certificate(format!("no certificate found in {}", self.cert_path.display())))?;

        let (_, parsed) = X509Certificate::from_der(leaf.as_ref())
            .map_err(|e| SecurityError::Certificate(format!("failed to parse certificate: {}", e)))?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| SecurityError::Certificate(format!("system clock before epoch: {}", e)))?
            .as_secs() as i64;

        let remaining = parsed.validity().not_after.timestamp() - now;
        Ok(remaining < i64::try_from(window.as_secs()).unwrap_or(i64::MAX))
    }
}

/// Load a certificate chain from a PEM file.
pub fn load_cert_chain(path: &Path) -> SecurityResult<Vec<CertificateDer<'static>>> {
    let file = File::open(path).map_err(|e| SecurityError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| SecurityError::Certificate(format!("failed to parse certificates from {}: {}", path.display(), e)))?;

    if certs.is_empty() {
        return Err(SecurityError::Certificate(format!("no certificates found in {}", path.display())));
    }

    Ok(certs)
}

/// Load a private key from a PEM file, PKCS8 first then PKCS1.
pub fn load_private_key(path: &Path) -> SecurityResult<PrivateKeyDer<'static>> {
    let file = File::open(path).map_err(|e| SecurityError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let pkcs8_keys = rustls_pemfile::pkcs8_private_keys(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| SecurityError::Certificate(format!("failed to parse PKCS8 keys from {}: {}", path.display(), e)))?;

    if let Some(k) = pkcs8_keys.into_iter().next() {
        return Ok(PrivateKeyDer::Pkcs8(k));
    }

    let file = File::open(path).map_err(|e| SecurityError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let rsa_keys = rustls_pemfile::rsa_private_keys(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| SecurityError::Certificate(format!("failed to parse RSA keys from {}: {}", path.display(), e)))?;

    if let Some(k) = rsa_keys.into_iter().next() {
        return Ok(PrivateKeyDer::Pkcs1(k));
    }

    Err(SecurityError::Certificate(format!("no valid private key found in {}", path.display())))
}

/// Subject Common Name of a DER certificate.
pub fn common_name(cert: &CertificateDer<'_>) -> SecurityResult<String> {
    let (_, parsed) = X509Certificate::from_der(cert.as_ref())
        .map_err(|e| SecurityError::Certificate(format!("failed to parse certificate: {}", e)))?;

    let cn = parsed
        .subject()
        .iter_common_name()
        .next()
        .ok_or_else(|| SecurityError::Certificate("no CN found in certificate".to_string()))?
        .as_str()
        .map_err(|e| SecurityError::Certificate(format!("failed to extract CN: {}", e)))?;

    Ok(cn.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::{CertificateParams, DnType, KeyPair};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn self_signed(cn: &str) -> (NamedTempFile, NamedTempFile) {
        let mut params = CertificateParams::new(vec![cn.to_string()]).unwrap();
        params.distinguished_name.push(DnType::CommonName, cn);
        let key = KeyPair::generate().unwrap();
        let cert = params.self_signed(&key).unwrap();
        (write_temp(&cert.pem()), write_temp(&key.serialize_pem()))
    }

    #[test]
    fn test_reads_common_name() {
        let (cert, key) = self_signed("alice.fleet");
        let manager = CertificateManager::new(cert.path(), cert.path(), key.path());
        assert_eq!(manager.common_name().unwrap(), "alice.fleet");
    }

    #[test]
    fn test_loads_bundle() {
        let (cert, key) = self_signed("node.fleet");
        let manager = CertificateManager::new(cert.path(), cert.path(), key.path());
        let bundle = manager.load_bundle().unwrap();
        assert_eq!(bundle.certs.len(), 1);
        assert_eq!(bundle.ca_certs.len(), 1);
        assert!(matches!(bundle.key, PrivateKeyDer::Pkcs8(_)));
    }

    #[test]
    fn test_expiry_window() {
        let (cert, key) = self_signed("node.fleet");
        let manager = CertificateManager::new(cert.path(), cert.path(), key.path());
        // rcgen certificates are valid until 4096
        assert!(!manager.expires_within(Duration::from_secs(30 * 24 * 60 * 60)).unwrap());
        assert!(manager.expires_within(Duration::MAX).unwrap());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_cert_chain(Path::new("/nonexistent/cert.pem")).unwrap_err();
        assert!(matches!(err, SecurityError::Io { .. }));
    }

    #[test]
    fn test_empty_pem_rejected() {
        let file = write_temp("not a certificate\n");
        let err = load_cert_chain(file.path()).unwrap_err();
        assert!(matches!(err, SecurityError::Certificate(_)));

        let err = load_private_key(file.path()).unwrap_err();
        assert!(matches!(err, SecurityError::Certificate(_)));
    }
}
