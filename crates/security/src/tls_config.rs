//! TLS policy for the security provider.
//!
//! [`TlsPolicy`] is the policy object the provider carries. It is synthesized
//! from the `[tls]` settings section, or from nothing at all, and only turns
//! into rustls client or server configs when asked. Certificate files are
//! not touched until then.

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::{ring, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{
    CertificateError, ClientConfig, DigitallySignedStruct, RootCertStore, ServerConfig, SignatureScheme, SupportedProtocolVersion,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cert_manager::CertificateManager;
use crate::error::{SecurityError, SecurityResult};

static TLS13_ONLY: &[&SupportedProtocolVersion] = &[&rustls::version::TLS13];

/// Lowest TLS protocol version a policy accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TlsVersion {
    #[serde(rename = "1.2")]
    Tls12,
    #[default]
    #[serde(rename = "1.3")]
    Tls13,
}

impl TlsVersion {
    fn protocol_versions(self) -> &'static [&'static SupportedProtocolVersion] {
        match self {
            TlsVersion::Tls12 => rustls::ALL_VERSIONS,
            TlsVersion::Tls13 => TLS13_ONLY,
        }
    }
}

impl std::fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TlsVersion::Tls12 => write!(f, "1.2"),
            TlsVersion::Tls13 => write!(f, "1.3"),
        }
    }
}

/// The `[tls]` section of the settings source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsSettings {
    pub ca_file: Option<PathBuf>,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
    pub min_version: TlsVersion,
    pub skip_hostname_verification: bool,
    pub alpn_protocols: Vec<String>,
}

/// TLS policy used by the security provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsPolicy {
    pub ca_file: Option<PathBuf>,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
    pub min_version: TlsVersion,
    pub skip_hostname_verification: bool,
    pub alpn_protocols: Vec<Vec<u8>>,
}

impl TlsPolicy {
    /// Synthesize a policy from optional settings.
    ///
    /// `None` gives the default policy: TLS 1.3 only, hostname verification
    /// on, no certificates.
    pub fn from_settings(settings: Option<&TlsSettings>) -> Self {
        let Some(s) = settings else {
            return Self::default();
        };

        if s.skip_hostname_verification {
            warn!("TLS policy configured to skip hostname verification");
        }

        Self {
            ca_file: s.ca_file.clone(),
            cert_file: s.cert_file.clone(),
            key_file: s.key_file.clone(),
            min_version: s.min_version,
            skip_hostname_verification: s.skip_hostname_verification,
            alpn_protocols: s.alpn_protocols.iter().map(|p| p.as_bytes().to_vec()).collect(),
        }
    }

    /// Whether CA, certificate and key are all configured.
    pub fn has_certificates(&self) -> bool {
        self.ca_file.is_some() && self.cert_file.is_some() && self.key_file.is_some()
    }

    /// Certificate manager over the configured files.
    pub fn certificate_manager(&self) -> SecurityResult<CertificateManager> {
        match (&self.ca_file, &self.cert_file, &self.key_file) {
            (Some(ca), Some(cert), Some(key)) => Ok(CertificateManager::new(ca, cert, key)),
            _ => Err(SecurityError::Tls(
                "TLS policy has no CA, certificate and key configured".to_string(),
            )),
        }
    }

    /// Build a mutual TLS server config; client certificates are required.
    pub fn server_config(&self) -> SecurityResult<ServerConfig> {
        info!("Building mTLS server configuration");

        let bundle = self.certificate_manager()?.load_bundle()?;
        let provider = crypto_provider();
        let root_store = root_store(bundle.ca_certs)?;

        let client_verifier =
            rustls::server::WebPkiClientVerifier::builder_with_provider(Arc::new(root_store), provider.clone())
                .build()
                .map_err(|e| SecurityError::Tls(format!("failed to build client verifier: {}", e)))?;

        let mut config = ServerConfig::builder_with_provider(provider)
            .with_protocol_versions(self.min_version.protocol_versions())
            .map_err(|e| SecurityError::Tls(format!("unsupported protocol versions: {}", e)))?
            .with_client_cert_verifier(client_verifier)
            .with_single_cert(bundle.certs, bundle.key)
            .map_err(|e| SecurityError::Tls(format!("failed to build server config: {}", e)))?;

        config.alpn_protocols = self.alpn_protocols.clone();
        debug!(min_version = %self.min_version, "mTLS server configuration created");
        Ok(config)
    }

    /// Build a mutual TLS client config presenting the configured certificate.
    pub fn client_config(&self) -> SecurityResult<ClientConfig> {
        info!("Building mTLS client configuration");

        let bundle = self.certificate_manager()?.load_bundle()?;
        let provider = crypto_provider();
        let root_store = Arc::new(root_store(bundle.ca_certs)?);

        let webpki = WebPkiServerVerifier::builder_with_provider(root_store, provider.clone())
            .build()
            .map_err(|e| SecurityError::Tls(format!("failed to build server verifier: {}", e)))?;

        let verifier: Arc<dyn ServerCertVerifier> = if self.skip_hostname_verification {
            info!("Building client config with hostname verification SKIPPED");
            Arc::new(NoHostnameVerifier { inner: webpki })
        } else {
            webpki
        };

        let mut config = ClientConfig::builder_with_provider(provider)
            .with_protocol_versions(self.min_version.protocol_versions())
            .map_err(|e| SecurityError::Tls(format!("unsupported protocol versions: {}", e)))?
            .dangerous()
            .with_custom_certificate_verifier(verifier)
            .with_client_auth_cert(bundle.certs, bundle.key)
            .map_err(|e| SecurityError::Tls(format!("failed to build client config: {}", e)))?;

        config.alpn_protocols = self.alpn_protocols.clone();
        debug!(min_version = %self.min_version, "mTLS client configuration created");
        Ok(config)
    }
}

fn crypto_provider() -> Arc<CryptoProvider> {
    Arc::new(ring::default_provider())
}

fn root_store(ca_certs: Vec<CertificateDer<'static>>) -> SecurityResult<RootCertStore> {
    let mut root_store = RootCertStore::empty();
    for cert in ca_certs {
        root_store
            .add(cert)
            .map_err(|e| SecurityError::Tls(format!("failed to add CA certificate to root store: {}", e)))?;
    }
    Ok(root_store)
}

/// Server certificate verifier that skips hostname validation.
///
/// The chain is still validated against the configured CA and handshake
/// signatures are still checked. Only a name mismatch is accepted.
#[derive(Debug)]
struct NoHostnameVerifier {
    inner: Arc<WebPkiServerVerifier>,
}

impl ServerCertVerifier for NoHostnameVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        match self
            .inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
        {
            Err(rustls::Error::InvalidCertificate(
                CertificateError::NotValidForName | CertificateError::NotValidForNameContext { .. },
            )) => {
                debug!("Server certificate chain valid, hostname check skipped");
                Ok(ServerCertVerified::assertion())
            }
            other => other,
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}
