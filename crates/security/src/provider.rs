//! The fleet security provider.
//!
//! [`FleetSecurity`] owns a finished [`SecurityConfig`] and never mutates it.
//! It verifies token signatures against the trusted signer set, signs
//! requests either through a remote signer or with the local seed file, and
//! reads the token file on demand.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey, SIGNATURE_LENGTH};
use std::path::Path;
use tracing::{debug, warn, Instrument, Span};

use crate::config::{SecurityBuilder, SecurityConfig};
use crate::error::{SecurityError, SecurityResult};
use crate::options::SecurityOption;
use crate::tls_config::TlsPolicy;
use crate::trust::SignerKey;

/// Value of the `security` field on every log entry from this provider.
pub const PROVIDER_NAME: &str = "fleet";

/// Security provider built from a sequence of [`SecurityOption`]s.
#[derive(Debug)]
pub struct FleetSecurity {
    conf: SecurityConfig,
    tls: TlsPolicy,
    log: Span,
}

impl FleetSecurity {
    /// Build a provider by applying `options` in order.
    ///
    /// # Errors
    /// The error of the first failing option, or
    /// [`SecurityError::IdentityMissing`] when no option supplied an identity.
    pub fn new<I>(options: I) -> SecurityResult<Self>
    where
        I: IntoIterator<Item = SecurityOption>,
    {
        SecurityBuilder::new().apply_all(options)?.build()
    }

    pub(crate) fn from_parts(conf: SecurityConfig, tls: TlsPolicy, log: Span) -> Self {
        Self { conf, tls, log }
    }

    /// Name this provider tags its log entries with.
    pub fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    /// Principal this provider acts as; never empty.
    pub fn identity(&self) -> &str {
        &self.conf.identity
    }

    /// The configuration the build produced.
    pub fn config(&self) -> &SecurityConfig {
        &self.conf
    }

    /// TLS policy, synthesized with defaults when no option supplied one.
    pub fn tls_policy(&self) -> &TlsPolicy {
        &self.tls
    }

    /// Trusted token signer keys, in configured order.
    pub fn trusted_signers(&self) -> &[SignerKey] {
        &self.conf.trusted_token_signers
    }

    /// Whether `key` is one of the trusted token signers.
    pub fn is_trusted_signer(&self, key: &[u8]) -> bool {
        self.conf.trusted_token_signers.iter().any(|k| k.as_slice() == key)
    }

    /// URL of the remote signing service, if configured.
    pub fn remote_signer_url(&self) -> Option<&str> {
        Some(self.conf.remote_signer_url.as_str()).filter(|s| !s.is_empty())
    }

    /// Token file presented to the remote signing service, if configured.
    pub fn remote_signer_token_file(&self) -> Option<&Path> {
        Some(self.conf.remote_signer_token_file.as_str())
            .filter(|s| !s.is_empty())
            .map(Path::new)
    }

    /// Whether signing is delegated to a [`RequestSigner`](crate::RequestSigner).
    pub fn has_remote_signer(&self) -> bool {
        self.conf.remote_signer.is_some()
    }

    /// Verify `signature` over `payload` made by `signer`.
    ///
    /// Returns `Ok(false)` for a well formed signature that does not verify.
    ///
    /// # Errors
    /// `UntrustedSigner` when `signer` is not trusted, `InvalidPublicKey` or
    /// `InvalidSignature` for malformed inputs.
    pub fn verify_signature(&self, payload: &[u8], signature: &[u8], signer: &[u8]) -> SecurityResult<bool> {
        let _enter = self.log.enter();

        if !self.is_trusted_signer(signer) {
            warn!(signer = %hex::encode(signer), "Signature from untrusted signer");
            return Err(SecurityError::UntrustedSigner(hex::encode(signer)));
        }

        let key: SignerKey = signer
            .try_into()
            .map_err(|_| SecurityError::InvalidPublicKey(format!("expected 32 bytes, got {}", signer.len())))?;
        let public_key = VerifyingKey::from_bytes(&key).map_err(|e| SecurityError::InvalidPublicKey(e.to_string()))?;

        let sig: [u8; SIGNATURE_LENGTH] = signature
            .try_into()
            .map_err(|_| SecurityError::InvalidSignature(signature.len()))?;
        let signature = Signature::from_bytes(&sig);

        let valid = public_key.verify(payload, &signature).is_ok();
        debug!(signer = %hex::encode(signer), valid, "Verified signature");
        Ok(valid)
    }

    /// Sign `payload`, through the remote signer when one is configured and
    /// with the seed file otherwise.
    pub async fn sign(&self, payload: &[u8]) -> SecurityResult<Vec<u8>> {
        async {
            if let Some(signer) = &self.conf.remote_signer {
                debug!(kind = signer.kind(), "Signing with remote signer");
                return signer.sign(payload).await;
            }

            let key = self.signing_key().await?;
            debug!("Signing with local seed");
            Ok(key.sign(payload).to_bytes().to_vec())
        }
        .instrument(self.log.clone())
        .await
    }

    /// Public key of the local seed.
    ///
    /// # Errors
    /// `NoSigningMaterial` without a seed file, `Io` or `InvalidSeed` when
    /// the seed file cannot be read or decoded.
    pub async fn public_key(&self) -> SecurityResult<SignerKey> {
        Ok(self.signing_key().await?.verifying_key().to_bytes())
    }

    async fn signing_key(&self) -> SecurityResult<SigningKey> {
        let path = self.conf.seed_file.as_deref().ok_or(SecurityError::NoSigningMaterial)?;

        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SecurityError::io(path, e))?;

        let invalid = |reason: String| SecurityError::InvalidSeed {
            path: path.to_path_buf(),
            reason,
        };

        let seed = hex::decode(contents.trim()).map_err(|e| invalid(e.to_string()))?;
        let size = seed.len();
        let seed: [u8; 32] = seed
            .try_into()
            .map_err(|_| invalid(format!("expected 32 bytes, got {}", size)))?;

        Ok(SigningKey::from_bytes(&seed))
    }

    /// Read the JWT token from the token file.
    ///
    /// # Errors
    /// `NoTokenFile` when unset, `Io` when unreadable, `EmptyToken` when the
    /// file holds only whitespace.
    pub async fn token(&self) -> SecurityResult<String> {
        let path = self.conf.token_file.as_deref().ok_or(SecurityError::NoTokenFile)?;

        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SecurityError::io(path, e))?;

        let token = contents.trim();
        if token.is_empty() {
            return Err(SecurityError::EmptyToken(path.to_path_buf()));
        }

        Ok(token.to_string())
    }

    /// Common Name of the configured TLS certificate.
    pub fn certificate_identity(&self) -> SecurityResult<String> {
        self.tls.certificate_manager()?.common_name()
    }

    /// Whether the TLS certificate was issued to this provider's identity.
    pub fn certificate_matches_identity(&self) -> SecurityResult<bool> {
        Ok(self.certificate_identity()? == self.conf.identity)
    }

    /// Problems worth warning about that do not stop the provider working.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.conf.trusted_token_signers.is_empty() {
            warnings.push("no trusted token signers configured".to_string());
        }

        if self.remote_signer_url().is_some() && self.remote_signer_token_file().is_none() {
            warnings.push("remote signer URL set without a remote signer token file".to_string());
        }

        if let Some(path) = &self.conf.token_file {
            if !path.exists() {
                warnings.push(format!("token file {} does not exist", path.display()));
            }
        }

        if let Some(path) = &self.conf.seed_file {
            if !path.exists() {
                warnings.push(format!("seed file {} does not exist", path.display()));
            }
        }

        if self.conf.seed_file.is_none() && self.conf.remote_signer.is_none() {
            warnings.push("no seed file or remote signer, requests cannot be signed".to_string());
        }

        warnings
    }
}
