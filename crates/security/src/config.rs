//! Native security provider configuration and the builder that assembles it.
//!
//! A build starts from an empty [`SecurityConfig`] and applies each
//! [`SecurityOption`](crate::SecurityOption) in order. The first failing
//! option ends the build; the builder and everything it gathered are dropped.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Span;

use crate::error::{SecurityError, SecurityResult};
use crate::options::SecurityOption;
use crate::provider::{FleetSecurity, PROVIDER_NAME};
use crate::signer::RequestSigner;
use crate::tls_config::TlsPolicy;
use crate::trust::SignerKey;

/// Configuration of a [`FleetSecurity`] provider.
#[derive(Clone, Default)]
pub struct SecurityConfig {
    /// TLS policy; always set once a build succeeds.
    pub tls_config: Option<TlsPolicy>,
    /// Ed25519 keys allowed to sign tokens, in configured order.
    pub trusted_token_signers: Vec<SignerKey>,
    /// Principal this provider acts as.
    pub identity: String,
    /// JWT token file, checked when the token is read.
    pub token_file: Option<PathBuf>,
    /// Hex encoded ed25519 seed used for local signing.
    pub seed_file: Option<PathBuf>,
    /// Remote signing service; empty means unset.
    pub remote_signer_url: String,
    /// Token presented to the remote signing service; empty means unset.
    pub remote_signer_token_file: String,
    /// Supersedes local signing when set.
    pub remote_signer: Option<Arc<dyn RequestSigner>>,
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("tls_config", &self.tls_config)
            .field(
                "trusted_token_signers",
                &self.trusted_token_signers.iter().map(hex::encode).collect::<Vec<_>>(),
            )
            .field("identity", &self.identity)
            .field("token_file", &self.token_file)
            .field("seed_file", &self.seed_file)
            .field("remote_signer_url", &self.remote_signer_url)
            .field("remote_signer_token_file", &self.remote_signer_token_file)
            .field("remote_signer", &self.remote_signer.as_ref().map(|s| s.kind().to_string()))
            .finish()
    }
}

/// In-progress build of a [`FleetSecurity`].
pub struct SecurityBuilder {
    conf: SecurityConfig,
    log: Span,
}

impl Default for SecurityBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SecurityBuilder {
    /// Start a build from an empty configuration.
    pub fn new() -> Self {
        Self {
            conf: SecurityConfig::default(),
            log: tracing::info_span!("security", security = PROVIDER_NAME),
        }
    }

    /// Apply a single option.
    pub fn apply(&mut self, option: SecurityOption) -> SecurityResult<()> {
        option(self)
    }

    /// Apply options in order, stopping at the first failure.
    pub fn apply_all<I>(mut self, options: I) -> SecurityResult<Self>
    where
        I: IntoIterator<Item = SecurityOption>,
    {
        for option in options {
            self.apply(option)?;
        }
        Ok(self)
    }

    /// Configuration gathered so far.
    pub fn config(&self) -> &SecurityConfig {
        &self.conf
    }

    pub(crate) fn config_mut(&mut self) -> &mut SecurityConfig {
        &mut self.conf
    }

    pub(crate) fn replace_config(&mut self, conf: SecurityConfig) {
        self.conf = conf;
    }

    pub(crate) fn set_log(&mut self, parent: &Span) {
        self.log = tracing::info_span!(parent: parent, "security", security = PROVIDER_NAME);
    }

    /// Synthesize the default TLS policy unless one is already set.
    pub(crate) fn ensure_tls_policy(&mut self) -> &TlsPolicy {
        self.conf
            .tls_config
            .get_or_insert_with(|| TlsPolicy::from_settings(None))
    }

    /// Finish the build.
    ///
    /// Server initiated processes may reach this point without an identity;
    /// this is where that is rejected.
    pub fn build(mut self) -> SecurityResult<FleetSecurity> {
        let tls = self.ensure_tls_policy().clone();

        if self.conf.identity.is_empty() {
            return Err(SecurityError::IdentityMissing);
        }

        self.log.in_scope(|| {
            tracing::debug!(
                identity = %self.conf.identity,
                signers = self.conf.trusted_token_signers.len(),
                remote_signer = self.conf.remote_signer.is_some(),
                "Security provider configured"
            )
        });

        Ok(FleetSecurity::from_parts(self.conf, tls, self.log))
    }
}
