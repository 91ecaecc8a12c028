//! Options that configure the security provider.
//!
//! Options are applied in the order given to [`FleetSecurity::new`](crate::FleetSecurity::new).
//! Use either [`with_fleet_settings`] or [`with_config`] as the source of the
//! configuration, then layer the field options on top.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::Span;

use crate::config::{SecurityBuilder, SecurityConfig};
use crate::error::SecurityResult;
use crate::identity::{process_env, resolve_identity};
use crate::settings::FleetSettings;
use crate::signer::RequestSigner;
use crate::tls_config::TlsPolicy;
use crate::trust::decode_signers;

/// A single configuration step.
pub type SecurityOption = Box<dyn FnOnce(&mut SecurityBuilder) -> SecurityResult<()> + Send>;

/// Configure from a [`FleetSettings`] source, resolving a missing identity
/// from the process environment.
///
/// Replaces anything configured by earlier options.
pub fn with_fleet_settings(settings: &FleetSettings) -> SecurityOption {
    with_fleet_settings_using(settings, process_env)
}

/// Like [`with_fleet_settings`], looking variables up through `env`.
pub fn with_fleet_settings_using<E>(settings: &FleetSettings, env: E) -> SecurityOption
where
    E: Fn(&str) -> Option<String> + Send + 'static,
{
    let settings = settings.clone();

    Box::new(move |builder| {
        let tls_config = TlsPolicy::from_settings(Some(&settings.tls));
        let trusted_token_signers = decode_signers(&settings.security.trusted_signers)?;
        let identity = resolve_identity(&settings.security.identity, settings.initiated_by_server, env)?;

        builder.replace_config(SecurityConfig {
            tls_config: Some(tls_config),
            trusted_token_signers,
            identity,
            remote_signer_url: settings.security.remote_signer_url,
            remote_signer_token_file: settings.security.remote_signer_token_file,
            ..Default::default()
        });

        Ok(())
    })
}

/// Adopt a caller-built configuration as is.
///
/// Only the TLS policy is defaulted; nothing else is validated.
pub fn with_config(config: SecurityConfig) -> SecurityOption {
    Box::new(move |builder| {
        builder.replace_config(config);
        builder.ensure_tls_policy();
        Ok(())
    })
}

/// Path to the JWT token file.
pub fn with_token_file(path: impl Into<PathBuf>) -> SecurityOption {
    let path = path.into();
    Box::new(move |builder| {
        builder.config_mut().token_file = Some(path);
        Ok(())
    })
}

/// Path to the hex encoded ed25519 seed file.
pub fn with_seed_file(path: impl Into<PathBuf>) -> SecurityOption {
    let path = path.into();
    Box::new(move |builder| {
        builder.config_mut().seed_file = Some(path);
        Ok(())
    })
}

/// Delegate signing to `signer`.
pub fn with_signer(signer: Arc<dyn RequestSigner>) -> SecurityOption {
    Box::new(move |builder| {
        builder.config_mut().remote_signer = Some(signer);
        Ok(())
    })
}

/// Log under `parent`, tagging entries with `security = "fleet"`.
pub fn with_log(parent: Span) -> SecurityOption {
    Box::new(move |builder| {
        builder.set_log(&parent);
        builder.ensure_tls_policy();
        Ok(())
    })
}
