//! Fleet security provider.
//!
//! This crate builds the configuration a fleet node or client uses to
//! authenticate and authorize messages: the ed25519 keys trusted to sign
//! tokens, the identity the process acts as, the TLS policy, and where
//! signing material comes from (a local seed file or a remote signer).
//!
//! # Features
//! - Option based configuration, applied in order, first failure aborts
//! - Settings from TOML files with `FLEET_` environment overrides
//! - Strict hex and size validation of trusted signer keys
//! - Identity fallback to the current-user environment variable for clients
//! - rustls client and server configs with mutual TLS
//! - Local ed25519 signing from a seed file, or delegation to a remote signer
//!
//! # Example
//! ```no_run
//! use fleet_security::{with_fleet_settings, with_token_file, FleetSecurity, FleetSettings};
//!
//! # fn main() -> Result<(), fleet_security::SecurityError> {
//! let settings = FleetSettings::load(Some("/etc/fleet/client.toml".as_ref()))?;
//! let security = FleetSecurity::new([
//!     with_fleet_settings(&settings),
//!     with_token_file("/etc/fleet/client.jwt"),
//! ])?;
//!
//! println!("acting as {}", security.identity());
//! # Ok(())
//! # }
//! ```

mod cert_manager;
mod config;
mod error;
mod identity;
mod options;
mod provider;
mod settings;
mod signer;
mod tls_config;
mod trust;

pub use cert_manager::CertificateManager;
pub use config::{SecurityBuilder, SecurityConfig};
pub use error::{SecurityError, SecurityResult};
pub use identity::{process_env, resolve_identity, user_env_var, user_env_var_for, DEFAULT_USER_ENV_VAR};
pub use options::{
    with_config, with_fleet_settings, with_fleet_settings_using, with_log, with_seed_file, with_signer,
    with_token_file, SecurityOption,
};
pub use provider::{FleetSecurity, PROVIDER_NAME};
pub use settings::{FleetSettings, SecuritySettings, ENV_PREFIX};
pub use signer::RequestSigner;
pub use tls_config::{TlsPolicy, TlsSettings, TlsVersion};
pub use trust::{decode_signer, decode_signers, SignerKey};
