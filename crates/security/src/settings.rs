//! Settings source for the security provider.
//!
//! Settings come from an optional TOML file, overridden by `FLEET_`
//! environment variables. Nested keys use `__`, so `security.identity` is
//! `FLEET_SECURITY__IDENTITY`. `FLEET_SECURITY__TRUSTED_SIGNERS` takes a
//! comma separated list.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::error::{SecurityError, SecurityResult};
use crate::tls_config::TlsSettings;

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "FLEET";

/// Settings the provider derives its configuration from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetSettings {
    /// Process was started in the server role.
    pub initiated_by_server: bool,
    pub security: SecuritySettings,
    pub tls: TlsSettings,
}

/// The `[security]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    /// Explicit identity; empty means resolve from the environment.
    pub identity: String,
    /// Hex encoded ed25519 public keys allowed to sign tokens.
    #[serde(deserialize_with = "signer_list")]
    pub trusted_signers: Vec<String>,
    pub remote_signer_url: String,
    pub remote_signer_token_file: String,
}

impl FleetSettings {
    /// Load settings from `path` (if any) and the process environment.
    pub fn load(path: Option<&Path>) -> SecurityResult<Self> {
        Self::build(path, None, environment())
    }

    /// Like [`FleetSettings::load`] but reads overrides from `vars` instead of
    /// the process environment.
    pub fn load_with_env(path: Option<&Path>, vars: HashMap<String, String>) -> SecurityResult<Self> {
        Self::build(path, None, environment().source(Some(vars)))
    }

    /// Parse settings from a TOML document, without environment overrides.
    pub fn from_toml_str(toml: &str) -> SecurityResult<Self> {
        Self::build(None, Some(toml), environment().source(Some(HashMap::new())))
    }

    fn build(path: Option<&Path>, toml: Option<&str>, env: config::Environment) -> SecurityResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            debug!(path = %path.display(), "Loading security settings");
            builder = builder.add_source(config::File::from(path).required(true));
        }

        if let Some(toml) = toml {
            builder = builder.add_source(config::File::from_str(toml, config::FileFormat::Toml));
        }

        builder
            .add_source(env)
            .build()
            .map_err(|e| SecurityError::Settings(format!("failed to load settings: {}", e)))?
            .try_deserialize()
            .map_err(|e| SecurityError::Settings(format!("invalid settings: {}", e)))
    }
}

// Values stay strings; serde and the config crate convert the typed fields.
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

/// Accept a list of keys or a single comma separated string.
fn signer_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SignerList {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match SignerList::deserialize(deserializer)? {
        SignerList::List(keys) => keys,
        SignerList::Joined(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .collect(),
    })
}
