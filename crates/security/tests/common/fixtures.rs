//! Test data fixtures for integration tests.

use ed25519_dalek::SigningKey;
use fleet_security::{FleetSettings, SecuritySettings, TlsSettings};
use rand::rngs::OsRng;
use std::io::Write;
use tempfile::NamedTempFile;

/// 32 bytes of `deadbeef`, hex encoded.
pub const DEADBEEF_KEY: &str = "deadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef";

/// Environment lookup with nothing set.
pub fn empty_env(_: &str) -> Option<String> {
    None
}

/// Environment lookup where the current user is `alice`.
pub fn alice_env(name: &str) -> Option<String> {
    (name == fleet_security::user_env_var()).then(|| "alice".to_string())
}

/// Settings with the given identity and signers.
pub fn sample_settings(identity: &str, signers: &[&str], initiated_by_server: bool) -> FleetSettings {
    FleetSettings {
        initiated_by_server,
        security: SecuritySettings {
            identity: identity.to_string(),
            trusted_signers: signers.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        },
        tls: TlsSettings::default(),
    }
}

/// Fresh random signing key.
pub fn generate_key() -> SigningKey {
    SigningKey::generate(&mut OsRng)
}

/// Temp file holding `contents`.
pub fn temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

/// Seed file for `key`, hex encoded the way the provider reads it.
pub fn seed_file(key: &SigningKey) -> NamedTempFile {
    temp_file(&format!("{}\n", hex::encode(key.to_bytes())))
}
