//! Payload signing.

use anyhow::{Context, Result};
use fleet_security::FleetSecurity;
use serde::Serialize;

use crate::output::OutputFormatter;

#[derive(Serialize)]
struct SignResponse {
    identity: String,
    signature: String,
    public_key: Option<String>,
}

/// Sign `payload` and print the hex encoded signature.
pub async fn run(security: &FleetSecurity, formatter: &OutputFormatter, payload: &str) -> Result<()> {
    let signature = security
        .sign(payload.as_bytes())
        .await
        .context("Failed to sign payload")?;

    // Remote signers do not expose their key
    let public_key = if security.has_remote_signer() {
        None
    } else {
        Some(hex::encode(security.public_key().await?))
    };

    let response = SignResponse {
        identity: security.identity().to_string(),
        signature: hex::encode(signature),
        public_key,
    };

    if formatter.json_mode {
        formatter.json(&response)?;
    } else {
        formatter.header("Signature");
        formatter.kv("Identity", &response.identity);
        formatter.kv("Signature", &response.signature);
        formatter.kv("Public Key", &formatter.format_optional(response.public_key.clone()));
    }

    Ok(())
}
