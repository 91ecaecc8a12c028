//! Signature verification against the trusted signer set.

use anyhow::{bail, Context, Result};
use fleet_security::FleetSecurity;
use serde::Serialize;

use crate::output::OutputFormatter;

#[derive(Serialize)]
struct VerifyResponse {
    signer: String,
    valid: bool,
}

/// Verify a hex encoded signature over `payload`.
pub fn run(
    security: &FleetSecurity,
    formatter: &OutputFormatter,
    payload: &str,
    signature: &str,
    signer: &str,
) -> Result<()> {
    let signature = hex::decode(signature).context("Signature is not valid hex")?;
    let signer_key = hex::decode(signer).context("Signer is not valid hex")?;

    let valid = security.verify_signature(payload.as_bytes(), &signature, &signer_key)?;

    let response = VerifyResponse {
        signer: signer.to_string(),
        valid,
    };

    if formatter.json_mode {
        formatter.json(&response)?;
    } else if valid {
        formatter.success(&format!("Signature by {} is valid", signer));
    }

    if !valid {
        bail!("signature by {} does not verify", signer);
    }

    Ok(())
}
