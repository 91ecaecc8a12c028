//! Provider configuration report.

use anyhow::Result;
use fleet_security::FleetSecurity;
use serde::Serialize;
use tabled::Tabled;

use crate::output::OutputFormatter;

#[derive(Debug, Serialize)]
struct CheckReport {
    provider: &'static str,
    identity: String,
    trusted_signers: Vec<String>,
    tls_min_version: String,
    tls_certificates: bool,
    skip_hostname_verification: bool,
    certificate_identity: Option<String>,
    token_file: Option<String>,
    seed_file: Option<String>,
    remote_signer_url: Option<String>,
    warnings: Vec<String>,
}

#[derive(Tabled)]
struct SignerRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Trusted Signer")]
    key: String,
}

fn report(security: &FleetSecurity) -> CheckReport {
    let tls = security.tls_policy();
    let conf = security.config();
    let mut warnings = security.validate();

    let certificate_identity = if tls.has_certificates() {
        match security.certificate_identity() {
            Ok(cn) => {
                if cn != security.identity() {
                    warnings.push(format!(
                        "certificate was issued to {} but identity is {}",
                        cn,
                        security.identity()
                    ));
                }
                Some(cn)
            }
            Err(e) => {
                warnings.push(e.to_string());
                None
            }
        }
    } else {
        None
    };

    CheckReport {
        provider: security.provider_name(),
        identity: security.identity().to_string(),
        trusted_signers: security.trusted_signers().iter().map(hex::encode).collect(),
        tls_min_version: tls.min_version.to_string(),
        tls_certificates: tls.has_certificates(),
        skip_hostname_verification: tls.skip_hostname_verification,
        certificate_identity,
        token_file: conf.token_file.as_ref().map(|p| p.display().to_string()),
        seed_file: conf.seed_file.as_ref().map(|p| p.display().to_string()),
        remote_signer_url: security.remote_signer_url().map(str::to_string),
        warnings,
    }
}

/// Show the configuration the provider was built with.
pub fn run(security: &FleetSecurity, formatter: &OutputFormatter) -> Result<()> {
    let report = report(security);

    if formatter.json_mode {
        return formatter.json(&report);
    }

    formatter.header("Security Provider");
    formatter.kv("Provider", report.provider);
    formatter.kv("Identity", &report.identity);
    formatter.kv("Trusted Signers", &report.trusted_signers.len().to_string());
    formatter.kv("Token File", &formatter.format_optional(report.token_file.clone()));
    formatter.kv("Seed File", &formatter.format_optional(report.seed_file.clone()));
    formatter.kv("Remote Signer", &formatter.format_optional(report.remote_signer_url.clone()));

    formatter.header("TLS Policy");
    formatter.kv("Minimum Version", &report.tls_min_version);
    formatter.kv("Certificates", &formatter.format_bool(report.tls_certificates));
    formatter.kv(
        "Hostname Verification",
        &formatter.format_bool(!report.skip_hostname_verification),
    );
    formatter.kv(
        "Certificate Identity",
        &formatter.format_optional(report.certificate_identity.clone()),
    );

    formatter.table(
        report
            .trusted_signers
            .iter()
            .enumerate()
            .map(|(i, key)| SignerRow {
                index: i + 1,
                key: key.clone(),
            })
            .collect(),
    );

    println!();
    if report.warnings.is_empty() {
        formatter.success("Security provider configuration looks good");
    } else {
        for warning in &report.warnings {
            formatter.warning(warning);
        }
    }

    Ok(())
}
