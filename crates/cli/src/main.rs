//! Fleet security CLI.
//!
//! Builds the security provider the same way a fleet process would and
//! reports what it ended up with. Provides commands for:
//! - Checking the resolved identity, trusted signers and TLS policy
//! - Signing a payload with the configured seed file or remote signer
//! - Verifying a signature against the trusted signer set

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fleet_security::{
    with_fleet_settings, with_log, with_seed_file, with_token_file, FleetSecurity, FleetSettings, SecurityOption,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod output;

use output::OutputFormatter;

/// Fleet Security CLI
#[derive(Parser)]
#[command(name = "fleet-security")]
#[command(author, version, about = "Fleet security provider diagnostics", long_about = None)]
struct Cli {
    /// Settings file (TOML); FLEET_ environment variables override it
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// JWT token file
    #[arg(long, global = true, value_name = "FILE")]
    token_file: Option<PathBuf>,

    /// Hex encoded ed25519 seed file
    #[arg(long, global = true, value_name = "FILE")]
    seed_file: Option<PathBuf>,

    /// Enable JSON output
    #[arg(long, global = true)]
    json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the provider and show the resulting configuration
    Check,

    /// Sign a payload
    Sign {
        /// Payload to sign
        #[arg(long, value_name = "TEXT")]
        payload: String,
    },

    /// Verify a signature made by a trusted signer
    Verify {
        /// Payload that was signed
        #[arg(long, value_name = "TEXT")]
        payload: String,

        /// Hex encoded signature
        #[arg(long, value_name = "HEX")]
        signature: String,

        /// Hex encoded ed25519 public key of the signer
        #[arg(long, value_name = "HEX")]
        signer: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_json);

    let formatter = OutputFormatter::new(!cli.no_color, cli.json);

    if let Err(e) = execute(cli, &formatter).await {
        formatter.error(&format!("Error: {:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn build_provider(cli: &Cli) -> Result<FleetSecurity> {
    let settings = FleetSettings::load(cli.config.as_deref()).context("Failed to load settings")?;

    let mut options: Vec<SecurityOption> = vec![
        with_fleet_settings(&settings),
        with_log(tracing::info_span!("fleet_security_cli")),
    ];

    if let Some(path) = &cli.token_file {
        options.push(with_token_file(path));
    }

    if let Some(path) = &cli.seed_file {
        options.push(with_seed_file(path));
    }

    FleetSecurity::new(options).context("Failed to configure security provider")
}

async fn execute(cli: Cli, formatter: &OutputFormatter) -> Result<()> {
    let security = build_provider(&cli)?;
    run(cli.command, &security, formatter).await
}

async fn run(command: Commands, security: &FleetSecurity, formatter: &OutputFormatter) -> Result<()> {
    match command {
        Commands::Check => commands::check::run(security, formatter),
        Commands::Sign { payload } => commands::sign::run(security, formatter, &payload).await,
        Commands::Verify {
            payload,
            signature,
            signer,
        } => commands::verify::run(security, formatter, &payload, &signature, &signer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_verify() {
        let cli = Cli::try_parse_from([
            "fleet-security",
            "--json",
            "verify",
            "--payload",
            "hello",
            "--signature",
            "00",
            "--signer",
            "11",
        ])
        .unwrap();

        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Verify { ref payload, .. } if payload == "hello"));
    }
}
