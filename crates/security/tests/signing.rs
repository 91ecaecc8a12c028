//! Signing, verification and token integration tests.

mod common;

use common::*;
use ed25519_dalek::{Signer, SigningKey};
use fleet_security::{
    with_config, with_seed_file, with_signer, with_token_file, FleetSecurity, SecurityConfig, SecurityError,
    TlsSettings,
};
use std::sync::Arc;

fn security_trusting(keys: &[&SigningKey]) -> SecurityConfig {
    SecurityConfig {
        identity: "alice".to_string(),
        trusted_token_signers: keys.iter().map(|k| k.verifying_key().to_bytes()).collect(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_local_seed_signature_verifies() {
    let key = generate_key();
    let seed = seed_file(&key);

    let security = FleetSecurity::new([with_config(security_trusting(&[&key])), with_seed_file(seed.path())]).unwrap();

    assert_eq!(security.public_key().await.unwrap(), key.verifying_key().to_bytes());

    let signature = security.sign(b"fleet request").await.unwrap();
    assert_eq!(signature.len(), 64);
    assert!(security
        .verify_signature(b"fleet request", &signature, key.verifying_key().as_bytes())
        .unwrap());
    assert!(!security
        .verify_signature(b"tampered request", &signature, key.verifying_key().as_bytes())
        .unwrap());
}

#[tokio::test]
async fn test_remote_signer_supersedes_seed() {
    let remote_key = generate_key();
    let signer = Arc::new(MockSigner::new(remote_key.clone()));

    let security = FleetSecurity::new([
        with_config(security_trusting(&[&remote_key])),
        with_seed_file("/nonexistent/seed"),
        with_signer(signer.clone()),
    ])
    .unwrap();

    let signature = security.sign(b"payload").await.unwrap();
    assert_eq!(signer.calls(), 1);
    assert!(security
        .verify_signature(b"payload", &signature, remote_key.verifying_key().as_bytes())
        .unwrap());
}

#[tokio::test]
async fn test_remote_signer_errors_propagate() {
    let security = FleetSecurity::new([
        with_config(security_trusting(&[])),
        with_signer(Arc::new(MockSigner::refusing())),
    ])
    .unwrap();

    match security.sign(b"payload").await {
        Err(SecurityError::RemoteSigner { kind, .. }) => assert_eq!(kind, "mock"),
        other => panic!("expected RemoteSigner error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_seed_file_reported_at_use() {
    let security = FleetSecurity::new([
        with_config(security_trusting(&[])),
        with_seed_file("/nonexistent/seed"),
    ])
    .unwrap();

    assert!(matches!(security.sign(b"payload").await, Err(SecurityError::Io { .. })));
}

#[test]
fn test_signature_from_untrusted_key_rejected() {
    let trusted = generate_key();
    let stranger = generate_key();
    let security = FleetSecurity::new([with_config(security_trusting(&[&trusted]))]).unwrap();

    let signature = stranger.sign(b"payload").to_bytes();
    let err = security
        .verify_signature(b"payload", &signature, stranger.verifying_key().as_bytes())
        .unwrap_err();
    assert!(matches!(err, SecurityError::UntrustedSigner(_)));
}

#[tokio::test]
async fn test_token_read_lazily() {
    let token = temp_file("header.claims.signature\n");
    let security = FleetSecurity::new([with_config(security_trusting(&[])), with_token_file(token.path())]).unwrap();
    assert_eq!(security.token().await.unwrap(), "header.claims.signature");

    let security = FleetSecurity::new([
        with_config(security_trusting(&[])),
        with_token_file("/nonexistent/token.jwt"),
    ])
    .unwrap();
    assert!(security.validate().iter().any(|w| w.contains("token file")));
    assert!(matches!(security.token().await, Err(SecurityError::Io { .. })));
}

#[test]
fn test_certificate_identity_matches() {
    let mut params = rcgen::CertificateParams::new(vec!["alice".to_string()]).unwrap();
    params.distinguished_name.push(rcgen::DnType::CommonName, "alice");
    let key_pair = rcgen::KeyPair::generate().unwrap();
    let cert = params.self_signed(&key_pair).unwrap();
    let cert_file = temp_file(&cert.pem());
    let key_file = temp_file(&key_pair.serialize_pem());

    let tls = TlsSettings {
        ca_file: Some(cert_file.path().to_path_buf()),
        cert_file: Some(cert_file.path().to_path_buf()),
        key_file: Some(key_file.path().to_path_buf()),
        ..Default::default()
    };

    let mut settings = sample_settings("alice", &[], false);
    settings.tls = tls;
    let security = FleetSecurity::new([fleet_security::with_fleet_settings_using(&settings, empty_env)]).unwrap();

    assert_eq!(security.certificate_identity().unwrap(), "alice");
    assert!(security.certificate_matches_identity().unwrap());
    assert!(security.tls_policy().server_config().is_ok());
}
