//! Error types for the fleet security provider.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building or using the security provider.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// A trusted signer is not valid hex.
    #[error("invalid ed25519 public key: {key}: {source}")]
    InvalidKeyEncoding {
        key: String,
        #[source]
        source: hex::FromHexError,
    },

    /// A trusted signer decoded to the wrong number of bytes.
    #[error("invalid ed25519 public key size: {key}: {size}")]
    InvalidKeySize { key: String, size: usize },

    /// No explicit identity and the current-user variable is not set.
    #[error("could not determine client identity, ensure {var} environment variable is set")]
    IdentityUnresolved { var: &'static str },

    /// Identity was still empty when the build completed.
    #[error("no identity configured for the security provider")]
    IdentityMissing,

    /// Settings source could not be loaded or parsed.
    #[error("settings error: {0}")]
    Settings(String),

    /// Failed to read a file the configuration points at.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Certificate error.
    #[error("certificate error: {0}")]
    Certificate(String),

    /// TLS configuration error.
    #[error("TLS configuration error: {0}")]
    Tls(String),

    /// Neither a seed file nor a remote signer is configured.
    #[error("no seed file or remote signer configured")]
    NoSigningMaterial,

    /// The seed file does not hold a hex encoded ed25519 seed.
    #[error("invalid ed25519 seed in {path}: {reason}")]
    InvalidSeed { path: PathBuf, reason: String },

    /// No token file configured.
    #[error("no token file configured")]
    NoTokenFile,

    /// Token file exists but holds no token.
    #[error("token file {0} is empty")]
    EmptyToken(PathBuf),

    /// The remote signer refused or failed to sign.
    #[error("remote signer {kind} failed: {reason}")]
    RemoteSigner { kind: String, reason: String },

    /// Signature was made by a key outside the trusted signer set.
    #[error("signer {0} is not a trusted token signer")]
    UntrustedSigner(String),

    /// Public key bytes do not describe an ed25519 point.
    #[error("invalid ed25519 public key: {0}")]
    InvalidPublicKey(String),

    /// Signature bytes have the wrong shape.
    #[error("invalid ed25519 signature: expected 64 bytes, got {0}")]
    InvalidSignature(usize),
}

impl SecurityError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for security provider operations.
pub type SecurityResult<T> = Result<T, SecurityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_offending_values() {
        let err = SecurityError::InvalidKeySize {
            key: "abcd".to_string(),
            size: 2,
        };
        assert_eq!(err.to_string(), "invalid ed25519 public key size: abcd: 2");

        let err = SecurityError::IdentityUnresolved { var: "USER" };
        assert!(err.to_string().contains("USER"));
    }
}
