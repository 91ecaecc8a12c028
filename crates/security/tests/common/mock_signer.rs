//! Mock remote signer.

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use fleet_security::{RequestSigner, SecurityError, SecurityResult};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Remote signer backed by an in-memory key, counting requests.
pub struct MockSigner {
    key: Option<SigningKey>,
    calls: AtomicUsize,
}

impl MockSigner {
    /// Signer that signs with `key`.
    pub fn new(key: SigningKey) -> Self {
        Self {
            key: Some(key),
            calls: AtomicUsize::new(0),
        }
    }

    /// Signer that refuses every request.
    pub fn refusing() -> Self {
        Self {
            key: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RequestSigner for MockSigner {
    async fn sign(&self, payload: &[u8]) -> SecurityResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.key {
            Some(key) => Ok(key.sign(payload).to_bytes().to_vec()),
            None => Err(SecurityError::RemoteSigner {
                kind: self.kind().to_string(),
                reason: "request denied".to_string(),
            }),
        }
    }

    fn kind(&self) -> &str {
        "mock"
    }
}
