//! Remote request signing.

use async_trait::async_trait;

use crate::error::SecurityResult;

/// Produces signatures on behalf of this process.
///
/// When a provider holds a remote signer it never reads the local seed file.
/// How the signer reaches its backend is up to the implementation.
#[async_trait]
pub trait RequestSigner: Send + Sync {
    /// Sign `payload`, returning the raw signature bytes.
    async fn sign(&self, payload: &[u8]) -> SecurityResult<Vec<u8>>;

    /// Short name of the signer, used in logs and errors.
    fn kind(&self) -> &str;
}
