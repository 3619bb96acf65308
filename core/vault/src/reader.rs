//! Transparent reads of vault files, locked or not.

use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use foliovault_cache::{CacheStats, DecryptionCache};
use foliovault_common::{Error, Result};
use foliovault_crypto::{read_decrypted, to_decrypted, to_encrypted};

/// Serves file contents regardless of lock state, consulting the
/// decryption cache before paying PBKDF2 for an envelope.
///
/// Callers may name a file by either form of its path; the reader
/// resolves whichever sibling is actually on disk. Plaintext files are
/// served straight from disk and never cached.
pub struct VaultReader {
    cache: Arc<DecryptionCache>,
}

impl VaultReader {
    pub fn new(cache: Arc<DecryptionCache>) -> Self {
        Self { cache }
    }

    /// Read a vault file, decrypting through the cache when the vault
    /// is locked.
    ///
    /// # Errors
    /// - `Error::NotFound` when neither the plaintext nor the encrypted
    ///   sibling exists
    /// - `Error::Authentication` when the envelope rejects the password
    pub async fn read(&self, path: &Path, password: &str) -> Result<Bytes> {
        let plain = to_decrypted(path);
        let encrypted = to_encrypted(&plain);

        if tokio::fs::try_exists(&plain).await.unwrap_or(false) {
            let data = tokio::fs::read(&plain).await?;
            return Ok(Bytes::from(data));
        }

        if let Some(data) = self.cache.get(&encrypted) {
            return Ok(data);
        }

        if !tokio::fs::try_exists(&encrypted).await.unwrap_or(false) {
            return Err(Error::NotFound(format!(
                "No such vault file: {}",
                plain.display()
            )));
        }

        let data = Bytes::from(read_decrypted(&encrypted, password).await?);
        self.cache.put(&encrypted, data.clone());
        debug!(path = %encrypted.display(), bytes = data.len(), "decrypted and cached");
        Ok(data)
    }

    /// Drop any cached plaintext for this file. Call after the file is
    /// rewritten or removed.
    pub fn invalidate(&self, path: &Path) {
        self.cache.invalidate(path);
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
