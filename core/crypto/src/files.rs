//! Whole-file encryption and decryption.
//!
//! Files transform to a sibling path: encrypting appends the suffix,
//! decrypting strips it. The output is written atomically and the source
//! is deleted only after the output is durably on disk, so a crash can
//! leave both copies behind but never neither.
//!
//! Key derivation and the AEAD pass are CPU-bound, so they run on the
//! blocking pool rather than an I/O worker.

use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::task;
use tracing::debug;

use crate::envelope;
use crate::paths;
use foliovault_common::fs::write_atomic;
use foliovault_common::{Error, Result};

/// Encrypt `path`, producing the suffixed sibling and removing the
/// plaintext source.
///
/// # Postconditions
/// - On success only the envelope file remains
/// - On failure the plaintext source is left untouched
///
/// # Errors
/// - I/O failure reading the source or writing the target
pub async fn encrypt_file(path: &Path, password: &str) -> Result<PathBuf> {
    let plaintext = fs::read(path).await?;
    let password = password.to_owned();
    let sealed = task::spawn_blocking(move || envelope::seal(&plaintext, &password))
        .await
        .map_err(|e| Error::Crypto(format!("Encryption task failed: {}", e)))??;

    let target = paths::to_encrypted(path);
    write_atomic(&target, &sealed).await?;
    fs::remove_file(path).await?;

    debug!(target = %target.display(), "encrypted file");
    Ok(target)
}

/// Decrypt `path`, restoring the unsuffixed sibling and removing the
/// envelope file.
///
/// # Preconditions
/// - `path` must carry the encrypted suffix
///
/// # Postconditions
/// - On success only the plaintext file remains
/// - On failure the envelope file is left untouched
///
/// # Errors
/// - [`Error::InvalidInput`] if the path is not suffixed
/// - [`Error::Authentication`] on a wrong password or corrupted envelope
pub async fn decrypt_file(path: &Path, password: &str) -> Result<PathBuf> {
    if !paths::is_encrypted(path) {
        return Err(Error::InvalidInput(format!(
            "Not an encrypted file: {}",
            path.display()
        )));
    }

    let sealed = fs::read(path).await?;
    let password = password.to_owned();
    let plaintext = task::spawn_blocking(move || envelope::open(&sealed, &password))
        .await
        .map_err(|e| Error::Crypto(format!("Decryption task failed: {}", e)))??;

    let target = paths::to_decrypted(path);
    write_atomic(&target, &plaintext).await?;
    fs::remove_file(path).await?;

    debug!(target = %target.display(), "decrypted file");
    Ok(target)
}

/// Read and decrypt an envelope file entirely in memory.
///
/// Never writes plaintext to disk; the serving layer uses this to display
/// files while the vault stays locked.
pub async fn read_decrypted(path: &Path, password: &str) -> Result<Vec<u8>> {
    let sealed = fs::read(path).await?;
    let password = password.to_owned();
    task::spawn_blocking(move || envelope::open(&sealed, &password))
        .await
        .map_err(|e| Error::Crypto(format!("Decryption task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSWORD: &str = "portfolio-pass";

    #[tokio::test]
    async fn encrypt_file_replaces_source_with_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("scan.jpg");
        fs::write(&source, b"jpeg bytes").await.unwrap();

        let target = encrypt_file(&source, PASSWORD).await.unwrap();

        assert_eq!(target, dir.path().join("scan.jpg.enc"));
        assert!(!source.exists());
        let sealed = fs::read(&target).await.unwrap();
        assert_eq!(sealed.len(), envelope::HEADER_SIZE + b"jpeg bytes".len());
    }

    #[tokio::test]
    async fn file_roundtrip_restores_content_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("notes.png");
        fs::write(&source, b"png bytes").await.unwrap();

        let sealed_path = encrypt_file(&source, PASSWORD).await.unwrap();
        let restored = decrypt_file(&sealed_path, PASSWORD).await.unwrap();

        assert_eq!(restored, source);
        assert!(!sealed_path.exists());
        assert_eq!(fs::read(&restored).await.unwrap(), b"png bytes");
    }

    #[tokio::test]
    async fn decrypt_file_with_wrong_password_leaves_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("scan.jpg");
        fs::write(&source, b"jpeg bytes").await.unwrap();
        let sealed_path = encrypt_file(&source, PASSWORD).await.unwrap();

        let result = decrypt_file(&sealed_path, "not-the-password").await;

        assert!(matches!(result, Err(Error::Authentication)));
        assert!(sealed_path.exists());
        assert!(!source.exists());
    }

    #[tokio::test]
    async fn decrypt_file_rejects_unsuffixed_path() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("scan.jpg");
        fs::write(&source, b"jpeg bytes").await.unwrap();

        let result = decrypt_file(&source, PASSWORD).await;

        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(source.exists());
    }

    #[tokio::test]
    async fn read_decrypted_never_writes_plaintext() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("scan.jpg");
        fs::write(&source, b"jpeg bytes").await.unwrap();
        let sealed_path = encrypt_file(&source, PASSWORD).await.unwrap();

        let plaintext = read_decrypted(&sealed_path, PASSWORD).await.unwrap();

        assert_eq!(plaintext, b"jpeg bytes");
        assert!(sealed_path.exists());
        assert!(!source.exists());
    }

    #[tokio::test]
    async fn encrypt_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.jpg");

        let result = encrypt_file(&missing, PASSWORD).await;

        assert!(matches!(result, Err(Error::Io(_))));
    }
}
