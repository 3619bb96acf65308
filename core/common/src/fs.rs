//! Durable filesystem helpers.
//!
//! Every persisted artifact in FolioVault (password record, vault state,
//! encrypted file bodies) goes through [`write_atomic`] so a crash mid-write
//! can never leave a half-written file at the destination path.

use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};

/// Write `bytes` to `path` atomically: the data lands in a temporary
/// sibling first, is synced to disk, then renamed over the destination.
///
/// # Postconditions
/// - On success, `path` contains exactly `bytes` and no temporary file remains
/// - On failure, any previous content of `path` is untouched
///
/// # Errors
/// - Permission denied or other I/O failure
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let tmp = temp_sibling(path)?;
    let result = async {
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }
    .await;

    if result.is_err() {
        // Leftover temp files are noise at best, plaintext leaks at worst.
        let _ = fs::remove_file(&tmp).await;
    }
    result
}

/// Restrict `path` to owner read/write (0600). No-op on non-Unix targets.
pub async fn set_owner_only(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        fs::set_permissions(path, perms).await?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

/// Temporary sibling path: same directory, `.tmp` appended to the full
/// file name so multi-extension names like `scan.jpg.enc` stay distinct.
fn temp_sibling(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| Error::Io(std::io::Error::other("path has no file name")))?;
    let mut tmp_name = name.to_os_string();
    tmp_name.push(".tmp");
    Ok(path.with_file_name(tmp_name))
}
