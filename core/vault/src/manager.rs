//! Vault lock orchestration over the portfolio tree.

use serde::Serialize;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::VaultDirs;
use crate::scan::scan_files;
use crate::state::StateStore;
use foliovault_common::Result;
use foliovault_crypto::{decrypt_file, encrypt_file, is_encrypted};

/// Outcome of a bulk lock pass.
#[derive(Debug, Clone, Serialize)]
pub struct LockReport {
    pub success: bool,
    pub files_encrypted: usize,
    pub errors: Vec<String>,
}

/// Outcome of a bulk unlock pass.
#[derive(Debug, Clone, Serialize)]
pub struct UnlockReport {
    pub success: bool,
    pub files_decrypted: usize,
    pub errors: Vec<String>,
}

/// Vault-wide counts of candidate files by encryption state.
#[derive(Debug, Clone, Serialize)]
pub struct VaultStats {
    pub locked: bool,
    pub total_files: usize,
    pub encrypted_files: usize,
    pub unencrypted_files: usize,
}

/// Orchestrates the lock flag and the bulk passes over one portfolio
/// tree.
///
/// Lock and unlock commit their flag asymmetrically, leaning locked in
/// both directions: `lock` persists the locked flag even when some files
/// failed to encrypt (the stragglers are reported, not silently left
/// behind an "open" vault), while `unlock` persists the unlocked flag
/// only after every file decrypted cleanly.
///
/// All passes serialize on an internal mutex, so overlapping calls
/// cannot interleave their per-file work and counts never observe a
/// half-finished pass.
pub struct VaultManager {
    dirs: VaultDirs,
    state: StateStore,
    gate: Mutex<()>,
}

impl VaultManager {
    pub fn new(dirs: VaultDirs) -> Self {
        let state = StateStore::new(&dirs);
        Self {
            dirs,
            state,
            gate: Mutex::new(()),
        }
    }

    /// The directories this manager operates over.
    pub fn dirs(&self) -> &VaultDirs {
        &self.dirs
    }

    /// Whether the vault currently reports locked. Absent or unreadable
    /// state reads as unlocked.
    pub async fn is_locked(&self) -> bool {
        self.state.is_locked().await
    }

    /// Lock the vault: encrypt every unencrypted candidate file, then
    /// persist the locked flag.
    ///
    /// # Postconditions
    /// - On a vault that was already locked, no file is touched and the
    ///   report carries the single "already locked" error
    /// - Otherwise the locked flag is persisted even when some files
    ///   failed; `errors` lists them for operator follow-up
    ///
    /// # Errors
    /// - I/O failure scanning the tree or persisting the flag
    pub async fn lock(&self, password: &str) -> Result<LockReport> {
        let _guard = self.gate.lock().await;

        if self.state.is_locked().await {
            debug!("lock requested but vault is already locked");
            return Ok(LockReport {
                success: false,
                files_encrypted: 0,
                errors: vec!["Vault is already locked".to_string()],
            });
        }

        info!(root = %self.dirs.portfolios_root.display(), "locking vault");

        let mut files_encrypted = 0;
        let mut errors = Vec::new();
        for path in scan_files(&self.dirs.portfolios_root).await? {
            if is_encrypted(&path) {
                continue;
            }
            match encrypt_file(&path, password).await {
                Ok(_) => files_encrypted += 1,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to encrypt file");
                    errors.push(format!("{}: {}", path.display(), e));
                }
            }
        }

        // Lean locked: commit the flag regardless of per-file failures.
        self.state.store(true).await?;

        let success = errors.is_empty();
        info!(files_encrypted, failed = errors.len(), "vault locked");
        Ok(LockReport {
            success,
            files_encrypted,
            errors,
        })
    }

    /// Unlock the vault: decrypt every encrypted candidate file; the
    /// unlocked flag is persisted only when every file decrypted.
    ///
    /// # Postconditions
    /// - On any per-file failure (wrong password included) the vault
    ///   still reports locked afterwards
    ///
    /// # Errors
    /// - I/O failure scanning the tree or persisting the flag
    pub async fn unlock(&self, password: &str) -> Result<UnlockReport> {
        let _guard = self.gate.lock().await;

        info!(root = %self.dirs.portfolios_root.display(), "unlocking vault");

        let mut files_decrypted = 0;
        let mut errors = Vec::new();
        for path in scan_files(&self.dirs.portfolios_root).await? {
            if !is_encrypted(&path) {
                continue;
            }
            match decrypt_file(&path, password).await {
                Ok(_) => files_decrypted += 1,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to decrypt file");
                    errors.push(format!("{}: {}", path.display(), e));
                }
            }
        }

        let success = errors.is_empty();
        if success {
            self.state.store(false).await?;
            info!(files_decrypted, "vault unlocked");
        } else {
            warn!(
                files_decrypted,
                failed = errors.len(),
                "unlock incomplete; vault stays locked"
            );
        }
        Ok(UnlockReport {
            success,
            files_decrypted,
            errors,
        })
    }

    /// Encrypt a single newly saved file if the vault is locked.
    ///
    /// Returns whether the file was encrypted; on an unlocked vault the
    /// file is left in place for the next bulk lock.
    pub async fn encrypt_new_file(&self, path: &Path, password: &str) -> Result<bool> {
        let _guard = self.gate.lock().await;

        if !self.state.is_locked().await {
            return Ok(false);
        }
        encrypt_file(path, password).await?;
        debug!(path = %path.display(), "encrypted newly added file");
        Ok(true)
    }

    /// Rescan the tree and report counts by encryption state.
    pub async fn stats(&self) -> Result<VaultStats> {
        let _guard = self.gate.lock().await;

        let files = scan_files(&self.dirs.portfolios_root).await?;
        let total_files = files.len();
        let encrypted_files = files.iter().filter(|path| is_encrypted(path)).count();
        Ok(VaultStats {
            locked: self.state.is_locked().await,
            total_files,
            encrypted_files,
            unencrypted_files: total_files - encrypted_files,
        })
    }
}
