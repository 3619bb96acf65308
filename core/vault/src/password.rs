//! Master password lifecycle.
//!
//! One password record guards the whole vault. Its state machine is
//! UNSET -> SET: `set_password` performs the only forward transition,
//! `change_password` replaces the record in place, and only
//! `reset_to_default` goes back. Expected outcomes (already configured,
//! wrong current password) are values, not errors; only I/O and
//! serialization failures are `Err`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use subtle::ConstantTimeEq;
use tokio::fs;
use tokio::task;
use tracing::{info, warn};

use crate::config::VaultDirs;
use foliovault_common::fs::{set_owner_only, write_atomic};
use foliovault_common::{Error, Result};
use foliovault_crypto::kdf::{hash_password, Salt, PASSWORD_HASH_LENGTH, SALT_LENGTH};

/// Well-known bootstrap password applied by
/// [`PasswordAuthority::initialize_default`]. Deployments are expected to
/// change it on first run.
pub const DEFAULT_PASSWORD: &str = "changeme";

/// Stored form of the master password: hex-encoded PBKDF2-SHA512 hash
/// and the salt it was computed under.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PasswordRecord {
    hash: String,
    salt: String,
}

/// Outcome of a password mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordUpdate {
    /// The record was written.
    Applied,
    /// A password is already configured; the record was not touched.
    AlreadyConfigured,
    /// The supplied current password did not verify; the record was not
    /// touched.
    IncorrectPassword,
}

impl PasswordUpdate {
    /// Whether the mutation took effect.
    pub fn applied(&self) -> bool {
        matches!(self, PasswordUpdate::Applied)
    }
}

/// Owns the password record file.
pub struct PasswordAuthority {
    record_path: PathBuf,
}

impl PasswordAuthority {
    pub fn new(dirs: &VaultDirs) -> Self {
        Self {
            record_path: dirs.password_path(),
        }
    }

    /// Whether a master password record exists.
    pub async fn has_password(&self) -> bool {
        fs::try_exists(&self.record_path).await.unwrap_or(false)
    }

    /// Configure the initial master password.
    ///
    /// # Postconditions
    /// - From UNSET, writes a freshly salted record and returns `Applied`
    /// - From SET, returns `AlreadyConfigured` and the record is
    ///   byte-for-byte untouched
    ///
    /// # Errors
    /// - I/O failure writing the record
    pub async fn set_password(&self, password: &str) -> Result<PasswordUpdate> {
        if self.has_password().await {
            return Ok(PasswordUpdate::AlreadyConfigured);
        }
        self.write_record(password).await?;
        info!("master password configured");
        Ok(PasswordUpdate::Applied)
    }

    /// Check a password against the stored record.
    ///
    /// Returns false rather than erroring in every failure mode: missing
    /// record, unreadable file, malformed JSON or hex, or a plain
    /// mismatch. The hash comparison is constant-time.
    pub async fn verify_password(&self, password: &str) -> bool {
        let raw = match fs::read(&self.record_path).await {
            Ok(raw) => raw,
            Err(_) => return false,
        };
        let record: PasswordRecord = match serde_json::from_slice(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "password record unreadable");
                return false;
            }
        };

        let password = password.to_owned();
        task::spawn_blocking(move || verify_against(&record, &password))
            .await
            .unwrap_or(false)
    }

    /// Replace the master password, authenticating with the current one.
    ///
    /// # Postconditions
    /// - On `Applied`, the record holds a freshly salted hash of `new`
    /// - On `IncorrectPassword`, the record is untouched
    ///
    /// # Errors
    /// - I/O failure writing the record
    pub async fn change_password(&self, current: &str, new: &str) -> Result<PasswordUpdate> {
        if !self.verify_password(current).await {
            warn!("password change rejected: current password did not verify");
            return Ok(PasswordUpdate::IncorrectPassword);
        }
        self.write_record(new).await?;
        info!("master password changed");
        Ok(PasswordUpdate::Applied)
    }

    /// Bootstrap the well-known default password if none is configured.
    /// Idempotent: an existing record is never overwritten.
    pub async fn initialize_default(&self) -> Result<PasswordUpdate> {
        self.set_password(DEFAULT_PASSWORD).await
    }

    /// Remove any record and restore the default password. Recovery
    /// affordance; a missing record is not an error.
    pub async fn reset_to_default(&self) -> Result<()> {
        match fs::remove_file(&self.record_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.write_record(DEFAULT_PASSWORD).await?;
        warn!("master password reset to default");
        Ok(())
    }

    async fn write_record(&self, password: &str) -> Result<()> {
        let password = password.to_owned();
        let record = task::spawn_blocking(move || {
            let salt = Salt::generate();
            let hash = hash_password(&password, &salt);
            PasswordRecord {
                hash: hex::encode(hash),
                salt: hex::encode(salt.as_bytes()),
            }
        })
        .await
        .map_err(|e| Error::Crypto(format!("Hashing task failed: {}", e)))?;

        let json =
            serde_json::to_vec_pretty(&record).map_err(|e| Error::Serialization(e.to_string()))?;
        write_atomic(&self.record_path, &json).await?;
        set_owner_only(&self.record_path).await?;
        Ok(())
    }
}

/// Constant-time comparison of a candidate password against a record.
fn verify_against(record: &PasswordRecord, password: &str) -> bool {
    let Ok(salt_bytes) = hex::decode(&record.salt) else {
        return false;
    };
    let Ok(salt) = <[u8; SALT_LENGTH]>::try_from(salt_bytes) else {
        return false;
    };
    let Ok(stored_hash) = hex::decode(&record.hash) else {
        return false;
    };
    if stored_hash.len() != PASSWORD_HASH_LENGTH {
        return false;
    }

    let computed = hash_password(password, &Salt::from_bytes(salt));
    computed.as_slice().ct_eq(stored_hash.as_slice()).into()
}
