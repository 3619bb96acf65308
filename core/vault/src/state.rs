//! Persisted vault lock state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tracing::warn;

use crate::config::VaultDirs;
use foliovault_common::fs::write_atomic;
use foliovault_common::{Error, Result};

/// On-disk lock flag with the time it last changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultState {
    pub locked: bool,
    pub timestamp: DateTime<Utc>,
}

/// Owns the vault state file.
///
/// An absent state file reads as unlocked: a fresh install has never been
/// locked. An unreadable or corrupt file also reads as unlocked, so the
/// serving layer assumes plaintext may exist on disk; the corruption is
/// logged rather than silently swallowed.
pub struct StateStore {
    state_path: PathBuf,
}

impl StateStore {
    pub fn new(dirs: &VaultDirs) -> Self {
        Self {
            state_path: dirs.state_path(),
        }
    }

    /// Full persisted state, if present and readable.
    pub async fn load(&self) -> Option<VaultState> {
        let raw = match fs::read(&self.state_path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(error = %e, "vault state unreadable; treating as unlocked");
                return None;
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(error = %e, "vault state corrupt; treating as unlocked");
                None
            }
        }
    }

    /// Current lock flag. Never fails.
    pub async fn is_locked(&self) -> bool {
        self.load().await.map(|state| state.locked).unwrap_or(false)
    }

    /// Persist the lock flag with the current time, atomically.
    pub async fn store(&self, locked: bool) -> Result<()> {
        let state = VaultState {
            locked,
            timestamp: Utc::now(),
        };
        let json =
            serde_json::to_vec_pretty(&state).map_err(|e| Error::Serialization(e.to_string()))?;
        write_atomic(&self.state_path, &json).await
    }
}
