//! Vault locations and on-disk layout.

use std::env;
use std::path::PathBuf;

/// Password record file name inside the data directory.
pub const PASSWORD_FILENAME: &str = "password.json";

/// Vault state file name inside the data directory.
pub const STATE_FILENAME: &str = "vault-state.json";

/// Reserved holding directory for not-yet-classified captures. Bulk
/// passes never descend into it.
pub const HOLDING_DIRNAME: &str = "unsorted";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "FOLIOVAULT_DATA_DIR";

/// Environment variable overriding the portfolios root.
pub const PORTFOLIOS_ENV: &str = "FOLIOVAULT_PORTFOLIOS";

/// Filesystem locations one vault operates over.
#[derive(Debug, Clone)]
pub struct VaultDirs {
    /// Where the password record and vault state live.
    pub data_dir: PathBuf,
    /// Root of the per-user portfolio tree the vault protects.
    pub portfolios_root: PathBuf,
}

impl VaultDirs {
    /// Use explicit locations.
    pub fn new(data_dir: impl Into<PathBuf>, portfolios_root: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            portfolios_root: portfolios_root.into(),
        }
    }

    /// Resolve locations: explicit argument, then environment variable,
    /// then platform default. The portfolios root defaults to a
    /// `portfolios` directory under the data directory.
    pub fn resolve(data_dir: Option<PathBuf>, portfolios_root: Option<PathBuf>) -> Self {
        let data_dir = data_dir
            .or_else(|| env::var_os(DATA_DIR_ENV).map(PathBuf::from))
            .unwrap_or_else(default_data_dir);
        let portfolios_root = portfolios_root
            .or_else(|| env::var_os(PORTFOLIOS_ENV).map(PathBuf::from))
            .unwrap_or_else(|| data_dir.join("portfolios"));
        Self {
            data_dir,
            portfolios_root,
        }
    }

    /// Resolve purely from the environment.
    pub fn from_env() -> Self {
        Self::resolve(None, None)
    }

    /// Location of the password record file.
    pub fn password_path(&self) -> PathBuf {
        self.data_dir.join(PASSWORD_FILENAME)
    }

    /// Location of the vault state file.
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(STATE_FILENAME)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("foliovault"))
        .unwrap_or_else(|| PathBuf::from(".foliovault"))
}
