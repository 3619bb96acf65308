//! Vault engine for FolioVault.
//!
//! This module provides:
//! - Lock state tracking and bulk lock/unlock passes over the
//!   portfolio tree
//! - Master password setup, verification, and rotation
//! - Transparent reads of locked files through the decryption cache
//! - Directory resolution from arguments, environment, or defaults
//!
//! # Architecture
//! The vault module sits between the user interface and the crypto
//! primitives, deciding which files to touch and when, while
//! `foliovault-crypto` decides how each byte is transformed.

pub mod config;
pub mod manager;
pub mod password;
pub mod reader;
pub mod scan;
pub mod state;

pub use config::{VaultDirs, HOLDING_DIRNAME};
pub use manager::{LockReport, UnlockReport, VaultManager, VaultStats};
pub use password::{PasswordAuthority, PasswordUpdate, DEFAULT_PASSWORD};
pub use reader::VaultReader;
pub use state::{StateStore, VaultState};
