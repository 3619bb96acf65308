//! Decryption cache for FolioVault.
//!
//! This module provides:
//! - A capacity-bounded LRU cache of decrypted file buffers
//! - TTL expiry driven by an explicit sweep, never a background timer
//! - Canonical path keying so encrypted and plaintext forms of one file
//!   share a single entry
//! - Hit/miss accounting for serving-layer diagnostics

pub mod cache;
pub mod lru;

pub use cache::{CacheConfig, CacheStats, DecryptionCache, DEFAULT_CAPACITY, DEFAULT_TTL};
