//! Cryptographic primitives for FolioVault.
//!
//! This module provides:
//! - Key derivation and password hashing using PBKDF2-HMAC
//! - Authenticated envelope encryption using AES-256-GCM
//! - Whole-file transforms between plaintext and envelope siblings
//! - Encrypted-file naming helpers
//!
//! # Security Guarantees
//! - Derived key material is automatically zeroized on drop
//! - No password, plaintext, or key material is ever logged
//! - Every decryption failure looks the same to the caller

pub mod envelope;
pub mod files;
pub mod kdf;
pub mod paths;

pub use envelope::{open, seal, HEADER_SIZE, IV_SIZE, TAG_SIZE};
pub use files::{decrypt_file, encrypt_file, read_decrypted};
pub use kdf::{derive_key, hash_password, EnvelopeKey, Salt};
pub use paths::{is_encrypted, to_decrypted, to_encrypted, ENCRYPTED_SUFFIX};
