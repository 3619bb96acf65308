//! Key derivation using PBKDF2-HMAC.
//!
//! Two independently parameterized derivations share the same primitive:
//! envelope keys (SHA-256, 32 bytes) and stored password hashes (SHA-512,
//! 64 bytes). Both run 100 000 rounds, so neither ever doubles as the other.

use pbkdf2::pbkdf2_hmac;
use sha2::{Sha256, Sha512};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// PBKDF2 iteration count for both derivations.
pub const PBKDF2_ROUNDS: u32 = 100_000;

/// Length of envelope encryption keys in bytes (256-bit AES).
pub const KEY_LENGTH: usize = 32;

/// Length of stored password hashes in bytes (SHA-512 output width).
pub const PASSWORD_HASH_LENGTH: usize = 64;

/// Length of derivation salts in bytes.
pub const SALT_LENGTH: usize = 32;

/// Salt for key derivation.
#[derive(Debug, Clone)]
pub struct Salt(pub [u8; SALT_LENGTH]);

impl Salt {
    /// Generate a random salt.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut salt = [0u8; SALT_LENGTH];
        rand::thread_rng().fill_bytes(&mut salt);
        Self(salt)
    }

    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; SALT_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Get the salt bytes.
    pub fn as_bytes(&self) -> &[u8; SALT_LENGTH] {
        &self.0
    }
}

/// Symmetric key for envelope encryption, derived from the master password.
///
/// Zeroizes its memory on drop so derived key material does not persist
/// after an encrypt or decrypt completes.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EnvelopeKey {
    key: [u8; KEY_LENGTH],
}

impl EnvelopeKey {
    /// Create an envelope key from raw bytes.
    pub fn from_bytes(key: [u8; KEY_LENGTH]) -> Self {
        Self { key }
    }

    /// Get the key bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl fmt::Debug for EnvelopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnvelopeKey([REDACTED])")
    }
}

/// Derive an envelope key from a password and salt.
///
/// # Postconditions
/// - The derived key is deterministic given the same inputs
/// - Different salts or passwords yield unrelated keys
///
/// # Security
/// - PBKDF2-HMAC-SHA256, 100 000 rounds
/// - Password is not stored or logged
pub fn derive_key(password: &str, salt: &Salt) -> EnvelopeKey {
    let mut key = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), PBKDF2_ROUNDS, &mut key);
    EnvelopeKey::from_bytes(key)
}

/// Hash a password for at-rest storage in the password record.
///
/// Uses the wider SHA-512 parameterization so a stored hash is never
/// usable as an envelope key.
pub fn hash_password(password: &str, salt: &Salt) -> [u8; PASSWORD_HASH_LENGTH] {
    let mut hash = [0u8; PASSWORD_HASH_LENGTH];
    pbkdf2_hmac::<Sha512>(password.as_bytes(), salt.as_bytes(), PBKDF2_ROUNDS, &mut hash);
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_deterministic() {
        let salt = Salt::from_bytes([42u8; SALT_LENGTH]);

        let key1 = derive_key("test-password-123", &salt);
        let key2 = derive_key("test-password-123", &salt);

        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_different_salt() {
        let salt1 = Salt::from_bytes([1u8; SALT_LENGTH]);
        let salt2 = Salt::from_bytes([2u8; SALT_LENGTH]);

        let key1 = derive_key("test-password-123", &salt1);
        let key2 = derive_key("test-password-123", &salt2);

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_different_password() {
        let salt = Salt::from_bytes([42u8; SALT_LENGTH]);

        let key1 = derive_key("password1", &salt);
        let key2 = derive_key("password2", &salt);

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_hash_password_deterministic() {
        let salt = Salt::from_bytes([7u8; SALT_LENGTH]);

        assert_eq!(hash_password("hunter2", &salt), hash_password("hunter2", &salt));
        assert_ne!(hash_password("hunter2", &salt), hash_password("hunter3", &salt));
    }

    #[test]
    fn test_hash_and_key_derivations_are_independent() {
        let salt = Salt::from_bytes([42u8; SALT_LENGTH]);

        let key = derive_key("same-password", &salt);
        let hash = hash_password("same-password", &salt);

        // SHA-256 and SHA-512 parameterizations must not share a prefix.
        assert_ne!(key.as_bytes()[..], hash[..KEY_LENGTH]);
    }

    #[test]
    fn test_salt_generate() {
        let salt1 = Salt::generate();
        let salt2 = Salt::generate();

        assert_ne!(salt1.as_bytes(), salt2.as_bytes());
    }

    #[test]
    fn test_key_debug_is_redacted() {
        let salt = Salt::from_bytes([9u8; SALT_LENGTH]);
        let key = derive_key("secret", &salt);

        assert_eq!(format!("{:?}", key), "EnvelopeKey([REDACTED])");
    }
}
