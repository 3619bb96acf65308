//! Authenticated envelope encryption using AES-256-GCM.
//!
//! Every sealed buffer is self-contained: it carries the salt for key
//! derivation, the GCM initialization vector, and the authentication tag
//! alongside the ciphertext, laid out as
//!
//! ```text
//! salt (32) || iv (16) || tag (16) || ciphertext (plaintext length)
//! ```
//!
//! so possession of the master password is sufficient to open it.

use aes_gcm::{
    aead::{generic_array::GenericArray, Aead, AeadCore, KeyInit, OsRng},
    AesGcm,
};
use aes_gcm::aead::generic_array::typenum::U16;
use aes_gcm::aes::Aes256;

use crate::kdf::{derive_key, Salt, SALT_LENGTH};
use foliovault_common::{Error, Result};

/// AES-256-GCM with a 16-byte initialization vector.
type Cipher = AesGcm<Aes256, U16>;

/// Initialization vector size in bytes.
pub const IV_SIZE: usize = 16;

/// Authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// Fixed envelope header size: salt, IV, and tag precede the ciphertext.
pub const HEADER_SIZE: usize = SALT_LENGTH + IV_SIZE + TAG_SIZE;

/// Encrypt a buffer under the master password.
///
/// # Postconditions
/// - Returns `salt || iv || tag || ciphertext`, exactly `HEADER_SIZE`
///   bytes longer than the plaintext
/// - Salt and IV are freshly random, so sealing the same plaintext twice
///   yields different envelopes
///
/// # Errors
/// - Returns error if encryption fails
///
/// # Security
/// - The envelope key is derived per call and zeroized on drop
pub fn seal(plaintext: &[u8], password: &str) -> Result<Vec<u8>> {
    let salt = Salt::generate();
    let iv = Cipher::generate_nonce(&mut OsRng);

    let key = derive_key(password, &salt);
    let cipher = Cipher::new(GenericArray::from_slice(key.as_bytes()));

    let mut sealed = cipher
        .encrypt(&iv, plaintext)
        .map_err(|e| Error::Crypto(format!("Encryption failed: {}", e)))?;

    // The Aead trait emits ciphertext || tag; the envelope stores the tag
    // inside the header, ahead of the ciphertext.
    let tag = sealed.split_off(sealed.len() - TAG_SIZE);
    let ciphertext = sealed;

    let mut envelope = Vec::with_capacity(HEADER_SIZE + ciphertext.len());
    envelope.extend_from_slice(salt.as_bytes());
    envelope.extend_from_slice(&iv);
    envelope.extend_from_slice(&tag);
    envelope.extend_from_slice(&ciphertext);

    Ok(envelope)
}

/// Decrypt an envelope under the master password.
///
/// # Preconditions
/// - `envelope` must be at least `HEADER_SIZE` bytes
///
/// # Postconditions
/// - Returns the original plaintext only if the authentication tag
///   verifies over the full ciphertext
///
/// # Errors
/// - [`Error::Authentication`] on a wrong password, a tampered or
///   truncated envelope, or any malformed input. The same error is
///   returned for every cause so callers cannot probe which it was.
pub fn open(envelope: &[u8], password: &str) -> Result<Vec<u8>> {
    if envelope.len() < HEADER_SIZE {
        return Err(Error::Authentication);
    }

    let mut salt_bytes = [0u8; SALT_LENGTH];
    salt_bytes.copy_from_slice(&envelope[..SALT_LENGTH]);
    let iv = &envelope[SALT_LENGTH..SALT_LENGTH + IV_SIZE];
    let tag = &envelope[SALT_LENGTH + IV_SIZE..HEADER_SIZE];
    let ciphertext = &envelope[HEADER_SIZE..];

    let key = derive_key(password, &Salt::from_bytes(salt_bytes));
    let cipher = Cipher::new(GenericArray::from_slice(key.as_bytes()));

    // Reassemble ciphertext || tag, the order the Aead trait verifies.
    let mut combined = Vec::with_capacity(ciphertext.len() + TAG_SIZE);
    combined.extend_from_slice(ciphertext);
    combined.extend_from_slice(tag);

    cipher
        .decrypt(GenericArray::from_slice(iv), combined.as_slice())
        .map_err(|_| Error::Authentication)
}
