//! Encrypted-file naming.
//!
//! An encrypted file sits next to where its plaintext would be, with one
//! fixed suffix appended to the full file name (`scan.jpg` becomes
//! `scan.jpg.enc`). Names that are not valid UTF-8 are never treated as
//! encrypted.

use std::path::{Path, PathBuf};

/// Suffix marking a file whose content is an encrypted envelope.
pub const ENCRYPTED_SUFFIX: &str = ".enc";

/// Whether the path's file name carries the encrypted suffix.
pub fn is_encrypted(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(ENCRYPTED_SUFFIX))
}

/// The sibling path an encrypted copy of `path` is written to.
pub fn to_encrypted(path: &Path) -> PathBuf {
    let mut raw = path.as_os_str().to_os_string();
    raw.push(ENCRYPTED_SUFFIX);
    PathBuf::from(raw)
}

/// The sibling path a decrypted copy of `path` is written to.
///
/// Strips exactly one trailing suffix occurrence; a path without the
/// suffix is returned unchanged.
pub fn to_decrypted(path: &Path) -> PathBuf {
    match path.file_name().and_then(|name| name.to_str()) {
        Some(name) if name.ends_with(ENCRYPTED_SUFFIX) => {
            path.with_file_name(&name[..name.len() - ENCRYPTED_SUFFIX.len()])
        }
        _ => path.to_path_buf(),
    }
}
