//! Portfolio tree traversal.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::config::HOLDING_DIRNAME;
use foliovault_common::Result;
use foliovault_crypto::is_encrypted;

/// Image extensions the vault protects, lowercase.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// Whether a file participates in vault passes: an image by extension
/// (case-insensitive) or an already-encrypted envelope.
pub fn is_vault_candidate(path: &Path) -> bool {
    if is_encrypted(path) {
        return true;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Collect every vault candidate file under `root`.
///
/// Directories named after the reserved holding area are skipped at any
/// depth, so captures awaiting classification are never bulk-encrypted.
/// A missing root yields an empty list; traversal order is not
/// significant.
///
/// # Errors
/// - I/O failure reading a directory inside the tree
pub async fn scan_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !fs::try_exists(root).await? {
        return Ok(files);
    }

    // Worklist traversal; async recursion would need boxing.
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                if entry.file_name() == HOLDING_DIRNAME {
                    continue;
                }
                pending.push(path);
            } else if file_type.is_file() && is_vault_candidate(&path) {
                files.push(path);
            }
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    async fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.unwrap();
        }
        fs::write(path, b"x").await.unwrap();
    }

    async fn scan_names(root: &Path) -> HashSet<String> {
        scan_files(root)
            .await
            .unwrap()
            .into_iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect()
    }

    #[tokio::test]
    async fn collects_images_and_envelopes_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("ana/scan.jpg")).await;
        touch(&root.join("ana/2024/receipt.PNG")).await;
        touch(&root.join("ben/id.webp.enc")).await;
        touch(&root.join("ben/notes.txt")).await;
        touch(&root.join("ben/report.pdf")).await;

        let names = scan_names(root).await;

        let expected: HashSet<String> = ["ana/scan.jpg", "ana/2024/receipt.PNG", "ben/id.webp.enc"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(names, expected);
    }

    #[tokio::test]
    async fn skips_holding_dir_at_any_depth() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("unsorted/raw.jpg")).await;
        touch(&root.join("ana/unsorted/pending.png")).await;
        touch(&root.join("ana/kept.jpg")).await;

        let names = scan_names(root).await;

        assert_eq!(names, HashSet::from(["ana/kept.jpg".to_string()]));
    }

    #[tokio::test]
    async fn missing_root_yields_empty_list() {
        let dir = tempfile::tempdir().unwrap();

        let files = scan_files(&dir.path().join("nonexistent")).await.unwrap();

        assert!(files.is_empty());
    }

    #[test]
    fn candidate_predicate() {
        assert!(is_vault_candidate(Path::new("a/scan.jpg")));
        assert!(is_vault_candidate(Path::new("a/scan.JPG")));
        assert!(is_vault_candidate(Path::new("a/anything.enc")));
        assert!(is_vault_candidate(Path::new("a/scan.jpg.enc")));
        assert!(!is_vault_candidate(Path::new("a/notes.txt")));
        assert!(!is_vault_candidate(Path::new("a/noextension")));
    }
}
