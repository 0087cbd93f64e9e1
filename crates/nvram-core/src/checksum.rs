//! SHA-256 fingerprints of dump bytes
//!
//! Fingerprints use the canonical `sha256:<hex>` format and detect a dump
//! being changed on disk between load and save.

use sha2::{Digest, Sha256};
use std::path::Path;

const PREFIX: &str = "sha256:";

/// Fingerprint of in-memory bytes.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Fingerprint of a file's current contents.
///
/// Returns `Ok(None)` when the file does not exist.
pub fn file_fingerprint(path: &Path) -> std::io::Result<Option<String>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(fingerprint(&bytes))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_known_value() {
        assert_eq!(
            fingerprint(b"hello world"),
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn file_fingerprint_matches_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.txt");
        std::fs::write(&path, "Setup Question = A\n").unwrap();

        assert_eq!(
            file_fingerprint(&path).unwrap(),
            Some(fingerprint(b"Setup Question = A\n"))
        );
    }

    #[test]
    fn missing_file_has_no_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(file_fingerprint(&dir.path().join("absent.txt")).unwrap(), None);
    }
}
