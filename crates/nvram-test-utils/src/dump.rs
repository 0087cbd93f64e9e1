//! [`TempDump`]: a dump file in a temporary directory.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A dump file written into its own temporary directory.
///
/// # Example
///
/// ```rust,no_run
/// use nvram_test_utils::{dump::TempDump, fixtures};
///
/// let dump = TempDump::new(fixtures::BASIC);
/// dump.assert_contains("Setup Question\t= Fast Boot");
/// ```
pub struct TempDump {
    temp_dir: TempDir,
    path: PathBuf,
}

impl TempDump {
    /// Write `content` to `nvram.txt` in a fresh directory.
    pub fn new(content: impl AsRef<[u8]>) -> Self {
        Self::named("nvram.txt", content)
    }

    pub fn named(file_name: &str, content: impl AsRef<[u8]>) -> Self {
        let temp_dir = TempDir::new().expect("TempDump: failed to create temp dir");
        let path = temp_dir.path().join(file_name);
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("TempDump: failed to write {}: {e}", path.display()));
        Self { temp_dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path of the backup written next to the dump with `suffix`.
    pub fn backup_path(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }

    pub fn read(&self) -> Vec<u8> {
        fs::read(&self.path)
            .unwrap_or_else(|e| panic!("TempDump: failed to read {}: {e}", self.path.display()))
    }

    pub fn read_to_string(&self) -> String {
        String::from_utf8_lossy(&self.read()).into_owned()
    }

    /// Overwrite the dump behind the back of any open session.
    pub fn overwrite(&self, content: impl AsRef<[u8]>) {
        fs::write(&self.path, content)
            .unwrap_or_else(|e| panic!("TempDump: failed to write {}: {e}", self.path.display()));
    }

    /// Write a `config.toml` in the temp directory and return its path.
    pub fn write_config(&self, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join("config.toml");
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("TempDump: failed to write {}: {e}", path.display()));
        path
    }

    /// # Panics
    /// Panics if the dump does not contain `needle`.
    pub fn assert_contains(&self, needle: &str) {
        let content = self.read_to_string();
        assert!(
            content.contains(needle),
            "Dump {} does not contain expected content.\nExpected: {:?}\nActual: {}",
            self.path.display(),
            needle,
            content
        );
    }

    /// # Panics
    /// Panics if a backup with `suffix` is missing.
    pub fn assert_backup_exists(&self, suffix: &str) {
        let backup = self.backup_path(suffix);
        assert!(backup.exists(), "Expected backup to exist: {}", backup.display());
    }
}
