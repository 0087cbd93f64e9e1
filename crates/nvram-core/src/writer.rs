//! Serialization and backup-then-atomic-write of dumps

use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::crc::{CrcAction, CrcPlan};
use crate::document::{self, Document, LineEnding};
use crate::error::IoError;

/// Suffix appended to the target path for the pre-write backup.
pub const DEFAULT_BACKUP_SUFFIX: &str = ".bak";

/// What a write did on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub path: PathBuf,
    /// `None` when the target did not exist before the write
    pub backup: Option<PathBuf>,
    pub bytes_written: usize,
}

/// Render a document to bytes, applying the CRC plan.
///
/// With an empty plan and no edits the output is byte-identical to the input.
pub fn serialize(document: &Document, plan: &CrcPlan) -> Vec<u8> {
    let mut text = String::new();
    if document.has_bom() {
        text.push('\u{feff}');
    }

    let mut last_ending: Option<LineEnding> = None;
    for (index, line) in document.lines().iter().enumerate() {
        let body = match plan.action_for(index) {
            Some(CrcAction::Drop) => {
                // Dropping an unterminated last line must not leave a trailing terminator
                if line.ending.is_none()
                    && let Some(ending) = last_ending.take()
                {
                    text.truncate(text.len() - ending.as_str().len());
                }
                continue;
            }
            Some(CrcAction::Replace(replacement)) => replacement.as_str(),
            None => line.text.as_str(),
        };
        text.push_str(body);
        if let Some(ending) = line.ending {
            text.push_str(ending.as_str());
        }
        last_ending = line.ending;
    }

    document::encode(&text, document.encoding())
}

/// Path of the backup for `path`.
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Back up `path`, then atomically replace it with the serialized document.
pub fn write(
    document: &Document,
    plan: &CrcPlan,
    path: &Path,
    backup_suffix: &str,
) -> Result<WriteReport, IoError> {
    write_bytes(path, &serialize(document, plan), backup_suffix)
}

/// Back up `path`, then atomically replace it with `content`.
pub fn write_bytes(path: &Path, content: &[u8], backup_suffix: &str) -> Result<WriteReport, IoError> {
    let backup = backup_existing(path, backup_suffix)?;
    write_atomic(path, content)?;

    tracing::debug!(
        path = %path.display(),
        backup = ?backup,
        bytes = content.len(),
        "Wrote dump"
    );

    Ok(WriteReport {
        path: path.to_path_buf(),
        backup,
        bytes_written: content.len(),
    })
}

fn backup_existing(path: &Path, suffix: &str) -> Result<Option<PathBuf>, IoError> {
    if !path.exists() {
        return Ok(None);
    }
    let backup = backup_path(path, suffix);
    fs::copy(path, &backup).map_err(|source| IoError::Backup {
        path: path.to_path_buf(),
        backup: backup.clone(),
        source,
    })?;
    Ok(Some(backup))
}

/// Write content atomically: temp file in the same directory, lock, fsync,
/// rename.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<(), IoError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| IoError::write(parent, e))?;
    }

    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| IoError::write(&temp_path, e))?;

    temp_file.lock_exclusive().map_err(|_| IoError::Lock {
        path: path.to_path_buf(),
    })?;

    let written = temp_file
        .write_all(content)
        .and_then(|()| temp_file.sync_all());
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(IoError::write(&temp_path, e));
    }

    temp_file.unlock().map_err(|_| IoError::Lock {
        path: path.to_path_buf(),
    })?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        IoError::write(path, e)
    })
}

/// Copy the backup of `path` back over it.
pub fn restore_backup(path: &Path, backup_suffix: &str) -> Result<PathBuf, IoError> {
    let backup = backup_path(path, backup_suffix);
    if !backup.exists() {
        return Err(IoError::NoBackup { backup });
    }
    let bytes = fs::read(&backup).map_err(|e| IoError::read(&backup, e))?;
    write_atomic(path, &bytes)?;
    tracing::debug!(path = %path.display(), backup = %backup.display(), "Restored backup");
    Ok(backup)
}
