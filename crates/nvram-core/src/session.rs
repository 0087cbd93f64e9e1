//! Edit sessions: load a dump, apply edits in memory, save with a backup.

use similar::TextDiff;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::block::BlockId;
use crate::checksum;
use crate::config::EditorConfig;
use crate::crc::{CrcMode, CrcPolicy};
use crate::document::Document;
use crate::editor::{EditOutcome, EditRequest, ValueEditor};
use crate::error::{EditError, Error, IoError, MatchError, Result};
use crate::index::{BlockIndex, MatchQuery, MatchResult};
use crate::writer;

/// Result of [`EditSession::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub path: PathBuf,
    /// `false` when there was nothing to save
    pub written: bool,
    pub backup: Option<PathBuf>,
    pub bytes_written: usize,
    /// Blocks whose CRC marker was emptied or removed under force
    pub unsafe_blocks: Vec<BlockId>,
}

/// A loaded dump plus the edits applied to it.
///
/// Edits only touch memory until [`save`](Self::save). Dropping the session
/// discards them.
#[derive(Debug)]
pub struct EditSession {
    path: Option<PathBuf>,
    config: EditorConfig,
    editor: ValueEditor,
    /// Bytes the document was parsed from, or last written
    baseline: Vec<u8>,
    fingerprint: String,
    document: Document,
    crc: CrcPolicy,
    /// Blocks with accepted edits and whether any of their requests forced the CRC gate
    touched: BTreeMap<BlockId, bool>,
    outcomes: Vec<EditOutcome>,
}

impl EditSession {
    /// Read and parse the dump at `path`.
    pub fn load(path: impl AsRef<Path>, config: EditorConfig) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| IoError::read(path, e))?;
        let mut session = Self::from_bytes(bytes, config)?;
        session.path = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), blocks = session.document.blocks().len(), "Loaded dump");
        Ok(session)
    }

    /// Parse a dump held in memory. Such a session can only [`save`](Self::save)
    /// to an explicit path.
    pub fn from_bytes(bytes: Vec<u8>, config: EditorConfig) -> Result<Self> {
        let document = Document::parse_with(&bytes, config.parse_options())?;
        Ok(Self {
            path: None,
            editor: config.editor(),
            config,
            fingerprint: checksum::fingerprint(&bytes),
            baseline: bytes,
            document,
            crc: CrcPolicy::default(),
            touched: BTreeMap::new(),
            outcomes: Vec::new(),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Every outcome produced so far, in order.
    pub fn outcomes(&self) -> &[EditOutcome] {
        &self.outcomes
    }

    pub fn find(&self, query: &MatchQuery) -> std::result::Result<MatchResult<'_>, MatchError> {
        BlockIndex::build(&self.document).resolve(query)
    }

    pub fn set_crc_policy(&mut self, mode: CrcMode, force: bool) {
        self.crc = CrcPolicy::new(mode, force);
    }

    pub fn apply_option_edit(
        &mut self,
        id: BlockId,
        substring: &str,
        dry_run: bool,
    ) -> std::result::Result<EditOutcome, EditError> {
        self.apply(id, &EditRequest::option(substring).dry_run(dry_run))
    }

    pub fn apply_value_edit(
        &mut self,
        id: BlockId,
        numeric_text: &str,
        dry_run: bool,
    ) -> std::result::Result<EditOutcome, EditError> {
        self.apply(id, &EditRequest::value(numeric_text).dry_run(dry_run))
    }

    /// Apply one edit to one block.
    pub fn apply(
        &mut self,
        id: BlockId,
        request: &EditRequest,
    ) -> std::result::Result<EditOutcome, EditError> {
        let outcome = self.editor.edit(&mut self.document, id, request, &self.crc)?;
        if outcome.applied && outcome.changes_state() {
            let forced = self.touched.entry(id).or_default();
            *forced |= request.force_unsafe_crc;
        }
        self.outcomes.push(outcome.clone());
        Ok(outcome)
    }

    /// Apply the same edit to several blocks, one outcome per block.
    ///
    /// A rejected block does not stop the batch; its outcome carries the
    /// reason. Fails only when an id is not part of the document.
    pub fn apply_batch(
        &mut self,
        ids: &[BlockId],
        request: &EditRequest,
    ) -> std::result::Result<Vec<EditOutcome>, EditError> {
        if let Some(missing) = ids.iter().find(|id| self.document.block(**id).is_none()) {
            return Err(EditError::UnknownBlock { id: missing.index() });
        }

        let mut outcomes = Vec::with_capacity(ids.len());
        for &id in ids {
            match self.apply(id, request) {
                Ok(outcome) => outcomes.push(outcome),
                Err(error) => {
                    let Some(block) = self.document.block(id) else {
                        return Err(EditError::UnknownBlock { id: id.index() });
                    };
                    tracing::debug!(block = %block.label(), %error, "Edit rejected");
                    let outcome = EditOutcome::rejected(block, self.editor.is_risky(block), &error);
                    self.outcomes.push(outcome.clone());
                    outcomes.push(outcome);
                }
            }
        }
        Ok(outcomes)
    }

    /// Whether any accepted edit changed a block since load or the last save.
    pub fn has_changes(&self) -> bool {
        !self.touched.is_empty()
    }

    /// The bytes a save would write.
    pub fn render(&self) -> std::result::Result<Vec<u8>, EditError> {
        let plan = self.crc.plan(&self.document, self.touched_blocks())?;
        Ok(writer::serialize(&self.document, &plan))
    }

    /// Unified diff between the loaded bytes and the pending output.
    pub fn diff_preview(&self) -> std::result::Result<String, EditError> {
        let rendered = self.render()?;
        let old = String::from_utf8_lossy(&self.baseline);
        let new = String::from_utf8_lossy(&rendered);
        let name = self
            .path
            .as_deref()
            .and_then(Path::file_name)
            .map_or_else(|| "dump".to_string(), |n| n.to_string_lossy().into_owned());

        Ok(TextDiff::from_lines(old.as_ref(), new.as_ref())
            .unified_diff()
            .context_radius(2)
            .header(&name, &format!("{name} (edited)"))
            .to_string())
    }

    /// Write pending edits to the loaded path.
    pub fn save_in_place(&mut self) -> Result<SaveReport> {
        let path = self.path.clone().ok_or(IoError::NoPath)?;
        self.save(&path)
    }

    /// Write pending edits to `path`, backing up what is there first.
    ///
    /// Nothing is written when no edit was accepted. On success the written
    /// bytes become the new baseline.
    pub fn save(&mut self, path: &Path) -> Result<SaveReport> {
        if !self.has_changes() {
            tracing::debug!(path = %path.display(), "No accepted changes, nothing to save");
            return Ok(SaveReport {
                path: path.to_path_buf(),
                written: false,
                backup: None,
                bytes_written: 0,
                unsafe_blocks: Vec::new(),
            });
        }

        let plan = self.crc.plan(&self.document, self.touched_blocks())?;
        let content = writer::serialize(&self.document, &plan);
        let reparsed = self.verify_reparse(&content)?;

        if self.config.detect_external_changes && self.path.as_deref() == Some(path) {
            let current = checksum::file_fingerprint(path).map_err(|e| IoError::read(path, e))?;
            if current.as_deref() != Some(self.fingerprint.as_str()) {
                return Err(IoError::ExternalModification {
                    path: path.to_path_buf(),
                }
                .into());
            }
        }

        let report = writer::write_bytes(path, &content, &self.config.backup_suffix)?;

        let unsafe_blocks = plan.unsafe_blocks().to_vec();
        for outcome in &mut self.outcomes {
            if outcome.applied && unsafe_blocks.contains(&outcome.block) {
                outcome.unsafe_crc = true;
            }
        }

        self.fingerprint = checksum::fingerprint(&content);
        self.baseline = content;
        self.document = reparsed;
        self.touched.clear();
        self.path = Some(path.to_path_buf());

        Ok(SaveReport {
            path: report.path,
            written: true,
            backup: report.backup,
            bytes_written: report.bytes_written,
            unsafe_blocks,
        })
    }

    /// Copy the backup of the loaded path back over it and reload.
    ///
    /// Returns the backup path. Pending edits are discarded.
    pub fn rollback_last_save(&mut self) -> Result<PathBuf> {
        let path = self.path.clone().ok_or(IoError::NoPath)?;
        let backup = writer::restore_backup(&path, &self.config.backup_suffix)?;
        let bytes = fs::read(&path).map_err(|e| IoError::read(&path, e))?;

        self.document = Document::parse_with(&bytes, self.config.parse_options())?;
        self.fingerprint = checksum::fingerprint(&bytes);
        self.baseline = bytes;
        self.touched.clear();
        self.outcomes.clear();
        Ok(backup)
    }

    fn touched_blocks(&self) -> impl Iterator<Item = (BlockId, bool)> + '_ {
        self.touched.iter().map(|(id, forced)| (*id, *forced))
    }

    /// Parse the pending output and check it agrees with the edited document.
    fn verify_reparse(&self, content: &[u8]) -> Result<Document> {
        let reparsed = Document::parse_with(content, self.config.parse_options()).map_err(|e| {
            Error::ReparseDivergence {
                message: e.to_string(),
            }
        })?;

        let expected = self.document.blocks();
        let actual = reparsed.blocks();
        if expected.len() != actual.len() {
            return Err(Error::ReparseDivergence {
                message: format!("{} blocks became {}", expected.len(), actual.len()),
            });
        }
        for (before, after) in expected.iter().zip(actual) {
            if before.name != after.name
                || before.kind.name() != after.kind.name()
                || before.summary() != after.summary()
            {
                return Err(Error::ReparseDivergence {
                    message: format!(
                        "block {} '{}' reads back as '{}' = {}",
                        before.id,
                        before.name,
                        after.name,
                        after.summary()
                    ),
                });
            }
        }
        Ok(reparsed)
    }
}
