//! Error types for nvram-core
//!
//! The four families mirror the stages of an edit session: parsing is fatal
//! for the session, matching and editing are recoverable, and I/O failures are
//! fatal only for the write step.

use std::ops::Range;
use std::path::PathBuf;

use crate::crc::CrcMode;

/// Result type for nvram-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in nvram-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error("Failed to load config at {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("Re-parsing the pending output diverged from the edited document ({message}); nothing was written")]
    ReparseDivergence { message: String },
}

/// The document cannot be used at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Mixed or unknown line endings at line {line}; the file must use CRLF or LF throughout")]
    MixedOrUnknownEndings { line: usize },

    #[error("Line {line} looks like a Setup Question header but has no '=': {text:?}")]
    MalformedHeader { line: usize, text: String },

    #[error("Malformed block '{name}' at lines {}-{}: {reason}", .span.start + 1, .span.end)]
    MalformedBlock {
        name: String,
        span: Range<usize>,
        reason: String,
    },
}

/// A query could not be resolved to a usable block set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("No Setup Question block matches '{query}'{}", token_clause(.token))]
    NoMatch {
        query: String,
        token: Option<String>,
    },

    #[error("'{query}' matches {count} blocks; narrow it with a token or apply to all")]
    Ambiguous { query: String, count: usize },
}

fn token_clause(token: &Option<String>) -> String {
    match token {
        Some(token) => format!(" with token {token}"),
        None => String::new(),
    }
}

/// A single block edit was rejected. The document is untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("Option '{wanted}' not found in block '{block}' (available: {})", .available.join(", "))]
    OptionNotFound {
        block: String,
        wanted: String,
        available: Vec<String>,
    },

    #[error("Invalid number '{input}': {reason}")]
    BadNumber { input: String, reason: String },

    #[error("Value {got} for block '{block}' is outside {}", bounds_clause(.min, .max))]
    OutOfRange {
        block: String,
        min: Option<i64>,
        max: Option<i64>,
        got: i64,
    },

    #[error("Unsafe CRC {mode} blocked for block '{block}': it carries a HIICrc32 marker; force the bypass to proceed")]
    UnsafeCrcRemoval { block: String, mode: CrcMode },

    #[error("Block '{block}' is a {found} question, not a {expected} question")]
    KindMismatch {
        block: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Block {id} does not exist in this document")]
    UnknownBlock { id: usize },
}

fn bounds_clause(min: &Option<i64>, max: &Option<i64>) -> String {
    let lower = min.map_or_else(|| "-inf".to_string(), |v| v.to_string());
    let upper = max.map_or_else(|| "+inf".to_string(), |v| v.to_string());
    format!("[{lower}, {upper}]")
}

/// Reading, backing up or writing a dump failed.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("Unable to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Backup of {path} to {backup} failed, nothing was written: {source}")]
    Backup {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Writing {path} failed (backup left intact): {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Lock acquisition failed for {path}")]
    Lock { path: PathBuf },

    #[error("{path} changed on disk since it was loaded; reload and re-apply the edits")]
    ExternalModification { path: PathBuf },

    #[error("No backup found at {backup}")]
    NoBackup { backup: PathBuf },

    #[error("The session has no file path; save to an explicit path instead")]
    NoPath,
}

impl IoError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}
