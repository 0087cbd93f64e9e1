//! Editing AMISCE Setup Question dumps
//!
//! Parses the text export of a firmware's setup questions into blocks, finds
//! blocks by name and token, changes the selected option or numeric value
//! within bounds, and writes the file back with a backup. Everything outside
//! the edited lines is reproduced byte for byte.
//!
//! ```no_run
//! use nvram_core::{EditSession, EditorConfig, MatchQuery};
//!
//! # fn main() -> nvram_core::Result<()> {
//! let mut session = EditSession::load("nvram.txt", EditorConfig::default())?;
//! let id = session.find(&MatchQuery::new("Fast Boot").exact(true))?.require_unique()?.id;
//! session.apply_option_edit(id, "Disabled", false)?;
//! session.save_in_place()?;
//! # Ok(())
//! # }
//! ```

pub mod block;
pub mod checksum;
pub mod config;
pub mod crc;
pub mod document;
pub mod editor;
pub mod error;
pub mod index;
pub mod numeric;
pub mod parser;
pub mod session;
pub mod writer;

pub use block::{Block, BlockId, BlockKind, CrcMarker, OptionChoice};
pub use config::{ConfigResolver, EditorConfig};
pub use crc::{CrcMode, CrcPolicy};
pub use document::{Document, LineEnding, ParseOptions, TextEncoding};
pub use editor::{EditChange, EditOutcome, EditRequest, ValueEditor};
pub use error::{EditError, Error, IoError, MatchError, ParseError, Result};
pub use index::{BlockIndex, MatchQuery, MatchResult};
pub use session::{EditSession, SaveReport};
