//! The parsed dump: line records plus the blocks that view them

use std::fs;
use std::path::Path;

use crate::block::{Block, BlockId, CrcMarker};
use crate::error::{IoError, ParseError, Result};
use crate::parser;

const UTF8_BOM: &str = "\u{feff}";

/// Line terminator style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// Text encoding the dump was decoded with; reused on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Latin1,
}

/// One line of the document and the terminator that followed it.
///
/// Only the last line can lack a terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub ending: Option<LineEnding>,
}

/// Options controlling how strictly a dump is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Keep per-line terminators instead of rejecting mixed CRLF/LF files
    pub allow_mixed_line_endings: bool,
}

/// A parsed Setup Question dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    lines: Vec<Line>,
    blocks: Vec<Block>,
    crc_header: Option<CrcMarker>,
    line_ending: LineEnding,
    encoding: TextEncoding,
    bom: bool,
}

impl Document {
    /// Parse raw dump bytes with strict line-ending rules.
    pub fn parse(bytes: &[u8]) -> std::result::Result<Self, ParseError> {
        Self::parse_with(bytes, ParseOptions::default())
    }

    /// Parse raw dump bytes.
    pub fn parse_with(bytes: &[u8], options: ParseOptions) -> std::result::Result<Self, ParseError> {
        let (text, encoding) = decode(bytes);
        let (text, bom) = match text.strip_prefix(UTF8_BOM) {
            Some(rest) => (rest.to_string(), true),
            None => (text, false),
        };

        let lines = split_lines(&text, options)?;
        let line_ending = lines
            .iter()
            .find_map(|line| line.ending)
            .unwrap_or_default();
        let (blocks, crc_header) = parser::parse_blocks(&lines)?;

        tracing::debug!(
            lines = lines.len(),
            blocks = blocks.len(),
            ?line_ending,
            ?encoding,
            "Parsed Setup Question dump"
        );

        Ok(Self {
            lines,
            blocks,
            crc_header,
            line_ending,
            encoding,
            bom,
        })
    }

    /// Read and parse a dump from disk.
    pub fn load(path: &Path, options: ParseOptions) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| IoError::read(path, e))?;
        Ok(Self::parse_with(&bytes, options)?)
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(|line| line.text.as_str())
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.index())
    }

    /// The file-level `HIICrc32=` header outside any block, if present.
    pub fn crc_header(&self) -> Option<&CrcMarker> {
        self.crc_header.as_ref()
    }

    /// CRC markers guarding a block: its own marker and the file header.
    pub fn crc_markers_for(&self, id: BlockId) -> Vec<&CrcMarker> {
        let own = self.block(id).and_then(|block| block.crc_marker.as_ref());
        own.into_iter().chain(self.crc_header.as_ref()).collect()
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn has_bom(&self) -> bool {
        self.bom
    }

    pub fn has_trailing_newline(&self) -> bool {
        self.lines.last().is_some_and(|line| line.ending.is_some())
    }

    pub(crate) fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.get_mut(id.index())
    }

    pub(crate) fn set_line_text(&mut self, index: usize, text: String) {
        if let Some(line) = self.lines.get_mut(index) {
            line.text = text;
        }
    }
}

fn decode(bytes: &[u8]) -> (String, TextEncoding) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), TextEncoding::Utf8),
        Err(e) => {
            let line = bytes[..e.valid_up_to()]
                .iter()
                .filter(|&&b| b == b'\n')
                .count()
                + 1;
            tracing::warn!(line, "Dump is not valid UTF-8; decoding as Latin-1");
            (bytes.iter().map(|&b| char::from(b)).collect(), TextEncoding::Latin1)
        }
    }
}

/// Encode document text back into the dump's original encoding.
pub(crate) fn encode(text: &str, encoding: TextEncoding) -> Vec<u8> {
    match encoding {
        TextEncoding::Utf8 => text.as_bytes().to_vec(),
        TextEncoding::Latin1 => text
            .chars()
            .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
            .collect(),
    }
}

fn split_lines(text: &str, options: ParseOptions) -> std::result::Result<Vec<Line>, ParseError> {
    let mut lines = Vec::new();
    let mut expected: Option<LineEnding> = None;

    for (index, piece) in text.split_inclusive('\n').enumerate() {
        let (body, ending) = if let Some(body) = piece.strip_suffix("\r\n") {
            (body, Some(LineEnding::CrLf))
        } else if let Some(body) = piece.strip_suffix('\n') {
            (body, Some(LineEnding::Lf))
        } else {
            (piece, None)
        };

        if !options.allow_mixed_line_endings {
            if body.contains('\r') {
                return Err(ParseError::MixedOrUnknownEndings { line: index + 1 });
            }
            if let Some(ending) = ending {
                match expected {
                    None => expected = Some(ending),
                    Some(first) if first != ending => {
                        return Err(ParseError::MixedOrUnknownEndings { line: index + 1 });
                    }
                    Some(_) => {}
                }
            }
        }

        lines.push(Line {
            text: body.to_string(),
            ending,
        });
    }

    Ok(lines)
}
