//! CRC marker policy.
//!
//! `HIICrc32=` markers are opaque: they are kept, swapped for a placeholder,
//! emptied or removed, but never computed. Emptying or removing a marker that
//! carries a value is blocked unless the caller forces it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::block::{BlockId, CrcMarker};
use crate::document::Document;
use crate::error::EditError;

/// Value written in place of a bypassed CRC.
pub const CRC_PLACEHOLDER: &str = concat!("<bypassed by nvram-tweak ", env!("CARGO_PKG_VERSION"), ">");

/// How CRC markers of edited blocks are written back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrcMode {
    /// Leave markers byte-identical
    #[default]
    Preserve,
    /// Replace the marker value with [`CRC_PLACEHOLDER`]
    Placeholder,
    /// Keep the `HIICrc32=` key with no value
    Empty,
    /// Delete the marker line
    Remove,
}

impl CrcMode {
    pub const ALL: [CrcMode; 4] = [Self::Preserve, Self::Placeholder, Self::Empty, Self::Remove];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preserve => "preserve",
            Self::Placeholder => "placeholder",
            Self::Empty => "empty",
            Self::Remove => "remove",
        }
    }

    /// Modes that discard a CRC value.
    pub fn is_destructive(self) -> bool {
        matches!(self, Self::Empty | Self::Remove)
    }
}

impl fmt::Display for CrcMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrcMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unsupported CRC mode '{s}'"))
    }
}

/// What happens to one marker line on write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrcAction {
    Replace(String),
    Drop,
}

/// Marker rewrites for one write, keyed by line index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrcPlan {
    actions: BTreeMap<usize, CrcAction>,
    unsafe_blocks: Vec<BlockId>,
}

impl CrcPlan {
    pub fn action_for(&self, line: usize) -> Option<&CrcAction> {
        self.actions.get(&line)
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Blocks whose CRC was emptied or removed under force.
    pub fn unsafe_blocks(&self) -> &[BlockId] {
        &self.unsafe_blocks
    }
}

/// The CRC mode of one write session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrcPolicy {
    mode: CrcMode,
    force: bool,
}

impl CrcPolicy {
    pub fn new(mode: CrcMode, force: bool) -> Self {
        Self { mode, force }
    }

    /// Gate a block against this policy.
    ///
    /// Returns whether the edit is unsafe, i.e. a destructive mode will hit a
    /// marker carrying a value under force.
    pub fn check(
        &self,
        markers: &[&CrcMarker],
        block_label: &str,
        request_force: bool,
    ) -> Result<bool, EditError> {
        if !self.mode.is_destructive() || markers.iter().all(|marker| marker.is_empty()) {
            return Ok(false);
        }
        if self.force || request_force {
            return Ok(true);
        }
        Err(EditError::UnsafeCrcRemoval {
            block: block_label.to_string(),
            mode: self.mode,
        })
    }

    /// Compute marker rewrites for the touched blocks.
    ///
    /// `touched` pairs each edited block with the force flag of its request.
    /// Markers of untouched blocks never appear in the plan.
    pub fn plan(
        &self,
        document: &Document,
        touched: impl IntoIterator<Item = (BlockId, bool)>,
    ) -> Result<CrcPlan, EditError> {
        let mut plan = CrcPlan::default();
        if self.mode == CrcMode::Preserve {
            return Ok(plan);
        }

        for (id, request_force) in touched {
            let Some(block) = document.block(id) else {
                return Err(EditError::UnknownBlock { id: id.index() });
            };
            let markers = document.crc_markers_for(id);
            if markers.is_empty() {
                continue;
            }

            if self.check(&markers, &block.label(), request_force)? {
                tracing::warn!(block = %block.label(), mode = %self.mode, "Forced CRC bypass");
                plan.unsafe_blocks.push(id);
            }

            for marker in markers {
                let Some(text) = document.line(marker.line) else {
                    continue;
                };
                plan.actions
                    .entry(marker.line)
                    .or_insert_with(|| self.rewrite(marker, text));
            }
        }

        Ok(plan)
    }

    fn rewrite(&self, marker: &CrcMarker, text: &str) -> CrcAction {
        let key = text[..marker.value_range.start].trim_end();
        match self.mode {
            CrcMode::Preserve => CrcAction::Replace(text.to_string()),
            CrcMode::Placeholder => {
                CrcAction::Replace(format!("{key}{CRC_PLACEHOLDER}{}", marker.suffix))
            }
            CrcMode::Empty => CrcAction::Replace(key.to_string()),
            CrcMode::Remove => CrcAction::Drop,
        }
    }
}
