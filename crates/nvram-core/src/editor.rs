//! Option and value edits for a single block.
//!
//! Every check runs before the document is touched, so a rejected edit leaves
//! the block exactly as it was.

use serde::Serialize;

use crate::block::{Block, BlockId, BlockKind, OptionChoice};
use crate::crc::CrcPolicy;
use crate::document::Document;
use crate::error::EditError;
use crate::numeric;
use crate::parser;

/// Keywords marking questions whose change can leave a board unbootable or
/// renegotiate a link.
pub const DEFAULT_RISK_KEYWORDS: &[&str] = &[
    "Controller",
    "Link Speed",
    "Link Width",
    "Negotiat",
    "ASPM",
    "Gen Speed",
    "Secure Boot",
    "Boot Guard",
    "BIOS Lock",
    "Flash Protection",
    "TPM",
    "IOMMU",
    "VT-d",
    "SR-IOV",
    "Above 4G",
    "CSM",
    "Voltage",
];

/// The change asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditChange {
    /// Move the selection to the option containing this text
    Option(String),
    /// Set the value to this decimal or hexadecimal text
    Value(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    pub change: EditChange,
    pub force_unsafe_crc: bool,
    pub dry_run: bool,
}

impl EditRequest {
    pub fn option(substring: impl Into<String>) -> Self {
        Self {
            change: EditChange::Option(substring.into()),
            force_unsafe_crc: false,
            dry_run: false,
        }
    }

    pub fn value(numeric_text: impl Into<String>) -> Self {
        Self {
            change: EditChange::Value(numeric_text.into()),
            force_unsafe_crc: false,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn force_unsafe_crc(mut self, force: bool) -> Self {
        self.force_unsafe_crc = force;
        self
    }
}

/// Result of one block edit, reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditOutcome {
    pub block: BlockId,
    pub name: String,
    pub token: Option<String>,
    pub line_number: usize,
    pub before_summary: String,
    /// `None` when the edit was rejected
    pub after_summary: Option<String>,
    /// `true` once the document was mutated
    pub applied: bool,
    pub reason_if_skipped: Option<String>,
    /// The block matched a risk keyword; callers should confirm
    pub risky: bool,
    /// A destructive CRC mode was forced for this block
    pub unsafe_crc: bool,
    pub conversion_note: Option<String>,
}

impl EditOutcome {
    fn new(block: &Block, risky: bool) -> Self {
        Self {
            block: block.id,
            name: block.name.clone(),
            token: block.token.clone(),
            line_number: block.line_number(),
            before_summary: block.summary(),
            after_summary: None,
            applied: false,
            reason_if_skipped: None,
            risky,
            unsafe_crc: false,
            conversion_note: None,
        }
    }

    /// Outcome for a block whose edit was rejected.
    pub fn rejected(block: &Block, risky: bool, error: &EditError) -> Self {
        Self {
            reason_if_skipped: Some(error.to_string()),
            ..Self::new(block, risky)
        }
    }

    /// Whether the edit changes the block's state.
    pub fn changes_state(&self) -> bool {
        self.after_summary
            .as_ref()
            .is_some_and(|after| *after != self.before_summary)
    }
}

/// Applies edits to blocks of a document.
#[derive(Debug, Clone)]
pub struct ValueEditor {
    risk_keywords: Vec<String>,
}

impl Default for ValueEditor {
    fn default() -> Self {
        Self::new(DEFAULT_RISK_KEYWORDS.iter().copied())
    }
}

impl ValueEditor {
    pub fn new<I, S>(risk_keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            risk_keywords: risk_keywords.into_iter().map(Into::into).collect(),
        }
    }

    /// Case-insensitive keyword scan over name and help text.
    pub fn is_risky(&self, block: &Block) -> bool {
        let name = block.name.to_lowercase();
        let help = block.help_text.as_deref().unwrap_or_default().to_lowercase();
        self.risk_keywords.iter().any(|keyword| {
            let keyword = keyword.to_lowercase();
            !keyword.is_empty() && (name.contains(&keyword) || help.contains(&keyword))
        })
    }

    /// Validate and, unless `dry_run`, apply one edit.
    pub fn edit(
        &self,
        document: &mut Document,
        id: BlockId,
        request: &EditRequest,
        crc: &CrcPolicy,
    ) -> Result<EditOutcome, EditError> {
        let block = document
            .block(id)
            .ok_or(EditError::UnknownBlock { id: id.index() })?;
        let mut outcome = EditOutcome::new(block, self.is_risky(block));
        outcome.unsafe_crc = crc.check(
            &document.crc_markers_for(id),
            &block.label(),
            request.force_unsafe_crc,
        )?;

        match &request.change {
            EditChange::Option(wanted) => {
                let (current, target, label) = plan_option(block, wanted)?;
                outcome.after_summary = Some(label);
                if !request.dry_run {
                    apply_option(document, id, current, target);
                    outcome.applied = true;
                }
            }
            EditChange::Value(text) => {
                let parsed = plan_value(block, text)?;
                outcome.after_summary = Some(numeric::summarize(parsed.value));
                outcome.conversion_note = numeric::conversion_note(text, &parsed);
                if !request.dry_run {
                    apply_value(document, id, parsed.value);
                    outcome.applied = true;
                }
            }
        }

        if request.dry_run {
            outcome.reason_if_skipped = Some("dry run".to_string());
        }
        tracing::debug!(
            block = %outcome.name,
            before = %outcome.before_summary,
            after = ?outcome.after_summary,
            applied = outcome.applied,
            "Edited block"
        );
        Ok(outcome)
    }
}

fn kind_mismatch(block: &Block, expected: &'static str) -> EditError {
    EditError::KindMismatch {
        block: block.label(),
        expected,
        found: block.kind.name(),
    }
}

/// The first `[code]label` containing `wanted`.
fn find_option(options: &[OptionChoice], wanted: &str) -> Option<usize> {
    options.iter().position(|choice| choice.text().contains(wanted))
}

fn plan_option(block: &Block, wanted: &str) -> Result<(usize, usize, String), EditError> {
    let BlockKind::Option { options, selected } = &block.kind else {
        return Err(kind_mismatch(block, "option"));
    };
    let target = find_option(options, wanted).ok_or_else(|| EditError::OptionNotFound {
        block: block.label(),
        wanted: wanted.to_string(),
        available: options.iter().map(OptionChoice::text).collect(),
    })?;
    Ok((*selected, target, options[target].label.clone()))
}

fn plan_value(block: &Block, text: &str) -> Result<numeric::ParsedNumber, EditError> {
    let BlockKind::Value { min, max, .. } = &block.kind else {
        return Err(kind_mismatch(block, "value"));
    };
    let parsed = numeric::parse_numeric(text).map_err(|e| EditError::BadNumber {
        input: text.to_string(),
        reason: e.to_string(),
    })?;
    let below = min.is_some_and(|min| parsed.value < min);
    let above = max.is_some_and(|max| parsed.value > max);
    if below || above {
        return Err(EditError::OutOfRange {
            block: block.label(),
            min: *min,
            max: *max,
            got: parsed.value,
        });
    }
    Ok(parsed)
}

fn apply_option(document: &mut Document, id: BlockId, current: usize, target: usize) {
    if current == target {
        return;
    }
    let Some(BlockKind::Option { options, .. }) = document.block(id).map(|block| &block.kind)
    else {
        return;
    };
    let old_line = options[current].line;
    let new_line = options[target].line;

    for (line, selected) in [(old_line, false), (new_line, true)] {
        let updated = document
            .line(line)
            .and_then(|text| parser::set_option_marker(text, selected));
        if let Some(updated) = updated {
            document.set_line_text(line, updated);
        }
    }

    if let Some(BlockKind::Option { selected, .. }) =
        document.block_mut(id).map(|block| &mut block.kind)
    {
        *selected = target;
    }
}

fn apply_value(document: &mut Document, id: BlockId, new_value: i64) {
    let Some(BlockKind::Value {
        line,
        number,
        style,
        ..
    }) = document.block(id).map(|block| block.kind.clone())
    else {
        return;
    };
    let Some(text) = document.line(line) else {
        return;
    };

    let rendered = style.render(new_value);
    let mut updated = text.to_string();
    updated.replace_range(number.clone(), &rendered);
    document.set_line_text(line, updated);

    if let Some(BlockKind::Value {
        value,
        number: range,
        ..
    }) = document.block_mut(id).map(|block| &mut block.kind)
    {
        *value = new_value;
        *range = number.start..number.start + rendered.len();
    }
}
