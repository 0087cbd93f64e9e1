//! Setup Question block types

use serde::Serialize;
use std::fmt;
use std::ops::Range;

use crate::numeric::{self, NumberStyle};

/// Position of a block in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct BlockId(pub usize);

impl BlockId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0 + 1)
    }
}

/// One selectable choice of an option question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionChoice {
    /// The bracketed code, e.g. `00`
    pub code: String,
    /// The display label with any trailing `//` comment removed
    pub label: String,
    /// Line index of the choice in the document
    #[serde(skip)]
    pub line: usize,
}

impl OptionChoice {
    /// The text option substrings are matched against: `[code]label`.
    pub fn text(&self) -> String {
        format!("[{}]{}", self.code, self.label)
    }
}

/// What kind of question a block is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockKind {
    /// A list of choices, exactly one selected
    Option {
        options: Vec<OptionChoice>,
        selected: usize,
    },
    /// A single numeric field with optional bounds
    Value {
        value: i64,
        min: Option<i64>,
        max: Option<i64>,
        #[serde(skip)]
        line: usize,
        #[serde(skip)]
        number: Range<usize>,
        #[serde(skip)]
        style: NumberStyle,
    },
    /// A string question; shown but never edited
    Text { value: String },
}

impl BlockKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Option { .. } => "option",
            Self::Value { .. } => "value",
            Self::Text { .. } => "string",
        }
    }
}

/// A `HIICrc32=` marker line, kept as an opaque token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrcMarker {
    /// Line index of the marker in the document
    #[serde(skip)]
    pub line: usize,
    /// Byte range of the value within the line
    #[serde(skip)]
    pub value_range: Range<usize>,
    /// The marker value, e.g. `4C3A8D3E`
    pub value: String,
    /// Anything after the value, e.g. `,ver=02`
    pub suffix: String,
}

impl CrcMarker {
    /// An empty marker carries no CRC and may be removed safely.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// One Setup Question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    pub id: BlockId,
    pub name: String,
    pub token: Option<String>,
    pub help_text: Option<String>,
    #[serde(flatten)]
    pub kind: BlockKind,
    pub crc_marker: Option<CrcMarker>,
    /// Line range from the header up to the next header or end of file
    pub span: Range<usize>,
}

impl Block {
    /// 1-based line number of the header.
    pub fn line_number(&self) -> usize {
        self.span.start + 1
    }

    /// Name plus token, for messages.
    pub fn label(&self) -> String {
        match &self.token {
            Some(token) => format!("{} (token {})", self.name, token),
            None => self.name.clone(),
        }
    }

    pub fn selected_option(&self) -> Option<&OptionChoice> {
        match &self.kind {
            BlockKind::Option { options, selected } => options.get(*selected),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<i64> {
        match self.kind {
            BlockKind::Value { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Current state in the form used for before/after summaries.
    pub fn summary(&self) -> String {
        match &self.kind {
            BlockKind::Option { options, selected } => options
                .get(*selected)
                .map(|choice| choice.label.clone())
                .unwrap_or_default(),
            BlockKind::Value { value, .. } => numeric::summarize(*value),
            BlockKind::Text { value } => value.clone(),
        }
    }

    /// One-line listing used by front-ends, with help text on a second line.
    pub fn describe(&self) -> String {
        let token = self.token.as_deref().unwrap_or("<none>");
        let info = match &self.kind {
            BlockKind::Option { .. } => format!("Selected option: {}", self.summary()),
            BlockKind::Value { min, max, .. } => {
                let mut info = format!("Value: {}", self.summary());
                if min.is_some() || max.is_some() {
                    let lower = min.map_or_else(|| "-".to_string(), |v| v.to_string());
                    let upper = max.map_or_else(|| "-".to_string(), |v| v.to_string());
                    info.push_str(&format!(" [{lower}..{upper}]"));
                }
                info
            }
            BlockKind::Text { value } => format!("String: {value}"),
        };
        let mut description = format!("Name: {} | Token: {} | {}", self.name, token, info);
        let help = format_help_text(self.help_text.as_deref());
        if !help.is_empty() {
            description.push_str("\n  Help: ");
            description.push_str(&help);
        }
        description
    }
}

const MAX_HELP_LENGTH: usize = 120;

/// Collapse whitespace and truncate help text for listings.
pub fn format_help_text(help: Option<&str>) -> String {
    let Some(help) = help else {
        return String::new();
    };
    let collapsed = help.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > MAX_HELP_LENGTH {
        let truncated: String = collapsed.chars().take(MAX_HELP_LENGTH - 3).collect();
        format!("{truncated}...")
    } else {
        collapsed
    }
}
