//! Block grammar for AMISCE Setup Question dumps.
//!
//! A block starts at a header line and runs until the next header or the end
//! of the file:
//! ```text
//! Setup Question	= Fast Boot
//! Help String	= Enables or disables boot with a minimal set of devices.
//! Token	=12	// Do NOT change this line
//! Options	=*[00]Disabled	// Move "*" to the desired Option
//!          [01]Enabled
//! ```
//! Numeric questions carry `Value = <n>` and optional `Min = n` / `Max = n`
//! lines instead of options. Keywords are case-insensitive and every line may
//! be prefixed with a `#`, `;` or `//` comment marker.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

use crate::block::{Block, BlockId, BlockKind, CrcMarker, OptionChoice};
use crate::document::Line;
use crate::error::ParseError;
use crate::numeric::{self, NumberStyle};

static HEADER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:[#;/]{1,2}\s*)?Setup\s+Question\s*=\s*(?P<name>.*)$")
        .expect("Invalid header regex")
});

static BOUNDARY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:[#;/]{1,2}\s*)?Setup\s+Question\b").expect("Invalid boundary regex")
});

static INLINE_COMMENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+(?://|#|;).*$").expect("Invalid inline comment regex"));

static HELP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:[#;/]{1,2}\s*)?Help\s+String\s*=\s*(?P<help>.*)$")
        .expect("Invalid help regex")
});

static TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:[#;/]{1,2}\s*)?Token\s*=\s*(?P<token>.*)$").expect("Invalid token regex")
});

static TOKEN_VALIDATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:0[xX])?[0-9A-Fa-f]+(?:\s*,\s*(?:0[xX])?[0-9A-Fa-f]+)*$")
        .expect("Invalid token validation regex")
});

static VALUE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:[#;/]{1,2}\s*)?Value\s*=\s*(?P<raw>.*?)\s*$").expect("Invalid value regex")
});

static VALUE_NUMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:[#;/]{1,2}\s*)?Value\s*=\s*<?\s*(?P<number>[+-]?(?:0x[0-9a-f]+|[0-9]+))\s*>?\s*(?://.*)?$",
    )
    .expect("Invalid value number regex")
});

static BOUND_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:[#;/]{1,2}\s*)?(?P<which>Min|Max)(?:imum)?\s*=\s*<?\s*(?P<number>[^>\s]*)")
        .expect("Invalid bound regex")
});

static OPTION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<prefix>\s*(?:[#;/]{1,2}\s*)?(?:Options?\s*=\s*)?)(?P<star>\*)?\[(?P<code>[^\]]+)\](?P<label>.*)$",
    )
    .expect("Invalid option regex")
});

static LABEL_COMMENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+//.*$").expect("Invalid label comment regex"));

static CRC_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*HIICrc32\s*=\s*(?P<value><[^>]*>|[^,\s]*)(?P<suffix>.*)$")
        .expect("Invalid CRC regex")
});

/// Returns the question name if `text` is a block header.
pub fn header_name(text: &str) -> Option<String> {
    let caps = HEADER_REGEX.captures(text)?;
    let name = INLINE_COMMENT_REGEX.replace(&caps["name"], "");
    Some(name.trim().to_string())
}

/// A parsed option line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OptionLine {
    pub selected: bool,
    pub code: String,
    pub label: String,
}

pub(crate) fn parse_option_line(text: &str) -> Option<OptionLine> {
    let caps = OPTION_REGEX.captures(text)?;
    let label = LABEL_COMMENT_REGEX.replace(&caps["label"], "");
    Some(OptionLine {
        selected: caps.name("star").is_some(),
        code: caps["code"].to_string(),
        label: label.trim().to_string(),
    })
}

/// Set or clear the `*` selection marker of an option line.
///
/// Returns `None` when `text` is not an option line.
pub(crate) fn set_option_marker(text: &str, selected: bool) -> Option<String> {
    let caps = OPTION_REGEX.captures(text)?;
    let at = caps.name("prefix").map_or(0, |m| m.end());
    let has_star = caps.name("star").is_some();
    let mut updated = text.to_string();
    match (selected, has_star) {
        (true, false) => updated.insert(at, '*'),
        (false, true) => {
            updated.remove(at);
        }
        _ => {}
    }
    Some(updated)
}

pub(crate) fn parse_crc_line(text: &str, line: usize) -> Option<CrcMarker> {
    let caps = CRC_REGEX.captures(text)?;
    let value = caps.name("value")?;
    Some(CrcMarker {
        line,
        value_range: value.range(),
        value: value.as_str().to_string(),
        suffix: caps["suffix"].to_string(),
    })
}

/// Normalize a `Token =` value, dropping trailing comments.
fn clean_token(raw: &str) -> Result<String, String> {
    let without_comment = raw.split("//").next().unwrap_or_default().trim();
    if without_comment.is_empty() {
        return Err("token is empty after removing comments".to_string());
    }
    if !TOKEN_VALIDATION_REGEX.is_match(without_comment) {
        return Err(format!(
            "'{without_comment}' is not a hexadecimal id list separated by commas"
        ));
    }
    Ok(without_comment.to_string())
}

/// Group lines into blocks. Returns the blocks and the file-level CRC header.
pub(crate) fn parse_blocks(lines: &[Line]) -> Result<(Vec<Block>, Option<CrcMarker>), ParseError> {
    let mut headers = Vec::new();
    for (index, line) in lines.iter().enumerate() {
        if let Some(name) = header_name(&line.text) {
            headers.push((index, name));
        } else if BOUNDARY_REGEX.is_match(&line.text) {
            return Err(ParseError::MalformedHeader {
                line: index + 1,
                text: line.text.clone(),
            });
        }
    }

    let preamble_end = headers.first().map_or(lines.len(), |(index, _)| *index);
    let crc_header = lines[..preamble_end]
        .iter()
        .enumerate()
        .find_map(|(index, line)| parse_crc_line(&line.text, index));

    let mut blocks = Vec::with_capacity(headers.len());
    for (position, (start, name)) in headers.iter().enumerate() {
        let end = headers
            .get(position + 1)
            .map_or(lines.len(), |(next, _)| *next);
        let block = build_block(BlockId(position), name.clone(), lines, *start..end)?;
        blocks.push(block);
    }

    Ok((blocks, crc_header))
}

fn malformed(name: &str, span: &Range<usize>, reason: impl Into<String>) -> ParseError {
    ParseError::MalformedBlock {
        name: name.to_string(),
        span: span.clone(),
        reason: reason.into(),
    }
}

fn parse_bound(name: &str, span: &Range<usize>, which: &str, raw: &str) -> Result<i64, ParseError> {
    numeric::parse_numeric(raw)
        .map(|parsed| parsed.value)
        .map_err(|e| malformed(name, span, format!("unreadable {which} bound '{raw}': {e}")))
}

enum ValueField {
    Number {
        value: i64,
        line: usize,
        number: Range<usize>,
        style: NumberStyle,
    },
    Text(String),
}

fn build_block(
    id: BlockId,
    name: String,
    lines: &[Line],
    span: Range<usize>,
) -> Result<Block, ParseError> {
    let mut help_text = None;
    let mut token = None;
    let mut crc_marker = None;
    let mut options = Vec::new();
    let mut selected = Vec::new();
    let mut value_field = None;
    let mut min = None;
    let mut max = None;

    for index in span.start + 1..span.end {
        let text = lines[index].text.as_str();

        if crc_marker.is_none()
            && let Some(marker) = parse_crc_line(text, index)
        {
            crc_marker = Some(marker);
            continue;
        }

        if let Some(caps) = HELP_REGEX.captures(text) {
            if help_text.is_none() {
                help_text = Some(caps["help"].trim().to_string());
            }
            continue;
        }

        if let Some(caps) = TOKEN_REGEX.captures(text) {
            if token.is_none() {
                match clean_token(&caps["token"]) {
                    Ok(cleaned) => token = Some(cleaned),
                    Err(reason) => {
                        tracing::warn!(block = %name, line = index + 1, "Token ignored: {}", reason);
                    }
                }
            }
            continue;
        }

        if let Some(caps) = VALUE_REGEX.captures(text) {
            if value_field.is_none() {
                value_field = Some(read_value_line(&name, &span, index, text, &caps["raw"])?);
            }
            continue;
        }

        if let Some(caps) = BOUND_REGEX.captures(text) {
            let which = caps["which"].to_ascii_lowercase();
            let bound = parse_bound(&name, &span, &which, &caps["number"])?;
            match which.as_str() {
                "min" if min.is_none() => min = Some(bound),
                "max" if max.is_none() => max = Some(bound),
                _ => {}
            }
            continue;
        }

        if let Some(option) = parse_option_line(text) {
            if option.selected {
                selected.push(options.len());
            }
            options.push(OptionChoice {
                code: option.code,
                label: option.label,
                line: index,
            });
        }
    }

    let kind = if !options.is_empty() {
        match selected.as_slice() {
            [only] => BlockKind::Option {
                options,
                selected: *only,
            },
            [] => return Err(malformed(&name, &span, "no option is marked with '*'")),
            many => {
                return Err(malformed(
                    &name,
                    &span,
                    format!("{} options are marked with '*'", many.len()),
                ));
            }
        }
    } else {
        match value_field {
            Some(ValueField::Number {
                value,
                line,
                number,
                style,
            }) => BlockKind::Value {
                value,
                min,
                max,
                line,
                number,
                style,
            },
            Some(ValueField::Text(value)) => BlockKind::Text { value },
            None => return Err(malformed(&name, &span, "no Options or Value line")),
        }
    };

    Ok(Block {
        id,
        name,
        token,
        help_text,
        kind,
        crc_marker,
        span,
    })
}

fn read_value_line(
    name: &str,
    span: &Range<usize>,
    index: usize,
    text: &str,
    raw: &str,
) -> Result<ValueField, ParseError> {
    if let Some(caps) = VALUE_NUMBER_REGEX.captures(text)
        && let Some(number) = caps.name("number")
    {
        let parsed = numeric::parse_numeric(number.as_str())
            .map_err(|e| malformed(name, span, format!("unreadable Value '{raw}': {e}")))?;
        return Ok(ValueField::Number {
            value: parsed.value,
            line: index,
            number: number.range(),
            style: parsed.style,
        });
    }
    if raw.starts_with('"') {
        return Ok(ValueField::Text(raw.trim_matches('"').to_string()));
    }
    Err(malformed(name, span, format!("unreadable Value '{raw}'")))
}
