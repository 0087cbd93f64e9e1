//! Numeric input handling for `Value` questions.
//!
//! Accepts decimal, explicitly signed, and `0x`-prefixed hexadecimal text and
//! remembers how a number was spelled so a rewritten `Value` line keeps the
//! radix of the original.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static NUMERIC_INPUT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:0[xX][0-9A-Fa-f]+|[0-9]+)$").expect("Invalid numeric input regex")
});

/// Why a numeric text was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NumericError {
    #[error("value cannot be empty")]
    Empty,

    #[error("numeric values must not contain tabs or newlines")]
    HiddenWhitespace,

    #[error("use decimal digits or 0x-prefixed hexadecimal")]
    Syntax,

    #[error("does not fit in a signed 64-bit integer")]
    Overflow,
}

/// How a number is written in the dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum NumberStyle {
    #[default]
    Decimal,
    Hex {
        upper_prefix: bool,
        upper_digits: bool,
    },
}

impl NumberStyle {
    /// Render `value` in this style.
    pub fn render(self, value: i64) -> String {
        match self {
            Self::Decimal => value.to_string(),
            Self::Hex {
                upper_prefix,
                upper_digits,
            } => {
                let sign = if value < 0 { "-" } else { "" };
                let prefix = if upper_prefix { "0X" } else { "0x" };
                let magnitude = value.unsigned_abs();
                if upper_digits {
                    format!("{sign}{prefix}{magnitude:X}")
                } else {
                    format!("{sign}{prefix}{magnitude:x}")
                }
            }
        }
    }

    pub fn is_hex(self) -> bool {
        matches!(self, Self::Hex { .. })
    }
}

/// A successfully parsed number with its spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedNumber {
    pub value: i64,
    pub style: NumberStyle,
}

/// Parse user or dump text into a signed integer.
///
/// Tabs and newlines anywhere in the input are rejected rather than trimmed
/// so hidden characters never reach the file.
pub fn parse_numeric(raw: &str) -> Result<ParsedNumber, NumericError> {
    if raw.contains(['\t', '\n', '\r']) {
        return Err(NumericError::HiddenWhitespace);
    }
    let cleaned = raw.trim();
    if cleaned.is_empty() {
        return Err(NumericError::Empty);
    }
    if !NUMERIC_INPUT_REGEX.is_match(cleaned) {
        return Err(NumericError::Syntax);
    }

    let (negative, unsigned) = match cleaned.as_bytes()[0] {
        b'-' => (true, &cleaned[1..]),
        b'+' => (false, &cleaned[1..]),
        _ => (false, cleaned),
    };

    let (digits, radix, style) = match unsigned.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("0x") => {
            let digits = &unsigned[2..];
            let style = NumberStyle::Hex {
                upper_prefix: prefix == "0X",
                upper_digits: digits.chars().any(|c| c.is_ascii_uppercase()),
            };
            (digits, 16, style)
        }
        _ => (unsigned, 10, NumberStyle::Decimal),
    };

    let magnitude = i128::from_str_radix(digits, radix).map_err(|_| NumericError::Overflow)?;
    let signed = if negative { -magnitude } else { magnitude };
    let value = i64::try_from(signed).map_err(|_| NumericError::Overflow)?;

    Ok(ParsedNumber { value, style })
}

/// Human-readable rendering used in before/after summaries.
pub fn summarize(value: i64) -> String {
    if value < 0 {
        format!("{value} (-0x{:X})", value.unsigned_abs())
    } else {
        format!("{value} (0x{value:X})")
    }
}

/// Note shown when hexadecimal input was converted.
pub fn conversion_note(raw: &str, parsed: &ParsedNumber) -> Option<String> {
    parsed.style.is_hex().then(|| {
        format!(
            "Entered hex value {} converted to decimal {}.",
            raw.trim(),
            parsed.value
        )
    })
}
