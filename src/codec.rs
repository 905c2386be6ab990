//! Field decoding for CAT fixed-width slices.
//!
//! Each codec is a pure function from the exact character window of a field
//! to a [`FieldValue`]. Codecs never see anything outside the window: bounds
//! are checked by the extractor before a codec is applied.

use crate::error::DecodeError;
use crate::models::FieldValue;
use std::fmt;

/// Decoding rule attached to every field of a record schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldCodec {
    /// Alphanumeric code, kept verbatim unless blank
    Code,
    /// Free text, right-trimmed
    Text,
    /// Base-10 integer, blank decodes to null
    Integer,
    /// Fixed-point number with `integer_digits` leading integer characters
    Decimal { integer_digits: usize },
    /// `YYYYMMDD` reformatted as `YYYY-MM-DD`
    Date,
    /// `HHMMSS` reformatted as `HH:MM:SS`
    Time,
    /// `YYYYMMDDHHMMSS` reformatted as `YYYY-MM-DD HH:MM:SS`
    DateTime,
}

impl FieldCodec {
    /// Decode a raw field slice
    pub fn decode(&self, raw: &str) -> Result<FieldValue, DecodeError> {
        match self {
            FieldCodec::Code => Ok(FieldValue::Text(decode_code(raw))),
            FieldCodec::Text => Ok(FieldValue::Text(decode_text(raw))),
            FieldCodec::Integer => decode_integer(raw),
            FieldCodec::Decimal { integer_digits } => decode_decimal(raw, *integer_digits),
            FieldCodec::Date => Ok(FieldValue::Text(decode_date(raw))),
            FieldCodec::Time => Ok(FieldValue::Text(decode_time(raw))),
            FieldCodec::DateTime => Ok(FieldValue::Text(decode_datetime(raw))),
        }
    }
}

impl fmt::Display for FieldCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldCodec::Code => f.write_str("code"),
            FieldCodec::Text => f.write_str("text"),
            FieldCodec::Integer => f.write_str("integer"),
            FieldCodec::Decimal { integer_digits } => write!(f, "decimal({})", integer_digits),
            FieldCodec::Date => f.write_str("date"),
            FieldCodec::Time => f.write_str("time"),
            FieldCodec::DateTime => f.write_str("datetime"),
        }
    }
}

/// True for empty or all-whitespace slices
pub fn is_blank(raw: &str) -> bool {
    raw.chars().all(char::is_whitespace)
}

/// Code field: verbatim, or empty when the whole slice is blank
pub fn decode_code(raw: &str) -> String {
    if is_blank(raw) {
        String::new()
    } else {
        raw.to_string()
    }
}

/// Text field: trailing whitespace removed, leading and inner spaces kept
pub fn decode_text(raw: &str) -> String {
    raw.trim_end().to_string()
}

/// Integer field. Blank slices decode to [`FieldValue::Null`].
pub fn decode_integer(raw: &str) -> Result<FieldValue, DecodeError> {
    if is_blank(raw) {
        return Ok(FieldValue::Null);
    }

    raw.trim()
        .parse::<i64>()
        .map(FieldValue::Integer)
        .map_err(|_| DecodeError::InvalidInteger {
            raw: raw.to_string(),
        })
}

/// Decimal field split after `integer_digits` characters.
///
/// `decode_decimal("00123045", 3)` reads `"001.23045"`. Blank slices decode
/// to [`FieldValue::Null`].
pub fn decode_decimal(raw: &str, integer_digits: usize) -> Result<FieldValue, DecodeError> {
    if is_blank(raw) {
        return Ok(FieldValue::Null);
    }

    let invalid = || DecodeError::InvalidDecimal {
        raw: raw.to_string(),
    };

    let integer_part = char_range(raw, 0, Some(integer_digits)).trim();
    let fraction_part = char_range(raw, integer_digits, None).trim();

    let unsigned = integer_part
        .strip_prefix(['-', '+'])
        .unwrap_or(integer_part);
    let digits_only = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !digits_only(unsigned) || !digits_only(fraction_part) {
        return Err(invalid());
    }
    if unsigned.is_empty() && fraction_part.is_empty() {
        return Err(invalid());
    }

    format!("{}.{}", integer_part, fraction_part)
        .parse::<f64>()
        .map(FieldValue::Decimal)
        .map_err(|_| invalid())
}

/// Date field: `YYYYMMDD` -> `YYYY-MM-DD`, no calendar validation
pub fn decode_date(raw: &str) -> String {
    if is_blank(raw) {
        return String::new();
    }
    format_date(raw)
}

/// Time field: `HHMMSS` -> `HH:MM:SS`, no range validation
pub fn decode_time(raw: &str) -> String {
    if is_blank(raw) {
        return String::new();
    }
    format_time(raw)
}

/// Datetime field: `YYYYMMDDHHMMSS` -> `YYYY-MM-DD HH:MM:SS`
pub fn decode_datetime(raw: &str) -> String {
    if is_blank(raw) {
        return String::new();
    }
    let date = format_date(char_range(raw, 0, Some(8)));
    let time = format_time(char_range(raw, 8, None));
    format!("{} {}", date, time)
}

fn format_date(raw: &str) -> String {
    format!(
        "{}-{}-{}",
        char_range(raw, 0, Some(4)),
        char_range(raw, 4, Some(6)),
        char_range(raw, 6, None)
    )
}

fn format_time(raw: &str) -> String {
    format!(
        "{}:{}:{}",
        char_range(raw, 0, Some(2)),
        char_range(raw, 2, Some(4)),
        char_range(raw, 4, None)
    )
}

/// Substring by character positions `[from, to)`, clamped to the input
fn char_range(s: &str, from: usize, to: Option<usize>) -> &str {
    let byte_at = |n: usize| s.char_indices().nth(n).map_or(s.len(), |(i, _)| i);
    let start = byte_at(from);
    let end = to.map_or(s.len(), byte_at).max(start);
    &s[start..end]
}
