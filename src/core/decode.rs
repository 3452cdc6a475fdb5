//! Typed-value decoding for leaf values.
//!
//! Leaf values in the store carry a one-byte type tag followed by the
//! payload. Decoding never fails: anything that does not match a known
//! tag and payload shape comes back as [`FieldType::Unknown`] with a hex
//! preview, so callers always have something printable.

use std::fmt;
use std::fmt::Write as _;

const TAG_NIL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_INT32: u8 = 2;
const TAG_INT64: u8 = 3;
const TAG_FLOAT64: u8 = 4;
const TAG_STRING: u8 = 5;
const TAG_TIMESTAMP: u8 = 6;

/// Closed set of value types a key can carry.
///
/// `Bucket` is never produced by [`decode`]; the entry lister assigns it
/// when a key names a nested bucket instead of a leaf value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Nil,
    Bool,
    Int32,
    Int64,
    Float64,
    String,
    Timestamp,
    Bucket,
    Unknown,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Nil => "nil",
            FieldType::Bool => "bool",
            FieldType::Int32 => "int32",
            FieldType::Int64 => "int64",
            FieldType::Float64 => "float64",
            FieldType::String => "string",
            FieldType::Timestamp => "timestamp",
            FieldType::Bucket => "bucket",
            FieldType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of decoding one raw leaf value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub field_type: FieldType,
    pub text: String,
}

/// Decodes a raw value into its field type and printable form.
///
/// An empty value decodes to `Nil`, matching how the store represents
/// keys that carry no scalar payload.
pub fn decode(raw: &[u8]) -> Decoded {
    if raw.is_empty() {
        return Decoded {
            field_type: FieldType::Nil,
            text: "nil".to_string(),
        };
    }

    let payload = &raw[1..];
    match raw[0] {
        TAG_NIL if payload.is_empty() => Decoded {
            field_type: FieldType::Nil,
            text: "nil".to_string(),
        },
        TAG_BOOL => match payload {
            [0] => decoded(FieldType::Bool, "false"),
            [1] => decoded(FieldType::Bool, "true"),
            _ => unknown(raw),
        },
        TAG_INT32 => match <[u8; 4]>::try_from(payload) {
            Ok(bytes) => decoded(FieldType::Int32, i32::from_le_bytes(bytes).to_string()),
            Err(_) => unknown(raw),
        },
        TAG_INT64 => match <[u8; 8]>::try_from(payload) {
            Ok(bytes) => decoded(FieldType::Int64, i64::from_le_bytes(bytes).to_string()),
            Err(_) => unknown(raw),
        },
        TAG_FLOAT64 => match <[u8; 8]>::try_from(payload) {
            Ok(bytes) => decoded(FieldType::Float64, f64::from_le_bytes(bytes).to_string()),
            Err(_) => unknown(raw),
        },
        TAG_STRING => decoded(FieldType::String, String::from_utf8_lossy(payload)),
        TAG_TIMESTAMP => match <[u8; 8]>::try_from(payload) {
            Ok(bytes) => decoded(FieldType::Timestamp, format_epoch(i64::from_le_bytes(bytes))),
            Err(_) => unknown(raw),
        },
        _ => unknown(raw),
    }
}

fn decoded(field_type: FieldType, text: impl Into<String>) -> Decoded {
    Decoded {
        field_type,
        text: text.into(),
    }
}

fn unknown(raw: &[u8]) -> Decoded {
    Decoded {
        field_type: FieldType::Unknown,
        text: hex_preview(raw),
    }
}

const HEX_PREVIEW_LEN: usize = 16;

fn hex_preview(raw: &[u8]) -> String {
    let mut out = String::with_capacity(2 + 2 * HEX_PREVIEW_LEN);
    out.push_str("0x");
    for byte in raw.iter().take(HEX_PREVIEW_LEN) {
        let _ = write!(out, "{:02x}", byte);
    }
    if raw.len() > HEX_PREVIEW_LEN {
        let _ = write!(out, ".. ({} bytes)", raw.len());
    }
    out
}

/// Renders unix-epoch milliseconds as `<secs>Z`, keeping the millisecond
/// part only when it is non-zero.
fn format_epoch(millis: i64) -> String {
    let secs = millis.div_euclid(1000);
    let ms = millis.rem_euclid(1000);
    if ms == 0 {
        format!("{}Z", secs)
    } else {
        format!("{}.{:03}Z", secs, ms)
    }
}
