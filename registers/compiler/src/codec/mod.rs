// Licensed under the Apache-2.0 license

//! Serialization codec for register maps and configurations.
//!
//! Documents are first parsed into a generic tree (JSON and TOML share the
//! same shape), then walked against the schema so that every failure can
//! name the offending entity by path, e.g.
//! `regmap[0](spam).bitfields[1](bar).width`. Writing goes through
//! serde-derived document types.
//!
//! Integers may be written as numbers or as `"0x…"`/`"0b…"` strings. The
//! writer uses the string form only for values TOML cannot hold as a
//! signed 64-bit integer.

mod config;
mod format;
mod regmap;

pub use config::{dump_configuration, parse_configuration};
pub use format::Format;
pub use regmap::{dump_register_map, parse_register_map};

use crate::error::{Error, Result};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Integer that serializes as a hex string when TOML could not hold it.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Int(pub u64);

impl Serialize for Int {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if i64::try_from(self.0).is_ok() {
            serializer.serialize_u64(self.0)
        } else {
            serializer.serialize_str(&format!("{:#x}", self.0))
        }
    }
}

/// Parse `0x…`, `0b…` or decimal text, allowing `_` separators.
pub(crate) fn parse_int(text: &str) -> Option<u64> {
    let text = text.trim().replace('_', "");
    let (digits, radix) = if let Some(hex) = text.strip_prefix("0x").or(text.strip_prefix("0X")) {
        (hex, 16)
    } else if let Some(bin) = text.strip_prefix("0b").or(text.strip_prefix("0B")) {
        (bin, 2)
    } else {
        (text.as_str(), 10)
    };
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, radix).ok()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a table",
    }
}

fn mismatch(path: &str, expected: &str, value: &Value) -> Error {
    let found = type_name(value);
    Error::schema(path, format!("expected {expected}, found {found}"))
}

fn expect_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| mismatch(path, "a table", value))
}

fn expect_array<'a>(value: &'a Value, path: &str) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| mismatch(path, "an array", value))
}

fn expect_str<'a>(value: &'a Value, path: &str) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| mismatch(path, "a string", value))
}

fn expect_int(value: &Value, path: &str) -> Result<u64> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => parse_int(s),
        _ => return Err(mismatch(path, "an integer", value)),
    };
    let message = format!("expected a non-negative integer, found {value}");
    parsed.ok_or_else(|| Error::schema(path, message))
}

fn expect_u32(value: &Value, path: &str) -> Result<u32> {
    let int = expect_int(value, path)?;
    u32::try_from(int).map_err(|_| Error::schema(path, format!("{int} is out of range")))
}

/// Reject attributes outside `allowed`.
fn check_keys(map: &Map<String, Value>, allowed: &[&str], path: &str) -> Result<()> {
    match map.keys().find(|k| !allowed.contains(&k.as_str())) {
        Some(key) => Err(Error::schema(
            format!("{path}.{key}"),
            format!("unknown attribute '{key}' (expected one of {})", allowed.join(", ")),
        )),
        None => Ok(()),
    }
}

fn required<'a>(map: &'a Map<String, Value>, key: &str, path: &str) -> Result<&'a Value> {
    map.get(key)
        .ok_or_else(|| Error::schema(path, format!("missing required attribute '{key}'")))
}
