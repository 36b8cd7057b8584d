// Licensed under the Apache-2.0 license

use super::{expect_object, parse_int, type_name, Format, Int};
use crate::config::{option_spec, Configuration, OptionKind, OptionValue};
use crate::error::{config_err, Error, Result};
use serde_json::{Map, Value};

/// Parse a configuration document on top of the defaults.
///
/// Nested tables are flattened into dotted keys, so `[lb_bridge] type = "apb"`
/// and `"lb_bridge.type" = "apb"` are equivalent.
pub fn parse_configuration(text: &str, format: Format, document: &str) -> Result<Configuration> {
    let root = format.parse(text, document)?;
    let root = expect_object(&root, document)?;
    let mut leaves = Vec::new();
    flatten("", root, &mut leaves);
    let mut config = Configuration::new();
    for (key, value) in leaves {
        let spec = option_spec(&key)
            .ok_or_else(|| Error::schema(&key, format!("unknown configuration option '{key}'")))?;
        config.set(&key, option_value(&key, spec.kind, value)?)?;
    }
    Ok(config)
}

/// Serialize every effective option, grouping dotted keys into tables.
pub fn dump_configuration(config: &Configuration, format: Format) -> Result<String> {
    let mut root = Map::new();
    for (key, value) in config.iter() {
        let value = match value {
            OptionValue::Int(v) => serde_json::to_value(Int(*v)),
            OptionValue::Str(s) => Ok(Value::from(s.as_str())),
            OptionValue::Negative(v) => Ok(Value::from(*v)),
        };
        let value = value.map_err(|e| Error::render(key, e))?;
        let mut table = &mut root;
        let mut parts = key.split('.').peekable();
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                table.insert(part.to_string(), value);
                break;
            }
            let entry = table
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            table = match entry {
                Value::Object(map) => map,
                _ => {
                    let message = format!("option '{key}' clashes with a value");
                    return Err(Error::render("configuration", message));
                }
            };
        }
    }
    format.render(&root, "configuration")
}

fn flatten<'a>(prefix: &str, map: &'a Map<String, Value>, leaves: &mut Vec<(String, &'a Value)>) {
    for (key, value) in map {
        let key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(inner) => flatten(&key, inner, leaves),
            _ => leaves.push((key, value)),
        }
    }
}

/// Convert a document value to the type an option expects.
fn option_value(key: &str, kind: OptionKind, value: &Value) -> Result<OptionValue> {
    let int = |v: &Value| match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => parse_int(s),
        _ => None,
    };
    match (kind, value) {
        (OptionKind::IntChoice(_) | OptionKind::IntRange { .. }, v) => match int(v) {
            Some(i) => Ok(OptionValue::Int(i)),
            None => config_err!("option '{key}' expects a non-negative integer, found {v}"),
        },
        (OptionKind::Increment, Value::String(s)) if s == "data_width" => {
            Ok(OptionValue::Str(s.clone()))
        }
        (OptionKind::Increment, v) => match int(v) {
            Some(i) => Ok(OptionValue::Int(i)),
            None => config_err!("option '{key}' expects 'data_width' or an integer, found {v}"),
        },
        (OptionKind::Identifier { .. } | OptionKind::Choice(_), Value::String(s)) => {
            Ok(OptionValue::Str(s.clone()))
        }
        (_, v) => config_err!("option '{key}' expects a string, found {}", type_name(v)),
    }
}
