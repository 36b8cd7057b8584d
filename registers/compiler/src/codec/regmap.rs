// Licensed under the Apache-2.0 license

use super::{check_keys, expect_array, expect_int, expect_object, expect_str, expect_u32, required};
use super::{Format, Int};
use crate::config::Configuration;
use crate::error::Result;
use crate::model::{Access, BitField, Modifier, Register, RegisterMap};
use serde::Serialize;
use serde_json::{Map, Value};

const REGISTER_KEYS: &[&str] = &["name", "description", "address", "bitfields"];
const BITFIELD_KEYS: &[&str] = &[
    "name",
    "description",
    "lsb",
    "width",
    "access",
    "initial",
    "modifiers",
];

#[derive(Serialize)]
struct RegisterMapDoc<'a> {
    regmap: Vec<RegisterDoc<'a>>,
}

#[derive(Serialize)]
struct RegisterDoc<'a> {
    name: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<Int>,
    bitfields: Vec<BitFieldDoc<'a>>,
}

#[derive(Serialize)]
struct BitFieldDoc<'a> {
    name: &'a str,
    description: &'a str,
    lsb: u32,
    width: u32,
    access: &'static str,
    initial: Int,
    modifiers: Vec<&'static str>,
}

impl<'a> From<&'a Register> for RegisterDoc<'a> {
    fn from(reg: &'a Register) -> Self {
        Self {
            name: reg.name(),
            description: reg.description(),
            address: reg.address().map(Int),
            bitfields: reg.bitfields().iter().map(BitFieldDoc::from).collect(),
        }
    }
}

impl<'a> From<&'a BitField> for BitFieldDoc<'a> {
    fn from(bf: &'a BitField) -> Self {
        Self {
            name: bf.name(),
            description: bf.description(),
            lsb: bf.lsb(),
            width: bf.width(),
            access: bf.access().as_str(),
            initial: Int(bf.initial()),
            modifiers: bf.modifiers().map(Modifier::as_str).collect(),
        }
    }
}

/// Serialize a register map. Only explicit addresses are written, so
/// implicit registers stay implicit after a round trip.
pub fn dump_register_map(rmap: &RegisterMap, format: Format) -> Result<String> {
    let doc = RegisterMapDoc {
        regmap: rmap.registers().iter().map(RegisterDoc::from).collect(),
    };
    format.render(&doc, "register map")
}

/// Parse a register map document. `document` names the source in errors.
pub fn parse_register_map(
    text: &str,
    format: Format,
    document: &str,
    config: Configuration,
) -> Result<RegisterMap> {
    let root = format.parse(text, document)?;
    let root = expect_object(&root, document)?;
    check_keys(root, &["regmap"], document)?;
    let mut rmap = RegisterMap::new(config);
    let Some(registers) = root.get("regmap") else {
        log::warn!("{document}: register map has no registers");
        return Ok(rmap);
    };
    for (idx, value) in expect_array(registers, "regmap")?.iter().enumerate() {
        rmap.add_register(read_register(value, idx)?)?;
    }
    Ok(rmap)
}

/// `base[idx](name)`, or `base[idx]` when the entry has no usable name.
fn entry_path(base: &str, idx: usize, value: &Value) -> String {
    match value.get("name").and_then(Value::as_str) {
        Some(name) => format!("{base}[{idx}]({name})"),
        None => format!("{base}[{idx}]"),
    }
}

fn description(map: &Map<String, Value>, path: &str) -> Result<String> {
    match map.get("description") {
        Some(v) => Ok(expect_str(v, &format!("{path}.description"))?.to_string()),
        None => Ok(String::new()),
    }
}

fn read_register(value: &Value, idx: usize) -> Result<Register> {
    let path = entry_path("regmap", idx, value);
    let map = expect_object(value, &path)?;
    check_keys(map, REGISTER_KEYS, &path)?;
    let name = expect_str(required(map, "name", &path)?, &format!("{path}.name"))?;
    let mut reg = Register::new(name)?.with_description(&description(map, &path)?);
    if let Some(address) = map.get("address") {
        reg = reg.with_address(expect_int(address, &format!("{path}.address"))?);
    }
    if let Some(bitfields) = map.get("bitfields") {
        let base = format!("{path}.bitfields");
        for (idx, value) in expect_array(bitfields, &base)?.iter().enumerate() {
            reg.add_bitfield(read_bitfield(value, &base, idx)?)?;
        }
    }
    Ok(reg)
}

fn read_bitfield(value: &Value, base: &str, idx: usize) -> Result<BitField> {
    let path = entry_path(base, idx, value);
    let map = expect_object(value, &path)?;
    check_keys(map, BITFIELD_KEYS, &path)?;
    let name = expect_str(required(map, "name", &path)?, &format!("{path}.name"))?;
    let lsb = expect_u32(required(map, "lsb", &path)?, &format!("{path}.lsb"))?;
    let width = expect_u32(required(map, "width", &path)?, &format!("{path}.width"))?;
    let access = expect_str(required(map, "access", &path)?, &format!("{path}.access"))?;
    let access: Access = access.parse()?;

    let mut bf =
        BitField::new(name, lsb, width, access)?.with_description(&description(map, &path)?);
    if let Some(initial) = map.get("initial") {
        bf = bf.with_initial(expect_int(initial, &format!("{path}.initial"))?)?;
    }
    if let Some(modifiers) = map.get("modifiers") {
        let base = format!("{path}.modifiers");
        let mut parsed = Vec::new();
        for (idx, m) in expect_array(modifiers, &base)?.iter().enumerate() {
            let m = expect_str(m, &format!("{base}[{idx}]"))?;
            parsed.push(m.parse::<Modifier>()?);
        }
        bf = bf.with_modifiers(parsed)?;
    }
    Ok(bf)
}
