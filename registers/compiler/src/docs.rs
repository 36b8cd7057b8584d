// Licensed under the Apache-2.0 license

//! Markdown documentation of a resolved register map.
//!
//! ```text
//! # Register map `<map>`
//! ## Configuration      option | value
//! ## Registers          address | name | reset | description
//! ### <register>        address, reset value, description
//!                       bits | name | access | reset | modifiers | description
//! ```

use crate::config::OptionValue;
use crate::error::{Error, Result};
use crate::layout::{ResolvedMap, ResolvedRegister};
use crate::util::{hex_addr, hex_const};
use std::fmt::{self, Write};

/// Markdown table cells cannot hold pipes or line breaks.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

fn write_config(out: &mut String, resolved: &ResolvedMap) -> fmt::Result {
    writeln!(out, "## Configuration")?;
    writeln!(out)?;
    writeln!(out, "| Option | Value |")?;
    writeln!(out, "|--------|-------|")?;
    for (key, value) in resolved.config().iter() {
        let value = match (key, value) {
            ("read_filler", OptionValue::Int(v)) => hex_const(*v),
            _ => value.to_string(),
        };
        writeln!(out, "| `{key}` | {} |", cell(&value))?;
    }
    Ok(())
}

fn write_summary(out: &mut String, resolved: &ResolvedMap) -> fmt::Result {
    writeln!(out, "## Registers")?;
    writeln!(out)?;
    if resolved.registers.is_empty() {
        return writeln!(out, "The register map is empty.");
    }
    writeln!(out, "| Address | Name | Reset | Description |")?;
    writeln!(out, "|---------|------|-------|-------------|")?;
    for reg in &resolved.registers {
        writeln!(
            out,
            "| {} | [{}](#{}) | {} | {} |",
            hex_addr(reg.address, resolved.address_width),
            reg.name(),
            reg.name().to_ascii_lowercase(),
            hex_addr(reg.register.reset_value(), resolved.data_width),
            cell(reg.register.description())
        )?;
    }
    Ok(())
}

fn write_register(
    out: &mut String,
    resolved: &ResolvedMap,
    reg: &ResolvedRegister,
) -> fmt::Result {
    writeln!(out, "### {}", reg.name())?;
    writeln!(out)?;
    writeln!(
        out,
        "Address: `{}`, reset value: `{}`",
        hex_addr(reg.address, resolved.address_width),
        hex_addr(reg.register.reset_value(), resolved.data_width)
    )?;
    if !reg.register.description().is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", reg.register.description())?;
    }
    writeln!(out)?;
    if reg.fields.is_empty() {
        return writeln!(out, "No bit fields.");
    }

    writeln!(out, "| Bits | Name | Access | Reset | Modifiers | Description |")?;
    writeln!(out, "|------|------|--------|-------|-----------|-------------|")?;
    let mut fields: Vec<_> = reg.fields.iter().map(|f| f.bitfield).collect();
    fields.sort_by_key(|bf| std::cmp::Reverse(bf.lsb()));
    for bf in fields {
        let modifiers: Vec<&str> = bf.modifiers().map(|m| m.as_str()).collect();
        // Hardware-driven fields have no reset state of their own.
        let reset = if bf.is_hw_driven() {
            "-".to_string()
        } else {
            hex_const(bf.initial())
        };
        writeln!(
            out,
            "| {} | {} | {} | {} | {} | {} |",
            bf.bit_range(),
            bf.name(),
            bf.access(),
            reset,
            modifiers.join(", "),
            cell(bf.description())
        )?;
    }
    Ok(())
}

fn write_docs(out: &mut String, resolved: &ResolvedMap, mapname: &str) -> fmt::Result {
    writeln!(out, "# Register map `{mapname}`")?;
    writeln!(out)?;
    writeln!(out, "Generated by regmap-compiler, do not edit.")?;
    writeln!(out)?;
    write_config(out, resolved)?;
    writeln!(out)?;
    write_summary(out, resolved)?;
    for reg in &resolved.registers {
        writeln!(out)?;
        write_register(out, resolved, reg)?;
    }
    Ok(())
}

/// Render the Markdown reference of `resolved`.
pub fn render_docs(resolved: &ResolvedMap, mapname: &str) -> Result<String> {
    let mut out = String::new();
    write_docs(&mut out, resolved, mapname)
        .map_err(|e| Error::render(format!("{mapname}.md"), e))?;
    Ok(out)
}
