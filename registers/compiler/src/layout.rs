// Licensed under the Apache-2.0 license

//! Address resolution.
//!
//! Walks the registers in declaration order. A register without an explicit
//! address gets the next address strictly greater than the highest one used
//! so far, rounded up to the address increment. Explicit addresses may be out
//! of sequence but never collide with any other resolved address.

use crate::config::Configuration;
use crate::error::{conflict, Result};
use crate::model::{BitField, Register, RegisterMap};
use crate::util::{bit_mask, hex_addr};

/// A bit field with its absolute position.
#[derive(Clone, Copy, Debug)]
pub struct ResolvedField<'m> {
    pub bitfield: &'m BitField,
    /// Byte address of the owning register.
    pub address: u64,
    pub lsb: u32,
    pub msb: u32,
}

impl ResolvedField<'_> {
    /// Bit index counted from bit 0 of address 0.
    pub fn absolute_bit(&self) -> u64 {
        self.address * 8 + u64::from(self.lsb)
    }
}

/// A register with its final address.
#[derive(Clone, Debug)]
pub struct ResolvedRegister<'m> {
    pub register: &'m Register,
    pub address: u64,
    pub fields: Vec<ResolvedField<'m>>,
}

impl ResolvedRegister<'_> {
    pub fn name(&self) -> &str {
        self.register.name()
    }
}

/// A register map whose addresses have all been fixed.
#[derive(Clone, Debug)]
pub struct ResolvedMap<'m> {
    pub regmap: &'m RegisterMap,
    pub data_width: u32,
    pub address_width: u32,
    pub registers: Vec<ResolvedRegister<'m>>,
}

impl<'m> ResolvedMap<'m> {
    pub fn config(&self) -> &'m Configuration {
        self.regmap.config()
    }

    pub fn register(&self, name: &str) -> Option<&ResolvedRegister<'m>> {
        self.registers.iter().find(|r| r.name() == name)
    }

    /// Register decoded at `address`, if any.
    pub fn at(&self, address: u64) -> Option<&ResolvedRegister<'m>> {
        self.registers.iter().find(|r| r.address == address)
    }
}

/// Resolve the addresses of every register in `regmap`.
pub fn resolve(regmap: &RegisterMap) -> Result<ResolvedMap<'_>> {
    let config = regmap.config();
    let increment = config.address_increment();
    let address_width = config.address_width();
    let mut placed: Vec<ResolvedRegister> = Vec::with_capacity(regmap.len());
    let mut highest: Option<u64> = None;

    for reg in regmap.registers() {
        let name = reg.name();
        let address = match reg.address() {
            Some(address) => {
                if address % increment != 0 {
                    conflict!(
                        "register '{name}' address {address:#x} is not a multiple of {increment}"
                    );
                }
                address
            }
            None => match highest {
                None => 0,
                Some(h) => match (h + 1).checked_next_multiple_of(increment) {
                    Some(a) => a,
                    None => conflict!("no address left for register '{name}' after {h:#x}"),
                },
            },
        };
        if address & !bit_mask(address_width) != 0 {
            conflict!(
                "register '{name}' address {address:#x} exceeds {address_width} address bits"
            );
        }
        if let Some(other) = placed.iter().find(|r| r.address == address) {
            conflict!(
                "registers '{}' and '{name}' both resolve to address {}",
                other.name(),
                hex_addr(address, address_width)
            );
        }
        log::debug!(
            "placed register '{name}' at {}{}",
            hex_addr(address, address_width),
            if reg.address().is_some() { "" } else { " (auto)" }
        );
        let fields = reg
            .bitfields()
            .iter()
            .map(|bf| ResolvedField {
                bitfield: bf,
                address,
                lsb: bf.lsb(),
                msb: bf.msb(),
            })
            .collect();
        placed.push(ResolvedRegister {
            register: reg,
            address,
            fields,
        });
        highest = Some(highest.map_or(address, |h| h.max(address)));
    }

    Ok(ResolvedMap {
        regmap,
        data_width: config.data_width(),
        address_width,
        registers: placed,
    })
}
