// Licensed under the Apache-2.0 license

//! Register maps: ordered registers plus the configuration that
//! parameterized them.

use super::bitfield::{Access, BitField, Modifier};
use super::register::Register;
use crate::config::Configuration;
use crate::error::{conflict, Result};
use crate::util::bit_mask;

/// An ordered collection of registers.
///
/// Registers are checked against the configuration when they are added:
/// every field must fit the data width, and explicit addresses must be
/// aligned to the address increment, fit the address width and be unique.
/// Implicit addresses are assigned later by the layout resolver.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RegisterMap {
    config: Configuration,
    registers: Vec<Register>,
}

impl RegisterMap {
    pub fn new(config: Configuration) -> Self {
        Self {
            config,
            registers: Vec::new(),
        }
    }

    /// The canonical example map used to bootstrap new documents.
    pub fn template(config: Configuration) -> Result<Self> {
        let spam = Register::new("spam")?
            .with_description("Register spam")
            .with_address(0)
            .with_bitfield(
                BitField::new("foo", 0, 7, Access::ReadWrite)?
                    .with_description("Bit field foo")
                    .with_initial(42)?,
            )?
            .with_bitfield(
                BitField::new("bar", 24, 1, Access::WriteOnly)?
                    .with_description("Bit field bar")
                    .with_modifier(Modifier::SelfClear)?,
            )?;
        let eggs = Register::new("eggs")?
            .with_description("Register eggs")
            .with_address(4)
            .with_bitfield(
                BitField::new("baz", 16, 16, Access::ReadOnly)?.with_description("Bit field baz"),
            )?;
        let mut rmap = RegisterMap::new(config);
        rmap.add_registers([spam, eggs])?;
        Ok(rmap)
    }

    /// Append a register, validating it against the map and its configuration.
    pub fn add_register(&mut self, register: Register) -> Result<()> {
        let name = register.name();
        let data_width = self.config.data_width();
        if self.register(name).is_some() {
            conflict!("register map already has a register named '{name}'");
        }
        for bf in register.bitfields() {
            if bf.msb() >= data_width {
                conflict!(
                    "bit field '{}' {} of register '{name}' exceeds the {data_width}-bit bus",
                    bf.name(),
                    bf.bit_range()
                );
            }
        }
        if let Some(address) = register.address() {
            let increment = self.config.address_increment();
            let address_width = self.config.address_width();
            if address % increment != 0 {
                conflict!(
                    "register '{name}' address {address:#x} is not a multiple of {increment}"
                );
            }
            if address & !bit_mask(address_width) != 0 {
                conflict!(
                    "register '{name}' address {address:#x} exceeds {address_width} address bits"
                );
            }
            if let Some(other) = self.registers.iter().find(|r| r.address() == Some(address)) {
                conflict!(
                    "registers '{}' and '{name}' share the address {address:#x}",
                    other.name()
                );
            }
        }
        if register.bitfields().is_empty() {
            log::warn!("register '{name}' has no bit fields");
        }
        self.registers.push(register);
        Ok(())
    }

    pub fn add_registers(&mut self, registers: impl IntoIterator<Item = Register>) -> Result<()> {
        for register in registers {
            self.add_register(register)?;
        }
        Ok(())
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn registers(&self) -> &[Register] {
        &self.registers
    }

    pub fn register(&self, name: &str) -> Option<&Register> {
        self.registers.iter().find(|r| r.name() == name)
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }
}
