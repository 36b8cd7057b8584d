// Licensed under the Apache-2.0 license

//! Bit fields: named sub-ranges of a register with access mode and
//! hardware-behavior modifiers.

use crate::error::{config_err, conflict, Error, Result};
use crate::util::{bit_mask, is_identifier};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Widest register supported by any bus configuration.
pub const MAX_REGISTER_WIDTH: u32 = 64;

/// Software access mode of a bit field, seen from the bus.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Access {
    ReadWrite,
    ReadOnly,
    WriteOnly,
}

impl Access {
    pub fn as_str(self) -> &'static str {
        match self {
            Access::ReadWrite => "rw",
            Access::ReadOnly => "ro",
            Access::WriteOnly => "wo",
        }
    }

    pub fn is_readable(self) -> bool {
        matches!(self, Access::ReadWrite | Access::ReadOnly)
    }

    pub fn is_writable(self) -> bool {
        matches!(self, Access::ReadWrite | Access::WriteOnly)
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Access {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "rw" => Access::ReadWrite,
            "ro" => Access::ReadOnly,
            "wo" => Access::WriteOnly,
            _ => config_err!("unknown access mode '{s}' (expected rw, ro or wo)"),
        })
    }
}

/// Hardware behavior attached to a bit field.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Modifier {
    /// The field holds a written value for one cycle, then reverts to zero.
    SelfClear,
    /// A write produces a one-cycle pulse instead of storing a level.
    WritePulse,
    /// Reading the field clears it.
    ReadClear,
    /// Only the first write after reset takes effect.
    WriteOnce,
}

impl Modifier {
    pub const ALL: [Modifier; 4] = [
        Modifier::SelfClear,
        Modifier::WritePulse,
        Modifier::ReadClear,
        Modifier::WriteOnce,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Modifier::SelfClear => "self_clear",
            Modifier::WritePulse => "write_pulse",
            Modifier::ReadClear => "read_clear",
            Modifier::WriteOnce => "write_once",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match Modifier::ALL.iter().find(|m| m.as_str() == s) {
            Some(m) => Ok(*m),
            None => config_err!(
                "unknown modifier '{s}' (expected one of {})",
                Modifier::ALL.map(Modifier::as_str).join(", ")
            ),
        }
    }
}

/// Pairs of modifiers that cannot be attached to the same field.
const EXCLUSIVE_MODIFIERS: &[(Modifier, Modifier)] = &[
    (Modifier::SelfClear, Modifier::WritePulse),
    (Modifier::SelfClear, Modifier::WriteOnce),
    (Modifier::WritePulse, Modifier::WriteOnce),
    (Modifier::SelfClear, Modifier::ReadClear),
    (Modifier::WritePulse, Modifier::ReadClear),
];

/// A named sub-range of a register's bit vector.
///
/// Fields are validated on construction and on every change, so a
/// `BitField` value always satisfies its invariants: it fits in
/// [`MAX_REGISTER_WIDTH`] bits, the initial value fits in `width` bits and
/// the modifiers are compatible with each other and with the access mode.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BitField {
    name: String,
    description: String,
    lsb: u32,
    width: u32,
    access: Access,
    initial: u64,
    modifiers: BTreeSet<Modifier>,
}

impl BitField {
    /// Create a field with no description, a zero initial value and no modifiers.
    pub fn new(name: &str, lsb: u32, width: u32, access: Access) -> Result<Self> {
        if !is_identifier(name) {
            conflict!("bit field name '{name}' is not a valid identifier");
        }
        if width == 0 {
            conflict!("bit field '{name}' has zero width");
        }
        if u64::from(lsb) + u64::from(width) > u64::from(MAX_REGISTER_WIDTH) {
            conflict!(
                "bit field '{name}' [{}:{lsb}] exceeds {MAX_REGISTER_WIDTH} bits",
                u64::from(lsb) + u64::from(width) - 1
            );
        }
        Ok(Self {
            name: name.to_string(),
            description: String::new(),
            lsb,
            width,
            access,
            initial: 0,
            modifiers: BTreeSet::new(),
        })
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_initial(mut self, initial: u64) -> Result<Self> {
        self.initial = initial;
        self.validate()?;
        Ok(self)
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Result<Self> {
        self.modifiers.insert(modifier);
        self.validate()?;
        Ok(self)
    }

    pub fn with_modifiers(mut self, modifiers: impl IntoIterator<Item = Modifier>) -> Result<Self> {
        self.modifiers.extend(modifiers);
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        let name = &self.name;
        if self.initial & !bit_mask(self.width) != 0 {
            conflict!(
                "initial value {:#x} of bit field '{name}' does not fit in {} bit(s)",
                self.initial,
                self.width
            );
        }
        for modifier in &self.modifiers {
            let access = self.access;
            match modifier {
                Modifier::SelfClear | Modifier::WritePulse | Modifier::WriteOnce
                    if !access.is_writable() =>
                {
                    conflict!("'{modifier}' needs a writable field, '{name}' is {access}");
                }
                Modifier::ReadClear if !access.is_readable() => {
                    conflict!("'{modifier}' needs a readable field, '{name}' is {access}");
                }
                _ => {}
            }
        }
        for (a, b) in EXCLUSIVE_MODIFIERS {
            if self.has(*a) && self.has(*b) {
                conflict!("bit field '{name}' cannot combine modifiers '{a}' and '{b}'");
            }
        }
        if (self.has(Modifier::SelfClear) || self.has(Modifier::WritePulse)) && self.initial != 0 {
            conflict!(
                "bit field '{name}' reverts to zero and cannot have initial value {:#x}",
                self.initial
            );
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn lsb(&self) -> u32 {
        self.lsb
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// Index of the most significant bit.
    pub fn msb(&self) -> u32 {
        self.lsb + self.width - 1
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn initial(&self) -> u64 {
        self.initial
    }

    pub fn modifiers(&self) -> impl Iterator<Item = Modifier> + '_ {
        self.modifiers.iter().copied()
    }

    pub fn has(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    /// Read-only without `read_clear`: the value comes straight from a
    /// hardware input and the field has no storage of its own.
    pub fn is_hw_driven(&self) -> bool {
        self.access == Access::ReadOnly && !self.has(Modifier::ReadClear)
    }

    /// Mask of the field's bits within the register.
    pub fn mask(&self) -> u64 {
        bit_mask(self.width) << self.lsb
    }

    pub fn overlaps(&self, other: &BitField) -> bool {
        self.mask() & other.mask() != 0
    }

    /// Bit range in `[msb:lsb]` notation (`[lsb]` for single bits).
    pub fn bit_range(&self) -> String {
        if self.width == 1 {
            format!("[{}]", self.lsb)
        } else {
            format!("[{}:{}]", self.msb(), self.lsb)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_parse() {
        assert_eq!("rw".parse::<Access>().unwrap(), Access::ReadWrite);
        assert_eq!("ro".parse::<Access>().unwrap(), Access::ReadOnly);
        assert_eq!("wo".parse::<Access>().unwrap(), Access::WriteOnly);
        assert!("rwx".parse::<Access>().unwrap_err().is_config());
    }

    #[test]
    fn test_modifier_parse() {
        for m in Modifier::ALL {
            assert_eq!(m.as_str().parse::<Modifier>().unwrap(), m);
        }
        let err = "sticky".parse::<Modifier>().unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("self_clear"));
    }

    #[test]
    fn test_geometry() {
        let bf = BitField::new("foo", 0, 7, Access::ReadWrite).unwrap();
        assert_eq!(bf.msb(), 6);
        assert_eq!(bf.mask(), 0x7f);
        assert_eq!(bf.bit_range(), "[6:0]");
        let bar = BitField::new("bar", 24, 1, Access::WriteOnly).unwrap();
        assert_eq!(bar.bit_range(), "[24]");
        assert!(!bf.overlaps(&bar));
        let full = BitField::new("full", 0, 64, Access::ReadOnly).unwrap();
        assert_eq!(full.mask(), u64::MAX);
    }

    #[test]
    fn test_invalid_geometry() {
        let cases = [("a", 0, 0), ("a", 60, 5), ("1a", 0, 1), ("a", u32::MAX, 2)];
        for (name, lsb, width) in cases {
            let err = BitField::new(name, lsb, width, Access::ReadWrite).unwrap_err();
            assert!(err.is_conflict(), "{name} {lsb} {width}");
        }
    }

    #[test]
    fn test_initial_must_fit() {
        let bf = BitField::new("foo", 0, 7, Access::ReadWrite).unwrap();
        assert_eq!(bf.clone().with_initial(127).unwrap().initial(), 127);
        assert!(bf.with_initial(128).unwrap_err().is_conflict());
    }

    #[test]
    fn test_modifier_access_rules() {
        let ro = BitField::new("st", 0, 1, Access::ReadOnly).unwrap();
        for m in [Modifier::SelfClear, Modifier::WritePulse, Modifier::WriteOnce] {
            let err = ro.clone().with_modifier(m).unwrap_err();
            assert!(err.is_conflict(), "{m}");
        }
        assert!(ro.with_modifier(Modifier::ReadClear).is_ok());

        let wo = BitField::new("go", 0, 1, Access::WriteOnly).unwrap();
        let err = wo.clone().with_modifier(Modifier::ReadClear).unwrap_err();
        assert!(err.is_conflict());
        assert!(wo.with_modifier(Modifier::SelfClear).is_ok());
    }

    #[test]
    fn test_hw_driven() {
        let ro = BitField::new("st", 0, 4, Access::ReadOnly).unwrap();
        assert!(ro.is_hw_driven());
        let sticky = ro.with_modifier(Modifier::ReadClear).unwrap();
        assert!(!sticky.is_hw_driven());
        for access in [Access::ReadWrite, Access::WriteOnly] {
            let bf = BitField::new("f", 0, 1, access).unwrap();
            assert!(!bf.is_hw_driven(), "{access}");
        }
    }

    #[test]
    fn test_exclusive_modifiers() {
        let rw = BitField::new("ctl", 0, 4, Access::ReadWrite).unwrap();
        for (a, b) in EXCLUSIVE_MODIFIERS {
            let err = rw.clone().with_modifiers([*a, *b]).unwrap_err();
            assert!(err.is_conflict(), "{a} + {b} should conflict");
        }
        assert!(rw
            .clone()
            .with_modifiers([Modifier::WriteOnce, Modifier::ReadClear])
            .is_ok());
        assert!(rw
            .with_initial(3)
            .unwrap()
            .with_modifier(Modifier::SelfClear)
            .unwrap_err()
            .is_conflict());
    }
}
