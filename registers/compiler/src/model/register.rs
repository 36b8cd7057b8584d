// Licensed under the Apache-2.0 license

//! Registers: named, addressed containers of bit fields.

use super::bitfield::BitField;
use crate::error::{conflict, Result};
use crate::util::is_identifier;

/// A register with an optional explicit address and an ordered list of
/// non-overlapping bit fields.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Register {
    name: String,
    description: String,
    address: Option<u64>,
    bitfields: Vec<BitField>,
}

impl Register {
    pub fn new(name: &str) -> Result<Self> {
        if !is_identifier(name) {
            conflict!("register name '{name}' is not a valid identifier");
        }
        Ok(Self {
            name: name.to_string(),
            description: String::new(),
            address: None,
            bitfields: Vec::new(),
        })
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Pin the register to an explicit byte address.
    pub fn with_address(mut self, address: u64) -> Self {
        self.address = Some(address);
        self
    }

    /// Append a bit field, rejecting duplicate names and overlapping bits.
    pub fn add_bitfield(&mut self, bitfield: BitField) -> Result<()> {
        let reg = &self.name;
        for existing in &self.bitfields {
            if existing.name() == bitfield.name() {
                conflict!(
                    "register '{reg}' already has a bit field named '{}'",
                    bitfield.name()
                );
            }
            if existing.overlaps(&bitfield) {
                conflict!(
                    "bit field '{}' {} overlaps bit field '{}' {} in register '{reg}'",
                    bitfield.name(),
                    bitfield.bit_range(),
                    existing.name(),
                    existing.bit_range()
                );
            }
        }
        self.bitfields.push(bitfield);
        Ok(())
    }

    pub fn add_bitfields(&mut self, bitfields: impl IntoIterator<Item = BitField>) -> Result<()> {
        for bitfield in bitfields {
            self.add_bitfield(bitfield)?;
        }
        Ok(())
    }

    /// Builder-style [`Register::add_bitfield`].
    pub fn with_bitfield(mut self, bitfield: BitField) -> Result<Self> {
        self.add_bitfield(bitfield)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Explicit address, if one was declared.
    pub fn address(&self) -> Option<u64> {
        self.address
    }

    pub fn bitfields(&self) -> &[BitField] {
        &self.bitfields
    }

    pub fn bitfield(&self, name: &str) -> Option<&BitField> {
        self.bitfields.iter().find(|bf| bf.name() == name)
    }

    /// Number of bits spanned up to the highest field (0 when empty).
    pub fn used_width(&self) -> u32 {
        self.bitfields
            .iter()
            .map(|bf| bf.msb() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Value the register's storage takes on reset.
    ///
    /// Hardware-driven fields have no storage, so their `initial` is left out.
    pub fn reset_value(&self) -> u64 {
        self.bitfields
            .iter()
            .filter(|bf| !bf.is_hw_driven())
            .fold(0, |acc, bf| acc | (bf.initial() << bf.lsb()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Access, Modifier};

    fn field(name: &str, lsb: u32, width: u32) -> BitField {
        BitField::new(name, lsb, width, Access::ReadWrite).unwrap()
    }

    #[test]
    fn test_overlap_any_order() {
        let cases = [((0, 8), (7, 2)), ((4, 4), (0, 5)), ((0, 32), (16, 1)), ((3, 1), (3, 1))];
        for ((lsb_a, w_a), (lsb_b, w_b)) in cases {
            let mut ab = Register::new("r").unwrap();
            ab.add_bitfield(field("a", lsb_a, w_a)).unwrap();
            let err = ab.add_bitfield(field("b", lsb_b, w_b)).unwrap_err();
            assert!(err.is_conflict());

            let mut ba = Register::new("r").unwrap();
            ba.add_bitfield(field("b", lsb_b, w_b)).unwrap();
            let err = ba.add_bitfield(field("a", lsb_a, w_a)).unwrap_err();
            assert!(err.is_conflict());
        }
    }

    #[test]
    fn test_adjacent_fields() {
        let mut reg = Register::new("r").unwrap();
        reg.add_bitfields([field("a", 0, 8), field("b", 8, 8), field("c", 31, 1)])
            .unwrap();
        assert_eq!(reg.bitfields().len(), 3);
        assert_eq!(reg.used_width(), 32);
    }

    #[test]
    fn test_duplicate_name() {
        let mut reg = Register::new("r").unwrap();
        reg.add_bitfield(field("a", 0, 1)).unwrap();
        let err = reg.add_bitfield(field("a", 4, 1)).unwrap_err();
        assert!(err.is_conflict());
        assert!(err.to_string().contains("'a'"));
    }

    #[test]
    fn test_overlap_message_names_both() {
        let mut reg = Register::new("ctrl").unwrap();
        reg.add_bitfield(field("foo", 0, 7)).unwrap();
        let msg = reg.add_bitfield(field("bar", 6, 2)).unwrap_err().to_string();
        assert!(msg.contains("'bar' [7:6]"), "{msg}");
        assert!(msg.contains("'foo' [6:0]"), "{msg}");
        assert!(msg.contains("'ctrl'"), "{msg}");
    }

    #[test]
    fn test_reset_value() {
        let reg = Register::new("r")
            .unwrap()
            .with_bitfield(field("a", 0, 7).with_initial(42).unwrap())
            .unwrap()
            .with_bitfield(field("b", 8, 4).with_initial(0xf).unwrap())
            .unwrap();
        assert_eq!(reg.reset_value(), 0xf2a);
    }

    #[test]
    fn test_reset_value_skips_hw_driven() {
        let level = BitField::new("level", 0, 4, Access::ReadOnly)
            .unwrap()
            .with_initial(5)
            .unwrap();
        let pending = BitField::new("pending", 4, 4, Access::ReadOnly)
            .unwrap()
            .with_initial(3)
            .unwrap()
            .with_modifier(Modifier::ReadClear)
            .unwrap();
        let reg = Register::new("r")
            .unwrap()
            .with_bitfield(level)
            .unwrap()
            .with_bitfield(pending)
            .unwrap();
        assert_eq!(reg.reset_value(), 0x30);
    }

    #[test]
    fn test_invalid_name() {
        assert!(Register::new("").unwrap_err().is_conflict());
        assert!(Register::new("a.b").unwrap_err().is_conflict());
    }
}
