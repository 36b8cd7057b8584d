// Licensed under the Apache-2.0 license

//! Register-map data model.
//!
//! ```text
//! RegisterMap
//! ├── config: Configuration
//! └── registers: Vec<Register>
//!     └── bitfields: Vec<BitField>
//!         ├── access: Access          (rw | ro | wo)
//!         └── modifiers: {Modifier}   (self_clear | write_pulse | read_clear | write_once)
//! ```
//!
//! Every mutation is validated eagerly, so any model value reachable by the
//! rest of the crate satisfies the invariants: field names are unique within
//! a register, fields never share a bit, initial values fit, modifier
//! combinations are meaningful, register names are unique and explicit
//! addresses are aligned and distinct.

mod bitfield;
mod register;
mod regmap;

pub use bitfield::{Access, BitField, Modifier, MAX_REGISTER_WIDTH};
pub use register::Register;
pub use regmap::RegisterMap;
