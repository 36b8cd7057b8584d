// Licensed under the Apache-2.0 license

//! Per-field hardware behavior.
//!
//! Every bit field maps to exactly one [`FieldLogic`] variant, derived once
//! from its access mode and modifiers. Both the Verilog emitter and the cycle
//! model dispatch on the variant, so the two can never disagree about which
//! template a field uses.

use super::generate::LOCAL_BUS_SIGNALS;
use super::protocol::{Direction, Protocol};
use crate::error::{conflict, Result};
use crate::layout::{ResolvedField, ResolvedMap, ResolvedRegister};
use crate::model::{BitField, Modifier};
use std::collections::BTreeMap;

/// States of a self-clearing field.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SelfClearState {
    #[default]
    Idle,
    /// Holding the written value for this one cycle.
    Asserted,
}

impl SelfClearState {
    pub const ALL: [SelfClearState; 2] = [SelfClearState::Idle, SelfClearState::Asserted];

    /// State after a clock edge. Writes are ignored while asserted.
    pub fn next(self, write: bool) -> Self {
        match self {
            SelfClearState::Idle if write => SelfClearState::Asserted,
            SelfClearState::Idle => SelfClearState::Idle,
            SelfClearState::Asserted => SelfClearState::Idle,
        }
    }

    pub fn verilog_name(self) -> &'static str {
        match self {
            SelfClearState::Idle => "SC_IDLE",
            SelfClearState::Asserted => "SC_ASSERTED",
        }
    }

    pub fn encoding(self) -> u64 {
        self as u64
    }
}

/// States of a write-once field.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum WriteOnceState {
    #[default]
    Open,
    /// A write has landed; further writes are dropped until reset.
    Locked,
}

impl WriteOnceState {
    pub const ALL: [WriteOnceState; 2] = [WriteOnceState::Open, WriteOnceState::Locked];

    pub fn next(self, write: bool) -> Self {
        match self {
            WriteOnceState::Open if write => WriteOnceState::Locked,
            state => state,
        }
    }

    pub fn accepts_write(self) -> bool {
        self == WriteOnceState::Open
    }

    pub fn verilog_name(self) -> &'static str {
        match self {
            WriteOnceState::Open => "WO_OPEN",
            WriteOnceState::Locked => "WO_LOCKED",
        }
    }

    pub fn encoding(self) -> u64 {
        self as u64
    }
}

/// Hardware template of a bit field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldLogic {
    /// Read-only, driven combinationally by a hardware input.
    HwDriven,
    /// Read-only with read_clear: input bits accumulate until the field is read.
    Sticky,
    /// A level written by the bus. With read_clear, a write accepted in the
    /// same cycle as a read of the register wins over the clear.
    Stored { read_clear: bool, write_once: bool },
    /// Holds a write for one cycle, see [`SelfClearState`].
    SelfClearing,
    /// Combinational one-cycle pulse on write; nothing is stored.
    Pulse,
}

impl FieldLogic {
    pub fn of(bf: &BitField) -> Self {
        if bf.has(Modifier::WritePulse) {
            FieldLogic::Pulse
        } else if bf.has(Modifier::SelfClear) {
            FieldLogic::SelfClearing
        } else if bf.is_hw_driven() {
            FieldLogic::HwDriven
        } else if !bf.access().is_writable() {
            FieldLogic::Sticky
        } else {
            FieldLogic::Stored {
                read_clear: bf.has(Modifier::ReadClear),
                write_once: bf.has(Modifier::WriteOnce),
            }
        }
    }

    /// Direction of the hardware-side port.
    pub fn port_direction(self) -> Direction {
        match self {
            FieldLogic::HwDriven | FieldLogic::Sticky => Direction::Input,
            _ => Direction::Output,
        }
    }

    pub fn port_suffix(self) -> &'static str {
        match self.port_direction() {
            Direction::Input => "_in",
            Direction::Output => "_out",
        }
    }

    /// Whether the field holds a flip-flop value.
    pub fn is_stored(self) -> bool {
        !matches!(self, FieldLogic::HwDriven | FieldLogic::Pulse)
    }

    pub fn is_write_once(self) -> bool {
        match self {
            FieldLogic::Stored { write_once, .. } => write_once,
            _ => false,
        }
    }

    /// Whether the field carries an explicit state register.
    pub fn has_state(self) -> bool {
        self == FieldLogic::SelfClearing || self.is_write_once()
    }
}

/// Whether reads of the field return its value rather than the filler.
pub fn reads_back(bf: &BitField) -> bool {
    bf.access().is_readable() && FieldLogic::of(bf) != FieldLogic::Pulse
}

/// Generated names and logic of one bit field.
#[derive(Clone, Debug)]
pub struct FieldPlan<'m> {
    pub field: ResolvedField<'m>,
    pub logic: FieldLogic,
    /// Hardware-side port.
    pub port: String,
    /// Prefix of internal signals, `<register>_<field>`.
    pub base: String,
}

impl FieldPlan<'_> {
    pub fn bitfield(&self) -> &BitField {
        self.field.bitfield
    }

    pub fn ff(&self) -> String {
        format!("{}_ff", self.base)
    }

    pub fn we(&self) -> String {
        format!("{}_we", self.base)
    }

    pub fn state(&self) -> String {
        format!("{}_state", self.base)
    }

    /// Signal muxed onto the read data bus.
    pub fn read_source(&self) -> String {
        match self.logic {
            FieldLogic::HwDriven => self.port.clone(),
            _ => self.ff(),
        }
    }

    fn internal_signals(&self) -> Vec<String> {
        let mut names = Vec::new();
        if self.logic.port_direction() == Direction::Output {
            names.push(self.we());
        }
        if self.logic.is_stored() {
            names.push(self.ff());
        }
        if self.logic.has_state() {
            names.push(self.state());
        }
        names
    }
}

/// Generated names of one register.
#[derive(Clone, Debug)]
pub struct RegisterPlan<'m> {
    pub register: &'m ResolvedRegister<'m>,
    pub fields: Vec<FieldPlan<'m>>,
}

impl RegisterPlan<'_> {
    pub fn wsel(&self) -> String {
        format!("{}_wsel", self.register.name())
    }

    pub fn rsel(&self) -> String {
        format!("{}_rsel", self.register.name())
    }
}

/// Part of a register's read word, most significant first.
#[derive(Clone, Debug)]
pub enum Segment<'p> {
    Field(&'p FieldPlan<'p>),
    Filler { lsb: u32, width: u32 },
}

impl RegisterPlan<'_> {
    /// Split the data word into readable fields and filler runs.
    pub fn read_segments(&self, data_width: u32) -> Vec<Segment<'_>> {
        let mut readable: Vec<&FieldPlan> = self
            .fields
            .iter()
            .filter(|f| reads_back(f.bitfield()))
            .collect();
        readable.sort_by_key(|f| std::cmp::Reverse(f.field.lsb));
        let mut segments = Vec::new();
        let mut top = data_width;
        for f in readable {
            let above = f.field.msb + 1;
            if above < top {
                segments.push(Segment::Filler {
                    lsb: above,
                    width: top - above,
                });
            }
            segments.push(Segment::Field(f));
            top = f.field.lsb;
        }
        if top > 0 {
            segments.push(Segment::Filler { lsb: 0, width: top });
        }
        segments
    }
}

/// Signal names and field templates of a whole register bank.
#[derive(Clone, Debug)]
pub struct BankPlan<'m> {
    pub registers: Vec<RegisterPlan<'m>>,
}

impl<'m> BankPlan<'m> {
    /// Name every generated signal, rejecting collisions.
    pub fn new(resolved: &'m ResolvedMap<'m>, protocol: &Protocol) -> Result<Self> {
        let config = resolved.config();
        let (prefix, case) = (config.naming_prefix(), config.naming_case());
        let mut owners: BTreeMap<String, String> = BTreeMap::new();
        let mut claim = |name: String, owner: String| -> Result<()> {
            if crate::util::is_verilog_keyword(&name) {
                conflict!("signal '{name}' generated for {owner} is a Verilog keyword");
            }
            if let Some(first) = owners.get(&name) {
                conflict!("signal '{name}' generated for {owner} collides with {first}");
            }
            owners.insert(name, owner);
            Ok(())
        };

        for fixed in ["clk", config.register_reset().port()] {
            claim(fixed.to_string(), "the clock/reset".to_string())?;
        }
        for port in protocol.ports {
            let owner = format!("the {} interface", protocol.title);
            claim(port.name.to_string(), owner)?;
        }
        for internal in LOCAL_BUS_SIGNALS.iter().chain(protocol.internals) {
            claim(internal.to_string(), "the bus bridge".to_string())?;
        }

        let mut registers = Vec::with_capacity(resolved.registers.len());
        for reg in &resolved.registers {
            let mut fields = Vec::with_capacity(reg.fields.len());
            for field in &reg.fields {
                let bf = field.bitfield;
                let logic = FieldLogic::of(bf);
                let port = case.apply(&format!(
                    "{prefix}{}_{}{}",
                    reg.name(),
                    bf.name(),
                    logic.port_suffix()
                ));
                fields.push(FieldPlan {
                    field: *field,
                    logic,
                    port,
                    base: format!("{}_{}", reg.name(), bf.name()),
                });
            }
            let plan = RegisterPlan {
                register: reg,
                fields,
            };
            let owner = format!("register '{}'", reg.name());
            claim(plan.wsel(), owner.clone())?;
            claim(plan.rsel(), owner)?;
            for f in &plan.fields {
                let owner = format!("bit field '{}.{}'", reg.name(), f.bitfield().name());
                claim(f.port.clone(), owner.clone())?;
                for name in f.internal_signals() {
                    claim(name, owner.clone())?;
                }
            }
            registers.push(plan);
        }
        Ok(Self { registers })
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldPlan<'m>> + '_ {
        self.registers.iter().flat_map(|r| r.fields.iter())
    }

    pub fn uses(&self, pred: impl Fn(FieldLogic) -> bool) -> bool {
        self.fields().any(|f| pred(f.logic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Access;

    fn bf(access: Access, modifiers: &[Modifier]) -> BitField {
        BitField::new("f", 0, 4, access)
            .unwrap()
            .with_modifiers(modifiers.iter().copied())
            .unwrap()
    }

    #[test]
    fn test_field_logic_dispatch() {
        use FieldLogic::*;
        assert_eq!(FieldLogic::of(&bf(Access::ReadOnly, &[])), HwDriven);
        assert_eq!(
            FieldLogic::of(&bf(Access::ReadOnly, &[Modifier::ReadClear])),
            Sticky
        );
        assert_eq!(
            FieldLogic::of(&bf(Access::ReadWrite, &[])),
            Stored {
                read_clear: false,
                write_once: false
            }
        );
        let both = [Modifier::WriteOnce, Modifier::ReadClear];
        assert_eq!(
            FieldLogic::of(&bf(Access::ReadWrite, &both)),
            Stored {
                read_clear: true,
                write_once: true
            }
        );
        assert_eq!(
            FieldLogic::of(&bf(Access::WriteOnly, &[Modifier::SelfClear])),
            SelfClearing
        );
        assert_eq!(
            FieldLogic::of(&bf(Access::ReadWrite, &[Modifier::WritePulse])),
            Pulse
        );
    }

    #[test]
    fn test_reads_back() {
        assert!(reads_back(&bf(Access::ReadWrite, &[])));
        assert!(!reads_back(&bf(Access::WriteOnly, &[])));
        assert!(!reads_back(&bf(Access::ReadWrite, &[Modifier::WritePulse])));
        assert!(reads_back(&bf(Access::ReadOnly, &[Modifier::ReadClear])));
    }

    #[test]
    fn test_state_machines() {
        use SelfClearState::*;
        assert_eq!(Idle.next(false), Idle);
        assert_eq!(Idle.next(true), Asserted);
        assert_eq!(Asserted.next(false), Idle);
        assert_eq!(Asserted.next(true), Idle);

        assert_eq!(WriteOnceState::Open.next(true), WriteOnceState::Locked);
        assert_eq!(WriteOnceState::Locked.next(true), WriteOnceState::Locked);
        assert!(!WriteOnceState::Locked.accepts_write());
    }
}
