// Licensed under the Apache-2.0 license

//! Cycle-accurate behavioral model of a generated bridge.
//!
//! [`BridgeModel`] evaluates the same per-field templates as the Verilog
//! emitter, one clock cycle at a time, driven by Local Bus requests.
//! [`BusDriver`] sits in front of it and replays a protocol's phase table,
//! so transaction timing can be checked per bus family without an HDL
//! simulator.

use super::logic::{reads_back, BankPlan, FieldLogic, SelfClearState, WriteOnceState};
use super::protocol::{Direction, Phase, Protocol};
use crate::util::bit_mask;
use std::collections::BTreeMap;

/// Local Bus activity during one clock cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LbRequest {
    Idle,
    Write { addr: u64, data: u64, strobe: u64 },
    Read { addr: u64 },
    /// Independent write and read channels active in the same cycle, as
    /// AXI4-Lite allows.
    WriteRead {
        waddr: u64,
        data: u64,
        strobe: u64,
        raddr: u64,
    },
}

/// Values observed during one cycle, before the closing clock edge.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CycleTrace {
    /// Hardware-side outputs keyed by `<register>.<field>`.
    pub outputs: BTreeMap<String, u64>,
    pub rdata: u64,
    pub rvalid: bool,
}

impl CycleTrace {
    pub fn output(&self, register: &str, field: &str) -> Option<u64> {
        self.outputs.get(&format!("{register}.{field}")).copied()
    }
}

#[derive(Clone, Debug)]
struct FieldModel {
    name: String,
    logic: FieldLogic,
    lsb: u32,
    mask: u64,
    readable: bool,
    initial: u64,
    value: u64,
    input: u64,
    self_clear: SelfClearState,
    write_once: WriteOnceState,
}

impl FieldModel {
    fn reset(&mut self) {
        self.value = match self.logic {
            FieldLogic::SelfClearing | FieldLogic::Pulse | FieldLogic::HwDriven => 0,
            _ => self.initial,
        };
        self.self_clear = SelfClearState::default();
        self.write_once = WriteOnceState::default();
    }

    fn extract(&self, word: u64) -> u64 {
        (word >> self.lsb) & self.mask
    }

    /// Value read back through the data bus.
    fn read_value(&self) -> u64 {
        match self.logic {
            FieldLogic::HwDriven => self.input,
            _ => self.value,
        }
    }
}

#[derive(Clone, Debug)]
struct RegisterModel {
    name: String,
    address: u64,
    fields: Vec<FieldModel>,
}

/// Behavioral model of one generated register bank.
#[derive(Clone, Debug)]
pub struct BridgeModel {
    data_width: u32,
    read_filler: u64,
    registers: Vec<RegisterModel>,
    rdata: u64,
    rvalid: bool,
}

impl BridgeModel {
    pub fn new(plan: &BankPlan, data_width: u32, read_filler: u64) -> Self {
        let registers = plan
            .registers
            .iter()
            .map(|reg| RegisterModel {
                name: reg.register.name().to_string(),
                address: reg.register.address,
                fields: reg
                    .fields
                    .iter()
                    .map(|f| {
                        let bf = f.bitfield();
                        FieldModel {
                            name: bf.name().to_string(),
                            logic: f.logic,
                            lsb: bf.lsb(),
                            mask: bit_mask(bf.width()),
                            readable: reads_back(bf),
                            initial: bf.initial(),
                            value: 0,
                            input: 0,
                            self_clear: SelfClearState::default(),
                            write_once: WriteOnceState::default(),
                        }
                    })
                    .collect(),
            })
            .collect();
        let mut model = Self {
            data_width,
            read_filler: read_filler & bit_mask(data_width),
            registers,
            rdata: 0,
            rvalid: false,
        };
        model.reset();
        model
    }

    /// Apply the bridge reset.
    pub fn reset(&mut self) {
        for f in self.registers.iter_mut().flat_map(|r| r.fields.iter_mut()) {
            f.reset();
        }
        self.rdata = self.read_filler;
        self.rvalid = false;
    }

    fn field_mut(&mut self, register: &str, field: &str) -> Option<&mut FieldModel> {
        self.registers
            .iter_mut()
            .find(|r| r.name == register)?
            .fields
            .iter_mut()
            .find(|f| f.name == field)
    }

    /// Drive the hardware input of a read-only field. Returns false if the
    /// field does not exist or has no input.
    pub fn set_input(&mut self, register: &str, field: &str, value: u64) -> bool {
        match self.field_mut(register, field) {
            Some(f) if matches!(f.logic, FieldLogic::HwDriven | FieldLogic::Sticky) => {
                f.input = value & f.mask;
                true
            }
            _ => false,
        }
    }

    /// Current registered output of a field (pulses are only visible in a
    /// [`CycleTrace`]).
    pub fn output(&self, register: &str, field: &str) -> Option<u64> {
        let reg = self.registers.iter().find(|r| r.name == register)?;
        let f = reg.fields.iter().find(|f| f.name == field)?;
        Some(f.value)
    }

    fn read_word(&self, addr: u64) -> u64 {
        let Some(reg) = self.registers.iter().find(|r| r.address == addr) else {
            return self.read_filler;
        };
        reg.fields
            .iter()
            .filter(|f| f.readable)
            .fold(self.read_filler, |word, f| {
                (word & !(f.mask << f.lsb)) | (f.read_value() << f.lsb)
            })
    }

    /// Run one clock cycle: sample outputs, then apply the clock edge.
    pub fn cycle(&mut self, request: LbRequest) -> CycleTrace {
        let (waddr, wdata, wmask) = match request {
            LbRequest::Write { addr, data, strobe } => (Some(addr), data, strobe_mask(strobe)),
            LbRequest::WriteRead {
                waddr,
                data,
                strobe,
                ..
            } => (Some(waddr), data, strobe_mask(strobe)),
            _ => (None, 0, 0),
        };
        let raddr = match request {
            LbRequest::Read { addr } | LbRequest::WriteRead { raddr: addr, .. } => Some(addr),
            _ => None,
        };

        let mut trace = CycleTrace {
            outputs: BTreeMap::new(),
            rdata: self.rdata,
            rvalid: self.rvalid,
        };
        for reg in &self.registers {
            for f in &reg.fields {
                if f.logic.port_direction() != Direction::Output {
                    continue;
                }
                let value = match f.logic {
                    FieldLogic::Pulse if waddr == Some(reg.address) => {
                        f.extract(wdata) & f.extract(wmask)
                    }
                    FieldLogic::Pulse => 0,
                    _ => f.value,
                };
                trace.outputs.insert(format!("{}.{}", reg.name, f.name), value);
            }
        }

        // Clock edge: read data is captured from pre-edge values.
        if let Some(addr) = raddr {
            self.rdata = self.read_word(addr);
        }
        self.rvalid = raddr.is_some();
        for reg in &mut self.registers {
            let wsel = waddr == Some(reg.address);
            let rsel = raddr == Some(reg.address);
            for f in &mut reg.fields {
                let mask = f.extract(wmask);
                let we = wsel && mask != 0;
                let load = (f.value & !mask) | (f.extract(wdata) & mask);
                match f.logic {
                    FieldLogic::HwDriven | FieldLogic::Pulse => {}
                    FieldLogic::Sticky => {
                        f.value = (if rsel { 0 } else { f.value }) | f.input;
                    }
                    FieldLogic::Stored {
                        read_clear,
                        write_once,
                    } => {
                        let accepted = we && (!write_once || f.write_once.accepts_write());
                        if accepted {
                            f.value = load;
                            if write_once {
                                f.write_once = f.write_once.next(true);
                            }
                        } else if read_clear && rsel {
                            f.value = 0;
                        }
                    }
                    FieldLogic::SelfClearing => {
                        f.value = match f.self_clear {
                            SelfClearState::Idle if we => f.extract(wdata) & mask,
                            _ => 0,
                        };
                        f.self_clear = f.self_clear.next(we);
                    }
                }
            }
        }
        trace
    }

    pub fn data_width(&self) -> u32 {
        self.data_width
    }
}

/// Expand byte strobes into a bit mask.
fn strobe_mask(strobe: u64) -> u64 {
    (0..8)
        .filter(|byte| strobe & (1 << byte) != 0)
        .fold(0, |mask, byte| mask | (0xff << (byte * 8)))
}

/// Result of one bus transaction.
#[derive(Clone, Debug)]
pub struct Transaction {
    /// One entry per clock cycle of the transaction.
    pub cycles: Vec<CycleTrace>,
    /// Read data sampled in the response phase.
    pub data: Option<u64>,
}

/// Drives bus transactions into a [`BridgeModel`] following a protocol's
/// phase table.
#[derive(Clone, Copy, Debug)]
pub struct BusDriver {
    protocol: &'static Protocol,
}

impl BusDriver {
    pub fn new(protocol: &'static Protocol) -> Self {
        Self { protocol }
    }

    pub fn protocol(&self) -> &'static Protocol {
        self.protocol
    }

    /// Write all bytes of `data` to `addr`.
    pub fn write(&self, model: &mut BridgeModel, addr: u64, data: u64) -> Transaction {
        let strobe = bit_mask(model.data_width() / 8);
        self.write_strobed(model, addr, data, strobe)
    }

    pub fn write_strobed(
        &self,
        model: &mut BridgeModel,
        addr: u64,
        data: u64,
        strobe: u64,
    ) -> Transaction {
        let request = LbRequest::Write { addr, data, strobe };
        self.run(model, self.protocol.write_phases, request, false)
    }

    pub fn read(&self, model: &mut BridgeModel, addr: u64) -> Transaction {
        let request = LbRequest::Read { addr };
        self.run(model, self.protocol.read_phases, request, true)
    }

    fn run(
        &self,
        model: &mut BridgeModel,
        phases: &[Phase],
        request: LbRequest,
        read: bool,
    ) -> Transaction {
        let mut cycles = Vec::with_capacity(phases.len());
        let mut data = None;
        for phase in phases {
            let trace = match phase {
                Phase::Strobe => model.cycle(request),
                Phase::Idle | Phase::Response => model.cycle(LbRequest::Idle),
            };
            if read && *phase == Phase::Response && trace.rvalid {
                data = Some(trace.rdata);
            }
            cycles.push(trace);
        }
        Transaction { cycles, data }
    }
}
