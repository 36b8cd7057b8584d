// Licensed under the Apache-2.0 license

//! Verilog emission.
//!
//! ```text
//! module <protocol>2lb_<map>
//! ├── bus front end        (from the protocol descriptor)
//! ├── Local Bus            lb_waddr/lb_wdata/lb_wstrb/lb_wen/lb_wready
//! │                        lb_raddr/lb_ren/lb_rdata/lb_rvalid
//! ├── address decode       <reg>_wsel / <reg>_rsel
//! ├── per-field templates  one per FieldLogic variant
//! └── read mux             case on lb_raddr, registered
//! ```

use super::logic::{BankPlan, FieldLogic, FieldPlan, RegisterPlan, Segment};
use super::logic::{SelfClearState, WriteOnceState};
use super::protocol::{BusGeometry, Direction, Protocol};
use crate::config::ResetStyle;
use crate::util::{bit_mask, verilog_hex};
use std::fmt::{self, Write};

/// Nets of the internal Local Bus, declared by every bridge.
pub(crate) const LOCAL_BUS_SIGNALS: &[&str] = &[
    "lb_waddr",
    "lb_wdata",
    "lb_wstrb",
    "lb_wmask",
    "lb_wen",
    "lb_wready",
    "lb_raddr",
    "lb_ren",
    "lb_rdata",
    "lb_rvalid",
];

pub(super) struct Emitter<'a> {
    pub plan: &'a BankPlan<'a>,
    pub protocol: &'static Protocol,
    pub bus: BusGeometry,
    pub read_filler: u64,
    pub module: &'a str,
    pub mapname: &'a str,
}

/// `[msb:0] ` for vectors, nothing for single bits.
fn range(width: u32) -> String {
    if width > 1 {
        format!("[{}:0] ", width - 1)
    } else {
        String::new()
    }
}

impl Emitter<'_> {
    fn reset(&self) -> ResetStyle {
        self.bus.reset
    }

    pub(super) fn emit(&self) -> Result<String, fmt::Error> {
        let mut out = String::new();
        self.header(&mut out)?;
        self.local_bus(&mut out)?;
        writeln!(out)?;
        (self.protocol.front_end)(&mut out, &self.bus)?;
        writeln!(out)?;
        self.decode(&mut out)?;
        for reg in &self.plan.registers {
            for field in &reg.fields {
                writeln!(out)?;
                self.field(&mut out, reg, field)?;
            }
        }
        writeln!(out)?;
        self.read_mux(&mut out)?;
        writeln!(out)?;
        writeln!(out, "endmodule")?;
        Ok(out)
    }

    fn header(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "// Generated by regmap-compiler, do not edit.")?;
        writeln!(
            out,
            "// {} bridge to the Local Bus of register map '{}'.",
            self.protocol.title, self.mapname
        )?;
        writeln!(out)?;
        writeln!(out, "module {} (", self.module)?;

        let mut ports: Vec<(Option<String>, String)> = Vec::new();
        let mut decl = |comment: Option<String>, dir: Direction, width: u32, name: &str| {
            let decl = format!("{} wire {:<8}{name}", dir.keyword(), range(width));
            ports.push((comment, decl));
        };
        decl(Some("Clock and reset".into()), Direction::Input, 1, "clk");
        decl(None, Direction::Input, 1, self.reset().port());
        for (i, port) in self.protocol.ports.iter().enumerate() {
            let comment = (i == 0).then(|| format!("{} interface", self.protocol.title));
            let width = self.bus.port_width(port.width);
            decl(comment, port.direction, width, port.name);
        }
        for reg in &self.plan.registers {
            for (i, f) in reg.fields.iter().enumerate() {
                let comment = (i == 0).then(|| format!("Register {}", reg.register.name()));
                let width = f.bitfield().width();
                decl(comment, f.logic.port_direction(), width, &f.port);
            }
        }

        let last = ports.len().saturating_sub(1);
        for (i, (comment, decl)) in ports.iter().enumerate() {
            if let Some(comment) = comment {
                writeln!(out, "    // {comment}")?;
            }
            let sep = if i == last { "" } else { "," };
            writeln!(out, "    {decl}{sep}")?;
        }
        writeln!(out, ");")?;
        writeln!(out)?;

        if self.plan.uses(|l| l == FieldLogic::SelfClearing) {
            for state in SelfClearState::ALL {
                writeln!(
                    out,
                    "localparam {} = 1'b{};",
                    state.verilog_name(),
                    state.encoding()
                )?;
            }
        }
        if self.plan.uses(FieldLogic::is_write_once) {
            for state in WriteOnceState::ALL {
                writeln!(
                    out,
                    "localparam {} = 1'b{};",
                    state.verilog_name(),
                    state.encoding()
                )?;
            }
        }
        Ok(())
    }

    fn local_bus(&self, out: &mut String) -> fmt::Result {
        let aw = range(self.bus.address_width);
        let dw = range(self.bus.data_width);
        // Always a vector: the mask below indexes it.
        let sw = format!("[{}:0] ", self.bus.strobe_width() - 1);
        writeln!(out, "// Local Bus")?;
        writeln!(out, "wire {aw:<8}lb_waddr;")?;
        writeln!(out, "wire {dw:<8}lb_wdata;")?;
        writeln!(out, "wire {sw:<8}lb_wstrb;")?;
        writeln!(out, "wire {dw:<8}lb_wmask;")?;
        writeln!(out, "wire {:<8}lb_wen;", "")?;
        writeln!(out, "wire {:<8}lb_wready;", "")?;
        writeln!(out, "wire {aw:<8}lb_raddr;")?;
        writeln!(out, "wire {:<8}lb_ren;", "")?;
        writeln!(out, "reg  {dw:<8}lb_rdata;")?;
        writeln!(out, "reg  {:<8}lb_rvalid;", "")?;
        writeln!(out)?;
        writeln!(out, "assign lb_wready = 1'b1;")?;
        let bytes: Vec<String> = (0..self.bus.strobe_width())
            .rev()
            .map(|i| format!("{{8{{lb_wstrb[{i}]}}}}"))
            .collect();
        writeln!(out, "assign lb_wmask  = {{{}}};", bytes.join(", "))
    }

    fn decode(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "// Address decode")?;
        for reg in &self.plan.registers {
            let addr = verilog_hex(self.bus.address_width, reg.register.address);
            writeln!(out, "wire {} = lb_wen & (lb_waddr == {addr});", reg.wsel())?;
            writeln!(out, "wire {} = lb_ren & (lb_raddr == {addr});", reg.rsel())?;
        }
        Ok(())
    }

    /// Opening lines of a clocked block with reset.
    fn always_begin(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "always {} begin", self.reset().sensitivity())?;
        writeln!(out, "    if ({}) begin", self.reset().active())
    }

    fn field(&self, out: &mut String, reg: &RegisterPlan, f: &FieldPlan) -> fmt::Result {
        let bf = f.bitfield();
        let width = bf.width();
        let bits = bf.bit_range();
        let w = range(width);
        let (ff, we, state) = (f.ff(), f.we(), f.state());
        let zero = verilog_hex(width, 0);
        let init = verilog_hex(width, bf.initial());
        let load = format!("lb_wdata{bits} & lb_wmask{bits}");
        let modifiers: Vec<&str> = bf.modifiers().map(|m| m.as_str()).collect();
        let modifiers = if modifiers.is_empty() {
            String::new()
        } else {
            format!(", {}", modifiers.join(", "))
        };
        writeln!(
            out,
            "// {}.{} {bits}: {}{modifiers}",
            reg.register.name(),
            bf.name(),
            bf.access()
        )?;

        if f.logic.port_direction() == Direction::Output {
            writeln!(out, "wire {we} = {} & (|lb_wmask{bits});", reg.wsel())?;
        }
        match f.logic {
            FieldLogic::HwDriven => {
                writeln!(out, "// driven by {}", f.port)?;
            }
            FieldLogic::Sticky => {
                writeln!(out, "reg  {w}{ff};")?;
                self.always_begin(out)?;
                writeln!(out, "        {ff} <= {init};")?;
                writeln!(out, "    end else begin")?;
                writeln!(
                    out,
                    "        {ff} <= ({} ? {zero} : {ff}) | {};",
                    reg.rsel(),
                    f.port
                )?;
                writeln!(out, "    end")?;
                writeln!(out, "end")?;
            }
            FieldLogic::Stored {
                read_clear,
                write_once,
            } => {
                let masked = format!("({ff} & ~lb_wmask{bits}) | ({load})");
                writeln!(out, "reg  {w}{ff};")?;
                if write_once {
                    writeln!(out, "reg  {state};")?;
                }
                self.always_begin(out)?;
                writeln!(out, "        {ff} <= {init};")?;
                if write_once {
                    let (open, locked) = (
                        WriteOnceState::Open.verilog_name(),
                        WriteOnceState::Locked.verilog_name(),
                    );
                    writeln!(out, "        {state} <= {open};")?;
                    writeln!(out, "    end else if ({we} && {state} == {open}) begin")?;
                    writeln!(out, "        {ff} <= {masked};")?;
                    writeln!(out, "        {state} <= {locked};")?;
                } else {
                    writeln!(out, "    end else if ({we}) begin")?;
                    writeln!(out, "        {ff} <= {masked};")?;
                }
                if read_clear {
                    writeln!(out, "    end else if ({}) begin", reg.rsel())?;
                    writeln!(out, "        {ff} <= {zero};")?;
                }
                writeln!(out, "    end")?;
                writeln!(out, "end")?;
                writeln!(out, "assign {} = {ff};", f.port)?;
            }
            FieldLogic::SelfClearing => {
                let (idle, asserted) = (
                    SelfClearState::Idle.verilog_name(),
                    SelfClearState::Asserted.verilog_name(),
                );
                writeln!(out, "reg  {state};")?;
                writeln!(out, "reg  {w}{ff};")?;
                self.always_begin(out)?;
                writeln!(out, "        {state} <= {idle};")?;
                writeln!(out, "        {ff} <= {zero};")?;
                writeln!(out, "    end else begin")?;
                writeln!(out, "        case ({state})")?;
                writeln!(out, "            {idle}: if ({we}) begin")?;
                writeln!(out, "                {state} <= {asserted};")?;
                writeln!(out, "                {ff} <= {load};")?;
                writeln!(out, "            end")?;
                writeln!(out, "            default: begin")?;
                writeln!(out, "                {state} <= {idle};")?;
                writeln!(out, "                {ff} <= {zero};")?;
                writeln!(out, "            end")?;
                writeln!(out, "        endcase")?;
                writeln!(out, "    end")?;
                writeln!(out, "end")?;
                writeln!(out, "assign {} = {ff};", f.port)?;
            }
            FieldLogic::Pulse => {
                writeln!(out, "assign {} = {we} ? ({load}) : {zero};", f.port)?;
            }
        }
        Ok(())
    }

    fn read_word(&self, reg: &RegisterPlan) -> String {
        let parts: Vec<String> = reg
            .read_segments(self.bus.data_width)
            .iter()
            .map(|seg| match seg {
                Segment::Field(f) => f.read_source(),
                Segment::Filler { lsb, width } => {
                    verilog_hex(*width, (self.read_filler >> lsb) & bit_mask(*width))
                }
            })
            .collect();
        format!("{{{}}}", parts.join(", "))
    }

    fn read_mux(&self, out: &mut String) -> fmt::Result {
        let filler = verilog_hex(self.bus.data_width, self.read_filler);
        writeln!(out, "// Read data, registered on the cycle after lb_ren")?;
        self.always_begin(out)?;
        writeln!(out, "        lb_rvalid <= 1'b0;")?;
        writeln!(out, "        lb_rdata  <= {filler};")?;
        writeln!(out, "    end else begin")?;
        writeln!(out, "        lb_rvalid <= lb_ren;")?;
        writeln!(out, "        if (lb_ren) begin")?;
        writeln!(out, "            case (lb_raddr)")?;
        for reg in &self.plan.registers {
            writeln!(
                out,
                "                {}: lb_rdata <= {};",
                verilog_hex(self.bus.address_width, reg.register.address),
                self.read_word(reg)
            )?;
        }
        writeln!(out, "                default: lb_rdata <= {filler};")?;
        writeln!(out, "            endcase")?;
        writeln!(out, "        end")?;
        writeln!(out, "    end")?;
        writeln!(out, "end")
    }
}
