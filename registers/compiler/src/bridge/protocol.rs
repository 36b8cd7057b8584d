// Licensed under the Apache-2.0 license

//! Bus protocol descriptors.
//!
//! Each supported family is one entry of [`PROTOCOLS`]. The generator never
//! branches on the protocol name: ports, the bus-side front end and the
//! transaction timing all come from the descriptor.

use crate::config::{ResetStyle, BRIDGE_TYPES};
use crate::error::{config_err, Result};
use std::fmt::{self, Write};

/// Handshake shape of a bus family.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Handshake {
    /// Setup cycle followed by an access cycle extended by `pready` (APB).
    SetupAccess,
    /// Independent valid/ready channels (AXI4-Lite).
    ValidReady,
    /// Single command phase stalled by `waitrequest` (Avalon-MM).
    WaitRequest,
}

/// What the Local Bus sees during one clock cycle of a bus transaction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    /// The transaction is in flight but no Local Bus strobe is issued.
    Idle,
    /// The Local Bus write or read strobe is asserted.
    Strobe,
    /// The bus master samples the response (read data, write ack).
    Response,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub fn keyword(self) -> &'static str {
        match self {
            Direction::Input => "input ",
            Direction::Output => "output",
        }
    }
}

/// Width of a bus port.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PortWidth {
    Bit,
    Fixed(u32),
    Address,
    Data,
    /// One bit per data byte.
    Strobe,
}

#[derive(Clone, Copy, Debug)]
pub struct Port {
    pub name: &'static str,
    pub direction: Direction,
    pub width: PortWidth,
}

const fn input(name: &'static str, width: PortWidth) -> Port {
    Port {
        name,
        direction: Direction::Input,
        width,
    }
}

const fn output(name: &'static str, width: PortWidth) -> Port {
    Port {
        name,
        direction: Direction::Output,
        width,
    }
}

/// Bus geometry and reset style handed to the front-end emitters.
#[derive(Clone, Copy, Debug)]
pub struct BusGeometry {
    pub address_width: u32,
    pub data_width: u32,
    pub reset: ResetStyle,
}

impl BusGeometry {
    pub fn strobe_width(&self) -> u32 {
        self.data_width / 8
    }

    pub fn port_width(&self, width: PortWidth) -> u32 {
        match width {
            PortWidth::Bit => 1,
            PortWidth::Fixed(w) => w,
            PortWidth::Address => self.address_width,
            PortWidth::Data => self.data_width,
            PortWidth::Strobe => self.strobe_width(),
        }
    }
}

/// Emits the glue between the bus ports and the internal Local Bus.
pub type FrontEnd = fn(&mut String, &BusGeometry) -> fmt::Result;

/// Description of one supported bus family.
pub struct Protocol {
    /// Value of `lb_bridge.type` selecting this family.
    pub name: &'static str,
    pub title: &'static str,
    pub handshake: Handshake,
    pub data_widths: &'static [u32],
    pub ports: &'static [Port],
    pub front_end: FrontEnd,
    /// Nets declared by the front end.
    pub internals: &'static [&'static str],
    /// Cycles of a write transaction, from the first cycle the master drives it.
    pub write_phases: &'static [Phase],
    /// Cycles of a read transaction.
    pub read_phases: &'static [Phase],
}

impl fmt::Debug for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Protocol")
            .field("name", &self.name)
            .field("handshake", &self.handshake)
            .finish_non_exhaustive()
    }
}

impl Protocol {
    pub fn supports_data_width(&self, width: u32) -> bool {
        self.data_widths.contains(&width)
    }

    /// Name of the generated module for a register map.
    pub fn module_name(&self, mapname: &str) -> String {
        format!("{}2lb_{mapname}", self.name)
    }
}

pub const PROTOCOLS: &[Protocol] = &[
    Protocol {
        name: "apb",
        title: "AMBA APB",
        handshake: Handshake::SetupAccess,
        data_widths: &[8, 16, 32],
        ports: &[
            input("psel", PortWidth::Bit),
            input("paddr", PortWidth::Address),
            input("penable", PortWidth::Bit),
            input("pwrite", PortWidth::Bit),
            input("pwdata", PortWidth::Data),
            input("pstrb", PortWidth::Strobe),
            output("prdata", PortWidth::Data),
            output("pready", PortWidth::Bit),
            output("pslverr", PortWidth::Bit),
        ],
        front_end: apb_front_end,
        internals: &[],
        write_phases: &[Phase::Idle, Phase::Strobe],
        read_phases: &[Phase::Strobe, Phase::Response],
    },
    Protocol {
        name: "axil",
        title: "AMBA AXI4-Lite",
        handshake: Handshake::ValidReady,
        data_widths: &[32, 64],
        ports: &[
            input("awaddr", PortWidth::Address),
            input("awprot", PortWidth::Fixed(3)),
            input("awvalid", PortWidth::Bit),
            output("awready", PortWidth::Bit),
            input("wdata", PortWidth::Data),
            input("wstrb", PortWidth::Strobe),
            input("wvalid", PortWidth::Bit),
            output("wready", PortWidth::Bit),
            output("bresp", PortWidth::Fixed(2)),
            output("bvalid", PortWidth::Bit),
            input("bready", PortWidth::Bit),
            input("araddr", PortWidth::Address),
            input("arprot", PortWidth::Fixed(3)),
            input("arvalid", PortWidth::Bit),
            output("arready", PortWidth::Bit),
            output("rdata", PortWidth::Data),
            output("rresp", PortWidth::Fixed(2)),
            output("rvalid", PortWidth::Bit),
            input("rready", PortWidth::Bit),
        ],
        front_end: axil_front_end,
        internals: &[
            "axil_bvalid",
            "axil_wr_req",
            "axil_rd_busy",
            "axil_rvalid_hold",
            "axil_rd_req",
        ],
        write_phases: &[Phase::Strobe, Phase::Response],
        read_phases: &[Phase::Strobe, Phase::Response],
    },
    Protocol {
        name: "amm",
        title: "Avalon-MM",
        handshake: Handshake::WaitRequest,
        data_widths: &[8, 16, 32, 64],
        ports: &[
            input("address", PortWidth::Address),
            input("read", PortWidth::Bit),
            output("readdata", PortWidth::Data),
            input("write", PortWidth::Bit),
            input("writedata", PortWidth::Data),
            input("byteenable", PortWidth::Strobe),
            output("waitrequest", PortWidth::Bit),
        ],
        front_end: amm_front_end,
        internals: &[],
        write_phases: &[Phase::Strobe],
        read_phases: &[Phase::Strobe, Phase::Response],
    },
];

/// Look up a bridge family by its `lb_bridge.type` value.
///
/// Returns `Ok(None)` for the `none` sentinel.
pub fn lookup(name: &str) -> Result<Option<&'static Protocol>> {
    if name == "none" {
        return Ok(None);
    }
    match PROTOCOLS.iter().find(|p| p.name == name) {
        Some(p) => Ok(Some(p)),
        None => config_err!(
            "unknown bridge type '{name}' (expected one of {})",
            BRIDGE_TYPES.join(", ")
        ),
    }
}

fn apb_front_end(out: &mut String, _bus: &BusGeometry) -> fmt::Result {
    writeln!(out, "// APB: setup cycle issues reads, access cycle issues writes")?;
    writeln!(out, "assign lb_waddr = paddr;")?;
    writeln!(out, "assign lb_wdata = pwdata;")?;
    writeln!(out, "assign lb_wstrb = pstrb;")?;
    writeln!(out, "assign lb_wen   = psel & penable & pwrite;")?;
    writeln!(out, "assign lb_raddr = paddr;")?;
    writeln!(out, "assign lb_ren   = psel & ~penable & ~pwrite;")?;
    writeln!(out, "assign prdata   = lb_rdata;")?;
    writeln!(out, "assign pready   = pwrite ? lb_wready : lb_rvalid;")?;
    writeln!(out, "assign pslverr  = 1'b0;")
}

fn axil_front_end(out: &mut String, bus: &BusGeometry) -> fmt::Result {
    let (sens, reset) = (bus.reset.sensitivity(), bus.reset.active());
    writeln!(out, "// AXI4-Lite write channels: accept address and data together")?;
    writeln!(out, "reg  axil_bvalid;")?;
    writeln!(out, "wire axil_wr_req = awvalid & wvalid & ~axil_bvalid;")?;
    writeln!(out, "always {sens} begin")?;
    writeln!(out, "    if ({reset}) axil_bvalid <= 1'b0;")?;
    writeln!(out, "    else if (axil_wr_req) axil_bvalid <= 1'b1;")?;
    writeln!(out, "    else if (bready) axil_bvalid <= 1'b0;")?;
    writeln!(out, "end")?;
    writeln!(out, "assign awready  = axil_wr_req;")?;
    writeln!(out, "assign wready   = axil_wr_req;")?;
    writeln!(out, "assign bvalid   = axil_bvalid;")?;
    writeln!(out, "assign bresp    = 2'b00;")?;
    writeln!(out, "assign lb_waddr = awaddr;")?;
    writeln!(out, "assign lb_wdata = wdata;")?;
    writeln!(out, "assign lb_wstrb = wstrb;")?;
    writeln!(out, "assign lb_wen   = axil_wr_req;")?;
    writeln!(out)?;
    writeln!(out, "// AXI4-Lite read channels: one outstanding read, data held until rready")?;
    writeln!(out, "reg  axil_rd_busy;")?;
    writeln!(out, "reg  axil_rvalid_hold;")?;
    writeln!(out, "wire axil_rd_req = arvalid & ~axil_rd_busy;")?;
    writeln!(out, "always {sens} begin")?;
    writeln!(out, "    if ({reset}) begin")?;
    writeln!(out, "        axil_rd_busy     <= 1'b0;")?;
    writeln!(out, "        axil_rvalid_hold <= 1'b0;")?;
    writeln!(out, "    end else begin")?;
    writeln!(out, "        axil_rvalid_hold <= rvalid & ~rready;")?;
    writeln!(out, "        if (axil_rd_req) axil_rd_busy <= 1'b1;")?;
    writeln!(out, "        else if (rvalid & rready) axil_rd_busy <= 1'b0;")?;
    writeln!(out, "    end")?;
    writeln!(out, "end")?;
    writeln!(out, "assign arready  = axil_rd_req;")?;
    writeln!(out, "assign rvalid   = lb_rvalid | axil_rvalid_hold;")?;
    writeln!(out, "assign rdata    = lb_rdata;")?;
    writeln!(out, "assign rresp    = 2'b00;")?;
    writeln!(out, "assign lb_raddr = araddr;")?;
    writeln!(out, "assign lb_ren   = axil_rd_req;")
}

fn amm_front_end(out: &mut String, _bus: &BusGeometry) -> fmt::Result {
    writeln!(out, "// Avalon-MM: reads stall on waitrequest until the data is registered")?;
    writeln!(out, "assign lb_waddr    = address;")?;
    writeln!(out, "assign lb_wdata    = writedata;")?;
    writeln!(out, "assign lb_wstrb    = byteenable;")?;
    writeln!(out, "assign lb_wen      = write;")?;
    writeln!(out, "assign lb_raddr    = address;")?;
    writeln!(out, "assign lb_ren      = read & ~lb_rvalid;")?;
    writeln!(out, "assign readdata    = lb_rdata;")?;
    writeln!(out, "assign waitrequest = read ? ~lb_rvalid : ~lb_wready;")
}
